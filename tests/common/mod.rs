// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use mockito::{Matcher, Mock, ServerGuard};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use xk_sniper::{
    error::AppResult,
    notify::{DeliveryReceipt, Notifier},
    session::CaptchaSolver,
};

pub const HANDSHAKE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ#21012101210121012101";

/// 始终返回同一个验证码，并记录被调用的次数
#[derive(Default)]
pub struct FixedSolver {
    pub calls: AtomicUsize,
}

impl FixedSolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaSolver for FixedSolver {
    async fn solve(&self, _image: &[u8]) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("abcd".to_string())
    }
}

/// 记录所有推送内容的通知渠道
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "记录"
    }

    async fn notify(&self, title: &str, body: &str) -> AppResult<DeliveryReceipt> {
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
        Ok(DeliveryReceipt {
            channel: "记录".to_string(),
            delivered: true,
            detail: String::new(),
        })
    }
}

pub fn solver() -> Arc<FixedSolver> {
    Arc::new(FixedSolver::default())
}

/// 握手、验证码与登录三个接口；`login_body` 决定登录结果。
///
/// 预期登录 `logins` 次，每次提交 `attempts` 次登录表单。
pub async fn mock_login(
    server: &mut ServerGuard,
    login_body: &str,
    logins: usize,
    attempts: usize,
) -> (Mock, Mock, Mock) {
    let handshake = server
        .mock("GET", "/Logon.do")
        .match_query(Matcher::UrlEncoded("flag".into(), "sess".into()))
        .with_status(200)
        .with_body(HANDSHAKE)
        .expect(logins)
        .create_async()
        .await;
    let captcha = server
        .mock("GET", "/verifycode.servlet")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .expect(logins * attempts)
        .create_async()
        .await;
    let login = server
        .mock("POST", "/Logon.do")
        .match_query(Matcher::UrlEncoded("method".into(), "logonLdap".into()))
        .with_status(200)
        .with_body(login_body)
        .expect(logins * attempts)
        .create_async()
        .await;
    (handshake, captcha, login)
}

pub fn round_list_html(rows: &[(&str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><table><tr><th>序号</th><th>学年学期</th><th>名称</th><th>操作</th></tr>",
    );
    for (i, (semester, round_id)) in rows.iter().enumerate() {
        html.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>选课</td><td><a href="/jsxsd/xsxk/xsxk_index?jx0502zbid={}">进入选课</a></td></tr>"#,
            i + 1,
            semester,
            round_id
        ));
    }
    html.push_str("</table></body></html>");
    html
}
