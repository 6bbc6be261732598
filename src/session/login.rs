// src/session/login.rs

use super::captcha::CaptchaSolver;
use crate::{
    client::PortalClient,
    constants::{self, portal},
    error::*,
};
use log::{debug, info, warn};
use reqwest::header;

/// 登录响应的三种结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    Accepted,
    CaptchaRejected,
    BadCredentials,
}

pub(crate) fn classify_login_response(body: &str) -> LoginOutcome {
    if body.contains(portal::markers::CAPTCHA_REJECTED) {
        LoginOutcome::CaptchaRejected
    } else if body.contains(portal::markers::BAD_CREDENTIALS) {
        LoginOutcome::BadCredentials
    } else {
        LoginOutcome::Accepted
    }
}

/// 按登录页脚本的规则生成 `encoded` 字段。
///
/// `handshake` 形如 `"<scode>#<sxh>"`。对 `账号%%%密码` 的前 20 个字符，每输出一个字符后
/// 再从 `scode` 中依次取出 `sxh[i]` 个字符；第 20 个字符起原样追加剩余部分。
///
/// 循环按数据字符串的位置进行，而不是按 `scode` 的位置。教务系统返回的 `scode` 总长于
/// 20 个字符，数据也不短于 20 个字符时两种写法结果相同。数据较短时在数据末尾结束，
/// `scode` 或 `sxh` 用尽时不再插入，缺失的 `sxh` 位按 0 处理。
pub fn encode_credentials(handshake: &str, account: &str, password: &str) -> AppResult<String> {
    let (scode, sxh) = handshake.trim().split_once('#').ok_or_else(|| {
        AppError::LoginFailed(format!("登录握手数据格式错误: '{}'", handshake.trim()))
    })?;
    let data: Vec<char> = format!("{}%%%{}", account, password).chars().collect();
    let digits: Vec<usize> = sxh
        .chars()
        .map(|c| c.to_digit(10).map_or(0, |d| d as usize))
        .collect();
    let mut scode = scode.chars();

    let mut encoded = String::new();
    for (i, c) in data.iter().enumerate() {
        if i >= 20 {
            encoded.extend(&data[i..]);
            break;
        }
        encoded.push(*c);
        let take = digits.get(i).copied().unwrap_or(0);
        encoded.extend(scode.by_ref().take(take));
    }
    Ok(encoded)
}

/// 完整的登录流程：握手、获取验证码、提交表单；验证码错误时重试。
pub(crate) async fn login(
    client: &PortalClient,
    solver: &dyn CaptchaSolver,
    account: &str,
    password: &str,
) -> AppResult<()> {
    let handshake = client.get_text(portal::HANDSHAKE).await?;
    debug!("登录握手数据长度: {}", handshake.len());

    for attempt in 1..=constants::MAX_LOGIN_ATTEMPTS {
        let image = client.get_bytes(portal::CAPTCHA).await?;
        let captcha = solver.solve(&image).await?;
        info!("验证码: {}", captcha);

        let encoded = encode_credentials(&handshake, account, password)?;
        let form = [
            ("userAccount", account),
            ("userPassword", password),
            ("RANDOMCODE", captcha.as_str()),
            ("encoded", encoded.as_str()),
        ];
        let request = client
            .post(portal::LOGIN)?
            .header(header::ORIGIN, client.url("")?.as_str().trim_end_matches('/'))
            .header(header::REFERER, client.url("")?.as_str())
            .form(&form);
        let body = client.send_text(request).await?;

        match classify_login_response(&body) {
            LoginOutcome::Accepted => {
                info!("登录成功");
                return Ok(());
            }
            LoginOutcome::CaptchaRejected => {
                warn!("验证码识别错误，重试第 {} 次", attempt);
            }
            LoginOutcome::BadCredentials => return Err(AppError::BadCredentials),
        }
    }

    Err(AppError::CaptchaExhausted(constants::MAX_LOGIN_ATTEMPTS))
}
