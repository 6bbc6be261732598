// src/notify/dingtalk.rs

use super::{DeliveryReceipt, Notifier, hmac_sha256};
use crate::{config::AppConfig, config::WebhookConfig, error::*};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};

/// 钉钉自定义机器人，发送 markdown 消息。
pub struct DingTalkNotifier {
    client: reqwest::Client,
    webhook: WebhookConfig,
}

impl DingTalkNotifier {
    pub fn new(webhook: WebhookConfig, config: &AppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, webhook })
    }

    /// 加签后的请求地址；未配置密钥时原样返回。
    fn signed_url(&self, timestamp_ms: i64) -> AppResult<String> {
        let Some(secret) = &self.webhook.secret else {
            return Ok(self.webhook.webhook.clone());
        };
        let separator = if self.webhook.webhook.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}timestamp={}&sign={}",
            self.webhook.webhook,
            separator,
            timestamp_ms,
            sign(secret, timestamp_ms)?
        ))
    }
}

/// `urlencode(base64(HMAC-SHA256(secret, "{timestamp}\n{secret}")))`
pub fn sign(secret: &str, timestamp_ms: i64) -> AppResult<String> {
    let digest = hmac_sha256(
        secret.as_bytes(),
        format!("{}\n{}", timestamp_ms, secret).as_bytes(),
    )?;
    Ok(utf8_percent_encode(&STANDARD.encode(digest), NON_ALPHANUMERIC).to_string())
}

/// markdown 正文：标题、分隔线、发送时间，"失败"/"成功" 分别标红、标绿。
pub fn format_markdown(title: &str, body: &str, sent_at: &str) -> String {
    format!(
        "### {}\n\n---\n\n{}\n\n---\n\n*发送时间：{}*",
        title, body, sent_at
    )
    .replace("失败", "<font color='red'>失败</font>")
    .replace("成功", "<font color='green'>成功</font>")
}

#[async_trait]
impl Notifier for DingTalkNotifier {
    fn name(&self) -> &str {
        "钉钉"
    }

    async fn notify(&self, title: &str, body: &str) -> AppResult<DeliveryReceipt> {
        let now = chrono::Local::now();
        let text = format_markdown(title, body, &now.format("%Y-%m-%d %H:%M:%S").to_string());
        let payload = json!({
            "msgtype": "markdown",
            "markdown": { "title": title, "text": text },
        });

        let url = self.signed_url(now.timestamp_millis())?;
        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();
        let reply: Value = response.json().await?;
        debug!("钉钉返回: {} {}", status, reply);

        let delivered = status.is_success() && reply.get("errcode").and_then(Value::as_i64) == Some(0);
        Ok(DeliveryReceipt {
            channel: self.name().to_string(),
            delivered,
            detail: reply
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_matches_reference_vector() {
        assert_eq!(
            sign("SECabc", 1_700_000_000_000).unwrap(),
            "jcUpW0QmtKduN03n4JqQ0PBosVjqnM8gU7fIIvsDmCM%3D"
        );
    }

    #[test]
    fn test_signed_url_appends_query() {
        let config = AppConfig::for_testing("http://127.0.0.1/");
        let notifier = DingTalkNotifier::new(
            WebhookConfig {
                webhook: "https://oapi.dingtalk.com/robot/send?access_token=t".into(),
                secret: Some("SECabc".into()),
            },
            &config,
        )
        .unwrap();
        assert_eq!(
            notifier.signed_url(1_700_000_000_000).unwrap(),
            "https://oapi.dingtalk.com/robot/send?access_token=t&timestamp=1700000000000&sign=jcUpW0QmtKduN03n4JqQ0PBosVjqnM8gU7fIIvsDmCM%3D"
        );
    }

    #[test]
    fn test_markdown_highlights_outcome() {
        let text = format_markdown("选课失败", "课程【A-B】选课成功！", "2025-01-01 08:00:00");
        assert!(text.starts_with("### 选课<font color='red'>失败</font>"));
        assert!(text.contains("选课<font color='green'>成功</font>！"));
        assert!(text.ends_with("*发送时间：2025-01-01 08:00:00*"));
    }

    #[tokio::test]
    async fn test_notify_reports_errcode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/robot/send")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errcode":0,"errmsg":"ok"}"#)
            .create_async()
            .await;

        let config = AppConfig::for_testing(&server.url());
        let notifier = DingTalkNotifier::new(
            WebhookConfig {
                webhook: format!("{}/robot/send?access_token=t", server.url()),
                secret: Some("SECabc".into()),
            },
            &config,
        )
        .unwrap();
        let receipt = notifier.notify("选课成功", "课程【A-B】选课成功！").await.unwrap();
        assert!(receipt.delivered);
        assert_eq!(receipt.detail, "ok");
        mock.assert_async().await;
    }
}
