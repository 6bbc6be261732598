// src/notify/feishu.rs

use super::{DeliveryReceipt, Notifier, hmac_sha256};
use crate::{config::AppConfig, config::WebhookConfig, error::*};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use serde_json::{Value, json};

/// 飞书自定义机器人，发送富文本 (post) 消息。
pub struct FeishuNotifier {
    client: reqwest::Client,
    webhook: WebhookConfig,
}

impl FeishuNotifier {
    pub fn new(webhook: WebhookConfig, config: &AppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, webhook })
    }

    fn payload(&self, title: &str, body: &str, timestamp: i64) -> AppResult<Value> {
        let mut payload = json!({
            "msg_type": "post",
            "content": {
                "post": {
                    "zh_cn": {
                        "title": title,
                        "content": [[{ "tag": "text", "text": body }]],
                    }
                }
            },
        });
        if let Some(secret) = &self.webhook.secret {
            payload["timestamp"] = json!(timestamp.to_string());
            payload["sign"] = json!(sign(secret, timestamp)?);
        }
        Ok(payload)
    }
}

/// `base64(HMAC-SHA256(key = "{timestamp}\n{secret}", msg = ""))`，时间戳单位为秒。
pub fn sign(secret: &str, timestamp: i64) -> AppResult<String> {
    let key = format!("{}\n{}", timestamp, secret);
    Ok(STANDARD.encode(hmac_sha256(key.as_bytes(), &[])?))
}

#[async_trait]
impl Notifier for FeishuNotifier {
    fn name(&self) -> &str {
        "飞书"
    }

    async fn notify(&self, title: &str, body: &str) -> AppResult<DeliveryReceipt> {
        let payload = self.payload(title, body, chrono::Utc::now().timestamp())?;
        let response = self
            .client
            .post(&self.webhook.webhook)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let reply: Value = response.json().await?;
        debug!("飞书返回: {} {}", status, reply);

        let code = reply
            .get("code")
            .or_else(|| reply.get("StatusCode"))
            .and_then(Value::as_i64);
        let detail = reply
            .get("msg")
            .or_else(|| reply.get("StatusMessage"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(DeliveryReceipt {
            channel: self.name().to_string(),
            delivered: status.is_success() && code == Some(0),
            detail,
        })
    }
}
