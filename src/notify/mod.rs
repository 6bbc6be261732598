// src/notify/mod.rs

pub mod dingtalk;
pub mod feishu;

pub use dingtalk::DingTalkNotifier;
pub use feishu::FeishuNotifier;

use crate::{config::AppConfig, constants, error::*, models::CourseRequest};
use anyhow::anyhow;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use log::{debug, error, info};
use sha2::Sha256;
use std::sync::Arc;

/// 一次推送的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub channel: String,
    pub delivered: bool,
    pub detail: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, title: &str, body: &str) -> AppResult<DeliveryReceipt>;
}

pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> AppResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| AppError::Other(anyhow!("无法初始化 HMAC: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// 把消息转发给所有已配置的推送渠道。推送失败只记录日志。
#[derive(Clone, Default)]
pub struct NotificationGateway {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationGateway {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if let Some(webhook) = &config.dingtalk {
            notifiers.push(Arc::new(DingTalkNotifier::new(webhook.clone(), config)?));
        } else {
            info!("未配置钉钉 webhook，跳过钉钉通知");
        }
        if let Some(webhook) = &config.feishu {
            notifiers.push(Arc::new(FeishuNotifier::new(webhook.clone(), config)?));
        } else {
            info!("未配置飞书 webhook，跳过飞书通知");
        }
        Ok(Self { notifiers })
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn broadcast(&self, title: &str, body: &str) -> Vec<DeliveryReceipt> {
        let mut receipts = Vec::with_capacity(self.notifiers.len());
        for notifier in &self.notifiers {
            match notifier.notify(title, body).await {
                Ok(receipt) => {
                    if receipt.delivered {
                        info!("{}发送通知消息成功", receipt.channel);
                    } else {
                        error!("{}发送通知消息失败: {}", receipt.channel, receipt.detail);
                    }
                    receipts.push(receipt);
                }
                Err(e) => {
                    error!("{}发送通知消息失败: {}", notifier.name(), e);
                    receipts.push(DeliveryReceipt {
                        channel: notifier.name().to_string(),
                        delivered: false,
                        detail: e.to_string(),
                    });
                }
            }
        }
        debug!("通知已发送到 {} 个渠道", receipts.len());
        receipts
    }

    pub async fn course_selected(&self, request: &CourseRequest) -> Vec<DeliveryReceipt> {
        let (title, body) = success_message(request);
        self.broadcast(title, &body).await
    }

    pub async fn course_failed(
        &self,
        request: &CourseRequest,
        failures: &[String],
    ) -> Vec<DeliveryReceipt> {
        let (title, body) = failure_message(request, failures);
        self.broadcast(title, &body).await
    }
}

pub fn success_message(request: &CourseRequest) -> (&'static str, String) {
    (
        constants::notify::SUCCESS_TITLE,
        format!("课程{}选课成功！", request),
    )
}

pub fn failure_message(request: &CourseRequest, failures: &[String]) -> (&'static str, String) {
    (
        constants::notify::FAILURE_TITLE,
        format!(
            "课程{}选课失败，遇到以下错误：\n\n{}",
            request,
            failures.join("\n\n")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            "记录"
        }

        async fn notify(&self, title: &str, body: &str) -> AppResult<DeliveryReceipt> {
            self.sent.lock().unwrap().push((title.into(), body.into()));
            Ok(DeliveryReceipt {
                channel: "记录".into(),
                delivered: true,
                detail: String::new(),
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl Notifier for Broken {
        fn name(&self) -> &str {
            "故障"
        }

        async fn notify(&self, _title: &str, _body: &str) -> AppResult<DeliveryReceipt> {
            Err(AppError::Other(anyhow::anyhow!("connection refused")))
        }
    }

    #[test]
    fn test_messages() {
        let request = CourseRequest::new("530009", "李大新");
        let (title, body) = success_message(&request);
        assert_eq!(title, "选课成功 🎉 ✨ 🌟 🎊");
        assert_eq!(body, "课程【530009-李大新】选课成功！");

        let failures = vec![
            "【专业内跨年级选课】失败: 人数已满".to_string(),
            "【公选课选课】发生异常: timeout".to_string(),
        ];
        let (title, body) = failure_message(&request, &failures);
        assert_eq!(title, "选课失败 😭 😢 😔");
        assert_eq!(
            body,
            "课程【530009-李大新】选课失败，遇到以下错误：\n\n【专业内跨年级选课】失败: 人数已满\n\n【公选课选课】发生异常: timeout"
        );
    }

    #[tokio::test]
    async fn test_broadcast_swallows_failures() {
        let recording = Arc::new(Recording {
            sent: Mutex::new(Vec::new()),
        });
        let gateway = NotificationGateway::new(vec![Arc::new(Broken), recording.clone()]);
        let receipts = gateway.broadcast("标题", "内容").await;

        assert_eq!(receipts.len(), 2);
        assert!(!receipts[0].delivered);
        assert!(receipts[1].delivered);
        assert_eq!(recording.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unconfigured_webhooks_leave_gateway_empty() {
        let mut config = AppConfig::for_testing("http://127.0.0.1:9");
        let gateway = NotificationGateway::from_config(&config).unwrap();
        assert!(gateway.is_empty());

        config.feishu = Some(crate::config::WebhookConfig {
            webhook: "http://127.0.0.1:9/hook".into(),
            secret: None,
        });
        let gateway = NotificationGateway::from_config(&config).unwrap();
        assert!(!gateway.is_empty());
    }
}
