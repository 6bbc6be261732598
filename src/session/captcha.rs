// src/session/captcha.rs

use crate::{
    config::{AppConfig, CaptchaSolverKind},
    error::*,
    ui,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, info};
use serde_json::{Value, json};
use std::{io::Write, sync::Arc};
use url::Url;

/// 验证码识别：输入图片字节，输出识别出的文本。重试由登录流程负责。
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn solve(&self, image: &[u8]) -> AppResult<String>;
}

pub fn solver_from_config(config: &AppConfig) -> AppResult<Arc<dyn CaptchaSolver>> {
    match (config.captcha.solver, &config.captcha.endpoint) {
        (CaptchaSolverKind::OcrService, Some(endpoint)) => {
            Ok(Arc::new(OcrServiceSolver::new(endpoint.clone(), config)?))
        }
        (CaptchaSolverKind::OcrService, None) => Err(AppError::Config(
            "未配置验证码识别服务地址 (captcha.endpoint)".to_string(),
        )),
        (CaptchaSolverKind::Prompt, _) => Ok(Arc::new(PromptSolver)),
    }
}

/// 把验证码保存为临时图片，由用户手动输入。
pub struct PromptSolver;

#[async_trait]
impl CaptchaSolver for PromptSolver {
    async fn solve(&self, image: &[u8]) -> AppResult<String> {
        let image = image.to_vec();
        tokio::task::spawn_blocking(move || -> AppResult<String> {
            let mut file = tempfile::Builder::new()
                .prefix("captcha-")
                .suffix(".jpg")
                .tempfile()?;
            file.write_all(&image)?;
            file.flush()?;
            info!("验证码图片已保存到: {}", file.path().display());
            let text = ui::prompt("请打开图片并输入验证码", None)?;
            if text.is_empty() {
                return Err(AppError::Captcha("未输入验证码".to_string()));
            }
            Ok(text)
        })
        .await
        .map_err(|e| AppError::Captcha(format!("读取验证码输入失败: {}", e)))?
    }
}

/// 调用 HTTP OCR 服务：POST `{"image": "<base64>"}`。
pub struct OcrServiceSolver {
    client: reqwest::Client,
    endpoint: Url,
}

impl OcrServiceSolver {
    pub fn new(endpoint: Url, config: &AppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

/// 兼容常见 OCR 服务的返回格式：JSON 中的 result / data / text 字段，或纯文本正文。
pub(crate) fn extract_ocr_text(body: &str) -> Option<String> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(value) => ["result", "data", "text"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string)?,
        Err(_) => body.to_string(),
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl CaptchaSolver for OcrServiceSolver {
    async fn solve(&self, image: &[u8]) -> AppResult<String> {
        let payload = json!({ "image": STANDARD.encode(image) });
        let body = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("OCR 服务返回: {}", body);
        extract_ocr_text(&body)
            .ok_or_else(|| AppError::Captcha(format!("OCR 服务返回了无法识别的结果: {}", body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ocr_text_formats() {
        assert_eq!(extract_ocr_text(r#"{"result":"a1b2"}"#).as_deref(), Some("a1b2"));
        assert_eq!(extract_ocr_text(r#"{"code":200,"data":" x9y8 "}"#).as_deref(), Some("x9y8"));
        assert_eq!(extract_ocr_text("k7m2\n").as_deref(), Some("k7m2"));
        assert_eq!(extract_ocr_text(r#"{"code":500}"#), None);
        assert_eq!(extract_ocr_text("   "), None);
    }

    #[tokio::test]
    async fn test_ocr_service_solver_posts_base64_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ocr")
            .match_body(mockito::Matcher::Json(json!({ "image": "AQID" })))
            .with_status(200)
            .with_body(r#"{"result":"7x3k"}"#)
            .create_async()
            .await;

        let config = AppConfig::for_testing(&server.url());
        let endpoint = Url::parse(&format!("{}/ocr", server.url())).unwrap();
        let solver = OcrServiceSolver::new(endpoint, &config).unwrap();
        assert_eq!(solver.solve(&[1, 2, 3]).await.unwrap(), "7x3k");
        mock.assert_async().await;
    }
}
