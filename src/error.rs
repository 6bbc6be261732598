// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(String),
    #[error("用户名或密码错误")]
    BadCredentials,
    #[error("验证码识别错误，已连续尝试 {0} 次")]
    CaptchaExhausted(u32),
    #[error("登录失败: {0}")]
    LoginFailed(String),
    #[error("验证码处理失败: {0}")]
    Captcha(String),
    #[error("登录状态失效: {0}")]
    SessionExpired(String),
    #[error("未能获取选课轮次")]
    RoundUnavailable,
    #[error("周次格式错误: {0}")]
    WeekPattern(String),
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("无法解析来自 '{url}' 的响应: {source}")]
    ApiParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 这些错误无法通过重新登录恢复，调度器遇到后直接退出。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::BadCredentials
                | AppError::CaptchaExhausted(_)
                | AppError::UserInterrupt
        )
    }

    pub fn is_not_found(&self) -> bool {
        let status = match self {
            AppError::Network(e) => e.status(),
            AppError::NetworkMiddleware(reqwest_middleware::Error::Reqwest(e)) => e.status(),
            _ => None,
        };
        status == Some(StatusCode::NOT_FOUND)
    }
}

pub type AppResult<T> = Result<T, AppError>;
