// src/session/mod.rs

pub mod captcha;
pub mod login;

pub use self::captcha::{CaptchaSolver, OcrServiceSolver, PromptSolver, solver_from_config};
pub use self::login::encode_credentials;

use crate::{client::PortalClient, config::AppConfig, error::*};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 持有当前已登录的客户端。失效后丢弃整个 Cookie 容器，下一次调用重新登录。
pub struct SessionManager {
    config: Arc<AppConfig>,
    solver: Arc<dyn CaptchaSolver>,
    current: Mutex<Option<Arc<PortalClient>>>,
}

impl SessionManager {
    pub fn new(config: Arc<AppConfig>, solver: Arc<dyn CaptchaSolver>) -> Self {
        Self {
            config,
            solver,
            current: Mutex::new(None),
        }
    }

    /// 返回已认证的客户端；尚未登录时执行完整登录流程。
    pub async fn ensure_authenticated(&self) -> AppResult<Arc<PortalClient>> {
        let mut guard = self.current.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }

        info!("正在登录教务系统: {}", self.config.base_url);
        let client = Arc::new(PortalClient::new(&self.config)?);
        login::login(
            &client,
            self.solver.as_ref(),
            &self.config.account,
            &self.config.password,
        )
        .await?;
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    pub async fn invalidate(&self) {
        if self.current.lock().await.take().is_some() {
            debug!("已丢弃当前会话");
        }
    }

    pub async fn current(&self) -> Option<Arc<PortalClient>> {
        self.current.lock().await.clone()
    }
}
