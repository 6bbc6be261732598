// src/client.rs

use crate::{config::AppConfig, constants, error::*};
use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::fmt;
use url::Url;

/// 绑定一个 Cookie 容器的教务系统客户端；一个实例对应一次登录会话。
pub struct PortalClient {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static(constants::ACCEPT_HTML));
        default_headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(constants::ACCEPT_LANGUAGE),
        );

        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn url(&self, path: &str) -> AppResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub fn get(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.client.get(self.url(path)?))
    }

    pub fn post(&self, path: &str) -> AppResult<RequestBuilder> {
        Ok(self.client.post(self.url(path)?))
    }

    /// 发送请求，非 2xx 状态码视为错误，返回响应正文。
    pub async fn send_text(&self, request: RequestBuilder) -> AppResult<String> {
        let res = request.send().await?;
        let status = res.status();
        let url = res.url().clone();
        let body = res.error_for_status()?.text().await?;
        debug!("{} -> {} ({} 字节)", url, status, body.len());
        Ok(body)
    }

    pub async fn get_text(&self, path: &str) -> AppResult<String> {
        self.send_text(self.get(path)?).await
    }

    pub async fn get_bytes(&self, path: &str) -> AppResult<Vec<u8>> {
        let res = self.get(path)?.send().await?.error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }

    /// 以 XHR 方式请求，附带 Referer，与浏览器中的选课页面行为一致。
    pub fn xhr(&self, request: RequestBuilder, referer: &str) -> AppResult<RequestBuilder> {
        Ok(request
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::ACCEPT, "*/*")
            .header(header::REFERER, self.url(referer)?.as_str()))
    }
}
