// src/config/file.rs

use super::CaptchaSolverKind;
use crate::{
    constants,
    error::{AppError, AppResult},
};
use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// 配置文件中的一门课程。空字符串等同于未填写。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourseEntry {
    #[serde(default)]
    pub course_id_or_name: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub class_period: String,
    #[serde(default)]
    pub week_day: String,
    #[serde(default)]
    pub weeks: String,
    #[serde(default)]
    pub jx02id: String,
    #[serde(default)]
    pub jx0404id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkSection {
    pub base_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaptchaSection {
    #[serde(default)]
    pub solver: CaptchaSolverKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingSection {
    pub backoff_ms: Option<u64>,
    pub pace_interval_ms: Option<u64>,
    pub round_interval_ms: Option<u64>,
}

/// 磁盘上的配置文件结构，字段名与旧版脚本的 config.json 保持一致。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub user_account: String,
    #[serde(default)]
    pub user_password: String,
    #[serde(default)]
    pub select_semester: String,
    #[serde(default)]
    pub dingtalk_webhook: String,
    #[serde(default)]
    pub dingtalk_secret: String,
    #[serde(default)]
    pub feishu_webhook: String,
    #[serde(default)]
    pub feishu_secret: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub courses: Vec<CourseEntry>,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub captcha: CaptchaSection,
    #[serde(default)]
    pub timings: TimingSection,
}

fn default_mode() -> String {
    "snipe".to_string()
}

impl ExternalConfig {
    /// 首次运行时写出的模板。
    pub fn template() -> Self {
        Self {
            user_account: String::new(),
            user_password: String::new(),
            select_semester: String::new(),
            dingtalk_webhook: String::new(),
            dingtalk_secret: String::new(),
            feishu_webhook: String::new(),
            feishu_secret: String::new(),
            mode: default_mode(),
            courses: vec![CourseEntry::default()],
            network: NetworkSection {
                base_url: Some(constants::DEFAULT_BASE_URL.into()),
                connect_timeout_secs: Some(10),
                timeout_secs: Some(30),
                max_retries: Some(3),
            },
            captcha: CaptchaSection::default(),
            timings: TimingSection {
                backoff_ms: Some(constants::timings::BACKOFF_MS),
                pace_interval_ms: Some(constants::timings::PACE_INTERVAL_MS),
                round_interval_ms: Some(constants::timings::ROUND_INTERVAL_MS),
            },
        }
    }
}

/// 读取配置文件；文件不存在时写出模板并返回配置错误，提示用户填写后重新运行。
pub(crate) fn load_or_create_external_config(path: &Path) -> AppResult<ExternalConfig> {
    if path.is_file() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 '{}' 失败", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", path.display()))?;
        return Ok(config);
    }

    info!("配置文件 {:?} 不存在，将创建默认配置。", path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json_content = serde_json::to_string_pretty(&ExternalConfig::template())?;
    fs::write(path, json_content)
        .with_context(|| format!("写入默认配置文件 '{}' 失败", path.display()))?;

    Err(AppError::Config(format!(
        "配置文件不存在，已创建默认配置文件 {}，请填写相关信息后重新运行程序",
        path.display()
    )))
}
