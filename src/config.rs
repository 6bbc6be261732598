// src/config.rs

pub mod file;

use self::file::{CourseEntry, ExternalConfig};
use crate::{
    cli::Policy,
    constants,
    error::{AppError, AppResult},
    models::{CourseIds, CourseRequest},
    schedule::WeekSet,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptchaSolverKind {
    /// 把验证码图片保存到临时文件，由用户在终端输入
    #[default]
    Prompt,
    /// 调用外部 OCR 服务识别
    OcrService,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaConfig {
    pub solver: CaptchaSolverKind,
    pub endpoint: Option<Url>,
}

/// 机器人 Webhook 的地址与签名密钥
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub webhook: String,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// 出错后回到登录阶段前的等待
    pub backoff: Duration,
    /// 普通模式下两门课之间的等待
    pub pace_interval: Duration,
    /// 截胡模式下两轮之间的等待
    pub round_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(constants::timings::BACKOFF_MS),
            pace_interval: Duration::from_millis(constants::timings::PACE_INTERVAL_MS),
            round_interval: Duration::from_millis(constants::timings::ROUND_INTERVAL_MS),
        }
    }
}

/// 校验后的运行时配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub account: String,
    pub password: String,
    pub semester: String,
    pub policy: Policy,
    pub base_url: Url,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub captcha: CaptchaConfig,
    pub timings: Timings,
    pub dingtalk: Option<WebhookConfig>,
    pub feishu: Option<WebhookConfig>,
    pub courses: Vec<CourseRequest>,
}

impl AppConfig {
    /// 读取（必要时生成）配置文件并校验。`policy_override` 来自命令行 `--mode`。
    pub fn load(path: &Path, policy_override: Option<Policy>) -> AppResult<Self> {
        let external = file::load_or_create_external_config(path)?;
        Self::from_external(external, policy_override)
    }

    pub fn from_external(
        external: ExternalConfig,
        policy_override: Option<Policy>,
    ) -> AppResult<Self> {
        for field in [
            ("user_account", &external.user_account),
            ("user_password", &external.user_password),
        ] {
            if field.1.trim().is_empty() {
                return Err(AppError::Config(format!("配置文件中缺少必填字段: {}", field.0)));
            }
        }

        if external.courses.is_empty() {
            return Err(AppError::Config("配置文件中未填写任何课程".to_string()));
        }
        let courses = external
            .courses
            .iter()
            .map(validate_course)
            .collect::<AppResult<Vec<_>>>()?;

        let policy = match policy_override {
            Some(policy) => policy,
            None => Policy::from_name(&external.mode).unwrap_or_else(|| {
                warn!(
                    "无效的选课模式: '{}'，请检查 mode 字段是否为 fast、normal 或 snipe，将使用 snipe 模式",
                    external.mode
                );
                Policy::RoundSynchronized
            }),
        };

        let network = external.network;
        let base_url = normalize_base_url(
            network
                .base_url
                .as_deref()
                .unwrap_or(constants::DEFAULT_BASE_URL),
        )?;

        let endpoint = match external.captcha.endpoint.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(Url::parse(raw).map_err(|e| {
                AppError::Config(format!("验证码识别服务地址 '{}' 无效: {}", raw, e))
            })?),
            _ => None,
        };
        if external.captcha.solver == CaptchaSolverKind::OcrService && endpoint.is_none() {
            return Err(AppError::Config(
                "captcha.solver 为 ocr_service 时必须填写 captcha.endpoint".to_string(),
            ));
        }

        let defaults = Timings::default();
        let timings = Timings {
            backoff: external
                .timings
                .backoff_ms
                .map_or(defaults.backoff, Duration::from_millis),
            pace_interval: external
                .timings
                .pace_interval_ms
                .map_or(defaults.pace_interval, Duration::from_millis),
            round_interval: external
                .timings
                .round_interval_ms
                .map_or(defaults.round_interval, Duration::from_millis),
        };

        Ok(Self {
            account: external.user_account.trim().to_string(),
            password: external.user_password,
            semester: external.select_semester.trim().to_string(),
            policy,
            base_url,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(network.connect_timeout_secs.unwrap_or(10)),
            timeout: Duration::from_secs(network.timeout_secs.unwrap_or(30)),
            max_retries: network.max_retries.unwrap_or(3),
            captcha: CaptchaConfig {
                solver: external.captcha.solver,
                endpoint,
            },
            timings,
            dingtalk: webhook(&external.dingtalk_webhook, &external.dingtalk_secret),
            feishu: webhook(&external.feishu_webhook, &external.feishu_secret),
            courses,
        })
    }
}

#[cfg(any(test, feature = "testing"))]
impl AppConfig {
    /// 指向 `base_url`（通常是 mock 服务器）的最小配置，所有等待时间为 0。
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            account: "2021000001".to_string(),
            password: "secret".to_string(),
            semester: String::new(),
            policy: Policy::RoundSynchronized,
            base_url: normalize_base_url(base_url).expect("mock server url"),
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            captcha: CaptchaConfig {
                solver: CaptchaSolverKind::Prompt,
                endpoint: None,
            },
            timings: Timings {
                backoff: Duration::ZERO,
                pace_interval: Duration::ZERO,
                round_interval: Duration::ZERO,
            },
            dingtalk: None,
            feishu: None,
            courses: Vec::new(),
        }
    }
}

fn normalize_base_url(raw: &str) -> AppResult<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| AppError::Config(format!("教务系统地址 '{}' 无效: {}", raw, e)))
}

fn webhook(url: &str, secret: &str) -> Option<WebhookConfig> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let secret = secret.trim();
    Some(WebhookConfig {
        webhook: url.to_string(),
        secret: (!secret.is_empty()).then(|| secret.to_string()),
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn validate_course(entry: &CourseEntry) -> AppResult<CourseRequest> {
    let (Some(course), Some(teacher)) =
        (non_empty(&entry.course_id_or_name), non_empty(&entry.teacher_name))
    else {
        return Err(AppError::Config(
            "每个课程配置必须包含 course_id_or_name 和 teacher_name".to_string(),
        ));
    };
    let label = format!("【{}-{}】", course, teacher);

    let weekday = match non_empty(&entry.week_day) {
        Some(day) => match day.parse::<u8>() {
            Ok(n @ 1..=7) => Some(n),
            _ => {
                return Err(AppError::Config(format!(
                    "课程{}的 week_day 格式错误: 必须是 1-7 之间的数字",
                    label
                )));
            }
        },
        None => None,
    };

    let weeks = match non_empty(&entry.weeks) {
        Some(pattern) => {
            let set = WeekSet::parse(pattern)
                .map_err(|e| AppError::Config(format!("课程{}的 weeks 格式错误: {}", label, e)))?;
            Some(set)
        }
        None => None,
    };

    let pinned = match (non_empty(&entry.jx02id), non_empty(&entry.jx0404id)) {
        (Some(channel_id), Some(offering_id)) => Some(CourseIds {
            channel_id: channel_id.to_string(),
            offering_id: offering_id.to_string(),
        }),
        (None, None) => None,
        _ => {
            return Err(AppError::Config(format!(
                "课程{}的 jx02id 与 jx0404id 必须同时填写或同时留空",
                label
            )));
        }
    };

    Ok(CourseRequest {
        course: course.to_string(),
        teacher: teacher.to_string(),
        weekday,
        periods: non_empty(&entry.class_period).map(str::to_string),
        weeks,
        pinned,
    })
}
