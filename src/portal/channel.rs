// src/portal/channel.rs

use crate::{
    client::PortalClient,
    constants::{self, portal},
    error::*,
    models::{
        AcquisitionResult, CourseIds, CourseRequest,
        api::{ChannelQueryResponse, CourseCandidate},
    },
};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// 一个选课通道：检索课程并提交选课。解析与提交按同一优先级顺序遍历。
#[async_trait]
pub trait EnrollmentChannel: Send + Sync {
    fn label(&self) -> &str;

    async fn query(&self, request: &CourseRequest) -> AppResult<Vec<CourseCandidate>>;

    async fn submit(&self, ids: &CourseIds) -> AppResult<AcquisitionResult>;
}

/// 通道的静态描述：各页面名称与检索表单的列定义。
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub enter: &'static str,
    pub query: &'static str,
    pub submit: &'static str,
    pub columns: &'static [&'static str],
    /// 表单中声明的列数，部分通道与实际列定义数量不一致
    pub column_count: usize,
    /// 公选课检索额外需要 `szjylb` 参数
    pub elective_filter: bool,
}

const PLAN_COLUMNS: &[&str] = &[
    "kch", "kcmc", "fzmc", "ktmc", "xf", "skls", "sksj", "skdd", "xqmc", "ctsm", "czOper",
];
const GENERAL_ELECTIVE_COLUMNS: &[&str] = &[
    "kch", "kcmc", "xf", "skls", "sksj", "skdd", "xqmc", "xxrs", "xkrs", "syrs", "ctsm",
    "szkcflmc", "czOper",
];

/// 按优先级排列的全部选课通道。
pub const STANDARD_CHANNELS: [ChannelSpec; 5] = [
    ChannelSpec {
        key: "knjxk",
        label: "专业内跨年级选课",
        enter: "comeInKnjxk",
        query: "xsxkKnjxk",
        submit: "knjxkOper",
        columns: PLAN_COLUMNS,
        column_count: 12,
        elective_filter: false,
    },
    ChannelSpec {
        key: "bxqjhxk",
        label: "本学期计划选课",
        enter: "comeInBxqjhxk",
        query: "xsxkBxqjhxk",
        submit: "bxqjhxkOper",
        columns: PLAN_COLUMNS,
        column_count: 12,
        elective_filter: false,
    },
    ChannelSpec {
        key: "ggxxkxk",
        label: "公选课选课",
        enter: "comeInGgxxkxk",
        query: "xsxkGgxxkxk",
        submit: "ggxxkxkOper",
        columns: GENERAL_ELECTIVE_COLUMNS,
        column_count: 13,
        elective_filter: true,
    },
    ChannelSpec {
        key: "xxxk",
        label: "选修选课",
        enter: "comeInXxxk",
        query: "xsxkXxxk",
        submit: "xxxkOper",
        columns: PLAN_COLUMNS,
        column_count: 11,
        elective_filter: false,
    },
    ChannelSpec {
        key: "fawxk",
        label: "计划外选课",
        enter: "comeInFawxk",
        query: "xsxkFawxk",
        submit: "fawxkOper",
        columns: PLAN_COLUMNS,
        column_count: 12,
        elective_filter: false,
    },
];

impl ChannelSpec {
    fn path(&self, page: &str) -> String {
        format!("{}{}", portal::CHANNEL_PREFIX, page)
    }

    pub fn enter_path(&self) -> String {
        self.path(self.enter)
    }

    pub fn query_path(&self) -> String {
        self.path(self.query)
    }

    pub fn submit_path(&self) -> String {
        self.path(self.submit)
    }

    /// 检索接口的查询参数；未填写的星期、节次以空字符串发送。
    pub fn query_params(&self, request: &CourseRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("kcxx", request.course.clone()),
            ("skls", request.teacher.clone()),
            ("skxq", request.weekday.map(|d| d.to_string()).unwrap_or_default()),
            ("skjc", request.periods.clone().unwrap_or_default()),
        ];
        if self.elective_filter {
            params.push(("szjylb", String::new()));
        }
        params.extend([
            ("sfym", "false".to_string()),
            ("sfct", "true".to_string()),
            ("sfxx", "true".to_string()),
        ]);
        params
    }

    /// DataTables 风格的分页表单。
    pub fn query_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("sEcho".to_string(), "1".to_string()),
            ("iColumns".to_string(), self.column_count.to_string()),
            ("sColumns".to_string(), String::new()),
            ("iDisplayStart".to_string(), "0".to_string()),
            ("iDisplayLength".to_string(), constants::QUERY_PAGE_SIZE.to_string()),
        ];
        form.extend(
            self.columns
                .iter()
                .enumerate()
                .map(|(i, column)| (format!("mDataProp_{}", i), column.to_string())),
        );
        form
    }
}

/// 解析选课接口的返回。
///
/// 存在 `flag1` 时只看它：会话失效代码返回 `SessionInvalid`，成功代码返回 `Success`，
/// 其余值整个响应作为失败原因。没有 `flag1` 时看 `success` 字段（布尔或布尔数组，
/// 数组要求全部为真）；都没有时整个响应作为失败原因。
pub fn classify_submit_response(body: &str) -> AcquisitionResult {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return AcquisitionResult::Rejected(body.trim().to_string());
    };

    if let Some(flag) = value.get("flag1") {
        let code = match flag {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        return match code {
            Some(portal::flag1::SESSION_EXPIRED) => {
                let message = value
                    .get("msgContent")
                    .and_then(Value::as_str)
                    .unwrap_or("未知原因");
                AcquisitionResult::SessionInvalid(message.to_string())
            }
            Some(portal::flag1::ACCEPTED) => AcquisitionResult::Success,
            // 其他 flag1 不再参考 success 字段
            _ => AcquisitionResult::Rejected(body.trim().to_string()),
        };
    }

    let accepted = match value.get("success") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => items.iter().all(|item| item.as_bool() == Some(true)),
        _ => return AcquisitionResult::Rejected(body.trim().to_string()),
    };
    if accepted {
        AcquisitionResult::Success
    } else {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("未知原因");
        AcquisitionResult::Rejected(message.to_string())
    }
}

/// 基于 HTTP 的选课通道实现。
pub struct PortalChannel {
    spec: ChannelSpec,
    client: Arc<PortalClient>,
}

impl PortalChannel {
    pub fn new(spec: ChannelSpec, client: Arc<PortalClient>) -> Self {
        Self { spec, client }
    }
}

#[async_trait]
impl EnrollmentChannel for PortalChannel {
    fn label(&self) -> &str {
        self.spec.label
    }

    async fn query(&self, request: &CourseRequest) -> AppResult<Vec<CourseCandidate>> {
        self.client.get_text(&self.spec.enter_path()).await?;
        debug!("已进入{}页面", self.spec.label);

        let query_path = self.spec.query_path();
        let builder = self
            .client
            .post(&query_path)?
            .query(&self.spec.query_params(request))
            .form(&self.spec.query_form());
        let builder = self.client.xhr(builder, &self.spec.enter_path())?;
        let body = self.client.send_text(builder).await?;

        let response: ChannelQueryResponse =
            serde_json::from_str(&body).map_err(|e| AppError::ApiParseFailed {
                url: self.client.url(&query_path).map_or(query_path.clone(), |u| u.to_string()),
                source: e,
            })?;
        let candidates = response.aa_data.unwrap_or_default();
        if candidates.is_empty() {
            debug!("{}没有返回 {} 的检索结果", self.spec.label, request);
        }
        Ok(candidates)
    }

    async fn submit(&self, ids: &CourseIds) -> AppResult<AcquisitionResult> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let params = [
            ("kcid", ids.channel_id.as_str()),
            ("cfbs", "null"),
            ("jx0404id", ids.offering_id.as_str()),
            ("xkzy", ""),
            ("trjf", ""),
            ("_", timestamp.as_str()),
        ];
        let builder = self.client.get(&self.spec.submit_path())?.query(&params);
        let builder = self.client.xhr(builder, &self.spec.enter_path())?;
        let body = self.client.send_text(builder).await?;

        let result = classify_submit_response(&body);
        match &result {
            AcquisitionResult::Success => info!("{}提交成功", self.spec.label),
            AcquisitionResult::Rejected(msg) => warn!("{}提交失败: {}", self.spec.label, msg),
            AcquisitionResult::SessionInvalid(msg) => warn!("登录状态异常: {}", msg),
        }
        Ok(result)
    }
}

/// 为当前会话创建全部选课通道，顺序即优先级。
pub fn standard_channels(client: Arc<PortalClient>) -> Vec<Box<dyn EnrollmentChannel>> {
    STANDARD_CHANNELS
        .iter()
        .map(|spec| {
            Box::new(PortalChannel::new(*spec, Arc::clone(&client))) as Box<dyn EnrollmentChannel>
        })
        .collect()
}
