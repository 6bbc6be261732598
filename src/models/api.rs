// src/models/api.rs

use super::CourseIds;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 教务系统有时把编号返回成数字，有时是字符串；这里统一成字符串。
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// --- 课程检索 (xsxk*) 响应结构体 ---

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChannelQueryResponse {
    #[serde(rename = "aaData", default)]
    pub aa_data: Option<Vec<CourseCandidate>>,
}

/// 检索结果中的一行，只在一次课程解析过程中存在。
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CourseCandidate {
    /// 课程号
    #[serde(default, deserialize_with = "lenient_string")]
    pub kch: Option<String>,
    /// 课程名称
    #[serde(default, deserialize_with = "lenient_string")]
    pub kcmc: Option<String>,
    /// 授课教师
    #[serde(default, deserialize_with = "lenient_string")]
    pub skls: Option<String>,
    /// 上课时间，如 "1-16周 星期三 3-4节"
    #[serde(default, deserialize_with = "lenient_string")]
    pub sksj: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub jx02id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub jx0404id: Option<String>,
}

impl CourseCandidate {
    pub fn ids(&self) -> Option<CourseIds> {
        match (self.jx02id.as_deref(), self.jx0404id.as_deref()) {
            (Some(channel_id), Some(offering_id))
                if !channel_id.is_empty() && !offering_id.is_empty() =>
            {
                Some(CourseIds {
                    channel_id: channel_id.to_string(),
                    offering_id: offering_id.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn schedule(&self) -> &str {
        self.sksj.as_deref().unwrap_or_default()
    }
}
