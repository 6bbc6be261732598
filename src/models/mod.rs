// src/models/mod.rs

pub mod api;

use crate::schedule::WeekSet;
use std::{collections::HashMap, fmt};

/// 选课后端识别课程所需的一对内部编号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseIds {
    /// 课程在培养方案中的编号 (jx02id)，提交时作为 `kcid`
    pub channel_id: String,
    /// 具体开课班级的编号 (jx0404id)
    pub offering_id: String,
}

/// 用户在配置文件中描述的一门待抢课程，加载后不再变化。
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRequest {
    pub course: String,
    pub teacher: String,
    pub weekday: Option<u8>,
    pub periods: Option<String>,
    pub weeks: Option<WeekSet>,
    pub pinned: Option<CourseIds>,
}

impl CourseRequest {
    pub fn new(course: &str, teacher: &str) -> Self {
        Self {
            course: course.to_string(),
            teacher: teacher.to_string(),
            weekday: None,
            periods: None,
            weeks: None,
            pinned: None,
        }
    }

    /// 状态跟踪使用的键；相同课程与教师的重复条目不作区分。
    pub fn key(&self) -> String {
        format!("{}-{}", self.course, self.teacher)
    }
}

impl fmt::Display for CourseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "【{}-{}】", self.course, self.teacher)
    }
}

/// 一次选课提交的结果。`SessionInvalid` 必须触发重新登录，而不是当作普通失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionResult {
    Success,
    Rejected(String),
    SessionInvalid(String),
}

/// 每门课程是否已经选上，只由调度器在收到 `Success` 后修改。
#[derive(Debug, Default, Clone)]
pub struct RequestStatus {
    satisfied: HashMap<String, bool>,
}

impl RequestStatus {
    pub fn new(requests: &[CourseRequest]) -> Self {
        Self {
            satisfied: requests.iter().map(|r| (r.key(), false)).collect(),
        }
    }

    pub fn mark_satisfied(&mut self, request: &CourseRequest) {
        self.satisfied.insert(request.key(), true);
    }

    pub fn is_satisfied(&self, request: &CourseRequest) -> bool {
        self.satisfied.get(&request.key()).copied().unwrap_or(false)
    }

    pub fn all_satisfied(&self) -> bool {
        self.satisfied.values().all(|done| *done)
    }

    pub fn satisfied_count(&self) -> usize {
        self.satisfied.values().filter(|done| **done).count()
    }

    pub fn len(&self) -> usize {
        self.satisfied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satisfied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tracks_by_course_and_teacher() {
        let a = CourseRequest::new("530009", "李大新");
        let b = CourseRequest::new("530009", "王小明");
        let duplicate = CourseRequest::new("530009", "李大新");
        let mut status = RequestStatus::new(&[a.clone(), b.clone(), duplicate.clone()]);

        assert_eq!(status.len(), 2);
        assert!(!status.all_satisfied());

        status.mark_satisfied(&a);
        assert!(status.is_satisfied(&duplicate));
        assert!(!status.is_satisfied(&b));
        assert_eq!(status.satisfied_count(), 1);

        status.mark_satisfied(&b);
        assert!(status.all_satisfied());
    }

    #[test]
    fn test_request_display() {
        let request = CourseRequest::new("高等数学", "张老师");
        assert_eq!(request.to_string(), "【高等数学-张老师】");
        assert_eq!(request.key(), "高等数学-张老师");
    }
}
