// src/enroll/submit.rs

use crate::{
    models::{AcquisitionResult, CourseIds, CourseRequest},
    portal::EnrollmentChannel,
};
use log::{error, info, warn};

/// 一次提交的汇总：最终结果与各通道的失败原因。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub result: AcquisitionResult,
    pub failures: Vec<String>,
}

/// 按优先级依次向各通道提交选课。
///
/// 成功或会话失效时立即返回；被拒绝或请求出错时继续尝试下一个通道。
pub async fn submit_to_channels(
    channels: &[Box<dyn EnrollmentChannel>],
    request: &CourseRequest,
    ids: &CourseIds,
) -> SubmissionReport {
    let mut failures = Vec::new();
    for channel in channels {
        info!("正在通过{}提交课程 {}", channel.label(), request);
        match channel.submit(ids).await {
            Ok(AcquisitionResult::Success) => {
                info!("课程 {} 通过{}选课成功", request, channel.label());
                return SubmissionReport {
                    result: AcquisitionResult::Success,
                    failures,
                };
            }
            Ok(AcquisitionResult::SessionInvalid(message)) => {
                warn!("提交课程 {} 时登录状态失效: {}", request, message);
                failures.push(format!("【{}】发生异常: {}", channel.label(), message));
                return SubmissionReport {
                    result: AcquisitionResult::SessionInvalid(message),
                    failures,
                };
            }
            Ok(AcquisitionResult::Rejected(message)) => {
                warn!("课程 {} 的{}失败: {}", request, channel.label(), message);
                failures.push(format!("【{}】失败: {}", channel.label(), message));
            }
            Err(e) => {
                error!("发送课程 {} 的{}请求失败: {}", request, channel.label(), e);
                failures.push(format!("【{}】发生异常: {}", channel.label(), e));
            }
        }
    }
    SubmissionReport {
        result: AcquisitionResult::Rejected(failures.join("\n\n")),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, AppResult},
        models::api::CourseCandidate,
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy)]
    enum Script {
        Accept,
        Reject(&'static str),
        Expire(&'static str),
        Fail,
    }

    struct ScriptedChannel {
        label: &'static str,
        script: Script,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl EnrollmentChannel for ScriptedChannel {
        fn label(&self) -> &str {
            self.label
        }

        async fn query(&self, _request: &CourseRequest) -> AppResult<Vec<CourseCandidate>> {
            Ok(Vec::new())
        }

        async fn submit(&self, _ids: &CourseIds) -> AppResult<AcquisitionResult> {
            self.calls.lock().unwrap().push(self.label);
            match self.script {
                Script::Accept => Ok(AcquisitionResult::Success),
                Script::Reject(msg) => Ok(AcquisitionResult::Rejected(msg.into())),
                Script::Expire(msg) => Ok(AcquisitionResult::SessionInvalid(msg.into())),
                Script::Fail => Err(AppError::RoundUnavailable),
            }
        }
    }

    fn channels(
        scripts: &[(&'static str, Script)],
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Vec<Box<dyn EnrollmentChannel>> {
        scripts
            .iter()
            .map(|&(label, script)| {
                Box::new(ScriptedChannel {
                    label,
                    script,
                    calls: Arc::clone(calls),
                }) as Box<dyn EnrollmentChannel>
            })
            .collect()
    }

    fn ids() -> CourseIds {
        CourseIds {
            channel_id: "A1".into(),
            offering_id: "2024".into(),
        }
    }

    #[tokio::test]
    async fn test_session_invalid_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let channels = channels(
            &[
                ("通道一", Script::Expire("请先登录")),
                ("通道二", Script::Accept),
            ],
            &calls,
        );
        let report =
            submit_to_channels(&channels, &CourseRequest::new("530009", "李大新"), &ids()).await;
        assert_eq!(report.result, AcquisitionResult::SessionInvalid("请先登录".into()));
        assert_eq!(*calls.lock().unwrap(), vec!["通道一"]);
    }

    #[tokio::test]
    async fn test_rejections_and_errors_fall_through() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let channels = channels(
            &[
                ("通道一", Script::Reject("人数已满")),
                ("通道二", Script::Fail),
                ("通道三", Script::Accept),
                ("通道四", Script::Accept),
            ],
            &calls,
        );
        let report =
            submit_to_channels(&channels, &CourseRequest::new("530009", "李大新"), &ids()).await;
        assert_eq!(report.result, AcquisitionResult::Success);
        assert_eq!(*calls.lock().unwrap(), vec!["通道一", "通道二", "通道三"]);
        assert_eq!(
            report.failures,
            vec![
                "【通道一】失败: 人数已满".to_string(),
                "【通道二】发生异常: 未能获取选课轮次".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_all_channels_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let channels = channels(
            &[
                ("通道一", Script::Reject("冲突")),
                ("通道二", Script::Reject("已满")),
            ],
            &calls,
        );
        let report =
            submit_to_channels(&channels, &CourseRequest::new("530009", "李大新"), &ids()).await;
        assert_eq!(
            report.result,
            AcquisitionResult::Rejected("【通道一】失败: 冲突\n\n【通道二】失败: 已满".into())
        );
        assert_eq!(report.failures.len(), 2);
    }
}
