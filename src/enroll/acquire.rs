// src/enroll/acquire.rs

use super::{resolver, submit};
use crate::{
    error::*,
    models::{AcquisitionResult, CourseRequest},
    notify::NotificationGateway,
    portal::EnrollmentChannel,
};
use log::{info, warn};

/// 完成一门课程的检索与提交，并推送结果。
///
/// 配置中已填写编号时跳过检索。会话失效原样返回给调度器，不推送通知；
/// 检索过程中的网络错误以 `Err` 返回。
pub async fn acquire_course(
    channels: &[Box<dyn EnrollmentChannel>],
    notifier: &NotificationGateway,
    request: &CourseRequest,
) -> AppResult<AcquisitionResult> {
    let ids = match &request.pinned {
        Some(ids) => {
            info!("课程 {} 已手动配置 jx02id 和 jx0404id，跳过检索直接选课", request);
            ids.clone()
        }
        None => match resolver::resolve_slot(channels, request).await? {
            Some(ids) => ids,
            None => {
                warn!("未找到课程 {} 的可选班级，等待下一轮", request);
                return Ok(AcquisitionResult::Rejected("未找到匹配的课程".to_string()));
            }
        },
    };

    let report = submit::submit_to_channels(channels, request, &ids).await;
    match &report.result {
        AcquisitionResult::Success => {
            notifier.course_selected(request).await;
        }
        AcquisitionResult::Rejected(_) => {
            notifier.course_failed(request, &report.failures).await;
        }
        AcquisitionResult::SessionInvalid(_) => {}
    }
    Ok(report.result)
}
