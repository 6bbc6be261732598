// src/enroll/resolver.rs

use crate::{
    constants,
    error::*,
    models::{CourseIds, CourseRequest, api::CourseCandidate},
    portal::EnrollmentChannel,
    schedule,
};
use log::{debug, info, warn};

/// 在一个通道的检索结果中选出要提交的课程。
///
/// 只有一条结果时直接采用；否则按顺序要求课程号与教师完全一致，且配置的周次
/// 是该课程上课周次的子集。上课时间中没有周次信息时不检查周次。
pub fn select_candidate(request: &CourseRequest, candidates: &[CourseCandidate]) -> Option<CourseIds> {
    if let [only] = candidates {
        if let Some(ids) = only.ids() {
            info!(
                "仅有一条检索结果，直接匹配课程 {} 的 jx02id: {} 和 jx0404id: {}",
                request, ids.channel_id, ids.offering_id
            );
            return Some(ids);
        }
    }

    for candidate in candidates {
        if candidate.kch.as_deref() != Some(request.course.as_str())
            || candidate.skls.as_deref() != Some(request.teacher.as_str())
        {
            continue;
        }
        if !weeks_covered(request, candidate) {
            debug!(
                "课程 {} 的上课周次不满足要求 {}: {}",
                request,
                request.weeks.as_ref().map(ToString::to_string).unwrap_or_default(),
                candidate.schedule()
            );
            continue;
        }
        if let Some(ids) = candidate.ids() {
            info!(
                "找到课程 {} 的 jx02id: {} 和 jx0404id: {}",
                request, ids.channel_id, ids.offering_id
            );
            return Some(ids);
        }
    }
    None
}

fn weeks_covered(request: &CourseRequest, candidate: &CourseCandidate) -> bool {
    let Some(wanted) = &request.weeks else {
        return true;
    };
    match schedule::covered_weeks(candidate.schedule()) {
        Ok(Some(actual)) => wanted.is_subset(&actual),
        Ok(None) => true,
        Err(e) => {
            warn!("无法解析上课时间 '{}': {}", candidate.schedule(), e);
            false
        }
    }
}

/// 同一通道遇到 404 时重试，其他结果直接返回。
async fn query_with_retry(
    channel: &dyn EnrollmentChannel,
    request: &CourseRequest,
) -> AppResult<Vec<CourseCandidate>> {
    let mut attempt = 1;
    loop {
        match channel.query(request).await {
            Err(e) if e.is_not_found() && attempt < constants::MAX_CHANNEL_QUERY_ATTEMPTS => {
                warn!("{}返回 404，正在进行第 {} 次尝试", channel.label(), attempt + 1);
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// 按优先级在各通道中检索课程，返回第一个匹配的编号对。
///
/// 所有通道都没有匹配时返回 `Ok(None)`；404 以外的网络错误直接返回。
pub async fn resolve_slot(
    channels: &[Box<dyn EnrollmentChannel>],
    request: &CourseRequest,
) -> AppResult<Option<CourseIds>> {
    info!("开始检索课程: {}", request);
    for channel in channels {
        let candidates = match query_with_retry(channel.as_ref(), request).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_not_found() => {
                warn!("{}多次返回 404，跳过该通道", channel.label());
                continue;
            }
            Err(AppError::ApiParseFailed { url, source }) => {
                warn!("{}返回了无法解析的数据 ({}): {}", channel.label(), url, source);
                continue;
            }
            Err(e) => return Err(e),
        };

        if candidates.is_empty() {
            debug!("{}中没有 {} 的检索结果，可能该课程不在该分类", channel.label(), request);
            continue;
        }
        if let Some(ids) = select_candidate(request, &candidates) {
            return Ok(Some(ids));
        }
        debug!("{}的 {} 条检索结果均不匹配", channel.label(), candidates.len());
    }
    warn!("未找到课程 {} 的匹配数据", request);
    Ok(None)
}
