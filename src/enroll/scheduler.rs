// src/enroll/scheduler.rs

use super::acquire_course;
use crate::{
    AppContext,
    cli::Policy,
    client::PortalClient,
    error::*,
    models::{AcquisitionResult, CourseRequest, RequestStatus},
    portal::{self, EnrollmentChannel, round},
    ui,
};
use log::{debug, error, info, warn};
use std::{
    fmt,
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

/// 调度器所处的阶段。任一阶段出错都会回到登录阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    Navigate,
    ResolveRound,
    EnrollLoop,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Login => "登录",
            Stage::Navigate => "页面导航",
            Stage::ResolveRound => "获取选课轮次",
            Stage::EnrollLoop => "选课",
        };
        f.write_str(name)
    }
}

/// 驱动整个选课流程，直到所有课程都已选上或被用户中断。
pub struct Scheduler {
    context: AppContext,
    status: RequestStatus,
    stage: Stage,
}

impl Scheduler {
    pub fn new(context: AppContext) -> Self {
        let status = RequestStatus::new(&context.config.courses);
        Self {
            context,
            status,
            stage: Stage::Login,
        }
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub async fn run(&mut self) -> AppResult<()> {
        info!(
            "开始选课，模式: {}，共 {} 门课程",
            self.context.config.policy.label(),
            self.status.len()
        );
        loop {
            self.check_cancelled()?;
            match self.run_cycle().await {
                Ok(()) => {
                    info!("所有课程已选择成功，程序即将退出...");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("{}阶段发生错误: {}，正在重新登录...", self.stage, e);
                    self.context.sessions.invalidate().await;
                    self.stage = Stage::Login;
                    self.pause(self.context.config.timings.backoff).await?;
                }
            }
        }
    }

    fn enter(&mut self, stage: Stage) {
        debug!("进入{}阶段", stage);
        self.stage = stage;
    }

    fn check_cancelled(&self) -> AppResult<()> {
        if self.context.cancellation_token.load(Ordering::Relaxed) {
            return Err(AppError::UserInterrupt);
        }
        Ok(())
    }

    async fn pause(&self, duration: Duration) -> AppResult<()> {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        self.check_cancelled()
    }

    /// 登录 → 导航 → 获取轮次 → 选课循环。只有全部课程选上才返回 `Ok`。
    async fn run_cycle(&mut self) -> AppResult<()> {
        self.enter(Stage::Login);
        let client = self.context.sessions.ensure_authenticated().await?;
        self.check_cancelled()?;

        self.enter(Stage::Navigate);
        round::navigate(&client).await?;

        self.enter(Stage::ResolveRound);
        let round_id = round::resolve_round(&client, &self.context.config.semester)
            .await?
            .ok_or(AppError::RoundUnavailable)?;
        round::enter_round(&client, &round_id).await?;

        self.enter(Stage::EnrollLoop);
        let channels = portal::standard_channels(Arc::clone(&client));
        let timings = self.context.config.timings;
        match self.context.config.policy {
            Policy::Continuous => self.run_passes(&channels, Duration::ZERO).await,
            Policy::Paced => self.run_passes(&channels, timings.pace_interval).await,
            Policy::RoundSynchronized => self.run_rounds(&client, &channels).await,
        }
    }

    fn pending(&self) -> Vec<CourseRequest> {
        self.context
            .config
            .courses
            .iter()
            .filter(|request| !self.status.is_satisfied(request))
            .cloned()
            .collect()
    }

    /// 处理一门课程；会话失效转换为错误，交给外层重新登录。
    async fn attempt(
        &mut self,
        channels: &[Box<dyn EnrollmentChannel>],
        request: &CourseRequest,
    ) -> AppResult<()> {
        // 重复配置的课程可能已在本轮中选上
        if self.status.is_satisfied(request) {
            return Ok(());
        }
        match acquire_course(channels, &self.context.notifier, request).await? {
            AcquisitionResult::Success => {
                self.status.mark_satisfied(request);
                ui::print_progress(request, self.status.satisfied_count(), self.status.len());
            }
            AcquisitionResult::Rejected(_) => info!("课程 {} 选课操作结束", request),
            AcquisitionResult::SessionInvalid(message) => {
                return Err(AppError::SessionExpired(message));
            }
        }
        Ok(())
    }

    /// 高速与普通模式：逐门尝试，一轮结束后立即开始下一轮。
    async fn run_passes(
        &mut self,
        channels: &[Box<dyn EnrollmentChannel>],
        interval: Duration,
    ) -> AppResult<()> {
        loop {
            for request in self.pending() {
                if self.status.all_satisfied() {
                    return Ok(());
                }
                self.check_cancelled()?;
                self.attempt(channels, &request).await?;
                if !interval.is_zero() && !self.status.all_satisfied() {
                    info!(
                        "课程 {} 选课操作结束，等待 {} 秒后继续选下一门课",
                        request,
                        interval.as_secs_f32()
                    );
                    self.pause(interval).await?;
                }
            }
            if self.status.all_satisfied() {
                return Ok(());
            }
        }
    }

    /// 截胡模式：每轮开始前刷新并进入选课轮次。
    async fn run_rounds(
        &mut self,
        client: &PortalClient,
        channels: &[Box<dyn EnrollmentChannel>],
    ) -> AppResult<()> {
        let timings = self.context.config.timings;
        loop {
            self.check_cancelled()?;
            if self.status.all_satisfied() {
                return Ok(());
            }

            let Some(round_id) = round::resolve_round(client, &self.context.config.semester).await?
            else {
                warn!("获取选课轮次失败，稍后重试...若持续失败，可能是账号被踢，请重新运行程序");
                self.pause(timings.backoff).await?;
                continue;
            };
            round::enter_round(client, &round_id).await?;

            for request in self.pending() {
                self.check_cancelled()?;
                self.attempt(channels, &request).await?;
            }

            if self.status.all_satisfied() {
                return Ok(());
            }
            info!(
                "本轮选课操作完成，{} 秒后开始新一轮选课...",
                timings.round_interval.as_secs_f32()
            );
            self.pause(timings.round_interval).await?;
        }
    }
}
