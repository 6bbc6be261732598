// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod enroll;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod portal;
pub mod schedule;
pub mod session;
pub mod ui;

use crate::{
    cli::Cli,
    config::AppConfig,
    enroll::Scheduler,
    error::AppResult,
    notify::NotificationGateway,
    session::{CaptchaSolver, SessionManager},
};
use colored::*;
use log::{debug, info};
use std::sync::{Arc, atomic::AtomicBool};

/// 调度器及各组件共享的运行上下文
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub notifier: NotificationGateway,
    pub cancellation_token: Arc<AtomicBool>,
}

impl AppContext {
    /// 按配置创建验证码识别与通知组件。
    pub fn new(config: Arc<AppConfig>, cancellation_token: Arc<AtomicBool>) -> AppResult<Self> {
        let solver = session::solver_from_config(&config)?;
        let notifier = NotificationGateway::from_config(&config)?;
        Ok(Self::with_collaborators(
            config,
            solver,
            notifier,
            cancellation_token,
        ))
    }

    pub fn with_collaborators(
        config: Arc<AppConfig>,
        solver: Arc<dyn CaptchaSolver>,
        notifier: NotificationGateway,
        cancellation_token: Arc<AtomicBool>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(Arc::clone(&config), solver));
        Self {
            config,
            sessions,
            notifier,
            cancellation_token,
        }
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    ui::print_header(&format!("曲阜师范大学教务系统抢课工具 v{}", env!("CARGO_PKG_VERSION")));
    ui::box_message(
        "免责声明",
        constants::DISCLAIMER
            .trim()
            .lines()
            .collect::<Vec<_>>()
            .as_slice(),
        |s| s.yellow(),
    );

    let config = Arc::new(AppConfig::load(&args.config, args.mode)?);
    info!("成功获取配置文件, 用户名: {}", config.account);
    println!(
        "\n{} 账号: {} | 模式: {} | 课程: {} 门 (按 {} 可随时停止)",
        *ui::INFO,
        config.account,
        config.policy.label(),
        config.courses.len(),
        *ui::CTRL_C
    );

    let context = AppContext::new(config, cancellation_token)?;
    if context.notifier.is_empty() {
        println!("{} 未配置钉钉或飞书机器人，选课结果只输出到终端和日志", *ui::WARN);
    }
    let mut scheduler = Scheduler::new(context);
    scheduler.run().await?;

    let status = scheduler.status();
    ui::print_header("选课完成");
    println!(
        "{}",
        format!("已成功选上 {}/{} 门课程", status.satisfied_count(), status.len()).green()
    );
    Ok(())
}
