// src/cli.rs

use crate::constants;
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志文件的输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// 选课循环的运行策略
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    /// 高速模式：不间断地逐门尝试
    #[value(name = "fast", alias = "continuous")]
    Continuous,
    /// 普通模式：每门课之间等待
    #[value(name = "normal", alias = "paced")]
    Paced,
    /// 截胡模式：每轮先刷新选课轮次
    #[value(name = "snipe", alias = "round-synchronized")]
    RoundSynchronized,
}

impl Policy {
    /// 按配置文件中的名称解析；无法识别时返回 `None`，由调用方决定回退策略。
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "fast" | "continuous" => Some(Policy::Continuous),
            "normal" | "paced" => Some(Policy::Paced),
            "snipe" | "round-synchronized" => Some(Policy::RoundSynchronized),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Policy::Continuous => "高速模式",
            Policy::Paced => "普通模式",
            Policy::RoundSynchronized => "截胡模式",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    /// 配置文件路径 (不存在时会生成模板)
    #[arg(short, long, value_name = "FILE", default_value_os_t = PathBuf::from(constants::DEFAULT_CONFIG_FILE), help_heading = "Options")]
    pub config: PathBuf,
    /// 覆盖配置文件中的选课模式: fast, normal, snipe
    #[arg(short, long, value_enum, help_heading = "Options")]
    pub mode: Option<Policy>,
    /// 设置日志文件的输出级别
    #[arg(long, value_enum, default_value_t = LogLevel::Debug, help_heading = "Options")]
    pub log_level: LogLevel,

    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
}
