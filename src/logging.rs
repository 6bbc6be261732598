// src/logging.rs

use crate::{cli::LogLevel, constants};
use fern::colors::{Color, ColoredLevelConfig};
use std::path::PathBuf;

/// 控制台只输出 info 及以上，日志文件按 `--log-level` 记录全部细节。
pub fn init_logger(level: LogLevel) {
    let colors = ColoredLevelConfig::new()
        .debug(Color::Cyan)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    let console = fern::Dispatch::new()
        .level(log::LevelFilter::Info)
        .format(move |out, message, record| {
            out.finish(format_args!("{}: {}", colors.color(record.level()), message))
        })
        .chain(std::io::stdout());

    let mut root = fern::Dispatch::new()
        .level(log::LevelFilter::Trace)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("html5ever", log::LevelFilter::Warn)
        .level_for("selectors", log::LevelFilter::Warn)
        .chain(console);

    if level != LogLevel::Off {
        match open_log_file() {
            Ok((path, file)) => {
                root = root.chain(
                    fern::Dispatch::new()
                        .level(level.into())
                        .format(|out, message, record| {
                            out.finish(format_args!(
                                "[{}] [{:<5}] [{}:{}] - {}",
                                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                                record.level(),
                                record.target(),
                                record.line().unwrap_or(0),
                                message
                            ))
                        })
                        .chain(file),
                );
                eprintln!("日志文件: {}", path.display());
            }
            Err(e) => eprintln!("警告: 无法创建日志文件，日志将只输出到控制台: {}", e),
        }
    }

    if let Err(e) = root.apply() {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}

fn open_log_file() -> std::io::Result<(PathBuf, std::fs::File)> {
    let dir = PathBuf::from(constants::LOG_DIR_NAME);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!(
        "app_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = fern::log_file(&path)?;
    Ok((path, file))
}
