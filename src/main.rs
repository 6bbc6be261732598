// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use log::{error, info, warn};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use xk_sniper::{cli::Cli, error::AppError, logging::init_logger, run_from_cli, ui};

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let after_help = format!(
        "示例:\n  # 使用当前目录下的 config.json (不存在时会生成模板)\n  {bin}\n\n  # 指定配置文件并使用高速模式\n  {bin} -c my_config.json --mode fast\n\n  # 在日志文件中记录完整的请求细节\n  {bin} --log-level trace",
        bin = clap::crate_name!()
    );
    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };
    init_logger(args.log_level);

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let handler_token = cancellation_token.clone();

    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("无法监听 Ctrl-C 信号: {}", e);
                return;
            }
            if handler_token.load(Ordering::Relaxed) {
                println!("\n第二次中断，强制退出...");
                warn!("用户第二次按下 Ctrl+C，强制退出。");
                std::process::exit(130);
            }
            println!(
                "\n{} 正在停止... 请等待当前请求完成。再按一次 {} 可强制退出。",
                *ui::WARN,
                *ui::CTRL_C
            );
            warn!("用户通过 Ctrl+C 请求中断程序。");
            handler_token.store(true, Ordering::Relaxed);
        }
    });

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        match e {
            AppError::UserInterrupt => {
                warn!("程序被用户中断。");
                std::process::exit(130);
            }
            AppError::BadCredentials => {
                error!("程序因账号或密码错误而退出: {}", e);
                eprintln!("\n{} {}", *ui::ERROR, e.to_string().red());
                eprintln!("{} 请检查配置文件中的 user_account 和 user_password。", *ui::INFO);
                std::process::exit(1);
            }
            _ => {
                error!("程序执行出错: {}", e);
                eprintln!("\n{} {}", *ui::ERROR, format!("程序执行出错: {}", e).red());
                std::process::exit(1);
            }
        }
    }
    info!("程序正常退出。");
}
