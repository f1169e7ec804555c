//! Run 命令 - 启动展示会话
//!
//! 使用终端渲染器运行完整的拉取/展示循环。标准输入中的 `touch`（或 `t`）
//! 模拟触摸当前通知，`q` 退出；Ctrl+C 同样会停止调度。

use super::{build_cache, build_client, ConfigArgs};
use crate::client::NotificationSource;
use crate::display::{DisplayMachine, DisplayStatus};
use crate::render::TerminalRenderer;
use crate::scheduler::{PollScheduler, SchedulerHandle};
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::ctrl_c;
use tracing::{info, warn};

/// Run 命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// 只展示图片通知
    #[arg(long)]
    pub images_only: bool,
}

/// 标准输入命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputCommand {
    Touch,
    Status,
    Quit,
}

fn parse_input(line: &str) -> Option<InputCommand> {
    match line.trim().to_lowercase().as_str() {
        "t" | "touch" => Some(InputCommand::Touch),
        "s" | "status" => Some(InputCommand::Status),
        "q" | "quit" | "exit" => Some(InputCommand::Quit),
        _ => None,
    }
}

fn describe_status(status: DisplayStatus) -> String {
    match status {
        DisplayStatus::Idle => "空闲".to_string(),
        DisplayStatus::Showing {
            notification_id,
            remaining_secs,
        } => format!("展示通知 #{}，剩余 {} 秒", notification_id, remaining_secs),
        DisplayStatus::ConfirmingTouch { notification_id } => {
            format!("通知 #{} 触摸确认中", notification_id)
        }
    }
}

/// 处理 run 命令
pub async fn handle_run(args: RunArgs) -> Result<()> {
    let mut config = args.config.resolve_validated()?;
    if args.images_only {
        config.enable_video = false;
    }

    let client = build_client(config.rest_config())?;
    let cache = Arc::new(build_cache(&config, client.clone()));
    let source: Arc<dyn NotificationSource> = client;

    info!(
        endpoint = %config.endpoint,
        display_endpoint_id = config.display_endpoint_id,
        cache_dir = %config.cache_dir().display(),
        "Starting display session"
    );

    let scheduler = PollScheduler::new(
        DisplayMachine::new(config.machine_config()),
        source,
        cache,
        Arc::new(TerminalRenderer::new()),
        config.scheduler_config(),
    );
    let (handle, task) = scheduler.spawn();

    println!("输入 t 触摸当前通知，s 查看状态，q 退出");
    drive_input(&handle).await;

    handle.stop();
    if let Err(e) = task.await {
        warn!(error = %e, "Scheduler task ended abnormally");
    }
    Ok(())
}

/// 读取标准输入直到退出
async fn drive_input(handle: &SchedulerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = ctrl_c() => {
                info!("Ctrl+C received, stopping");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Some(InputCommand::Touch) => match handle.touch_current() {
                        Some(id) => info!(notification_id = id, "Simulated touch"),
                        None => println!("当前没有展示中的通知"),
                    },
                    Some(InputCommand::Status) => println!("{}", describe_status(handle.status())),
                    Some(InputCommand::Quit) => break,
                    None => {}
                },
                // stdin 关闭后只等待 Ctrl+C
                Ok(None) => {
                    let _ = ctrl_c().await;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    let _ = ctrl_c().await;
                    break;
                }
            },
        }
    }
}
