//! Pull / Touch 命令 - 单次访问云端，用于现场排查

use super::output::{format_notification, to_json};
use super::{build_client, ConfigArgs};
use crate::client::NotificationSource;
use crate::notification::UserEvent;
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;
use std::time::Instant;

/// Pull 命令参数
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 拉取一次当前候选通知
pub async fn handle_pull(args: PullArgs) -> Result<()> {
    let config = args.config.resolve_validated()?;
    let client = build_client(config.rest_config())?;

    let started = Instant::now();
    let notification = client.pull().await?;
    let elapsed = started.elapsed();

    if args.json {
        println!("{}", to_json(&notification));
        return Ok(());
    }

    match notification {
        Some(n) => {
            println!("{}", format_notification(&n));
            match n.displayable_content(config.media_support()) {
                Ok(content) => println!("可展示: {}", content.uri()),
                Err(reason) => println!("不可展示: {}", reason),
            }
        }
        None => println!("当前没有通知"),
    }
    if let Some(threshold) = config.slow_pull_threshold_ms {
        if elapsed.as_millis() as u64 > threshold {
            println!("⚠️  响应耗时 {}ms，运行时会被丢弃", elapsed.as_millis());
        }
    }
    Ok(())
}

/// Touch 命令参数
#[derive(Args, Debug)]
pub struct TouchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// 被触摸的通知 ID
    pub notification_id: i64,
}

/// 推送一次触摸事件
pub async fn handle_touch(args: TouchArgs) -> Result<()> {
    if args.notification_id <= 0 {
        return Err(anyhow!("通知 ID 必须为正数: {}", args.notification_id));
    }
    let config = args.config.resolve_validated()?;
    let client = build_client(config.rest_config())?;

    let event = UserEvent::touch(args.notification_id, config.display_endpoint_id, Utc::now());
    client.push_event(&event).await?;
    println!("✅ 已推送: {}", event.message);
    Ok(())
}
