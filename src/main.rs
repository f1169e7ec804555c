//! Proximity Display CLI
//!
//! 近场展示终端：轮询云端通知，按时长展示媒体，上报触摸事件

use anyhow::Result;
use clap::{Parser, Subcommand};
use proximity_display::cli::{
    handle_cache, handle_config, handle_pull, handle_run, handle_touch, CacheArgs,
    ConfigCommandArgs, PullArgs, RunArgs, TouchArgs,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pxd")]
#[command(about = "Proximity Display - 近场展示终端客户端")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行展示会话
    Run(RunArgs),
    /// 拉取一次当前通知
    Pull(PullArgs),
    /// 推送一次触摸事件
    Touch(TouchArgs),
    /// 管理本地媒体缓存
    Cache(CacheArgs),
    /// 查看或生成配置
    Config(ConfigCommandArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("proximity_display=info,pxd=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Pull(args) => handle_pull(args).await,
        Commands::Touch(args) => handle_touch(args).await,
        Commands::Cache(args) => handle_cache(args).await,
        Commands::Config(args) => handle_config(args),
    }
}
