//! Config 命令 - 查看有效配置、生成配置模板

use super::output::to_json;
use super::ConfigArgs;
use crate::config::DisplayConfig;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

/// Config 命令参数
#[derive(Args, Debug)]
pub struct ConfigCommandArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示合并后的有效配置（API key 脱敏）
    Show {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 生成配置文件模板
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

/// 处理 config 命令
pub fn handle_config(args: ConfigCommandArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show { json } => {
            let mut config = args.config.resolve()?;
            let valid = config.validate();
            config.api_key = config.masked_api_key();

            if json {
                println!("{}", to_json(&config));
            } else {
                if let Some(path) = args.config.config_path() {
                    let marker = if path.exists() { "" } else { " (不存在)" };
                    println!("配置文件: {}{}", path.display(), marker);
                }
                println!("endpoint:            {}", config.endpoint);
                println!("api_key:             {}", config.api_key);
                println!("display_endpoint_id: {}", config.display_endpoint_id);
                println!("poll_interval_ms:    {}", config.poll_interval_ms);
                println!("pull_timeout_ms:     {}", config.pull_timeout_ms);
                match config.slow_pull_threshold_ms {
                    Some(ms) => println!("slow_pull_threshold: {}ms", ms),
                    None => println!("slow_pull_threshold: off"),
                }
                println!("confirmation_dwell:  {}ms", config.confirmation_dwell_ms);
                println!("cache_dir:           {}", config.cache_dir().display());
                println!("cache_retention:     {} 天", config.cache_retention_days);
                println!("video:               {}", config.enable_video);
            }
            if let Err(e) = valid {
                eprintln!("⚠️  {}", e);
            }
        }
        ConfigCommand::Init { force } => {
            let path = args
                .config
                .config_path()
                .ok_or_else(|| anyhow!("无法确定 home 目录"))?;
            if path.exists() && !force {
                return Err(anyhow!("配置文件已存在: {}（使用 --force 覆盖）", path.display()));
            }
            let mut template = DisplayConfig::default();
            if let Some(endpoint) = &args.config.endpoint {
                template.endpoint = endpoint.clone();
            }
            if let Some(api_key) = &args.config.api_key {
                template.api_key = api_key.clone();
            }
            template.display_endpoint_id = args.config.display_endpoint_id.unwrap_or(1);
            template.save_to(&path)?;
            println!("✅ 已写入 {}", path.display());
        }
    }
    Ok(())
}
