//! Cache 命令 - 查看和维护本地媒体缓存

use super::output::{format_size, to_json};
use super::{build_cache, build_client, ConfigArgs};
use crate::cache::{ContentCache, MediaFetcher, MediaStream};
use crate::error::{CacheError, ClientError};
use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::sync::Arc;

/// Cache 命令参数
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// 删除过期条目
    Sweep,
    /// 列出有效条目
    List {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 下载（或命中）指定媒体
    Fetch {
        uri: String,
    },
    /// 查询媒体的本地路径，不访问网络
    Path {
        uri: String,
    },
}

/// 不访问网络的下载器，离线维护缓存时使用
struct OfflineFetcher;

#[async_trait]
impl MediaFetcher for OfflineFetcher {
    async fn fetch(&self, uri: &str) -> Result<MediaStream, ClientError> {
        Err(ClientError::Transport(format!("offline, not fetching {}", uri)))
    }
}

#[derive(Serialize)]
struct EntryOutput {
    uri: String,
    path: String,
    size: u64,
    fetched_at: String,
}

/// 处理 cache 命令
pub async fn handle_cache(args: CacheArgs) -> Result<()> {
    match args.command {
        CacheCommand::Sweep => {
            let config = args.config.resolve()?;
            let cache = ContentCache::new(
                config.cache_dir(),
                config.cache_retention_days,
                Arc::new(OfflineFetcher),
            );
            let removed = cache.remove_expired().await?;
            println!("已清理 {} 个过期条目 ({})", removed, cache.root().display());
        }
        CacheCommand::List { json } => {
            let config = args.config.resolve()?;
            let cache = ContentCache::new(
                config.cache_dir(),
                config.cache_retention_days,
                Arc::new(OfflineFetcher),
            );
            let entries = cache.entries().await?;
            if json {
                let output: Vec<EntryOutput> = entries
                    .iter()
                    .map(|e| EntryOutput {
                        uri: e.uri.clone(),
                        path: e.path.display().to_string(),
                        size: e.size,
                        fetched_at: e.fetched_at.to_rfc3339(),
                    })
                    .collect();
                println!("{}", to_json(&output));
            } else if entries.is_empty() {
                println!("缓存为空 ({})", cache.root().display());
            } else {
                for entry in &entries {
                    println!(
                        "{}  {:>9}  {}",
                        entry.fetched_at.format("%Y-%m-%d %H:%M:%S"),
                        format_size(entry.size),
                        entry.uri
                    );
                }
            }
        }
        CacheCommand::Fetch { uri } => {
            let config = args.config.resolve_validated()?;
            let client = build_client(config.rest_config())?;
            let cache = build_cache(&config, client);
            let handle = cache.get_or_fetch(&uri).await?;
            println!("{} ({})", handle.path.display(), format_size(handle.size));
        }
        CacheCommand::Path { uri } => {
            let config = args.config.resolve()?;
            let cache = ContentCache::new(
                config.cache_dir(),
                config.cache_retention_days,
                Arc::new(OfflineFetcher),
            );
            match cache.resolve_local_file(&uri).await {
                Ok(handle) => println!("{}", handle.path.display()),
                Err(CacheError::Miss(_)) => println!("未缓存: {}", uri),
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}
