//! CLI command handling

pub mod cache;
pub mod config;
pub mod output;
pub mod pull;
pub mod run;

pub use cache::*;
pub use config::*;
pub use output::*;
pub use pull::*;
pub use run::*;

use crate::cache::ContentCache;
use crate::client::{RestClient, RestConfig};
use crate::config::DisplayConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// 各命令共享的配置覆盖参数
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// 配置文件路径（默认 ~/.config/proximity-display/config.json）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API 根地址
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// 本终端 ID
    #[arg(long, global = true)]
    pub display_endpoint_id: Option<i64>,
}

impl ConfigArgs {
    /// 合并配置：命令行参数 > 环境变量 > 配置文件 > 默认值
    pub fn resolve(&self) -> Result<DisplayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = DisplayConfig::load_from(path)?;
                config.apply_env(|key| std::env::var(key).ok());
                config
            }
            None => DisplayConfig::load()?,
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    /// 合并并校验，供需要访问云端的命令使用
    pub fn resolve_validated(&self) -> Result<DisplayConfig> {
        let config = self.resolve()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_to(&self, config: &mut DisplayConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(id) = self.display_endpoint_id {
            config.display_endpoint_id = id;
        }
    }

    /// 配置文件实际路径
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(DisplayConfig::path)
    }
}

/// 创建 REST 客户端
pub fn build_client(rest: RestConfig) -> Result<Arc<RestClient>> {
    let client = RestClient::new(rest).context("Failed to create REST client")?;
    Ok(Arc::new(client))
}

/// 创建内容缓存，下载走 REST 客户端
pub fn build_cache(config: &DisplayConfig, client: Arc<RestClient>) -> ContentCache {
    ContentCache::new(config.cache_dir(), config.cache_retention_days, client)
}
