//! 终端配置
//!
//! 优先级：命令行参数 > 环境变量 > `~/.config/proximity-display/config.json` > 默认值。

use crate::client::RestConfig;
use crate::display::MachineConfig;
use crate::error::ConfigError;
use crate::notification::MediaSupport;
use crate::scheduler::{SchedulerConfig, COUNTDOWN_TICK};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_ENDPOINT: &str = "PXD_ENDPOINT";
pub const ENV_API_KEY: &str = "PXD_API_KEY";
pub const ENV_DISPLAY_ENDPOINT_ID: &str = "PXD_DISPLAY_ENDPOINT_ID";

/// 终端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// API 根地址
    pub endpoint: String,
    pub api_key: String,
    /// 本终端 ID（>= 1）
    pub display_endpoint_id: i64,
    pub poll_interval_ms: u64,
    pub pull_timeout_ms: u64,
    /// 慢响应阈值，`null` 表示保留所有响应
    pub slow_pull_threshold_ms: Option<u64>,
    pub event_timeout_ms: u64,
    pub confirmation_dwell_ms: u64,
    pub cache_retention_days: u32,
    /// 媒体缓存目录，默认 `<系统缓存目录>/proximity-display/media`
    pub cache_dir: Option<PathBuf>,
    /// 是否播放视频通知
    pub enable_video: bool,
    pub media_timeout_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/v1".to_string(),
            api_key: String::new(),
            display_endpoint_id: 0,
            poll_interval_ms: 2000,
            pull_timeout_ms: 1500,
            slow_pull_threshold_ms: Some(1000),
            event_timeout_ms: 4000,
            confirmation_dwell_ms: 5000,
            cache_retention_days: crate::cache::DEFAULT_RETENTION_DAYS,
            cache_dir: None,
            enable_video: true,
            media_timeout_ms: 60_000,
        }
    }
}

impl DisplayConfig {
    /// 默认配置文件路径
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/proximity-display/config.json"))
    }

    /// 加载配置文件并应用环境变量（文件不存在时使用默认值）
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 从指定文件加载
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded display config");
        Ok(config)
    }

    /// 写入配置文件
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)
    }

    /// 应用环境变量覆盖，空值忽略
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.api_key = api_key;
        }
        if let Some(raw) = get(ENV_DISPLAY_ENDPOINT_ID) {
            match raw.trim().parse() {
                Ok(id) => self.display_endpoint_id = id,
                Err(_) => debug!(value = %raw, "Ignoring non-numeric {}", ENV_DISPLAY_ENDPOINT_ID),
            }
        }
    }

    /// 校验必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.display_endpoint_id < 1 {
            return Err(ConfigError::InvalidEndpointId(self.display_endpoint_id));
        }
        Ok(())
    }

    /// 媒体缓存目录
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("proximity-display/media")
        })
    }

    /// 脱敏后的 API key（只保留末 4 位）
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.is_empty() {
            return "(not set)".to_string();
        }
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }

    pub fn media_support(&self) -> MediaSupport {
        if self.enable_video {
            MediaSupport::ImagesAndVideo
        } else {
            MediaSupport::ImagesOnly
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            display_endpoint_id: self.display_endpoint_id,
            confirmation_dwell: Duration::from_millis(self.confirmation_dwell_ms),
            slow_pull_threshold: self.slow_pull_threshold_ms.map(Duration::from_millis),
            media_support: self.media_support(),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            pull_timeout: Duration::from_millis(self.pull_timeout_ms),
            event_timeout: Duration::from_millis(self.event_timeout_ms),
            countdown_tick: COUNTDOWN_TICK,
            sweep_cache_on_start: true,
        }
    }

    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            display_endpoint_id: self.display_endpoint_id,
            pull_timeout: Duration::from_millis(self.pull_timeout_ms),
            event_timeout: Duration::from_millis(self.event_timeout_ms),
            media_timeout: Duration::from_millis(self.media_timeout_ms),
        }
    }
}
