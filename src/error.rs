//! 错误类型 - 远程请求与内容缓存

use std::time::Duration;
use thiserror::Error;

/// 远程请求错误（拉取通知、推送事件、下载媒体）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// 网络不可达、DNS、连接重置等
    #[error("transport error: {0}")]
    Transport(String),
    /// 请求超过时限，已在传输层中止
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// 非 2xx 状态码
    #[error("unexpected HTTP status {0}")]
    Protocol(u16),
    /// 响应内容无法解析
    #[error("malformed payload: {0}")]
    Parse(String),
}

impl ClientError {
    /// 错误类别（用于结构化日志）
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "transport",
            ClientError::Timeout(_) => "timeout",
            ClientError::Protocol(_) => "protocol",
            ClientError::Parse(_) => "parse",
        }
    }

    /// 从 reqwest 错误归类
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else if let Some(status) = err.status() {
            ClientError::Protocol(status.as_u16())
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// 内容缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    /// 本地没有可用（未过期）的条目
    #[error("no cached entry for {0}")]
    Miss(String),
    /// 缓存未命中且网络下载失败
    #[error("failed to fetch {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: ClientError,
    },
    /// 缓存目录读写失败
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误（唯一会导致进程退出的错误）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api_key is not configured (set PXD_API_KEY or run `pxd config init`)")]
    MissingApiKey,
    #[error("display_endpoint_id must be >= 1, got {0}")]
    InvalidEndpointId(i64),
    #[error("endpoint is not configured")]
    MissingEndpoint,
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
