//! REST 客户端 - 通过 HTTP 访问 display endpoint API

use super::{parse_pull_body, NotificationSource};
use crate::cache::{MediaFetcher, MediaStream};
use crate::error::{ClientError, ConfigError};
use crate::notification::{Notification, UserEvent};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// API key 请求头
pub const API_KEY_HEADER: &str = "x-api-key";

/// REST 客户端配置
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// API 根地址（如 https://api.example.com/v1）
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// 终端 ID
    pub display_endpoint_id: i64,
    /// 拉取超时
    pub pull_timeout: Duration,
    /// 事件推送超时
    pub event_timeout: Duration,
    /// 媒体下载超时
    pub media_timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/v1".to_string(),
            api_key: String::new(),
            display_endpoint_id: 0,
            pull_timeout: Duration::from_millis(1500),
            event_timeout: Duration::from_millis(4000),
            media_timeout: Duration::from_secs(60),
        }
    }
}

/// 基于 reqwest 的 REST 客户端
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: RestConfig,
}

impl RestClient {
    /// 创建新的客户端
    pub fn new(config: RestConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let client = Client::builder().build().map_err(ConfigError::HttpClient)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// 通知拉取地址
    pub fn notifications_url(&self) -> String {
        format!(
            "{}/display_endpoints/{}/notifications",
            self.config.endpoint.trim_end_matches('/'),
            self.config.display_endpoint_id
        )
    }

    /// 事件推送地址
    pub fn events_url(&self) -> String {
        format!(
            "{}/display_endpoints/{}/events",
            self.config.endpoint.trim_end_matches('/'),
            self.config.display_endpoint_id
        )
    }
}

#[async_trait]
impl NotificationSource for RestClient {
    async fn pull(&self) -> Result<Option<Notification>, ClientError> {
        let timeout = self.config.pull_timeout;
        let response = self
            .client
            .get(self.notifications_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Protocol(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;
        debug!(body = %body, "Notification pull response");

        parse_pull_body(&body)
    }

    async fn push_event(&self, event: &UserEvent) -> Result<(), ClientError> {
        let timeout = self.config.event_timeout;
        let response = self
            .client
            .post(self.events_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(event)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Protocol(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for RestClient {
    async fn fetch(&self, uri: &str) -> Result<MediaStream, ClientError> {
        let timeout = self.config.media_timeout;
        let response = self
            .client
            .get(uri)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Protocol(status.as_u16()));
        }

        debug!(
            uri = %uri,
            content_length = ?response.content_length(),
            "Media download started"
        );
        // 请求级超时覆盖到响应体读完
        let chunks = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| ClientError::from_reqwest(e, timeout)));
        Ok(chunks.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RestConfig {
        RestConfig {
            endpoint: "https://api.example.com/v1/".to_string(),
            api_key: "key".to_string(),
            display_endpoint_id: 12,
            ..Default::default()
        }
    }

    #[test]
    fn test_rest_config_default() {
        let config = RestConfig::default();
        assert_eq!(config.pull_timeout, Duration::from_millis(1500));
        assert_eq!(config.event_timeout, Duration::from_millis(4000));
    }

    #[test]
    fn test_rest_client_requires_api_key() {
        let config = RestConfig {
            api_key: String::new(),
            ..test_config()
        };
        assert!(matches!(
            RestClient::new(config),
            Err(ConfigError::MissingApiKey)
        ));
        let blank = RestConfig {
            api_key: "  ".to_string(),
            ..test_config()
        };
        assert!(matches!(RestClient::new(blank), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_urls() {
        let client = RestClient::new(test_config()).unwrap();
        assert_eq!(
            client.notifications_url(),
            "https://api.example.com/v1/display_endpoints/12/notifications"
        );
        assert_eq!(
            client.events_url(),
            "https://api.example.com/v1/display_endpoints/12/events"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_or_timeout() {
        let client = RestClient::new(RestConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            pull_timeout: Duration::from_millis(500),
            ..test_config()
        })
        .unwrap();

        let err = client.pull().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(_) | ClientError::Timeout(_)
        ));
    }
}
