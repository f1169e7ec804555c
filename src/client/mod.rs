//! 远程通知客户端
//!
//! `NotificationSource` 是状态机驱动器唯一依赖的网络能力：
//! 拉取下一条候选通知、推送用户事件。`RestClient` 是基于 reqwest 的实现，
//! 测试中可以替换为脚本化的假实现。

pub mod rest;

use crate::error::ClientError;
use crate::notification::{Notification, UserEvent};
use async_trait::async_trait;

pub use rest::{RestClient, RestConfig};

/// 通知来源
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// 拉取当前候选通知，`Ok(None)` 表示云端当前没有通知
    async fn pull(&self) -> Result<Option<Notification>, ClientError>;

    /// 推送用户事件
    async fn push_event(&self, event: &UserEvent) -> Result<(), ClientError>;
}

/// 解析拉取响应体
///
/// 空响应体和 `null` 都视为“没有通知”。
pub fn parse_pull_body(body: &str) -> Result<Option<Notification>, ClientError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<Notification>>(trimmed)
        .map_err(|e| ClientError::Parse(e.to_string()))
}
