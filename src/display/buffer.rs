//! 通知缓冲区 - 单槽位、后写覆盖
//!
//! 只保存最近一次拉取结果（包括 `None`），与屏幕上正在展示的通知解耦。
//! 写入顺序以到达顺序为准：两个并发拉取乱序完成时，最后到达的结果生效。

use crate::notification::Notification;

/// 单槽位候选通知缓冲区
#[derive(Debug, Default)]
pub struct NotificationBuffer {
    slot: Option<Notification>,
    /// 每次写入递增
    generation: u64,
}

impl NotificationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖写入（`None` 表示云端当前没有通知）
    pub fn set(&mut self, candidate: Option<Notification>) {
        self.slot = candidate;
        self.generation += 1;
    }

    /// 清空
    pub fn clear(&mut self) {
        self.set(None);
    }

    /// 获取候选通知的独立副本，之后的写入不会影响已取出的副本
    pub fn take_snapshot(&self) -> Option<Notification> {
        self.slot.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// 当前候选通知 ID
    pub fn candidate_id(&self) -> Option<i64> {
        self.slot.as_ref().map(|n| n.notification_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
