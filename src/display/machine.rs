//! 展示状态机
//!
//! 纯转移函数 `handle(Event) -> Vec<Effect>`：状态机不碰计时器、网络和渲染，
//! 只返回需要驱动器执行的副作用指令，因此可以脱离真实计时器测试。
//!
//! ## 状态转移
//! - `Idle` + 可展示的拉取结果 → `Showing`
//! - `Showing` 期间的新拉取只更新缓冲区，不打断当前展示（每次超时最多切换一次）
//! - `Showing` 倒计时归零 → 重新评估缓冲区：有可展示候选则重新 `Showing`，否则 `Idle`
//! - `Showing` + 触摸（媒体已加载且有优惠券）→ `ConfirmingTouch`，暂停拉取
//! - `ConfirmingTouch` 停留结束 → `Idle`，恢复拉取并立即拉取一次

use super::buffer::NotificationBuffer;
use super::frame::{Frame, ResolvedMedia};
use crate::error::ClientError;
use crate::notification::{Content, MediaSupport, Notification, UserEvent};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 默认触摸确认停留时长
pub const DEFAULT_CONFIRMATION_DWELL: Duration = Duration::from_millis(5000);
/// 默认慢响应阈值，超过则丢弃拉取结果
pub const DEFAULT_SLOW_PULL_THRESHOLD: Duration = Duration::from_millis(1000);

/// 状态机配置
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// 终端 ID（写入触摸事件）
    pub display_endpoint_id: i64,
    /// 触摸确认停留时长
    pub confirmation_dwell: Duration,
    /// 慢响应阈值，`None` 表示不丢弃
    pub slow_pull_threshold: Option<Duration>,
    /// 支持的媒体范围
    pub media_support: MediaSupport,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            display_endpoint_id: 0,
            confirmation_dwell: DEFAULT_CONFIRMATION_DWELL,
            slow_pull_threshold: Some(DEFAULT_SLOW_PULL_THRESHOLD),
            media_support: MediaSupport::ImagesAndVideo,
        }
    }
}

/// 展示状态
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Idle,
    Showing {
        notification: Notification,
        remaining_secs: u32,
        /// 媒体已呈现；加载中或加载失败时不接受触摸
        media_loaded: bool,
    },
    ConfirmingTouch {
        notification: Notification,
    },
}

/// 对外发布的状态摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayStatus {
    #[default]
    Idle,
    Showing {
        notification_id: i64,
        remaining_secs: u32,
    },
    ConfirmingTouch {
        notification_id: i64,
    },
}

impl DisplayStatus {
    pub fn notification_id(&self) -> Option<i64> {
        match self {
            DisplayStatus::Idle => None,
            DisplayStatus::Showing { notification_id, .. }
            | DisplayStatus::ConfirmingTouch { notification_id } => Some(*notification_id),
        }
    }
}

/// 输入事件
#[derive(Debug, Clone)]
pub enum Event {
    /// 驱动器启动
    Started,
    /// 一次拉取完成（按到达顺序投递）
    PullCompleted {
        result: Result<Option<Notification>, ClientError>,
        elapsed: Duration,
    },
    /// 倒计时 1 秒
    CountdownTick,
    /// 用户触摸
    Touched {
        notification_id: i64,
        at: DateTime<Utc>,
    },
    /// 触摸确认停留结束
    ConfirmationElapsed,
    /// 媒体解析完成
    ContentResolved {
        notification_id: i64,
        media: ResolvedMedia,
    },
    /// 媒体解析失败
    ContentFailed {
        notification_id: i64,
        reason: String,
    },
    /// 事件推送完成
    EventPushed {
        notification_id: i64,
        result: Result<(), ClientError>,
    },
}

/// 副作用指令（由驱动器执行）
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Render(Frame),
    /// 重置并启动 1 秒倒计时
    StartCountdown,
    StopCountdown,
    SuspendPulls,
    /// 重新启动拉取计时器
    ResumePulls,
    /// 立即拉取一次
    PullNow,
    ResolveContent {
        notification_id: i64,
        content: Content,
    },
    PushEvent(UserEvent),
    ScheduleConfirmation(Duration),
    /// 拉取失败，交给日志上报
    ReportError(ClientError),
}

/// 展示状态机，独占缓冲区和展示状态
pub struct DisplayMachine {
    state: DisplayState,
    buffer: NotificationBuffer,
    config: MachineConfig,
}

impl DisplayMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            state: DisplayState::Idle,
            buffer: NotificationBuffer::new(),
            config,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn buffer(&self) -> &NotificationBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn status(&self) -> DisplayStatus {
        match &self.state {
            DisplayState::Idle => DisplayStatus::Idle,
            DisplayState::Showing {
                notification,
                remaining_secs,
                ..
            } => DisplayStatus::Showing {
                notification_id: notification.notification_id,
                remaining_secs: *remaining_secs,
            },
            DisplayState::ConfirmingTouch { notification } => DisplayStatus::ConfirmingTouch {
                notification_id: notification.notification_id,
            },
        }
    }

    /// 处理一个事件，返回需要执行的副作用
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Started => vec![Effect::Render(Frame::Idle)],
            Event::PullCompleted { result, elapsed } => self.on_pull(result, elapsed),
            Event::CountdownTick => self.on_tick(),
            Event::Touched {
                notification_id,
                at,
            } => self.on_touch(notification_id, at),
            Event::ConfirmationElapsed => self.on_confirmation_elapsed(),
            Event::ContentResolved {
                notification_id,
                media,
            } => self.on_content_resolved(notification_id, media),
            Event::ContentFailed {
                notification_id,
                reason,
            } => self.on_content_failed(notification_id, reason),
            Event::EventPushed {
                notification_id,
                result,
            } => {
                match result {
                    Ok(()) => info!(notification_id, "Event sent successfully"),
                    Err(e) => error!(
                        notification_id,
                        kind = e.kind(),
                        error = %e,
                        "Error in user event push"
                    ),
                }
                Vec::new()
            }
        }
    }

    fn on_pull(
        &mut self,
        result: Result<Option<Notification>, ClientError>,
        elapsed: Duration,
    ) -> Vec<Effect> {
        if let DisplayState::ConfirmingTouch { notification } = &self.state {
            debug!(
                notification_id = notification.notification_id,
                "Pull result dropped during touch confirmation"
            );
            return Vec::new();
        }

        let candidate = match result {
            Ok(candidate) => candidate,
            Err(err) => {
                // 失败时清空缓冲区，避免旧候选残留
                self.buffer.clear();
                return vec![Effect::ReportError(err)];
            }
        };

        if let Some(threshold) = self.config.slow_pull_threshold {
            if elapsed > threshold {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    threshold_ms = threshold.as_millis() as u64,
                    "Notification pull took too long, response discarded"
                );
                return Vec::new();
            }
        }

        self.buffer.set(candidate);
        match self.state {
            DisplayState::Idle => self.show_next(),
            _ => Vec::new(),
        }
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        let (notification_id, show_progress, total_secs, remaining_secs) = match &mut self.state {
            DisplayState::Showing {
                notification,
                remaining_secs,
                ..
            } => {
                *remaining_secs = remaining_secs.saturating_sub(1);
                (
                    notification.notification_id,
                    notification.show_progress_bar,
                    notification.timeout_secs(),
                    *remaining_secs,
                )
            }
            _ => return Vec::new(),
        };

        let mut effects = Vec::new();
        if show_progress {
            effects.push(Effect::Render(Frame::Progress {
                notification_id,
                elapsed_secs: total_secs.saturating_sub(remaining_secs),
                total_secs,
            }));
        }

        if remaining_secs == 0 {
            debug!(notification_id, "Notification timed out");
            effects.push(Effect::StopCountdown);
            effects.extend(self.show_next());
        }
        effects
    }

    /// 从缓冲区取候选通知展示，没有可展示的通知时回到 Idle
    fn show_next(&mut self) -> Vec<Effect> {
        let was_showing = matches!(self.state, DisplayState::Showing { .. });

        let accepted = self.buffer.take_snapshot().and_then(|notification| {
            match notification.displayable_content(self.config.media_support) {
                Ok(content) => Some((notification, content)),
                Err(reason) => {
                    debug!(
                        notification_id = notification.notification_id,
                        reason = %reason,
                        "Notification not displayable"
                    );
                    None
                }
            }
        });

        match accepted {
            Some((notification, content)) => {
                let notification_id = notification.notification_id;
                let remaining_secs = notification.timeout_secs();
                info!(
                    notification_id,
                    content_type = %notification.content_mime_type,
                    timeout_secs = remaining_secs,
                    ">>>Show notification"
                );
                self.state = DisplayState::Showing {
                    notification: notification.clone(),
                    remaining_secs,
                    media_loaded: false,
                };
                vec![
                    Effect::Render(Frame::Loading { notification }),
                    Effect::ResolveContent {
                        notification_id,
                        content,
                    },
                    Effect::StartCountdown,
                ]
            }
            None => {
                self.state = DisplayState::Idle;
                if was_showing {
                    vec![Effect::Render(Frame::Idle)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_touch(&mut self, notification_id: i64, at: DateTime<Utc>) -> Vec<Effect> {
        let notification = match &self.state {
            DisplayState::Showing {
                notification,
                media_loaded,
                ..
            } if notification_id > 0 && notification.notification_id == notification_id => {
                if !*media_loaded {
                    debug!(notification_id, "Touch ignored, media not loaded");
                    return Vec::new();
                }
                notification.clone()
            }
            _ => {
                debug!(notification_id, "Touch ignored, notification is not showing");
                return Vec::new();
            }
        };

        if !notification.has_coupons() {
            debug!(notification_id, "Touch ignored, notification has no coupons");
            return Vec::new();
        }

        info!(notification_id, "Notification touched");
        self.buffer.clear();
        let event = UserEvent::touch(notification_id, self.config.display_endpoint_id, at);
        self.state = DisplayState::ConfirmingTouch { notification };

        vec![
            Effect::StopCountdown,
            Effect::SuspendPulls,
            Effect::PushEvent(event),
            Effect::Render(Frame::Confirmation { notification_id }),
            Effect::ScheduleConfirmation(self.config.confirmation_dwell),
        ]
    }

    fn on_confirmation_elapsed(&mut self) -> Vec<Effect> {
        let DisplayState::ConfirmingTouch { notification } = &self.state else {
            return Vec::new();
        };
        debug!(
            notification_id = notification.notification_id,
            "Touch confirmation finished"
        );

        self.buffer.clear();
        self.state = DisplayState::Idle;
        vec![
            Effect::Render(Frame::Idle),
            Effect::ResumePulls,
            Effect::PullNow,
        ]
    }

    fn on_content_resolved(&mut self, notification_id: i64, media: ResolvedMedia) -> Vec<Effect> {
        match &mut self.state {
            DisplayState::Showing {
                notification,
                media_loaded,
                ..
            } if notification.notification_id == notification_id => {
                *media_loaded = true;
                vec![Effect::Render(Frame::Media {
                    notification_id,
                    media,
                    pressable: notification.has_coupons(),
                })]
            }
            _ => {
                debug!(notification_id, "Stale content resolution ignored");
                Vec::new()
            }
        }
    }

    fn on_content_failed(&mut self, notification_id: i64, reason: String) -> Vec<Effect> {
        match &self.state {
            DisplayState::Showing { notification, .. }
                if notification.notification_id == notification_id =>
            {
                warn!(notification_id, reason = %reason, "Notification media loading error");
                vec![Effect::Render(Frame::ContentFailed { notification_id })]
            }
            _ => Vec::new(),
        }
    }
}
