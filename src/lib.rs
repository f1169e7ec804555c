//! Proximity Display - 近场展示终端客户端
//!
//! 周期性拉取云端候选通知，按时长展示图片或视频，
//! 用户触摸带优惠券的通知时上报事件并显示确认画面。

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod notification;
pub mod render;
pub mod scheduler;

pub use cache::{
    Clock, ContentCache, ManualClock, MediaFetcher, MediaHandle, MediaStream, SystemClock,
};
pub use client::{NotificationSource, RestClient, RestConfig};
pub use config::DisplayConfig;
pub use display::{
    DisplayMachine, DisplayState, DisplayStatus, Effect, Event, Frame, MachineConfig,
    NotificationBuffer, ResolvedMedia,
};
pub use error::{CacheError, ClientError, ConfigError};
pub use notification::{Content, Coupon, MediaSupport, MimeType, Notification, UserEvent};
pub use render::{RecordingRenderer, Renderer, TerminalRenderer};
pub use scheduler::{PollScheduler, SchedulerConfig, SchedulerHandle};
