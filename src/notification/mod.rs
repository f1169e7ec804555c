//! 通知模型 - 云端通知、媒体内容与用户事件

pub mod content;
pub mod event;
pub mod model;

pub use content::{Content, MediaSupport, Rejection};
pub use event::{EventType, UserEvent};
pub use model::{Coupon, MimeType, Notification};
