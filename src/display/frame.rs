//! 渲染帧 - 状态机告诉渲染端“现在该显示什么”

use crate::cache::MediaHandle;
use crate::notification::Notification;

/// 已解析、可直接播放的媒体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMedia {
    /// 远程图片，渲染端直接按链接加载
    RemoteImage { uri: String },
    /// 本地缓存的视频
    LocalVideo(MediaHandle),
}

/// 渲染帧
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// 默认面板
    Idle,
    /// 通知面板已打开，媒体加载中
    Loading { notification: Notification },
    /// 媒体已就绪；`pressable` 为真时显示可按压提示（有优惠券）
    Media {
        notification_id: i64,
        media: ResolvedMedia,
        pressable: bool,
    },
    /// 媒体加载失败，显示“内容加载失败”占位图
    ContentFailed { notification_id: i64 },
    /// 倒计时进度
    Progress {
        notification_id: i64,
        elapsed_secs: u32,
        total_secs: u32,
    },
    /// 触摸确认（“感谢触摸”）
    Confirmation { notification_id: i64 },
}

impl Frame {
    /// 帧关联的通知 ID
    pub fn notification_id(&self) -> Option<i64> {
        match self {
            Frame::Idle => None,
            Frame::Loading { notification } => Some(notification.notification_id),
            Frame::Media { notification_id, .. }
            | Frame::ContentFailed { notification_id }
            | Frame::Progress { notification_id, .. }
            | Frame::Confirmation { notification_id } => Some(*notification_id),
        }
    }
}
