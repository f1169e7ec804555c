//! 渲染端接口 - 状态机只描述“显示什么”，具体绘制交给实现方

use crate::display::{Frame, ResolvedMedia};
use std::sync::Mutex;

/// 渲染端
pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame);
}

/// 终端渲染器 - 把每一帧打印为一行文本
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, frame: &Frame) {
        println!("{}", describe_frame(frame));
    }
}

/// 帧的文本描述
pub fn describe_frame(frame: &Frame) -> String {
    match frame {
        Frame::Idle => "⏸  默认面板".to_string(),
        Frame::Loading { notification } => format!(
            "⏳ 通知 #{} 加载中 ({}, {}秒)",
            notification.notification_id, notification.content_mime_type, notification.timeout
        ),
        Frame::Media {
            notification_id,
            media,
            pressable,
        } => {
            let source = match media {
                ResolvedMedia::RemoteImage { uri } => format!("图片 {}", uri),
                ResolvedMedia::LocalVideo(handle) => {
                    format!(
                        "视频 {} ({}, 缓存: {})",
                        handle.uri,
                        handle.mime_hint(),
                        handle.path.display()
                    )
                }
            };
            if *pressable {
                format!("🖼  通知 #{}: {} [触摸领取优惠券]", notification_id, source)
            } else {
                format!("🖼  通知 #{}: {}", notification_id, source)
            }
        }
        Frame::ContentFailed { notification_id } => {
            format!("⚠️  通知 #{} 内容加载失败", notification_id)
        }
        Frame::Progress {
            notification_id,
            elapsed_secs,
            total_secs,
        } => format!("   通知 #{} 进度 {}/{}", notification_id, elapsed_secs, total_secs),
        Frame::Confirmation { notification_id } => {
            format!("✅ 感谢触摸！通知 #{} 已记录", notification_id)
        }
    }
}

/// 记录所有帧的渲染器（测试和调试用）
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<Frame>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已渲染的帧
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 最后一帧（忽略进度帧）
    pub fn last_screen(&self) -> Option<Frame> {
        self.frames()
            .into_iter()
            .rev()
            .find(|f| !matches!(f, Frame::Progress { .. }))
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, frame: &Frame) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(frame.clone());
    }
}
