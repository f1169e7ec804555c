//! 通知内容解析与展示校验

use super::model::{MimeType, Notification};
use thiserror::Error;

/// 通知媒体内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// 远程图片链接（由渲染端直接加载）
    Image(String),
    /// 远程视频，经内容缓存落地后播放
    Video(String),
}

impl Content {
    pub fn uri(&self) -> &str {
        match self {
            Content::Image(uri) | Content::Video(uri) => uri,
        }
    }
}

/// 当前终端支持的媒体范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaSupport {
    ImagesOnly,
    #[default]
    ImagesAndVideo,
}

impl MediaSupport {
    pub fn accepts(&self, mime: MimeType) -> bool {
        match self {
            MediaSupport::ImagesOnly => mime.is_image(),
            MediaSupport::ImagesAndVideo => mime.is_image() || mime.is_video(),
        }
    }
}

/// 通知不可展示的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("timeout must be positive, got {0}")]
    NonPositiveTimeout(i64),
    #[error("content body is empty")]
    EmptyBody,
    #[error("unsupported content type {0}")]
    UnsupportedMime(MimeType),
}

impl Notification {
    /// 校验通知是否可展示，成功时返回解析出的内容
    pub fn displayable_content(&self, support: MediaSupport) -> Result<Content, Rejection> {
        if self.timeout <= 0 {
            return Err(Rejection::NonPositiveTimeout(self.timeout));
        }
        let body = self.content_body.trim();
        if body.is_empty() {
            return Err(Rejection::EmptyBody);
        }
        if !support.accepts(self.content_mime_type) {
            return Err(Rejection::UnsupportedMime(self.content_mime_type));
        }
        if self.content_mime_type.is_video() {
            Ok(Content::Video(body.to_string()))
        } else {
            Ok(Content::Image(body.to_string()))
        }
    }

    /// 展示时长（秒），非正数返回 0
    pub fn timeout_secs(&self) -> u32 {
        u32::try_from(self.timeout.max(0)).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content() {
        let n = Notification::new(1, 5, MimeType::ImagePng, "http://x/a.png");
        assert_eq!(
            n.displayable_content(MediaSupport::ImagesAndVideo),
            Ok(Content::Image("http://x/a.png".to_string()))
        );
    }

    #[test]
    fn test_video_content_requires_video_support() {
        let n = Notification::new(1, 5, MimeType::VideoMp4, "http://x/v.mp4");
        assert_eq!(
            n.displayable_content(MediaSupport::ImagesAndVideo),
            Ok(Content::Video("http://x/v.mp4".to_string()))
        );
        assert_eq!(
            n.displayable_content(MediaSupport::ImagesOnly),
            Err(Rejection::UnsupportedMime(MimeType::VideoMp4))
        );
    }

    #[test]
    fn test_rejections() {
        let support = MediaSupport::ImagesAndVideo;
        assert_eq!(
            Notification::new(1, 0, MimeType::ImagePng, "http://x/a.png").displayable_content(support),
            Err(Rejection::NonPositiveTimeout(0))
        );
        assert_eq!(
            Notification::new(1, -3, MimeType::ImagePng, "http://x/a.png").displayable_content(support),
            Err(Rejection::NonPositiveTimeout(-3))
        );
        assert_eq!(
            Notification::new(1, 5, MimeType::ImagePng, "  ").displayable_content(support),
            Err(Rejection::EmptyBody)
        );
        assert_eq!(
            Notification::new(1, 5, MimeType::None, "http://x/a").displayable_content(support),
            Err(Rejection::UnsupportedMime(MimeType::None))
        );
        assert_eq!(
            Notification::new(1, 5, MimeType::Unknown(9), "http://x/a").displayable_content(support),
            Err(Rejection::UnsupportedMime(MimeType::Unknown(9)))
        );
    }

    #[test]
    fn test_timeout_secs_clamps() {
        assert_eq!(Notification::new(1, -1, MimeType::ImagePng, "x").timeout_secs(), 0);
        assert_eq!(Notification::new(1, 10, MimeType::ImagePng, "x").timeout_secs(), 10);
        assert_eq!(
            Notification::new(1, i64::MAX, MimeType::ImagePng, "x").timeout_secs(),
            u32::MAX
        );
    }
}
