//! 通知数据模型 - 云端拉取的 JSON 载荷

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 内容 MIME 类型（云端以整数枚举传输）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MimeType {
    #[default]
    None,
    ImagePng,
    ImageJpeg,
    ImageJpg,
    VideoMp4,
    /// 无法识别的取值，保留原值用于日志
    Unknown(i64),
}

impl MimeType {
    /// 是否为图片类型
    pub fn is_image(&self) -> bool {
        matches!(self, MimeType::ImagePng | MimeType::ImageJpeg | MimeType::ImageJpg)
    }

    /// 是否为视频类型
    pub fn is_video(&self) -> bool {
        matches!(self, MimeType::VideoMp4)
    }

    /// 标准 MIME 字符串
    pub fn as_mime_str(&self) -> Option<&'static str> {
        match self {
            MimeType::ImagePng => Some("image/png"),
            MimeType::ImageJpeg | MimeType::ImageJpg => Some("image/jpeg"),
            MimeType::VideoMp4 => Some("video/mp4"),
            MimeType::None | MimeType::Unknown(_) => None,
        }
    }
}

impl From<i64> for MimeType {
    fn from(value: i64) -> Self {
        match value {
            0 => MimeType::None,
            1 => MimeType::ImagePng,
            2 => MimeType::ImageJpeg,
            3 => MimeType::ImageJpg,
            4 => MimeType::VideoMp4,
            other => MimeType::Unknown(other),
        }
    }
}

impl From<MimeType> for i64 {
    fn from(value: MimeType) -> Self {
        match value {
            MimeType::None => 0,
            MimeType::ImagePng => 1,
            MimeType::ImageJpeg => 2,
            MimeType::ImageJpg => 3,
            MimeType::VideoMp4 => 4,
            MimeType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimeType::None => write!(f, "none"),
            MimeType::ImagePng => write!(f, "image-png"),
            MimeType::ImageJpeg => write!(f, "image-jpeg"),
            MimeType::ImageJpg => write!(f, "image-jpg"),
            MimeType::VideoMp4 => write!(f, "video-mp4"),
            MimeType::Unknown(n) => write!(f, "unknown({})", n),
        }
    }
}

/// 优惠券（对状态机而言只有“是否存在”有意义）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(rename = "CouponID", default, skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<i64>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 通知 - 一次定时展示的媒体公告
///
/// 收到后不可变；缓冲区只会整体替换，不会原地修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "NotificationID")]
    pub notification_id: i64,
    /// 展示时长（秒），必须 > 0 才能展示
    #[serde(rename = "Timeout", default, deserialize_with = "null_as_default")]
    pub timeout: i64,
    #[serde(rename = "ContentMimeType", default, deserialize_with = "null_as_default")]
    pub content_mime_type: MimeType,
    /// 媒体地址
    #[serde(rename = "ContentBody", default, deserialize_with = "null_as_default")]
    pub content_body: String,
    #[serde(rename = "Coupons", default, deserialize_with = "null_as_default")]
    pub coupons: Vec<Coupon>,
    #[serde(rename = "ClientSpotID", default, skip_serializing_if = "Option::is_none")]
    pub client_spot_id: Option<i64>,
    #[serde(rename = "DisplayEndpointID", default, skip_serializing_if = "Option::is_none")]
    pub display_endpoint_id: Option<i64>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "SortOrder", default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(rename = "Active", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "ContentSubject", default, skip_serializing_if = "Option::is_none")]
    pub content_subject: Option<String>,
    #[serde(rename = "ContentCaption", default, skip_serializing_if = "Option::is_none")]
    pub content_caption: Option<String>,
    /// 是否显示倒计时进度条
    #[serde(rename = "ShowProgressBar", default = "default_true")]
    pub show_progress_bar: bool,
}

impl Notification {
    /// 创建最小通知（其余字段取默认值）
    pub fn new(
        notification_id: i64,
        timeout: i64,
        content_mime_type: MimeType,
        content_body: impl Into<String>,
    ) -> Self {
        Self {
            notification_id,
            timeout,
            content_mime_type,
            content_body: content_body.into(),
            coupons: Vec::new(),
            client_spot_id: None,
            display_endpoint_id: None,
            name: None,
            sort_order: None,
            active: None,
            content_subject: None,
            content_caption: None,
            show_progress_bar: true,
        }
    }

    /// 附加优惠券
    pub fn with_coupons(mut self, coupons: Vec<Coupon>) -> Self {
        self.coupons = coupons;
        self
    }

    /// 是否有优惠券（决定触摸是否生效）
    pub fn has_coupons(&self) -> bool {
        !self.coupons.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// `null` 视为字段默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
