//! 用户事件 - 推送到云端的触摸记录

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    None,
    /// 用户触摸了展示中的通知
    #[serde(rename = "DisplayEndpoint_Touch")]
    DisplayEndpointTouch,
}

/// 事件来源类型
pub const SOURCE_TYPE_NOTIFICATION: &str = "Notification";

/// 用户事件载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "Type")]
    pub event_type: EventType,
    /// ISO-8601 UTC 时间戳
    #[serde(rename = "EventAtTimestamp", serialize_with = "serialize_utc")]
    pub event_at: DateTime<Utc>,
    #[serde(rename = "SourceType")]
    pub source_type: String,
    #[serde(rename = "SourceID")]
    pub source_id: i64,
    #[serde(rename = "Message")]
    pub message: String,
}

impl UserEvent {
    /// 构造触摸事件
    pub fn touch(notification_id: i64, display_endpoint_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            event_type: EventType::DisplayEndpointTouch,
            event_at: at,
            source_type: SOURCE_TYPE_NOTIFICATION.to_string(),
            source_id: notification_id,
            message: format!(
                "NotificationID {} touched on a DisplayEndpointID {}",
                notification_id, display_endpoint_id
            ),
        }
    }
}

fn serialize_utc<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_touch_event_wire_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let event = UserEvent::touch(42, 7, at);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["Type"], "DisplayEndpoint_Touch");
        assert_eq!(value["EventAtTimestamp"], "2026-03-01T12:30:00.000Z");
        assert_eq!(value["SourceType"], "Notification");
        assert_eq!(value["SourceID"], 42);
        assert_eq!(
            value["Message"],
            "NotificationID 42 touched on a DisplayEndpointID 7"
        );
    }

    #[test]
    fn test_event_parses_back() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let event = UserEvent::touch(1, 2, at);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: UserEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
