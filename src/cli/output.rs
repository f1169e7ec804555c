//! Output formatting for CLI commands

use crate::notification::Notification;
use serde::Serialize;

/// JSON 输出
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 通知摘要（一行）
pub fn format_notification(notification: &Notification) -> String {
    let mut line = format!(
        "#{} {} {}s {}",
        notification.notification_id,
        notification.content_mime_type,
        notification.timeout,
        notification.content_body
    );
    if let Some(name) = &notification.name {
        line.push_str(&format!(" \"{}\"", name));
    }
    if notification.has_coupons() {
        line.push_str(&format!(" [{} coupon(s)]", notification.coupons.len()));
    }
    line
}

/// 字节数的可读形式
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
