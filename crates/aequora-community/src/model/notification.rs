//! Notification models

use serde::{Deserialize, Serialize};
use validator::Validate;

use aequora_persistence::entity::notification;
use aequora_persistence::entity::sea_orm_active_enums::NotificationType;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationInfo {
    pub notification_id: i32,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<notification::Model> for NotificationInfo {
    fn from(value: notification::Model) -> Self {
        Self {
            notification_id: value.notification_id,
            message: value.message,
            notification_type: value.notification_type,
            link: value.link,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub unread_count: u64,
    pub notifications: Vec<NotificationInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
    pub community_id: Option<i32>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
}
