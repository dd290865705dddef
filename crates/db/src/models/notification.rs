//! Notification entity models and DTOs.

use serde::{Deserialize, Serialize};
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// A row from the `notification_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationSettings {
    pub user_id: DbId,
    pub email: bool,
    pub push: bool,
    pub generation_complete: bool,
    pub weekly_digest: bool,
    pub marketing: bool,
    pub updated_at: Timestamp,
}

/// DTO for updating notification settings. Absent fields keep their
/// current value (or the column default on first write).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotificationSettings {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub generation_complete: Option<bool>,
    pub weekly_digest: Option<bool>,
    pub marketing: Option<bool>,
}
