//! Repository for the `notifications` and `notification_settings` tables.

use sparkfluence_core::notification::NewNotification;
use sparkfluence_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{
    Notification, NotificationSettings, UpdateNotificationSettings,
};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, type, title, message, data, is_read, created_at";

/// Column list for `notification_settings` queries.
const SETTINGS_COLUMNS: &str =
    "user_id, email, push, generation_complete, weekly_digest, marketing, updated_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create an unread notification for a user.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, type, title, message, data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(&input.notification_type)
            .bind(&input.title)
            .bind(&input.message)
            .bind(&input.data)
            .fetch_one(pool)
            .await
    }

    /// Whether the user already has a notification of `notification_type`
    /// whose data references `session_id`.
    pub async fn exists_for_session(
        pool: &PgPool,
        user_id: DbId,
        notification_type: &str,
        session_id: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE user_id = $1 AND type = $2 AND data ->> 'session_id' = $3 \
             )",
        )
        .bind(user_id)
        .bind(notification_type)
        .bind(session_id)
        .fetch_one(pool)
        .await
    }

    /// List notifications for a user, newest first.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification belongs to the user and was unread.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true \
             WHERE id = $1 AND user_id = $2 AND is_read = false",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read. Returns how many changed.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Provides read/upsert for per-user notification toggles.
pub struct NotificationSettingsRepo;

impl NotificationSettingsRepo {
    pub async fn get(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationSettings>, sqlx::Error> {
        let query =
            format!("SELECT {SETTINGS_COLUMNS} FROM notification_settings WHERE user_id = $1");
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or patch the settings row. `None` fields keep the stored
    /// value, or the column default when the row is new.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateNotificationSettings,
    ) -> Result<NotificationSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_settings \
                (user_id, email, push, generation_complete, weekly_digest, marketing) \
             VALUES ($1, COALESCE($2, true), COALESCE($3, true), COALESCE($4, true), \
                     COALESCE($5, false), COALESCE($6, false)) \
             ON CONFLICT (user_id) DO UPDATE SET \
                email = COALESCE($2, notification_settings.email), \
                push = COALESCE($3, notification_settings.push), \
                generation_complete = COALESCE($4, notification_settings.generation_complete), \
                weekly_digest = COALESCE($5, notification_settings.weekly_digest), \
                marketing = COALESCE($6, notification_settings.marketing), \
                updated_at = NOW() \
             RETURNING {SETTINGS_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .bind(input.email)
            .bind(input.push)
            .bind(input.generation_complete)
            .bind(input.weekly_digest)
            .bind(input.marketing)
            .fetch_one(pool)
            .await
    }
}
