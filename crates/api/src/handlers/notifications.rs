//! Handlers for `/users/{user_id}/notifications` and notification settings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sparkfluence_core::error::CoreError;
use sparkfluence_core::types::DbId;
use sparkfluence_db::models::notification::UpdateNotificationSettings;
use sparkfluence_db::repositories::{NotificationRepo, NotificationSettingsRepo};

use crate::error::{AppError, AppResult};
use crate::response::ok;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

const MAX_LIMIT: i64 = 100;
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{user_id}/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Response> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications =
        NotificationRepo::list_for_user(&state.pool, user_id, unread_only, limit).await?;
    Ok(ok(notifications))
}

/// POST /api/v1/users/{user_id}/notifications/{id}/read
///
/// 204 on success, 404 if the notification is unknown, already read, or
/// belongs to someone else.
pub async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(DbId, DbId)>,
) -> AppResult<Response> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /api/v1/users/{user_id}/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Response> {
    let count = NotificationRepo::mark_all_read(&state.pool, user_id).await?;
    Ok(ok(json!({ "marked_read": count })))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /api/v1/users/{user_id}/notification-settings
///
/// Users without a stored row get the column defaults.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Response> {
    let settings = match NotificationSettingsRepo::get(&state.pool, user_id).await? {
        Some(settings) => settings,
        None => {
            NotificationSettingsRepo::upsert(
                &state.pool,
                user_id,
                &UpdateNotificationSettings::default(),
            )
            .await?
        }
    };
    Ok(ok(settings))
}

/// PUT /api/v1/users/{user_id}/notification-settings
///
/// Only the toggles present in the body change.
pub async fn update_settings(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateNotificationSettings>,
) -> AppResult<Response> {
    let settings = NotificationSettingsRepo::upsert(&state.pool, user_id, &input).await?;
    tracing::debug!(user_id = %user_id, "Notification settings updated");
    Ok(ok(settings))
}
