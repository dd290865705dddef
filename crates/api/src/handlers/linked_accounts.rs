//! Handlers for `/users/{user_id}/linked-accounts`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sparkfluence_core::types::DbId;
use sparkfluence_db::models::linked_account::UpsertLinkedAccount;
use sparkfluence_db::repositories::LinkedAccountRepo;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::response::ok;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/linked-accounts
pub async fn list_linked_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Response> {
    let accounts = LinkedAccountRepo::list_for_user(&state.pool, user_id).await?;
    Ok(ok(accounts))
}

/// PUT /api/v1/users/{user_id}/linked-accounts/{platform}
///
/// Connect a social platform, or replace the username of an existing link.
pub async fn upsert_linked_account(
    State(state): State<AppState>,
    Path((user_id, platform)): Path<(DbId, String)>,
    Json(input): Json<UpsertLinkedAccount>,
) -> AppResult<Response> {
    let username = input.platform_username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("platform_username is required".into()));
    }

    let account = LinkedAccountRepo::upsert(&state.pool, user_id, &platform, username).await?;
    tracing::info!(user_id = %user_id, platform = %platform, "Linked account saved");
    Ok(ok(account))
}

/// DELETE /api/v1/users/{user_id}/linked-accounts/{platform}
pub async fn delete_linked_account(
    State(state): State<AppState>,
    Path((user_id, platform)): Path<(DbId, String)>,
) -> AppResult<Response> {
    let removed = LinkedAccountRepo::delete(&state.pool, user_id, &platform).await?;
    if !removed {
        return Err(AppError::coded(
            ErrorCode::NotFound,
            format!("No linked {platform} account"),
        ));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
