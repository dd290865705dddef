//! Handlers for `/users/{user_id}/tokens`.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde_json::json;
use sparkfluence_core::types::DbId;
use sparkfluence_db::models::token::CreateTokenPurchase;
use sparkfluence_db::repositories::TokenRepo;

use crate::error::{AppError, AppResult};
use crate::response::ok;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/tokens
///
/// Users without a balance row have zero tokens.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Response> {
    let balance = TokenRepo::balance(&state.pool, user_id).await?;
    Ok(ok(json!({ "user_id": user_id, "balance": balance })))
}

/// POST /api/v1/users/{user_id}/tokens/purchase
///
/// Simulated checkout: records a completed purchase and credits the
/// balance in one transaction. No payment provider is contacted.
pub async fn purchase_tokens(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<CreateTokenPurchase>,
) -> AppResult<Response> {
    if input.tokens <= 0 {
        return Err(AppError::BadRequest("tokens must be positive".into()));
    }
    if !input.amount.is_finite() || input.amount < 0.0 {
        return Err(AppError::BadRequest("amount must be a non-negative number".into()));
    }
    if input.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest("payment_method is required".into()));
    }

    let (purchase, balance) = TokenRepo::purchase(&state.pool, user_id, &input).await?;
    tracing::info!(
        user_id = %user_id,
        tokens = input.tokens,
        balance,
        "Token purchase recorded",
    );

    Ok(ok(json!({ "purchase": purchase, "balance": balance })))
}
