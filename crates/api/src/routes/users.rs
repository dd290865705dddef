//! Route definitions for per-user dashboard records.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{linked_accounts, notifications, tokens};
use crate::state::AppState;

/// Routes mounted at `/users/{user_id}`.
///
/// ```text
/// GET    /linked-accounts                 -> list_linked_accounts
/// PUT    /linked-accounts/{platform}      -> upsert_linked_account
/// DELETE /linked-accounts/{platform}      -> delete_linked_account
///
/// GET    /notification-settings           -> get_settings
/// PUT    /notification-settings           -> update_settings
///
/// GET    /notifications                   -> list_notifications
/// POST   /notifications/read-all          -> mark_all_read
/// POST   /notifications/{id}/read         -> mark_read
///
/// GET    /tokens                          -> get_balance
/// POST   /tokens/purchase                 -> purchase_tokens
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/linked-accounts", get(linked_accounts::list_linked_accounts))
        .route(
            "/linked-accounts/{platform}",
            put(linked_accounts::upsert_linked_account)
                .delete(linked_accounts::delete_linked_account),
        )
        .route(
            "/notification-settings",
            get(notifications::get_settings).put(notifications::update_settings),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/tokens", get(tokens::get_balance))
        .route("/tokens/purchase", post(tokens::purchase_tokens))
}
