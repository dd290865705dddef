pub mod functions;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/functions/v1` route tree.
///
/// ```text
/// POST /generate-videos          video jobs (mode discriminator)
/// POST /generate-images          image jobs (mode discriminator)
/// POST /check-video-status       provider status poll + re-host
/// POST /send-whatsapp-otp        send a verification code
/// POST /verify-whatsapp-otp      check a verification code
/// ```
pub fn function_routes() -> Router<AppState> {
    functions::router()
}

/// Build the `/api/v1` route tree.
///
/// ```text
/// /users/{user_id}/linked-accounts                   list
/// /users/{user_id}/linked-accounts/{platform}        upsert, delete
/// /users/{user_id}/notification-settings             get, update
/// /users/{user_id}/notifications                     list (?unread_only, ?limit)
/// /users/{user_id}/notifications/read-all            mark all read
/// /users/{user_id}/notifications/{id}/read           mark one read
/// /users/{user_id}/tokens                            balance
/// /users/{user_id}/tokens/purchase                   simulated purchase
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/users/{user_id}", users::router())
}
