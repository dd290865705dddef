pub mod image_generation;
pub mod linked_accounts;
pub mod notifications;
pub mod otp;
pub mod tokens;
pub mod video_generation;
pub mod video_status;

use sparkfluence_core::types::DbId;
use sparkfluence_pipeline::SessionRef;

use crate::error::{AppError, AppResult};

/// A session reference when both identifiers are present and non-empty.
fn optional_session(session_id: Option<&str>, user_id: Option<DbId>) -> Option<SessionRef<'_>> {
    let session_id = session_id.filter(|s| !s.is_empty())?;
    Some(SessionRef {
        session_id,
        user_id: user_id?,
    })
}

/// Like [`optional_session`], but `INVALID_INPUT` with `message` when
/// either identifier is missing.
fn require_session<'a>(
    session_id: Option<&'a str>,
    user_id: Option<DbId>,
    message: &str,
) -> AppResult<SessionRef<'a>> {
    optional_session(session_id, user_id).ok_or_else(|| AppError::invalid_input(message))
}
