//! Phone verification models.

use serde::Serialize;
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `phone_otp` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhoneOtp {
    pub id: DbId,
    pub phone_number: String,
    pub otp_code: String,
    pub expires_at: Timestamp,
    pub attempts: i32,
    pub verified: bool,
    pub created_at: Timestamp,
}

/// Failed-verification tally for a phone inside the block window.
#[derive(Debug, Clone, FromRow)]
pub struct FailureWindow {
    pub fail_count: i64,
    pub last_failure: Option<Timestamp>,
}

/// `attempt_type` value for verification attempts.
pub const ATTEMPT_VERIFY: &str = "verify";
