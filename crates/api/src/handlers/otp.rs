//! Handlers for WhatsApp phone verification.

use axum::extract::State;
use axum::response::Response;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sparkfluence_core::otp::{self, BlockStatus, BLOCK_WINDOW_SECS, OTP_TTL_SECS};
use sparkfluence_core::types::{DbId, Timestamp};
use sparkfluence_db::repositories::{OtpRepo, ProfileRepo};
use sparkfluence_db::DbPool;

use crate::error::{AppError, AppResult, ErrorCode};
use crate::extract::FunctionBody;
use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone_number: Option<String>,
    pub otp_code: Option<String>,
    /// When given, the verified phone is attached to this user's profile.
    pub user_id: Option<DbId>,
}

async fn block_status(pool: &DbPool, phone: &str, now: Timestamp) -> AppResult<BlockStatus> {
    let since = now - Duration::seconds(BLOCK_WINDOW_SECS);
    let window = OtpRepo::failure_window(pool, phone, since).await?;
    Ok(BlockStatus::evaluate(window.fail_count, window.last_failure, now))
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

/// POST /functions/v1/send-whatsapp-otp
pub async fn send_otp(
    State(state): State<AppState>,
    FunctionBody(req): FunctionBody<SendOtpRequest>,
) -> AppResult<Response> {
    let phone = otp::validate_phone(req.phone_number.as_deref().unwrap_or_default())
        .map_err(|_| AppError::coded(ErrorCode::InvalidPhone, "Invalid WhatsApp number format"))?;

    if ProfileRepo::is_phone_registered(&state.pool, &phone).await? {
        return Err(AppError::coded(
            ErrorCode::PhoneRegistered,
            "This WhatsApp number is already registered",
        ));
    }

    let now = Utc::now();
    let block = block_status(&state.pool, &phone, now).await?;
    if block.blocked() {
        tracing::info!(phone = %otp::mask_phone(&phone), "OTP send refused, phone blocked");
        return Err(AppError::coded(ErrorCode::RateLimited, block.message())
            .with_extra("remaining_seconds", block.remaining_seconds));
    }

    let last_sent = OtpRepo::last_sent_at(&state.pool, &phone).await?;
    if let Some(remaining) = otp::cooldown_remaining(last_sent, now) {
        return Err(
            AppError::coded(ErrorCode::Cooldown, format!("Please wait {remaining} seconds"))
                .with_extra("remaining_seconds", remaining),
        );
    }

    let fonnte = state.fonnte()?;

    let code = otp::generate_code();
    OtpRepo::upsert_code(
        &state.pool,
        &phone,
        &code,
        now + Duration::seconds(OTP_TTL_SECS),
    )
    .await?;

    let (country_code, local_number) = otp::split_country_code(&phone);
    if let Err(e) = fonnte
        .send(local_number, country_code, &otp::message_text(&code))
        .await
    {
        tracing::error!(phone = %otp::mask_phone(&phone), error = %e, "WhatsApp delivery failed");
        return Err(AppError::coded(
            ErrorCode::SendFailed,
            "Failed to send WhatsApp message",
        ));
    }

    let phone_masked = otp::mask_phone(&phone);
    tracing::info!(phone = %phone_masked, "OTP sent");

    Ok(ok(json!({
        "phone_masked": phone_masked,
        "expires_in": OTP_TTL_SECS,
    })))
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// POST /functions/v1/verify-whatsapp-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    FunctionBody(req): FunctionBody<VerifyOtpRequest>,
) -> AppResult<Response> {
    let (Some(raw_phone), Some(raw_code)) = (
        req.phone_number.as_deref().filter(|p| !p.trim().is_empty()),
        req.otp_code.as_deref().filter(|c| !c.trim().is_empty()),
    ) else {
        return Err(AppError::coded(
            ErrorCode::MissingParams,
            "Phone number and OTP code are required",
        ));
    };
    let phone = otp::normalize_phone(raw_phone);
    let code = otp::normalize_code(raw_code);
    let pool = &state.pool;

    let now = Utc::now();
    let block = block_status(pool, &phone, now).await?;
    if block.blocked() {
        return Err(AppError::coded(ErrorCode::RateLimited, block.message())
            .with_extra("remaining_seconds", block.remaining_seconds)
            .with_extra("attempts_left", 0));
    }

    let Some(stored) = OtpRepo::find_live(pool, &phone, now).await? else {
        return Err(AppError::coded(
            ErrorCode::OtpExpired,
            "OTP code expired or not found. Please request a new code.",
        ));
    };

    if stored.otp_code != code {
        OtpRepo::record_attempt(pool, &phone, false).await?;
        let attempts_left = otp::attempts_left_after_failure(block.fail_count);
        let message = if attempts_left > 0 {
            format!("Wrong OTP code. {attempts_left} attempts left.")
        } else {
            "Wrong OTP code. This number is blocked for 24 hours after too many wrong attempts."
                .to_string()
        };
        tracing::info!(phone = %otp::mask_phone(&phone), attempts_left, "Wrong OTP code");
        return Err(AppError::coded(ErrorCode::InvalidOtp, message)
            .with_extra("attempts_left", attempts_left));
    }

    OtpRepo::mark_verified(pool, stored.id).await?;

    if let Some(user_id) = req.user_id {
        if ProfileRepo::is_phone_taken_by_other(pool, &phone, user_id).await? {
            return Err(AppError::coded(
                ErrorCode::PhoneTaken,
                "This number is already used by another account",
            ));
        }
        let updated = ProfileRepo::set_verified_phone(pool, user_id, &phone).await?;
        if updated == 0 {
            tracing::warn!(user_id = %user_id, "No profile row to attach the verified phone to");
        }
    }

    OtpRepo::record_attempt(pool, &phone, true).await?;
    OtpRepo::clear_failures(pool, &phone).await?;
    OtpRepo::delete_for_phone(pool, &phone).await?;

    tracing::info!(phone = %otp::mask_phone(&phone), "Phone verified");

    Ok(ok(json!({
        "message": "WhatsApp number verified",
        "phone_number": phone,
        "verified": true,
    })))
}
