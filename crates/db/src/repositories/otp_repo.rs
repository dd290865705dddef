//! Repositories backing WhatsApp phone verification: `phone_otp`,
//! `phone_otp_attempts`, and the phone columns of `user_profiles`.

use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::otp::{FailureWindow, PhoneOtp, ATTEMPT_VERIFY};

const COLUMNS: &str = "id, phone_number, otp_code, expires_at, attempts, verified, created_at";

pub struct OtpRepo;

impl OtpRepo {
    /// When the current code for `phone` was issued, if any.
    pub async fn last_sent_at(
        pool: &PgPool,
        phone: &str,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar("SELECT created_at FROM phone_otp WHERE phone_number = $1")
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Store a fresh code, replacing any previous one for the phone.
    pub async fn upsert_code(
        pool: &PgPool,
        phone: &str,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO phone_otp (phone_number, otp_code, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_phone_otp_phone_number DO UPDATE SET \
                otp_code = EXCLUDED.otp_code, \
                expires_at = EXCLUDED.expires_at, \
                attempts = 0, \
                verified = false, \
                created_at = NOW()",
        )
        .bind(phone)
        .bind(code)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The newest unverified code that has not expired at `now`.
    pub async fn find_live(
        pool: &PgPool,
        phone: &str,
        now: Timestamp,
    ) -> Result<Option<PhoneOtp>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM phone_otp \
             WHERE phone_number = $1 AND verified = false AND expires_at > $2 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, PhoneOtp>(&query)
            .bind(phone)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_verified(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE phone_otp SET verified = true WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn delete_for_phone(pool: &PgPool, phone: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM phone_otp WHERE phone_number = $1")
            .bind(phone)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Failed verification attempts for `phone` since `since`.
    pub async fn failure_window(
        pool: &PgPool,
        phone: &str,
        since: Timestamp,
    ) -> Result<FailureWindow, sqlx::Error> {
        sqlx::query_as::<_, FailureWindow>(
            "SELECT COUNT(*) AS fail_count, MAX(created_at) AS last_failure \
             FROM phone_otp_attempts \
             WHERE phone_number = $1 AND attempt_type = $2 AND success = false \
               AND created_at > $3",
        )
        .bind(phone)
        .bind(ATTEMPT_VERIFY)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    pub async fn record_attempt(
        pool: &PgPool,
        phone: &str,
        success: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO phone_otp_attempts (phone_number, attempt_type, success) \
             VALUES ($1, $2, $3)",
        )
        .bind(phone)
        .bind(ATTEMPT_VERIFY)
        .bind(success)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Reset the failure counter after a successful verification.
    pub async fn clear_failures(pool: &PgPool, phone: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM phone_otp_attempts WHERE phone_number = $1 AND success = false")
            .bind(phone)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Phone columns of `user_profiles`.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Whether any profile has already verified `phone`.
    pub async fn is_phone_registered(pool: &PgPool, phone: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM user_profiles WHERE phone_number = $1 AND phone_verified \
             )",
        )
        .bind(phone)
        .fetch_one(pool)
        .await
    }

    /// Whether a user other than `user_id` has verified `phone`.
    pub async fn is_phone_taken_by_other(
        pool: &PgPool,
        phone: &str,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM user_profiles \
                WHERE phone_number = $1 AND phone_verified AND user_id <> $2 \
             )",
        )
        .bind(phone)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Attach a verified phone to the user's profile. Returns rows touched.
    pub async fn set_verified_phone(
        pool: &PgPool,
        user_id: DbId,
        phone: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_profiles \
             SET phone_number = $2, phone_verified = true, phone_verified_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(phone)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
