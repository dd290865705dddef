//! WhatsApp OTP verification against a real database.
//!
//! Codes are seeded through the repository so no message is sent.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, build_test_app, post_json};
use serde_json::json;
use sparkfluence_db::repositories::{OtpRepo, ProfileRepo};
use sqlx::PgPool;
use uuid::Uuid;

const SEND_OTP: &str = "/functions/v1/send-whatsapp-otp";
const VERIFY_OTP: &str = "/functions/v1/verify-whatsapp-otp";
const PHONE: &str = "6281234567890";

async fn seed_code(pool: &PgPool, code: &str, ttl: Duration) {
    OtpRepo::upsert_code(pool, PHONE, code, Utc::now() + ttl)
        .await
        .unwrap();
}

async fn verify(pool: &PgPool, code: &str, user_id: Option<Uuid>) -> (StatusCode, serde_json::Value) {
    let mut body = json!({ "phone_number": format!("+{PHONE}"), "otp_code": code });
    if let Some(user_id) = user_id {
        body["user_id"] = json!(user_id);
    }
    let response = post_json(build_test_app(pool.clone()), VERIFY_OTP, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn create_profile(pool: &PgPool, user_id: Uuid) {
    sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn correct_code_verifies_and_attaches_phone(pool: PgPool) {
    let user_id = Uuid::new_v4();
    create_profile(&pool, user_id).await;
    seed_code(&pool, "123456", Duration::minutes(5)).await;

    let (status, json) = verify(&pool, " 123456 ", Some(user_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["verified"], true);
    assert_eq!(json["data"]["phone_number"], PHONE);

    assert!(ProfileRepo::is_phone_registered(&pool, PHONE).await.unwrap());
    assert!(OtpRepo::last_sent_at(&pool, PHONE).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_code_reports_attempts_left(pool: PgPool) {
    seed_code(&pool, "123456", Duration::minutes(5)).await;

    let (status, json) = verify(&pool, "000000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_OTP");
    assert_eq!(json["error"]["attempts_left"], 2);

    let (_, json) = verify(&pool, "111111", None).await;
    assert_eq!(json["error"]["attempts_left"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn third_failure_blocks_the_phone(pool: PgPool) {
    seed_code(&pool, "123456", Duration::minutes(5)).await;

    for wrong in ["000000", "111111"] {
        verify(&pool, wrong, None).await;
    }
    let (status, json) = verify(&pool, "222222", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["attempts_left"], 0);

    // Even the right code is refused while blocked.
    let (status, json) = verify(&pool, "123456", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "RATE_LIMITED");
    assert_eq!(json["error"]["attempts_left"], 0);
    assert!(json["error"]["remaining_seconds"].as_i64().unwrap() > 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_code_is_rejected(pool: PgPool) {
    seed_code(&pool, "123456", Duration::seconds(-1)).await;

    let (status, json) = verify(&pool, "123456", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "OTP_EXPIRED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn phone_verified_by_another_user_is_taken(pool: PgPool) {
    let owner = Uuid::new_v4();
    create_profile(&pool, owner).await;
    ProfileRepo::set_verified_phone(&pool, owner, PHONE).await.unwrap();

    let newcomer = Uuid::new_v4();
    create_profile(&pool, newcomer).await;
    seed_code(&pool, "654321", Duration::minutes(5)).await;

    let (status, json) = verify(&pool, "654321", Some(newcomer)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "PHONE_TAKEN");
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn resend_within_cooldown_is_refused(pool: PgPool) {
    seed_code(&pool, "123456", Duration::minutes(5)).await;

    let response = post_json(
        build_test_app(pool),
        SEND_OTP,
        json!({ "phone_number": "+62 812-3456-7890" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "COOLDOWN");
    let remaining = json["error"]["remaining_seconds"].as_i64().unwrap();
    assert!((1..=60).contains(&remaining));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn registered_phone_cannot_request_a_code(pool: PgPool) {
    let owner = Uuid::new_v4();
    create_profile(&pool, owner).await;
    ProfileRepo::set_verified_phone(&pool, owner, PHONE).await.unwrap();

    let response = post_json(build_test_app(pool), SEND_OTP, json!({ "phone_number": PHONE })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "PHONE_REGISTERED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn send_without_gateway_token_is_config_error(pool: PgPool) {
    let response = post_json(build_test_app(pool.clone()), SEND_OTP, json!({ "phone_number": PHONE })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONFIG_ERROR");
    assert!(OtpRepo::last_sent_at(&pool, PHONE).await.unwrap().is_none());
}
