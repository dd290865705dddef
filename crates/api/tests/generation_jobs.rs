//! Queue-mode generation against a real database: job creation, session
//! status, and the completion notification.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_veo_test_app, get, post_json};
use serde_json::{json, Value};
use sparkfluence_db::repositories::VideoJobRepo;
use sqlx::PgPool;
use uuid::Uuid;

const VIDEOS: &str = "/functions/v1/generate-videos";
const IMAGES: &str = "/functions/v1/generate-images";

async fn ok_data(response: axum::response::Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true, "body: {json}");
    json["data"].clone()
}

fn two_segments() -> Value {
    json!([
        {
            "segment_id": "hook",
            "segment_type": "hook",
            "shot_type": "CREATOR",
            "script_text": "Tiga kebiasaan pagi yang mengubah hidupku",
            "image_url": "https://cdn.example.com/hook.png"
        },
        {
            "segment_id": "body",
            "segment_type": "body",
            "shot_type": "B-ROLL",
            "visual_prompt": "steam rising from a coffee cup"
        }
    ])
}

// ---------------------------------------------------------------------------
// Video jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn video_jobs_are_created_pending(pool: PgPool) {
    let user_id = Uuid::new_v4();

    let data = ok_data(
        post_json(
            build_test_app(pool.clone()),
            VIDEOS,
            json!({
                "mode": "create_jobs",
                "user_id": user_id,
                "session_id": "sess-video-1",
                "topic": "morning habits",
                "segments": two_segments(),
            }),
        )
        .await,
    )
    .await;

    assert_eq!(data["total_jobs"], 2);
    assert_eq!(data["session_id"], "sess-video-1");
    let jobs = data["jobs"].as_array().unwrap();
    assert!(jobs.iter().all(|j| j["status"] == 0));
    assert_eq!(jobs[0]["segment_type"], "hook");
    assert_eq!(jobs[0]["language"], "indonesian");

    let status = ok_data(
        post_json(
            build_test_app(pool),
            VIDEOS,
            json!({ "mode": "check_status", "user_id": user_id, "session_id": "sess-video-1" }),
        )
        .await,
    )
    .await;

    assert_eq!(status["summary"]["total"], 2);
    assert_eq!(status["summary"]["pending"], 2);
    assert_eq!(status["all_complete"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn recreating_video_jobs_resets_instead_of_duplicating(pool: PgPool) {
    let user_id = Uuid::new_v4();
    let body = json!({
        "mode": "create_jobs",
        "user_id": user_id,
        "session_id": "sess-video-2",
        "segments": two_segments(),
    });

    let first = ok_data(post_json(build_test_app(pool.clone()), VIDEOS, body.clone()).await).await;
    let job_id: Uuid = serde_json::from_value(first["jobs"][0]["id"].clone()).unwrap();
    VideoJobRepo::mark_processing(&pool, job_id).await.unwrap();

    ok_data(post_json(build_test_app(pool.clone()), VIDEOS, body).await).await;

    let status = ok_data(
        post_json(
            build_test_app(pool),
            VIDEOS,
            json!({ "mode": "check_status", "user_id": user_id, "session_id": "sess-video-2" }),
        )
        .await,
    )
    .await;
    assert_eq!(status["summary"]["total"], 2);
    assert_eq!(status["summary"]["processing"], 0);
    assert_eq!(status["summary"]["pending"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_video_session_notifies_once(pool: PgPool) {
    let user_id = Uuid::new_v4();
    let data = ok_data(
        post_json(
            build_test_app(pool.clone()),
            VIDEOS,
            json!({
                "mode": "create_jobs",
                "user_id": user_id,
                "session_id": "sess-video-3",
                "segments": two_segments(),
            }),
        )
        .await,
    )
    .await;

    for (i, job) in data["jobs"].as_array().unwrap().iter().enumerate() {
        let id: Uuid = serde_json::from_value(job["id"].clone()).unwrap();
        let provider_id = format!("gen-{i}");
        VideoJobRepo::record_submission(&pool, id, &provider_id, "veo-3.1-fast", "prompt")
            .await
            .unwrap();
        VideoJobRepo::complete_by_uuid(&pool, &provider_id, Some("https://cdn.example.com/v.mp4"), None)
            .await
            .unwrap();
    }

    let check = json!({ "mode": "check_status", "user_id": user_id, "session_id": "sess-video-3" });
    for _ in 0..2 {
        let status = ok_data(post_json(build_test_app(pool.clone()), VIDEOS, check.clone()).await).await;
        assert_eq!(status["all_complete"], true);
        assert_eq!(status["summary"]["completed"], 2);
    }

    let notifications = ok_data(
        get(
            build_test_app(pool),
            &format!("/api/v1/users/{user_id}/notifications"),
        )
        .await,
    )
    .await;
    let notifications = notifications.as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "video_generation_complete");
    assert_eq!(notifications[0]["data"]["session_id"], "sess-video-3");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partially_failed_video_session_notifies_once(pool: PgPool) {
    let user_id = Uuid::new_v4();
    let ids = create_video_session(&pool, user_id, "sess-video-6").await;

    for (i, id) in ids.iter().enumerate() {
        let provider_id = format!("gen-partial-{i}");
        VideoJobRepo::record_submission(&pool, *id, &provider_id, "veo-3.1-fast", "prompt")
            .await
            .unwrap();
    }
    VideoJobRepo::complete_by_uuid(&pool, "gen-partial-0", Some("https://cdn.example.com/v.mp4"), None)
        .await
        .unwrap();
    VideoJobRepo::fail_by_uuid(&pool, "gen-partial-1", "moderation")
        .await
        .unwrap();

    let check = json!({ "mode": "check_status", "user_id": user_id, "session_id": "sess-video-6" });
    for _ in 0..2 {
        let status = ok_data(post_json(build_test_app(pool.clone()), VIDEOS, check.clone()).await).await;
        assert_eq!(status["all_complete"], true);
        assert_eq!(status["summary"]["failed"], 1);
    }

    let notifications = ok_data(
        get(
            build_test_app(pool),
            &format!("/api/v1/users/{user_id}/notifications"),
        )
        .await,
    )
    .await;
    let notifications = notifications.as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "video_generation_partial");
    assert_eq!(notifications[0]["data"]["failed"], 1);
}

// ---------------------------------------------------------------------------
// Single video submission
// ---------------------------------------------------------------------------

/// Create the two-segment session and return the job ids in segment order.
async fn create_video_session(pool: &PgPool, user_id: Uuid, session_id: &str) -> Vec<Uuid> {
    let data = ok_data(
        post_json(
            build_test_app(pool.clone()),
            VIDEOS,
            json!({
                "mode": "create_jobs",
                "user_id": user_id,
                "session_id": session_id,
                "segments": two_segments(),
            }),
        )
        .await,
    )
    .await;
    data["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| serde_json::from_value(job["id"].clone()).unwrap())
        .collect()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_single_waits_while_a_job_is_in_flight(pool: PgPool) {
    let user_id = Uuid::new_v4();
    let ids = create_video_session(&pool, user_id, "sess-video-4").await;
    VideoJobRepo::mark_processing(&pool, ids[0]).await.unwrap();

    let data = ok_data(
        post_json(
            build_veo_test_app(pool.clone()),
            VIDEOS,
            json!({ "mode": "process_single", "user_id": user_id, "session_id": "sess-video-4" }),
        )
        .await,
    )
    .await;

    assert_eq!(data["waiting"], true);
    assert_eq!(data["processing_count"], 1);
    let untouched = VideoJobRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();
    assert_eq!(untouched.status, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_single_unknown_job_is_not_found(pool: PgPool) {
    let response = post_json(
        build_veo_test_app(pool),
        VIDEOS,
        json!({ "mode": "process_single", "job_id": Uuid::new_v4() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "JOB_NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_single_without_image_fails_the_job(pool: PgPool) {
    let user_id = Uuid::new_v4();
    let ids = create_video_session(&pool, user_id, "sess-video-5").await;

    let response = post_json(
        build_veo_test_app(pool.clone()),
        VIDEOS,
        json!({ "mode": "process_single", "job_id": ids[1] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NO_IMAGE");

    let job = VideoJobRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();
    assert_eq!(job.status, 3);
    assert_eq!(job.error_message.as_deref(), Some("No image URL"));
    assert!(job.veo_uuid.is_none());
}

// ---------------------------------------------------------------------------
// Image jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_jobs_route_creator_shots_to_reference_model(pool: PgPool) {
    let user_id = Uuid::new_v4();

    let data = ok_data(
        post_json(
            build_test_app(pool.clone()),
            IMAGES,
            json!({
                "mode": "create_jobs",
                "user_id": user_id,
                "session_id": "sess-image-1",
                "character_ref_png": "https://cdn.example.com/avatar.png",
                "segments": two_segments(),
            }),
        )
        .await,
    )
    .await;

    assert_eq!(data["total_jobs"], 2);
    let jobs = data["jobs"].as_array().unwrap();
    assert_eq!(jobs[0]["provider"], "gpt-image-1");
    assert_eq!(jobs[1]["provider"], "huggingface");
    assert_eq!(jobs[0]["style"], "cinematic");

    let status = ok_data(
        post_json(
            build_test_app(pool.clone()),
            IMAGES,
            json!({ "mode": "check_status", "user_id": user_id, "session_id": "sess-image-1" }),
        )
        .await,
    )
    .await;
    assert_eq!(status["summary"]["pending"], 2);
    assert_eq!(status["all_complete"], false);

    let other_user = ok_data(
        post_json(
            build_test_app(pool),
            IMAGES,
            json!({ "mode": "check_status", "user_id": Uuid::new_v4(), "session_id": "sess-image-1" }),
        )
        .await,
    )
    .await;
    assert_eq!(other_user["summary"]["total"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_jobs_honour_explicit_provider(pool: PgPool) {
    let data = ok_data(
        post_json(
            build_test_app(pool),
            IMAGES,
            json!({
                "mode": "create_jobs",
                "user_id": Uuid::new_v4(),
                "session_id": "sess-image-2",
                "provider": "openai",
                "segments": two_segments(),
            }),
        )
        .await,
    )
    .await;

    let jobs = data["jobs"].as_array().unwrap();
    assert!(jobs.iter().all(|j| j["provider"] == "openai"));
}
