//! Integration tests for the generation job repositories.

use sparkfluence_core::status::JobStatus;
use sparkfluence_db::models::image_job::NewImageJob;
use sparkfluence_db::models::video_job::NewVideoJob;
use sparkfluence_db::repositories::{ImageJobRepo, VideoJobRepo};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_video_job(user_id: Uuid, session: &str, segment: &str, number: i32) -> NewVideoJob {
    NewVideoJob {
        user_id,
        session_id: session.to_string(),
        segment_id: segment.to_string(),
        segment_number: number,
        segment_type: "HOOK".to_string(),
        shot_type: "CREATOR".to_string(),
        emotion: "authority".to_string(),
        script_text: "hello".to_string(),
        image_url: Some("https://cdn.example/img.png".to_string()),
        duration_seconds: 8,
        language: "english".to_string(),
        aspect_ratio: "9:16".to_string(),
        resolution: "1080p".to_string(),
        environment: "studio".to_string(),
        topic: String::new(),
        preferred_platform: "auto".to_string(),
        platform: "veo-3.1-fast".to_string(),
    }
}

fn new_image_job(user_id: Uuid, session: &str, number: i32) -> NewImageJob {
    NewImageJob {
        user_id,
        session_id: session.to_string(),
        segment_id: format!("SEG-{number}"),
        segment_number: number,
        segment_type: "body".to_string(),
        shot_type: "B-ROLL".to_string(),
        emotion: "calm".to_string(),
        visual_prompt: "desk".to_string(),
        style: "cinematic".to_string(),
        aspect_ratio: "9:16".to_string(),
        provider: "huggingface".to_string(),
        topic: String::new(),
        character_description: None,
        character_ref_png: None,
    }
}

// ---------------------------------------------------------------------------
// Video jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upsert_resets_existing_segment(pool: PgPool) {
    let user = Uuid::new_v4();
    let jobs = vec![new_video_job(user, "s1", "1", 1), new_video_job(user, "s1", "2", 2)];
    let created = VideoJobRepo::upsert_many(&pool, &jobs).await.unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|j| j.status == JobStatus::Pending.id()));

    let first = created[0].id;
    VideoJobRepo::mark_processing(&pool, first).await.unwrap();
    VideoJobRepo::record_submission(&pool, first, "uuid-1", "veo-3.1-fast", "p")
        .await
        .unwrap();

    let again = VideoJobRepo::upsert_many(&pool, &jobs[..1]).await.unwrap();
    assert_eq!(again[0].id, first);
    assert_eq!(again[0].status, JobStatus::Pending.id());
    assert!(again[0].veo_uuid.is_none());

    let all = VideoJobRepo::list_for_session(&pool, "s1", user).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn next_pending_follows_segment_order(pool: PgPool) {
    let user = Uuid::new_v4();
    let jobs = vec![new_video_job(user, "s1", "b", 2), new_video_job(user, "s1", "a", 1)];
    VideoJobRepo::upsert_many(&pool, &jobs).await.unwrap();

    let next = VideoJobRepo::next_pending(&pool, "s1", user).await.unwrap().unwrap();
    assert_eq!(next.segment_id, "a");

    VideoJobRepo::mark_processing(&pool, next.id).await.unwrap();
    assert_eq!(VideoJobRepo::count_processing(&pool, "s1", user).await.unwrap(), 1);

    let next = VideoJobRepo::next_pending(&pool, "s1", user).await.unwrap().unwrap();
    assert_eq!(next.segment_id, "b");

    assert!(VideoJobRepo::next_pending(&pool, "s1", Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn outcome_written_by_provider_uuid(pool: PgPool) {
    let user = Uuid::new_v4();
    let jobs = vec![new_video_job(user, "s1", "1", 1), new_video_job(user, "s1", "2", 2)];
    let created = VideoJobRepo::upsert_many(&pool, &jobs).await.unwrap();
    for (job, uuid) in created.iter().zip(["u-a", "u-b"]) {
        VideoJobRepo::mark_processing(&pool, job.id).await.unwrap();
        VideoJobRepo::record_submission(&pool, job.id, uuid, "veo-3.1-fast", "p")
            .await
            .unwrap();
    }
    assert_eq!(VideoJobRepo::list_submitted(&pool, "s1", user).await.unwrap().len(), 2);

    let touched = VideoJobRepo::complete_by_uuid(&pool, "u-a", Some("https://owned/a.mp4"), None)
        .await
        .unwrap();
    assert_eq!(touched, 1);
    VideoJobRepo::fail_by_uuid(&pool, "u-b", "boom").await.unwrap();
    assert_eq!(VideoJobRepo::fail_by_uuid(&pool, "missing", "x").await.unwrap(), 0);

    let all = VideoJobRepo::list_for_session(&pool, "s1", user).await.unwrap();
    assert_eq!(all[0].status, JobStatus::Completed.id());
    assert_eq!(all[0].video_url.as_deref(), Some("https://owned/a.mp4"));
    assert_eq!(all[1].status, JobStatus::Failed.id());
    assert_eq!(all[1].error_message.as_deref(), Some("boom"));
    assert!(VideoJobRepo::list_submitted(&pool, "s1", user).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Image jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn image_job_lifecycle(pool: PgPool) {
    let user = Uuid::new_v4();
    let jobs = vec![new_image_job(user, "s9", 1), new_image_job(user, "s9", 2)];
    let created = ImageJobRepo::insert_many(&pool, &jobs).await.unwrap();
    assert_eq!(created.len(), 2);

    let job = ImageJobRepo::next_pending(&pool, "s9", user).await.unwrap().unwrap();
    assert_eq!(job.segment_number, 1);
    ImageJobRepo::mark_processing(&pool, job.id).await.unwrap();
    ImageJobRepo::complete(&pool, job.id, "https://owned/img.png").await.unwrap();

    let other = ImageJobRepo::next_pending(&pool, "s9", user).await.unwrap().unwrap();
    ImageJobRepo::mark_failed(&pool, other.id, "quota").await.unwrap();

    let found = ImageJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(found.status, JobStatus::Completed.id());
    assert_eq!(found.image_url.as_deref(), Some("https://owned/img.png"));
    assert!(ImageJobRepo::next_pending(&pool, "s9", user).await.unwrap().is_none());
}
