//! Video generation job models.

use serde::Serialize;
use sparkfluence_core::status::StatusId;
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `video_generation_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoJob {
    pub id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub script_text: String,
    pub image_url: Option<String>,
    pub duration_seconds: i32,
    pub language: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub environment: String,
    pub topic: String,
    pub preferred_platform: String,
    pub platform: Option<String>,
    pub prompt: Option<String>,
    pub veo_uuid: Option<String>,
    pub status: StatusId,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for one segment of a `create_jobs` batch.
#[derive(Debug, Clone)]
pub struct NewVideoJob {
    pub user_id: DbId,
    pub session_id: String,
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub script_text: String,
    pub image_url: Option<String>,
    pub duration_seconds: i32,
    pub language: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub environment: String,
    pub topic: String,
    pub preferred_platform: String,
    pub platform: String,
}

/// Row written when a legacy batch submission is accepted by the provider.
#[derive(Debug, Clone)]
pub struct SubmittedVideoJob {
    pub user_id: DbId,
    pub session_id: String,
    pub segment_id: String,
    pub segment_type: String,
    pub veo_uuid: String,
    pub platform: String,
    pub prompt: String,
    pub image_url: String,
}
