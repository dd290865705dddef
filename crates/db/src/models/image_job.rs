//! Image generation job models.

use serde::Serialize;
use sparkfluence_core::status::StatusId;
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `image_generation_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImageJob {
    pub id: DbId,
    pub user_id: DbId,
    pub session_id: String,
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub visual_prompt: String,
    pub style: String,
    pub aspect_ratio: String,
    pub provider: String,
    pub topic: String,
    pub character_description: Option<String>,
    pub character_ref_png: Option<String>,
    pub status: StatusId,
    pub image_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for one segment of a `create_jobs` batch.
#[derive(Debug, Clone)]
pub struct NewImageJob {
    pub user_id: DbId,
    pub session_id: String,
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub visual_prompt: String,
    pub style: String,
    pub aspect_ratio: String,
    pub provider: String,
    pub topic: String,
    pub character_description: Option<String>,
    pub character_ref_png: Option<String>,
}
