//! Handler for `POST /functions/v1/generate-videos`.
//!
//! One endpoint, several modes selected by the `mode` field:
//! `preview_prompts`, `create_jobs`, `process_single`, `check_and_update`,
//! `check_status`, and the synchronous batch (`legacy`, also the default).

use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{json, Value};
use sparkfluence_core::prompts::VideoPromptContext;
use sparkfluence_core::segments::{segment_objects, VideoSegment};
use sparkfluence_core::types::DbId;
use sparkfluence_core::video_models::VideoPlatform;
use sparkfluence_pipeline::session::video_session_status;
use sparkfluence_pipeline::video::{self, VideoJobSettings, VideoProcessOutcome, BATCH_SUBMIT_PAUSE};

use super::{optional_session, require_session};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::extract::FunctionBody;
use crate::response::ok;
use crate::state::AppState;

const MISSING_SESSION: &str = "Missing session_id or user_id";
const STATUS_ENDPOINT: &str = "/functions/v1/check-video-status";
const POLLING_INTERVAL_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

fn default_language() -> String {
    "indonesian".into()
}

fn default_aspect_ratio() -> String {
    "9:16".into()
}

fn default_resolution() -> String {
    "1080p".into()
}

fn default_environment() -> String {
    "studio".into()
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub mode: Option<String>,
    pub user_id: Option<DbId>,
    pub session_id: Option<String>,
    pub job_id: Option<DbId>,
    /// Kept raw; segment normalization happens per mode.
    pub segments: Option<Value>,
    /// Older clients send images separately, index-aligned with segments.
    pub images: Option<Vec<Value>>,
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Dashboard choice: `auto`, `veo31` or `sora2`.
    pub preferred_platform: Option<String>,
    /// Batch-mode override, given as a platform key.
    pub prefer_platform: Option<String>,
}

impl VideoRequest {
    fn settings(&self, platform: VideoPlatform) -> VideoJobSettings<'_> {
        VideoJobSettings {
            platform,
            language: &self.language,
            aspect_ratio: &self.aspect_ratio,
            resolution: &self.resolution,
            environment: &self.environment,
            topic: &self.topic,
        }
    }

    fn normalized_segments(&self) -> AppResult<Vec<VideoSegment>> {
        let raw = segment_objects(self.segments.as_ref())?;
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, seg)| VideoSegment::from_raw(seg, i))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// POST /functions/v1/generate-videos
pub async fn generate_videos(
    State(state): State<AppState>,
    FunctionBody(req): FunctionBody<VideoRequest>,
) -> AppResult<Response> {
    let mode = req.mode.as_deref().unwrap_or("legacy");
    tracing::debug!(mode, "generate-videos request");

    match mode {
        "preview_prompts" => preview_prompts(&req),
        "create_jobs" => create_jobs(&state, &req).await,
        "process_single" => process_single(&state, &req).await,
        "check_and_update" => check_and_update(&state, &req).await,
        "check_status" => check_status(&state, &req).await,
        _ => legacy(&state, &req).await,
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn preview_prompts(req: &VideoRequest) -> AppResult<Response> {
    let segments = req.normalized_segments()?;
    let platform = VideoPlatform::from_preference(req.preferred_platform.as_deref());
    let ctx = req.settings(platform).prompt_context();

    let prompts: Vec<_> = segments
        .iter()
        .map(|seg| video::preview_prompt(seg, &ctx))
        .collect();

    tracing::info!(count = prompts.len(), platform = platform.key(), "Built prompt previews");

    Ok(ok(json!({
        "total": prompts.len(),
        "prompts": prompts,
        "metadata": {
            "topic": req.topic,
            "language": req.language,
            "aspect_ratio": req.aspect_ratio,
            "environment": req.environment,
        },
    })))
}

async fn create_jobs(state: &AppState, req: &VideoRequest) -> AppResult<Response> {
    const MISSING: &str = "Missing user_id, session_id, or segments";

    let session = require_session(req.session_id.as_deref(), req.user_id, MISSING)?;
    let segments = match req.segments {
        Some(_) => req.normalized_segments()?,
        None => return Err(AppError::invalid_input(MISSING)),
    };

    let platform = VideoPlatform::from_preference(req.preferred_platform.as_deref());
    let jobs = video::create_jobs(&state.pool, session, &segments, &req.settings(platform)).await?;

    Ok(ok(json!({
        "total_jobs": jobs.len(),
        "jobs": jobs,
        "session_id": session.session_id,
        "message": "Jobs created successfully. Start processing with process_single mode.",
    })))
}

async fn process_single(state: &AppState, req: &VideoRequest) -> AppResult<Response> {
    let veo = state.veo()?;
    let session = optional_session(req.session_id.as_deref(), req.user_id);

    match video::process_single(&state.pool, &veo, req.job_id, session).await? {
        VideoProcessOutcome::Waiting { processing_count } => Ok(ok(json!({
            "waiting": true,
            "processing_count": processing_count,
            "message": "Another job is still processing. Wait for it to complete before submitting a new job.",
        }))),
        VideoProcessOutcome::Idle(status) => Ok(ok(status)),
        VideoProcessOutcome::Submitted(job) => Ok(ok(json!({
            "job": job,
            "message": "Job submitted. Poll check_and_update to get the video URL.",
        }))),
        VideoProcessOutcome::Failed { job, message } => {
            Err(AppError::coded(ErrorCode::GenerationFailed, message).with_data(json!({ "job": job })))
        }
    }
}

async fn check_and_update(state: &AppState, req: &VideoRequest) -> AppResult<Response> {
    let session = require_session(req.session_id.as_deref(), req.user_id, MISSING_SESSION)?;
    let veo = state.veo()?;
    let storage = state.storage();
    if storage.is_none() {
        tracing::warn!("Storage not configured, finished clips keep their provider URLs");
    }

    let status = video::check_and_update(&state.pool, &veo, storage.as_ref(), session).await?;
    Ok(ok(status))
}

async fn check_status(state: &AppState, req: &VideoRequest) -> AppResult<Response> {
    let session = require_session(req.session_id.as_deref(), req.user_id, MISSING_SESSION)?;
    let status = video_session_status(&state.pool, session).await?;
    Ok(ok(status))
}

async fn legacy(state: &AppState, req: &VideoRequest) -> AppResult<Response> {
    let mut segments = req.normalized_segments()?;

    let images = req.images.as_deref().filter(|i| !i.is_empty());
    if let Some(images) = images {
        if images.len() != segments.len() {
            return Err(AppError::invalid_input("Segments and images count mismatch"));
        }
        for (segment, image) in segments.iter_mut().zip(images) {
            segment.image_url = image
                .get("image_url")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
                .map(str::to_string);
        }
    }

    let veo = state.veo()?;
    let platform = req
        .prefer_platform
        .as_deref()
        .and_then(VideoPlatform::from_key)
        .unwrap_or(VideoPlatform::Veo31Fast);
    let ctx: VideoPromptContext<'_> = req.settings(platform).prompt_context();
    let session = optional_session(req.session_id.as_deref(), req.user_id);

    tracing::info!(count = segments.len(), platform = platform.key(), "Submitting video batch");
    let (videos, stats) =
        video::submit_batch(&state.pool, &veo, &segments, &ctx, session, BATCH_SUBMIT_PAUSE).await;

    Ok(ok(json!({
        "videos": videos,
        "stats": stats,
        "polling_endpoint": STATUS_ENDPOINT,
        "polling_interval_seconds": POLLING_INTERVAL_SECS,
        "metadata": {
            "language": req.language,
            "aspect_ratio": req.aspect_ratio,
            "resolution": req.resolution,
            "topic": req.topic,
            "environment": req.environment,
        },
    })))
}
