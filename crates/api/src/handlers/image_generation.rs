//! Handler for `POST /functions/v1/generate-images`.

use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{json, Value};
use sparkfluence_core::image_provider::PROVIDER_AUTO;
use sparkfluence_core::segments::{segment_objects, ImageSegment};
use sparkfluence_core::types::DbId;
use sparkfluence_pipeline::image::{
    self, ImageGenerator, ImageJobSettings, ImageProcessOutcome, BATCH_GENERATE_PAUSE,
};
use sparkfluence_pipeline::session::image_session_status;

use super::{optional_session, require_session};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::extract::FunctionBody;
use crate::response::ok;
use crate::state::AppState;

fn default_style() -> String {
    "cinematic".into()
}

fn default_aspect_ratio() -> String {
    "9:16".into()
}

fn default_provider() -> String {
    PROVIDER_AUTO.into()
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub mode: Option<String>,
    pub user_id: Option<DbId>,
    pub session_id: Option<String>,
    pub job_id: Option<DbId>,
    pub segments: Option<Value>,
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// `auto` (per-segment routing) or a provider key.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub character_description: String,
    /// Avatar URL used as the face reference for creator shots.
    #[serde(default)]
    pub character_ref_png: String,
}

impl ImageRequest {
    fn settings(&self) -> ImageJobSettings<'_> {
        ImageJobSettings {
            provider_mode: &self.provider,
            style: &self.style,
            aspect_ratio: &self.aspect_ratio,
            topic: &self.topic,
            character_description: &self.character_description,
            character_ref_png: &self.character_ref_png,
        }
    }

    fn normalized_segments(&self) -> AppResult<Vec<ImageSegment>> {
        let raw = segment_objects(self.segments.as_ref())?;
        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, seg)| ImageSegment::from_raw(seg, i))
            .collect())
    }
}

/// POST /functions/v1/generate-images
pub async fn generate_images(
    State(state): State<AppState>,
    FunctionBody(req): FunctionBody<ImageRequest>,
) -> AppResult<Response> {
    let mode = req.mode.as_deref().unwrap_or("legacy");
    tracing::debug!(mode, provider_mode = %req.provider, "generate-images request");

    match mode {
        "create_jobs" => create_jobs(&state, &req).await,
        "process_single" => process_single(&state, &req).await,
        "check_status" => check_status(&state, &req).await,
        _ => legacy(&state, &req).await,
    }
}

async fn create_jobs(state: &AppState, req: &ImageRequest) -> AppResult<Response> {
    const MISSING: &str = "Missing user_id, session_id, or segments";

    let session = require_session(req.session_id.as_deref(), req.user_id, MISSING)?;
    if req.segments.is_none() {
        return Err(AppError::invalid_input(MISSING));
    }
    let segments = req.normalized_segments()?;

    let jobs = image::create_jobs(&state.pool, session, &segments, &req.settings()).await?;

    Ok(ok(json!({
        "total_jobs": jobs.len(),
        "jobs": jobs,
        "session_id": session.session_id,
        "message": "Jobs created successfully. You can now process them.",
    })))
}

async fn process_single(state: &AppState, req: &ImageRequest) -> AppResult<Response> {
    let session = optional_session(req.session_id.as_deref(), req.user_id);
    let storage = state.require_storage()?;
    let openai = state.openai();
    let flux = state.flux();
    let generator = ImageGenerator {
        openai: openai.as_ref(),
        flux: flux.as_ref(),
        storage: &storage,
    };

    match image::process_single(&state.pool, &generator, req.job_id, session).await? {
        ImageProcessOutcome::Idle(status) => Ok(ok(json!({
            "status": "no_pending_jobs",
            "summary": status.summary,
            "all_complete": status.all_complete,
        }))),
        ImageProcessOutcome::Completed {
            job,
            summary,
            all_complete,
        } => Ok(ok(json!({
            "job": job,
            "summary": summary,
            "all_complete": all_complete,
        }))),
        ImageProcessOutcome::Failed { job, message } => {
            Err(AppError::coded(ErrorCode::GenerationFailed, message).with_data(json!({ "job": job })))
        }
    }
}

async fn check_status(state: &AppState, req: &ImageRequest) -> AppResult<Response> {
    let session = require_session(
        req.session_id.as_deref(),
        req.user_id,
        "Missing session_id or user_id",
    )?;
    let status = image_session_status(&state.pool, session, false).await?;
    Ok(ok(status))
}

async fn legacy(state: &AppState, req: &ImageRequest) -> AppResult<Response> {
    let segments = req.normalized_segments()?;

    let openai = state.openai();
    let flux = state.flux();
    if openai.is_none() && flux.is_none() {
        return Err(AppError::config("No image generation API keys configured"));
    }
    let storage = state.require_storage()?;
    let generator = ImageGenerator {
        openai: openai.as_ref(),
        flux: flux.as_ref(),
        storage: &storage,
    };

    tracing::info!(
        count = segments.len(),
        provider_mode = %req.provider,
        style = %req.style,
        aspect_ratio = %req.aspect_ratio,
        "Generating image batch",
    );
    let (images, stats) =
        image::generate_batch(&generator, &segments, &req.settings(), BATCH_GENERATE_PAUSE).await;

    Ok(ok(json!({
        "images": images,
        "stats": stats,
        "provider_mode": req.provider,
        "metadata": {
            "topic": req.topic,
            "aspect_ratio": req.aspect_ratio,
            "style": req.style,
        },
    })))
}
