//! Handler for `POST /functions/v1/check-video-status`.

use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::Value;
use sparkfluence_pipeline::adapters::{GatewayRehoster, PgOutcomeSink};
use sparkfluence_pipeline::{PollItem, PollOptions, StatusPoller};

use crate::error::{AppError, AppResult};
use crate::extract::FunctionBody;
use crate::response::ok;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Provider identifiers, as strings or `{ uuid, segment_type?, segment_number? }`.
    pub video_uuids: Option<Vec<Value>>,
    pub update_db: Option<bool>,
    pub upload_to_storage: Option<bool>,
}

/// POST /functions/v1/check-video-status
///
/// Polls the provider for each identifier in input order. Finished clips
/// are re-hosted in owned storage and written back to their job rows
/// unless the flags turn that off.
pub async fn check_video_status(
    State(state): State<AppState>,
    FunctionBody(req): FunctionBody<StatusRequest>,
) -> AppResult<Response> {
    let raw = req
        .video_uuids
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::invalid_input("Missing or invalid video_uuids array"))?;
    let veo = state.veo()?;

    let defaults = PollOptions::default();
    let options = PollOptions {
        update_db: req.update_db.unwrap_or(defaults.update_db),
        upload_to_storage: req.upload_to_storage.unwrap_or(defaults.upload_to_storage),
    };
    let items: Vec<PollItem> = raw.iter().map(PollItem::from_value).collect();

    let storage = state.storage();
    if options.upload_to_storage && storage.is_none() {
        tracing::warn!("Storage not configured, skipping re-hosting");
    }
    let rehoster = storage.as_ref().map(|storage| GatewayRehoster {
        veo: &veo,
        storage,
    });
    let sink = PgOutcomeSink { pool: &state.pool };

    let mut poller = StatusPoller::new(&veo).with_sink(&sink);
    if let Some(rehoster) = rehoster.as_ref() {
        poller = poller.with_store(rehoster);
    }

    let report = poller.poll(&items, options).await;
    tracing::info!(
        total = report.summary.total,
        completed = report.summary.completed,
        processing = report.summary.processing,
        failed = report.summary.failed,
        "Checked video status",
    );

    Ok(ok(report))
}
