//! Video job lifecycle: creation, prompt preview, single-job submission,
//! session polling, and the synchronous batch path.

use std::time::Duration;

use serde::Serialize;
use sparkfluence_core::error::CoreError;
use sparkfluence_core::prompts::{
    build_video_prompt, dialogue_preview, truncate_chars, VideoPromptContext,
    STORED_PROMPT_MAX_CHARS,
};
use sparkfluence_core::segments::VideoSegment;
use sparkfluence_core::status::{JobStatus, StatusId};
use sparkfluence_core::types::DbId;
use sparkfluence_core::video_models::{
    check_dialogue_length, resolution_for_aspect, DialogueCheck, VideoPlatform,
};
use sparkfluence_db::models::video_job::{NewVideoJob, SubmittedVideoJob, VideoJob};
use sparkfluence_db::repositories::VideoJobRepo;
use sparkfluence_db::DbPool;
use sparkfluence_providers::storage::StorageClient;
use sparkfluence_providers::veo::{SubmitResponse, VeoClient, VideoSubmission};
use sparkfluence_providers::ProviderError;

use crate::adapters::{GatewayRehoster, PgOutcomeSink};
use crate::error::PipelineError;
use crate::poller::{PollItem, PollOptions, StatusPoller};
use crate::session::{video_session_status, SessionRef, SessionStatus};

/// Pause between submissions of the synchronous batch path.
pub const BATCH_SUBMIT_PAUSE: Duration = Duration::from_secs(2);

/// Request-level settings shared by every job of a `create_jobs` batch.
#[derive(Debug, Clone)]
pub struct VideoJobSettings<'a> {
    pub platform: VideoPlatform,
    pub language: &'a str,
    pub aspect_ratio: &'a str,
    pub resolution: &'a str,
    pub environment: &'a str,
    pub topic: &'a str,
}

impl<'a> VideoJobSettings<'a> {
    pub fn prompt_context(&self) -> VideoPromptContext<'a> {
        VideoPromptContext {
            platform: self.platform,
            language: self.language,
            aspect_ratio: self.aspect_ratio,
            environment: self.environment,
            topic: self.topic,
        }
    }
}

/// Minimal view of a job returned by `process_single`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoJobStub {
    pub id: DbId,
    pub segment_number: i32,
    pub segment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veo_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<&'static str>,
    pub status: StatusId,
}

impl VideoJobStub {
    fn of(job: &VideoJob, status: JobStatus) -> Self {
        Self {
            id: job.id,
            segment_number: job.segment_number,
            segment_type: job.segment_type.clone(),
            veo_uuid: None,
            platform: None,
            status: status.id(),
        }
    }
}

#[derive(Debug)]
pub enum VideoProcessOutcome {
    /// Another job of the session is still rendering; nothing was submitted.
    Waiting { processing_count: i64 },
    /// No pending job left in the session.
    Idle(SessionStatus<VideoJob>),
    Submitted(VideoJobStub),
    /// The provider refused the job. The row is already marked failed.
    Failed { job: VideoJobStub, message: String },
}

// ---------------------------------------------------------------------------
// Creation and preview
// ---------------------------------------------------------------------------

/// Build one pending job per segment.
pub fn new_jobs(
    session: SessionRef<'_>,
    segments: &[VideoSegment],
    settings: &VideoJobSettings<'_>,
) -> Vec<NewVideoJob> {
    segments
        .iter()
        .map(|seg| NewVideoJob {
            user_id: session.user_id,
            session_id: session.session_id.to_string(),
            segment_id: seg.segment_id.clone(),
            segment_number: seg.segment_number,
            segment_type: seg.segment_type.clone(),
            shot_type: seg.shot_type.clone(),
            emotion: seg.emotion.clone(),
            script_text: seg.script_text.clone(),
            image_url: seg.image_url.clone(),
            duration_seconds: seg.duration_seconds,
            language: settings.language.to_string(),
            aspect_ratio: settings.aspect_ratio.to_string(),
            resolution: settings.resolution.to_string(),
            environment: settings.environment.to_string(),
            topic: settings.topic.to_string(),
            preferred_platform: settings.platform.key().to_string(),
            platform: settings.platform.key().to_string(),
        })
        .collect()
}

/// Upsert the session's jobs, resetting any that already exist.
pub async fn create_jobs(
    pool: &DbPool,
    session: SessionRef<'_>,
    segments: &[VideoSegment],
    settings: &VideoJobSettings<'_>,
) -> Result<Vec<VideoJob>, PipelineError> {
    let jobs = new_jobs(session, segments, settings);
    let created = VideoJobRepo::upsert_many(pool, &jobs).await?;
    tracing::info!(
        session_id = session.session_id,
        count = created.len(),
        platform = settings.platform.key(),
        "Created video jobs",
    );
    Ok(created)
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptPreview {
    pub segment_id: String,
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub platform: &'static str,
    pub platform_name: &'static str,
    pub duration: i32,
    pub max_duration: i32,
    pub resolution: &'static str,
    pub has_dialogue: bool,
    pub dialogue_preview: String,
    pub dialogue_validation: DialogueCheck,
    pub prompt: String,
    pub image_url: Option<String>,
}

pub fn preview_prompt(segment: &VideoSegment, ctx: &VideoPromptContext<'_>) -> PromptPreview {
    let platform = ctx.platform;
    let dialogue_validation = if segment.has_dialogue() {
        check_dialogue_length(&segment.script_text, platform)
    } else {
        DialogueCheck {
            valid: true,
            word_count: 0,
            max_words: 0,
            message: None,
        }
    };

    PromptPreview {
        segment_id: segment.segment_id.clone(),
        segment_number: segment.segment_number,
        segment_type: segment.segment_type.clone(),
        shot_type: segment.shot_type.clone(),
        platform: platform.key(),
        platform_name: platform.display_name(),
        duration: platform.clamp_duration(segment.duration_seconds),
        max_duration: platform.max_duration_secs(),
        resolution: platform.resolution_label(),
        has_dialogue: segment.has_dialogue(),
        dialogue_preview: dialogue_preview(&segment.script_text),
        dialogue_validation,
        prompt: build_video_prompt(segment, ctx),
        image_url: segment.image_url.clone(),
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A submission accepted by the provider.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub uuid: String,
    pub prompt: String,
    pub response: SubmitResponse,
}

/// Build the prompt for `segment` and submit it with `image_url` as the
/// reference frame.
pub async fn submit_segment(
    veo: &VeoClient,
    segment: &VideoSegment,
    ctx: &VideoPromptContext<'_>,
    image_url: &str,
) -> Result<Submitted, ProviderError> {
    let prompt = build_video_prompt(segment, ctx);
    let request = VideoSubmission {
        platform: ctx.platform,
        prompt: &prompt,
        resolution: resolution_for_aspect(ctx.aspect_ratio),
        aspect_ratio: ctx.aspect_ratio,
        reference_image_url: image_url,
    };
    tracing::debug!(
        segment = segment.segment_number,
        platform = ctx.platform.key(),
        prompt_len = prompt.len(),
        "Submitting video",
    );

    let response = veo.submit(&request).await?;
    Ok(Submitted {
        uuid: response.uuid.clone().unwrap_or_default(),
        prompt,
        response,
    })
}

fn segment_of(job: &VideoJob) -> VideoSegment {
    VideoSegment {
        segment_id: job.segment_id.clone(),
        segment_number: job.segment_number,
        segment_type: job.segment_type.clone(),
        shot_type: job.shot_type.clone(),
        emotion: job.emotion.clone(),
        script_text: job.script_text.clone(),
        image_url: job.image_url.clone(),
        duration_seconds: job.duration_seconds,
        character_name: None,
        transition: None,
    }
}

/// Submit one job: the given one, or the next pending job of the session.
///
/// When a session is given and one of its jobs is already rendering,
/// nothing is submitted and [`VideoProcessOutcome::Waiting`] is returned.
pub async fn process_single(
    pool: &DbPool,
    veo: &VeoClient,
    job_id: Option<DbId>,
    session: Option<SessionRef<'_>>,
) -> Result<VideoProcessOutcome, PipelineError> {
    if let Some(session) = session {
        let processing_count =
            VideoJobRepo::count_processing(pool, session.session_id, session.user_id).await?;
        if processing_count > 0 {
            tracing::info!(session_id = session.session_id, processing_count, "Waiting for job in flight");
            return Ok(VideoProcessOutcome::Waiting { processing_count });
        }
    }

    let job = match (job_id, session) {
        (Some(id), _) => VideoJobRepo::find_by_id(pool, id)
            .await?
            .ok_or(PipelineError::JobNotFound)?,
        (None, Some(session)) => {
            match VideoJobRepo::next_pending(pool, session.session_id, session.user_id).await? {
                Some(job) => job,
                None => {
                    return Ok(VideoProcessOutcome::Idle(
                        video_session_status(pool, session).await?,
                    ))
                }
            }
        }
        (None, None) => {
            return Err(CoreError::Validation(
                "Provide job_id or (session_id + user_id)".into(),
            )
            .into())
        }
    };

    let Some(image_url) = job.image_url.clone().filter(|u| !u.is_empty()) else {
        VideoJobRepo::mark_failed(pool, job.id, "No image URL").await?;
        return Err(PipelineError::NoImage);
    };

    VideoJobRepo::mark_processing(pool, job.id).await?;
    tracing::info!(
        job_id = %job.id,
        segment = job.segment_number,
        segment_type = %job.segment_type,
        "Processing video job",
    );

    let platform = VideoPlatform::from_key(&job.preferred_platform).unwrap_or(VideoPlatform::Veo31Fast);
    let ctx = VideoPromptContext {
        platform,
        language: &job.language,
        aspect_ratio: &job.aspect_ratio,
        environment: &job.environment,
        topic: &job.topic,
    };

    match submit_segment(veo, &segment_of(&job), &ctx, &image_url).await {
        Ok(submitted) => {
            VideoJobRepo::record_submission(
                pool,
                job.id,
                &submitted.uuid,
                platform.key(),
                truncate_chars(&submitted.prompt, STORED_PROMPT_MAX_CHARS),
            )
            .await?;
            tracing::info!(job_id = %job.id, uuid = %submitted.uuid, "Video job submitted");

            let mut stub = VideoJobStub::of(&job, JobStatus::Processing);
            stub.veo_uuid = Some(submitted.uuid);
            stub.platform = Some(platform.key());
            Ok(VideoProcessOutcome::Submitted(stub))
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(job_id = %job.id, error = %message, "Video submission failed");
            VideoJobRepo::mark_failed(pool, job.id, &message).await?;
            Ok(VideoProcessOutcome::Failed {
                job: VideoJobStub::of(&job, JobStatus::Failed),
                message,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Poll every submitted job of the session with database write-back, then
/// report the session status. Without storage configured, clips keep their
/// provider URLs.
pub async fn check_and_update(
    pool: &DbPool,
    veo: &VeoClient,
    storage: Option<&StorageClient>,
    session: SessionRef<'_>,
) -> Result<SessionStatus<VideoJob>, PipelineError> {
    let submitted = VideoJobRepo::list_submitted(pool, session.session_id, session.user_id).await?;

    if !submitted.is_empty() {
        let items: Vec<PollItem> = submitted
            .iter()
            .filter_map(|job| {
                job.veo_uuid.as_ref().map(|uuid| PollItem {
                    uuid: uuid.clone(),
                    segment_type: Some(job.segment_type.clone()).filter(|t| !t.is_empty()),
                    segment_number: Some(i64::from(job.segment_number)),
                })
            })
            .collect();

        let sink = PgOutcomeSink { pool };
        let rehoster = storage.map(|storage| GatewayRehoster { veo, storage });
        let mut poller = StatusPoller::new(veo).with_sink(&sink);
        if let Some(rehoster) = rehoster.as_ref() {
            poller = poller.with_store(rehoster);
        }

        let report = poller.poll(&items, PollOptions::default()).await;
        tracing::info!(
            session_id = session.session_id,
            checked = report.summary.total,
            completed = report.summary.completed,
            failed = report.summary.failed,
            "Checked submitted video jobs",
        );
    }

    video_session_status(pool, session).await
}

// ---------------------------------------------------------------------------
// Synchronous batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BatchVideoResult {
    pub segment_number: i32,
    pub segment_id: String,
    pub segment_type: String,
    /// Platform key, or `none` when the segment had no image.
    pub platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veo_response: Option<SubmitResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub estimated_cost: f64,
}

/// Submit every segment in turn, pausing `pause` after each accepted
/// submission except the last. With a session, each accepted submission is
/// recorded as a processing job. Per-segment errors stay in that segment's
/// result.
pub async fn submit_batch(
    pool: &DbPool,
    veo: &VeoClient,
    segments: &[VideoSegment],
    ctx: &VideoPromptContext<'_>,
    session: Option<SessionRef<'_>>,
    pause: Duration,
) -> (Vec<BatchVideoResult>, BatchStats) {
    let platform = ctx.platform;
    let mut results = Vec::with_capacity(segments.len());
    let mut stats = BatchStats::default();

    for (i, segment) in segments.iter().enumerate() {
        let mut result = BatchVideoResult {
            segment_number: segment.segment_number,
            segment_id: segment.segment_id.clone(),
            segment_type: segment.segment_type.clone(),
            platform: platform.key(),
            model_name: None,
            veo_response: None,
            error: None,
        };

        let Some(image_url) = segment.image_url.as_deref().filter(|u| !u.is_empty()) else {
            result.platform = "none";
            result.error = Some("No image URL provided".into());
            results.push(result);
            continue;
        };

        match submit_segment(veo, segment, ctx, image_url).await {
            Ok(submitted) => {
                stats.estimated_cost += platform.price_usd();

                if let Some(session) = session {
                    let row = SubmittedVideoJob {
                        user_id: session.user_id,
                        session_id: session.session_id.to_string(),
                        segment_id: segment.segment_id.clone(),
                        segment_type: segment.segment_type.clone(),
                        veo_uuid: submitted.uuid.clone(),
                        platform: platform.key().to_string(),
                        prompt: truncate_chars(&submitted.prompt, STORED_PROMPT_MAX_CHARS).to_string(),
                        image_url: image_url.to_string(),
                    };
                    if let Err(e) = VideoJobRepo::upsert_submitted(pool, &row).await {
                        tracing::warn!(segment_id = %row.segment_id, error = %e, "Failed to record submitted job");
                    }
                }

                result.model_name = Some(platform.display_name());
                result.veo_response = Some(submitted.response);
                results.push(result);

                if i + 1 < segments.len() {
                    tokio::time::sleep(pause).await;
                }
            }
            Err(e) => {
                tracing::warn!(segment = segment.segment_number, error = %e, "Batch submission failed");
                result.error = Some(e.to_string());
                results.push(result);
            }
        }
    }

    stats.total = results.len();
    stats.success = results.iter().filter(|r| r.error.is_none()).count();
    stats.failed = stats.total - stats.success;
    (results, stats)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn settings() -> VideoJobSettings<'static> {
        VideoJobSettings {
            platform: VideoPlatform::Sora2Hd,
            language: "english",
            aspect_ratio: "9:16",
            resolution: "1080p",
            environment: "studio",
            topic: "fitness",
        }
    }

    #[test]
    fn new_jobs_carry_session_and_settings() {
        let raw = json!({ "type": "HOOK", "script": "Hello there", "imageUrl": "https://img/1.png" });
        let segments = vec![VideoSegment::from_raw(raw.as_object().unwrap(), 0)];
        let session = SessionRef {
            session_id: "sess-1",
            user_id: DbId::nil(),
        };

        let jobs = new_jobs(session, &segments, &settings());
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.session_id, "sess-1");
        assert_eq!(job.segment_id, "1");
        assert_eq!(job.segment_type, "HOOK");
        assert_eq!(job.script_text, "Hello there");
        assert_eq!(job.image_url.as_deref(), Some("https://img/1.png"));
        assert_eq!(job.preferred_platform, "sora-2-hd");
        assert_eq!(job.duration_seconds, 8);
    }

    #[test]
    fn preview_clamps_duration_and_flags_long_dialogue() {
        let long_script = vec!["word"; 30].join(" ");
        let raw = json!({ "type": "HOOK", "script_text": long_script, "duration_seconds": 15 });
        let segment = VideoSegment::from_raw(raw.as_object().unwrap(), 0);

        let preview = preview_prompt(&segment, &settings().prompt_context());
        assert_eq!(preview.duration, 10);
        assert_eq!(preview.max_duration, 10);
        assert_eq!(preview.platform, "sora-2-hd");
        assert!(preview.has_dialogue);
        assert!(!preview.dialogue_validation.valid);
        assert!(preview.dialogue_preview.ends_with("..."));
        assert!(preview.prompt.contains("DIALOGUE"));
    }

    #[test]
    fn preview_without_dialogue_is_valid() {
        let raw = json!({ "type": "PROBLEM" });
        let segment = VideoSegment::from_raw(raw.as_object().unwrap(), 1);

        let preview = preview_prompt(&segment, &settings().prompt_context());
        assert!(!preview.has_dialogue);
        assert!(preview.dialogue_validation.valid);
        assert_eq!(preview.dialogue_validation.max_words, 0);
        assert_eq!(preview.dialogue_preview, "");
    }

    #[test]
    fn stub_serializes_without_empty_fields() {
        let stub = VideoJobStub {
            id: DbId::nil(),
            segment_number: 2,
            segment_type: "CTA".into(),
            veo_uuid: None,
            platform: None,
            status: JobStatus::Failed.id(),
        };
        let value = serde_json::to_value(&stub).unwrap();
        assert_eq!(value["status"], 3);
        assert!(value.get("veo_uuid").is_none());
    }
}
