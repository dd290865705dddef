//! Image job lifecycle: creation with per-segment provider routing,
//! single-job generation, and the synchronous batch path.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sparkfluence_core::error::CoreError;
use sparkfluence_core::image_provider::{ImageProvider, ImageSize};
use sparkfluence_core::naming::{generated_image_key, IMAGE_BUCKET, IMAGE_CONTENT_TYPE};
use sparkfluence_core::prompts::{build_image_prompt, ImagePromptContext};
use sparkfluence_core::segments::ImageSegment;
use sparkfluence_core::status::{JobStatus, SessionSummary, StatusId};
use sparkfluence_core::types::DbId;
use sparkfluence_db::models::image_job::{ImageJob, NewImageJob};
use sparkfluence_db::repositories::ImageJobRepo;
use sparkfluence_db::DbPool;
use sparkfluence_providers::huggingface::FluxClient;
use sparkfluence_providers::openai::OpenAiClient;
use sparkfluence_providers::storage::StorageClient;
use sparkfluence_providers::ProviderError;

use crate::error::PipelineError;
use crate::session::{image_session_status, SessionRef, SessionStatus};

/// Pause between segments of the synchronous batch path.
pub const BATCH_GENERATE_PAUSE: Duration = Duration::from_millis(1500);

/// Request-level settings shared by every segment of a batch.
#[derive(Debug, Clone)]
pub struct ImageJobSettings<'a> {
    /// `auto` or an explicit provider key.
    pub provider_mode: &'a str,
    pub style: &'a str,
    pub aspect_ratio: &'a str,
    pub topic: &'a str,
    pub character_description: &'a str,
    /// Avatar URL used as the face reference for creator shots.
    pub character_ref_png: &'a str,
}

impl ImageJobSettings<'_> {
    fn provider_for(&self, segment: &ImageSegment) -> ImageProvider {
        ImageProvider::for_segment(self.provider_mode, segment.is_creator_shot())
    }

    fn prompt_for(&self, segment: &ImageSegment) -> String {
        let ctx = ImagePromptContext {
            style: self.style,
            aspect_ratio: self.aspect_ratio,
            topic: self.topic,
            character_description: self.character_description,
        };
        build_image_prompt(segment, &ctx)
    }

    /// Only creator shots keep a face reference.
    fn reference_for(&self, segment: &ImageSegment) -> Option<String> {
        if !segment.is_creator_shot() {
            return None;
        }
        segment
            .character_ref_png
            .clone()
            .or_else(|| Some(self.character_ref_png.to_string()))
            .filter(|r| !r.is_empty())
    }

    fn description_for(&self, segment: &ImageSegment) -> Option<String> {
        segment
            .character_description
            .clone()
            .or_else(|| Some(self.character_description.to_string()))
            .filter(|d| !d.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Routes a prompt to the configured provider and stores the result in
/// the image bucket.
pub struct ImageGenerator<'a> {
    pub openai: Option<&'a OpenAiClient>,
    pub flux: Option<&'a FluxClient>,
    pub storage: &'a StorageClient,
}

impl ImageGenerator<'_> {
    /// Fail early when the provider's credential is missing.
    pub fn ensure_configured(&self, provider: ImageProvider) -> Result<(), PipelineError> {
        if provider.uses_openai_key() {
            self.openai.map(|_| ()).ok_or(PipelineError::MissingKey("OPENAI_API_KEY"))
        } else {
            self.flux.map(|_| ()).ok_or(PipelineError::MissingKey("HUGGINGFACE_API_KEY"))
        }
    }

    /// Generate one image and return its public URL.
    pub async fn generate(
        &self,
        provider: ImageProvider,
        prompt: &str,
        aspect_ratio: &str,
        reference_url: Option<&str>,
    ) -> Result<String, PipelineError> {
        let size = provider.size_for_aspect(aspect_ratio);
        tracing::debug!(provider = provider.key(), size = %size, prompt_len = prompt.len(), "Generating image");

        let (prefix, bytes) = match provider {
            ImageProvider::OpenAi => {
                let openai = self.openai.ok_or(PipelineError::MissingKey("OPENAI_API_KEY"))?;
                let url = openai.dalle3(prompt, size).await?;
                ("dalle", self.storage.fetch(&url).await?)
            }
            ImageProvider::GptImage1 => {
                let openai = self.openai.ok_or(PipelineError::MissingKey("OPENAI_API_KEY"))?;
                self.gpt_image(openai, prompt, size, reference_url).await?
            }
            ImageProvider::HuggingFace => {
                let flux = self.flux.ok_or(PipelineError::MissingKey("HUGGINGFACE_API_KEY"))?;
                ("flux", flux.generate(prompt, size).await?)
            }
        };

        let key = generated_image_key(prefix, Utc::now().timestamp_millis());
        let url = self
            .storage
            .upload(IMAGE_BUCKET, &key, bytes, IMAGE_CONTENT_TYPE, false)
            .await?;
        Ok(url)
    }

    /// gpt-image-1 with the reference avatar when one is given. Any failure
    /// of the reference path falls back to plain generation.
    async fn gpt_image(
        &self,
        openai: &OpenAiClient,
        prompt: &str,
        size: ImageSize,
        reference_url: Option<&str>,
    ) -> Result<(&'static str, Vec<u8>), ProviderError> {
        if let Some(reference) = reference_url.filter(|r| !r.is_empty()) {
            match self.edit_with_reference(openai, prompt, size, reference).await {
                Ok(bytes) => return Ok(("gpt-image-1-ref", bytes)),
                Err(e) => {
                    tracing::warn!(error = %e, "Reference edit failed, generating without reference");
                }
            }
        }
        Ok(("gpt-image-1", openai.gpt_image(prompt, size).await?))
    }

    async fn edit_with_reference(
        &self,
        openai: &OpenAiClient,
        prompt: &str,
        size: ImageSize,
        reference_url: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let reference = self.storage.fetch(reference_url).await?;
        openai.gpt_image_edit(prompt, size, reference).await
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

pub fn new_jobs(
    session: SessionRef<'_>,
    segments: &[ImageSegment],
    settings: &ImageJobSettings<'_>,
) -> Vec<NewImageJob> {
    segments
        .iter()
        .map(|seg| {
            let provider = settings.provider_for(seg);
            tracing::debug!(
                segment = seg.segment_number,
                shot_type = %seg.shot_type,
                provider = provider.key(),
                "Routed image segment",
            );
            NewImageJob {
                user_id: session.user_id,
                session_id: session.session_id.to_string(),
                segment_id: seg.segment_id.clone(),
                segment_number: seg.segment_number,
                segment_type: seg.segment_type.clone(),
                shot_type: seg.shot_type.clone(),
                emotion: seg.emotion.clone(),
                visual_prompt: settings.prompt_for(seg),
                style: settings.style.to_string(),
                aspect_ratio: settings.aspect_ratio.to_string(),
                provider: provider.key().to_string(),
                topic: settings.topic.to_string(),
                character_description: settings.description_for(seg),
                character_ref_png: settings.reference_for(seg),
            }
        })
        .collect()
}

pub async fn create_jobs(
    pool: &DbPool,
    session: SessionRef<'_>,
    segments: &[ImageSegment],
    settings: &ImageJobSettings<'_>,
) -> Result<Vec<ImageJob>, PipelineError> {
    let jobs = new_jobs(session, segments, settings);
    let created = ImageJobRepo::insert_many(pool, &jobs).await?;
    tracing::info!(
        session_id = session.session_id,
        count = created.len(),
        provider_mode = settings.provider_mode,
        "Created image jobs",
    );
    Ok(created)
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageJobStub {
    pub id: DbId,
    pub segment_number: i32,
    pub segment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: StatusId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageJobStub {
    fn of(job: &ImageJob, status: JobStatus) -> Self {
        Self {
            id: job.id,
            segment_number: job.segment_number,
            segment_type: job.segment_type.clone(),
            image_url: None,
            status: status.id(),
            error: None,
        }
    }
}

#[derive(Debug)]
pub enum ImageProcessOutcome {
    /// No pending job left in the session.
    Idle(SessionStatus<ImageJob>),
    Completed {
        job: ImageJobStub,
        summary: SessionSummary,
        all_complete: bool,
    },
    /// Generation failed. The row is already marked failed.
    Failed { job: ImageJobStub, message: String },
}

/// Generate one job: the given one, or the next pending job of the session.
pub async fn process_single(
    pool: &DbPool,
    generator: &ImageGenerator<'_>,
    job_id: Option<DbId>,
    session: Option<SessionRef<'_>>,
) -> Result<ImageProcessOutcome, PipelineError> {
    let job = match (job_id, session) {
        (Some(id), _) => ImageJobRepo::find_by_id(pool, id)
            .await?
            .ok_or(PipelineError::JobNotFound)?,
        (None, Some(session)) => {
            match ImageJobRepo::next_pending(pool, session.session_id, session.user_id).await? {
                Some(job) => job,
                None => {
                    return Ok(ImageProcessOutcome::Idle(
                        image_session_status(pool, session, true).await?,
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

    let provider = ImageProvider::from_key(&job.provider).unwrap_or(ImageProvider::HuggingFace);
    generator.ensure_configured(provider)?;

    ImageJobRepo::mark_processing(pool, job.id).await?;
    tracing::info!(
        job_id = %job.id,
        segment = job.segment_number,
        provider = provider.key(),
        "Processing image job",
    );

    let generated = generator
        .generate(
            provider,
            &job.visual_prompt,
            &job.aspect_ratio,
            job.character_ref_png.as_deref(),
        )
        .await;

    match generated {
        Ok(url) => {
            ImageJobRepo::complete(pool, job.id, &url).await?;
            tracing::info!(job_id = %job.id, "Image job completed");

            let session = SessionRef {
                session_id: &job.session_id,
                user_id: job.user_id,
            };
            let status = image_session_status(pool, session, true).await?;

            let mut stub = ImageJobStub::of(&job, JobStatus::Completed);
            stub.image_url = Some(url);
            Ok(ImageProcessOutcome::Completed {
                job: stub,
                summary: status.summary,
                all_complete: status.all_complete,
            })
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(job_id = %job.id, error = %message, "Image generation failed");
            ImageJobRepo::mark_failed(pool, job.id, &message).await?;

            let mut stub = ImageJobStub::of(&job, JobStatus::Failed);
            stub.error = Some(message.clone());
            Ok(ImageProcessOutcome::Failed { job: stub, message })
        }
    }
}

// ---------------------------------------------------------------------------
// Synchronous batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BatchImageResult {
    pub segment_number: i32,
    pub segment_type: String,
    pub shot_type: String,
    pub emotion: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub provider: &'static str,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchImageStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

/// Generate every segment in turn with `pause` between segments.
pub async fn generate_batch(
    generator: &ImageGenerator<'_>,
    segments: &[ImageSegment],
    settings: &ImageJobSettings<'_>,
    pause: Duration,
) -> (Vec<BatchImageResult>, BatchImageStats) {
    let mut results = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let provider = settings.provider_for(segment);
        let prompt = settings.prompt_for(segment);
        let reference = settings.reference_for(segment);

        let outcome = match generator.ensure_configured(provider) {
            Ok(()) => {
                generator
                    .generate(provider, &prompt, settings.aspect_ratio, reference.as_deref())
                    .await
            }
            Err(e) => Err(e),
        };

        let (image_url, error) = match outcome {
            Ok(url) => (Some(url), None),
            Err(e) => {
                tracing::warn!(segment = segment.segment_number, provider = provider.key(), error = %e, "Batch image failed");
                (None, Some(e.to_string()))
            }
        };

        results.push(BatchImageResult {
            segment_number: segment.segment_number,
            segment_type: segment.segment_type.clone(),
            shot_type: segment.shot_type.clone(),
            emotion: segment.emotion.clone(),
            prompt,
            image_url,
            provider: provider.result_label(),
            error,
        });

        if i + 1 < segments.len() {
            tokio::time::sleep(pause).await;
        }
    }

    let success = results.iter().filter(|r| r.image_url.is_some()).count();
    let stats = BatchImageStats {
        total: results.len(),
        success,
        failed: results.len() - success,
    };
    (results, stats)
}
