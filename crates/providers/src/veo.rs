//! Client for the image-to-video gateway (VEO 3.1 and Sora 2).
//!
//! Submissions are multipart forms; status is polled through
//! `GET /history/{uuid}`. Both endpoints authenticate with `x-api-key`,
//! and so do the download URLs of finished clips.

use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use sparkfluence_core::status::JobStatus;
use sparkfluence_core::video_models::VideoPlatform;

use crate::error::ProviderError;
use crate::http;

const PROVIDER: &str = "VEO";

/// Markers in an error body that mean the upstream model is overloaded.
const RATE_LIMIT_MARKERS: &[&str] = &["GEMINI_RATE_LIMIT", "high traffic"];

/// HTTP client for the video generation gateway.
#[derive(Clone)]
pub struct VeoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// One image-to-video request.
#[derive(Debug, Clone)]
pub struct VideoSubmission<'a> {
    pub platform: VideoPlatform,
    pub prompt: &'a str,
    pub resolution: &'a str,
    pub aspect_ratio: &'a str,
    /// Public URL of the reference frame.
    pub reference_image_url: &'a str,
}

/// Body returned by a successful submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmitResponse {
    pub id: Option<serde_json::Value>,
    pub uuid: Option<String>,
    pub model_name: Option<String>,
    pub status: Option<i64>,
    pub status_percentage: Option<serde_json::Number>,
    pub estimated_credit: Option<serde_json::Value>,
    pub video_url: Option<String>,
}

/// A generation record from `/history/{uuid}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoHistory {
    pub uuid: Option<String>,
    /// 1 = processing, 2 = completed, 3 = failed.
    pub status: Option<i64>,
    pub status_percentage: Option<serde_json::Number>,
    pub status_desc: Option<String>,
    pub thumbnail_url: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub generated_video: Option<Vec<GeneratedVideo>>,
}

/// One rendered output attached to a history record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratedVideo {
    pub file_download_url: Option<String>,
    pub video_url: Option<String>,
    pub duration: Option<serde_json::Value>,
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
}

/// Outcome of a history lookup.
#[derive(Debug, Clone)]
pub enum HistoryLookup {
    Found(VideoHistory),
    /// The gateway answered with a non-2xx status.
    Missing { status: u16 },
}

impl VideoHistory {
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_provider(self.status.unwrap_or_default())
    }

    /// The first rendered output, if any.
    pub fn output(&self) -> Option<&GeneratedVideo> {
        self.generated_video.as_deref()?.first()
    }

    /// Download URL of the first output, preferring `file_download_url`.
    pub fn asset_url(&self) -> Option<&str> {
        let output = self.output()?;
        non_empty(&output.file_download_url).or_else(|| non_empty(&output.video_url))
    }
}

/// Whether an error body from the gateway signals upstream overload.
pub fn is_rate_limited(body: &str) -> bool {
    RATE_LIMIT_MARKERS.iter().any(|m| body.contains(m))
}

impl VeoClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, platform: VideoPlatform) -> String {
        match platform {
            VideoPlatform::Veo31Fast => format!("{}/video-gen/veo", self.base_url),
            VideoPlatform::Sora2Hd => format!("{}/video-gen/sora", self.base_url),
        }
    }

    /// Submit an image-to-video job. The returned `uuid` is what
    /// [`Self::history`] is polled with.
    pub async fn submit(&self, req: &VideoSubmission<'_>) -> Result<SubmitResponse, ProviderError> {
        let form = Form::new()
            .text("prompt", req.prompt.to_string())
            .text("model", req.platform.api_model())
            .text("resolution", req.resolution.to_string())
            .text("aspect_ratio", req.aspect_ratio.to_string())
            .text("ref_images", req.reference_image_url.to_string());

        let response = self
            .client
            .post(self.endpoint(req.platform))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_rate_limited(&body) {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::ApiError {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let submitted: SubmitResponse = response.json().await?;
        if submitted.uuid.as_deref().is_none_or(str::is_empty) {
            return Err(ProviderError::InvalidResponse {
                provider: PROVIDER,
                detail: "missing uuid".into(),
            });
        }
        Ok(submitted)
    }

    /// Fetch the generation record for `uuid`.
    ///
    /// A non-2xx answer is reported as [`HistoryLookup::Missing`] rather
    /// than an error; transport failures and malformed bodies are errors.
    pub async fn history(&self, uuid: &str) -> Result<HistoryLookup, ProviderError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, uuid))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HistoryLookup::Missing {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        tracing::debug!(uuid, status = status.as_u16(), body = %truncate(&text, 300), "History response");
        let history = serde_json::from_str::<VideoHistory>(&text).map_err(|e| {
            ProviderError::InvalidResponse {
                provider: PROVIDER,
                detail: e.to_string(),
            }
        })?;
        Ok(HistoryLookup::Found(history))
    }

    /// Download a finished clip. Gateway URLs need the API key.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        http::read_bytes(PROVIDER, response).await
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.is_empty())
}

fn truncate(text: &str, max: usize) -> &str {
    sparkfluence_core::prompts::truncate_chars(text, max)
}
