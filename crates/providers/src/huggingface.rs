//! FLUX.1-schnell on the HuggingFace inference router.

use std::time::Duration;

use sparkfluence_core::image_provider::ImageSize;

use crate::error::ProviderError;
use crate::http;

const PROVIDER: &str = "FLUX";
const MODEL_PATH: &str = "black-forest-labs/FLUX.1-schnell";

/// Per-request ceiling; cold starts on the router can be slow.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct FluxClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FluxClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Generate an image. The router answers with the raw image bytes.
    pub async fn generate(&self, prompt: &str, size: ImageSize) -> Result<Vec<u8>, ProviderError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": { "width": size.width, "height": size.height },
        });
        tracing::debug!(size = %size, prompt_len = prompt.len(), "FLUX request");

        let response = self
            .client
            .post(format!("{}/{MODEL_PATH}", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(GENERATION_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        http::read_bytes(PROVIDER, response).await
    }
}
