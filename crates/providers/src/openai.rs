//! OpenAI image generation: DALL-E 3 (URL responses) and gpt-image-1
//! (base64 responses, optional reference-image edit).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sparkfluence_core::image_provider::ImageSize;

use crate::error::ProviderError;
use crate::http;

const PROVIDER: &str = "OpenAI";

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

impl ImagesResponse {
    fn first(self) -> Result<ImageDatum, ProviderError> {
        self.data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: PROVIDER,
                detail: "empty data array".into(),
            })
    }
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Generate with DALL-E 3 and return the temporary image URL.
    pub async fn dalle3(&self, prompt: &str, size: ImageSize) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": "dall-e-3",
            "prompt": prompt,
            "n": 1,
            "size": size.to_string(),
            "quality": "hd",
            "style": "vivid",
            "response_format": "url",
        });
        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ImagesResponse = http::parse_response(PROVIDER, response).await?;
        parsed.first()?.url.ok_or_else(|| ProviderError::InvalidResponse {
            provider: PROVIDER,
            detail: "missing url".into(),
        })
    }

    /// Generate with gpt-image-1 and return decoded PNG bytes.
    pub async fn gpt_image(&self, prompt: &str, size: ImageSize) -> Result<Vec<u8>, ProviderError> {
        let body = serde_json::json!({
            "model": "gpt-image-1",
            "prompt": prompt,
            "n": 1,
            "size": size.to_string(),
            "quality": "high",
        });
        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: ImagesResponse = http::parse_response(PROVIDER, response).await?;
        decode_b64(parsed.first()?)
    }

    /// Edit a reference image with gpt-image-1 so the creator's face stays
    /// consistent. Returns decoded PNG bytes.
    pub async fn gpt_image_edit(
        &self,
        prompt: &str,
        size: ImageSize,
        reference_png: Vec<u8>,
    ) -> Result<Vec<u8>, ProviderError> {
        let image = Part::bytes(reference_png)
            .file_name("reference.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("model", "gpt-image-1")
            .text("prompt", prompt.to_string())
            .text("size", size.to_string())
            .text("quality", "high")
            .text("input_fidelity", "high")
            .part("image[]", image);

        let response = self
            .client
            .post(format!("{}/images/edits", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let parsed: ImagesResponse = http::parse_response(PROVIDER, response).await?;
        decode_b64(parsed.first()?)
    }
}

fn decode_b64(datum: ImageDatum) -> Result<Vec<u8>, ProviderError> {
    let encoded = datum.b64_json.ok_or_else(|| ProviderError::InvalidResponse {
        provider: PROVIDER,
        detail: "missing b64_json".into(),
    })?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ProviderError::InvalidResponse {
            provider: PROVIDER,
            detail: format!("invalid base64: {e}"),
        })
}
