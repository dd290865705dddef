//! Object storage over the Supabase Storage REST API.
//!
//! Uploads go to `POST {root}/object/{bucket}/{key}` authenticated with the
//! service key; public objects are served from
//! `{root}/object/public/{bucket}/{key}`.

use crate::error::ProviderError;
use crate::http;

const PROVIDER: &str = "Storage";

#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(client: reqwest::Client, base_url: String, service_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    /// Public URL of an object. Does not check that it exists.
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/object/public/{bucket}/{key}", self.base_url)
    }

    /// Upload `bytes` and return the object's public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/object/{bucket}/{key}", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;

        http::ensure_success(PROVIDER, response).await?;
        Ok(self.public_url(bucket, key))
    }

    /// Download an arbitrary public URL (reference images, temporary
    /// provider URLs).
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.get(url).send().await?;
        http::read_bytes("Download", response).await
    }
}
