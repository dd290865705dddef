use std::sync::Arc;

use sparkfluence_providers::fonnte::FonnteClient;
use sparkfluence_providers::huggingface::FluxClient;
use sparkfluence_providers::openai::OpenAiClient;
use sparkfluence_providers::storage::StorageClient;
use sparkfluence_providers::veo::VeoClient;
use sparkfluence_providers::ProviderConfig;

use crate::config::ServerConfig;
use crate::error::AppError;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and the HTTP client are handles, configs
/// sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sparkfluence_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Provider credentials and base URLs.
    pub providers: Arc<ProviderConfig>,
    /// Shared outbound HTTP client.
    pub http: reqwest::Client,
}

impl AppState {
    /// Video gateway client, or `CONFIG_ERROR` without `VEO_API_KEY`.
    pub fn veo(&self) -> Result<VeoClient, AppError> {
        let key = self
            .providers
            .veo_api_key
            .clone()
            .ok_or_else(|| AppError::config("VEO_API_KEY not configured"))?;
        Ok(VeoClient::new(
            self.http.clone(),
            self.providers.veo_base_url.clone(),
            key,
        ))
    }

    pub fn openai(&self) -> Option<OpenAiClient> {
        self.providers.openai_api_key.clone().map(|key| {
            OpenAiClient::new(self.http.clone(), self.providers.openai_base_url.clone(), key)
        })
    }

    pub fn flux(&self) -> Option<FluxClient> {
        self.providers.huggingface_api_key.clone().map(|key| {
            FluxClient::new(
                self.http.clone(),
                self.providers.huggingface_base_url.clone(),
                key,
            )
        })
    }

    /// Object storage client when both the URL and the service key are set.
    pub fn storage(&self) -> Option<StorageClient> {
        let url = self.providers.storage_url.clone()?;
        let key = self.providers.storage_service_key.clone()?;
        Some(StorageClient::new(self.http.clone(), url, key))
    }

    pub fn require_storage(&self) -> Result<StorageClient, AppError> {
        self.storage()
            .ok_or_else(|| AppError::config("Storage not configured"))
    }

    /// WhatsApp gateway client, or `CONFIG_ERROR` without `FONNTE_API_TOKEN`.
    pub fn fonnte(&self) -> Result<FonnteClient, AppError> {
        let token = self
            .providers
            .fonnte_api_token
            .clone()
            .ok_or_else(|| AppError::config("WhatsApp service not configured"))?;
        Ok(FonnteClient::new(
            self.http.clone(),
            self.providers.fonnte_base_url.clone(),
            token,
        ))
    }
}
