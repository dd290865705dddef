//! Production implementations of the poller seams.

use async_trait::async_trait;
use sparkfluence_core::naming::{VIDEO_BUCKET, VIDEO_CONTENT_TYPE};
use sparkfluence_db::repositories::VideoJobRepo;
use sparkfluence_db::DbPool;
use sparkfluence_providers::storage::StorageClient;
use sparkfluence_providers::veo::{HistoryLookup, VeoClient};

use crate::error::PipelineError;
use crate::poller::{AssetStore, JobOutcomeSink, VideoStatusSource};

#[async_trait]
impl VideoStatusSource for VeoClient {
    async fn lookup(&self, uuid: &str) -> Result<HistoryLookup, PipelineError> {
        Ok(self.history(uuid).await?)
    }
}

/// Downloads clips from the video gateway (the download needs the gateway
/// key) and uploads them to the video bucket.
pub struct GatewayRehoster<'a> {
    pub veo: &'a VeoClient,
    pub storage: &'a StorageClient,
}

#[async_trait]
impl AssetStore for GatewayRehoster<'_> {
    async fn rehost(&self, source_url: &str, object_key: &str) -> Result<String, PipelineError> {
        let bytes = self.veo.download(source_url).await?;
        tracing::debug!(key = object_key, size = bytes.len(), "Uploading clip to storage");
        let url = self
            .storage
            .upload(VIDEO_BUCKET, object_key, bytes, VIDEO_CONTENT_TYPE, true)
            .await?;
        Ok(url)
    }
}

/// Writes poll outcomes to `video_generation_jobs` by provider identifier.
pub struct PgOutcomeSink<'a> {
    pub pool: &'a DbPool,
}

#[async_trait]
impl JobOutcomeSink for PgOutcomeSink<'_> {
    async fn completed(
        &self,
        uuid: &str,
        video_url: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<(), PipelineError> {
        let rows = VideoJobRepo::complete_by_uuid(self.pool, uuid, video_url, thumbnail_url).await?;
        tracing::debug!(uuid, rows, "Recorded completed video");
        Ok(())
    }

    async fn failed(&self, uuid: &str, error_message: &str) -> Result<(), PipelineError> {
        let rows = VideoJobRepo::fail_by_uuid(self.pool, uuid, error_message).await?;
        tracing::debug!(uuid, rows, "Recorded failed video");
        Ok(())
    }
}
