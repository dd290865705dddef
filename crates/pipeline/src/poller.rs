//! Video status poller.
//!
//! Given a batch of provider identifiers, fetch each one's status, re-host
//! finished clips into owned storage, and optionally write the outcome back
//! to the job rows. Items are checked one after another and each item's
//! failure is isolated to its own record.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sparkfluence_core::error::CoreError;
use sparkfluence_core::naming;
use sparkfluence_core::status::JobStatus;
use sparkfluence_providers::veo::{HistoryLookup, VideoHistory};

use crate::error::PipelineError;

/// Pause before the single re-host retry.
pub const REHOST_RETRY_DELAY: Duration = Duration::from_secs(2);

pub const ERROR_NOT_FOUND: &str = "NOT_FOUND";
pub const ERROR_CHECK: &str = "CHECK_ERROR";
pub const ERROR_PROCESSING: &str = "PROCESSING_ERROR";

const DEFAULT_FAILURE_MESSAGE: &str = "Video generation failed";

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Where provider-side job status comes from.
#[async_trait]
pub trait VideoStatusSource: Send + Sync {
    async fn lookup(&self, uuid: &str) -> Result<HistoryLookup, PipelineError>;
}

/// Owned object storage for finished clips.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Copy the asset at `source_url` into storage under `object_key` and
    /// return its public URL.
    async fn rehost(&self, source_url: &str, object_key: &str) -> Result<String, PipelineError>;
}

/// Write-back of terminal outcomes, keyed by provider identifier.
#[async_trait]
pub trait JobOutcomeSink: Send + Sync {
    async fn completed(
        &self,
        uuid: &str,
        video_url: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<(), PipelineError>;

    async fn failed(&self, uuid: &str, error_message: &str) -> Result<(), PipelineError>;
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// One identifier to check, with optional segment metadata used to label
/// the re-hosted object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollItem {
    pub uuid: String,
    pub segment_type: Option<String>,
    pub segment_number: Option<i64>,
}

impl PollItem {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    /// Accept either a bare identifier string or an object
    /// `{ uuid, segment_type?, segment_number? }`. Anything else becomes an
    /// item whose check fails, so the output still lines up with the input.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(uuid) => Self::new(uuid.clone()),
            Value::Object(map) => Self {
                uuid: map
                    .get("uuid")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                segment_type: map
                    .get("segment_type")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                segment_number: map.get("segment_number").and_then(Value::as_i64),
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Write terminal outcomes back to the job rows.
    pub update_db: bool,
    /// Re-host finished clips into owned storage.
    pub upload_to_storage: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            update_db: true,
            upload_to_storage: true,
        }
    }
}

/// Status of one polled identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoStatusRecord {
    pub uuid: String,
    pub segment_type: Option<String>,
    pub segment_number: Option<i64>,
    /// Provider status code: 1 processing, 2 completed, 3 failed.
    pub status: i64,
    pub status_percentage: Value,
    pub video_url: Option<String>,
    pub storage_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VideoStatusRecord {
    fn failed(item: &PollItem, code: &str, message: String) -> Self {
        Self {
            uuid: item.uuid.clone(),
            segment_type: item.segment_type.clone(),
            segment_number: item.segment_number,
            status: i64::from(JobStatus::Failed.id()),
            status_percentage: Value::from(0),
            video_url: None,
            storage_url: None,
            thumbnail_url: None,
            duration: None,
            resolution: None,
            aspect_ratio: None,
            error_code: Some(code.to_string()),
            error_message: Some(message),
        }
    }

    fn from_history(item: &PollItem, history: &VideoHistory) -> Self {
        Self {
            uuid: history
                .uuid
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| item.uuid.clone()),
            segment_type: item.segment_type.clone(),
            segment_number: item.segment_number,
            status: history.status.unwrap_or_default(),
            status_percentage: history
                .status_percentage
                .clone()
                .map(Value::Number)
                .unwrap_or_else(|| Value::from(0)),
            video_url: None,
            storage_url: None,
            thumbnail_url: history.thumbnail_url.clone().filter(|u| !u.is_empty()),
            duration: None,
            resolution: None,
            aspect_ratio: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_provider(self.status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollReport {
    pub videos: Vec<VideoStatusRecord>,
    pub summary: PollSummary,
    pub all_completed: bool,
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

pub struct StatusPoller<'a> {
    source: &'a dyn VideoStatusSource,
    store: Option<&'a dyn AssetStore>,
    sink: Option<&'a dyn JobOutcomeSink>,
    retry_delay: Duration,
}

impl<'a> StatusPoller<'a> {
    pub fn new(source: &'a dyn VideoStatusSource) -> Self {
        Self {
            source,
            store: None,
            sink: None,
            retry_delay: REHOST_RETRY_DELAY,
        }
    }

    pub fn with_store(mut self, store: &'a dyn AssetStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn JobOutcomeSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Check every item in order. Always returns one record per item.
    pub async fn poll(&self, items: &[PollItem], options: PollOptions) -> PollReport {
        let mut videos = Vec::with_capacity(items.len());
        let mut summary = PollSummary {
            total: items.len(),
            ..PollSummary::default()
        };

        for item in items {
            let record = match self.check(item, options).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(uuid = %item.uuid, error = %e, "Video status check failed");
                    VideoStatusRecord::failed(item, ERROR_CHECK, e.to_string())
                }
            };

            match record.job_status() {
                JobStatus::Completed => summary.completed += 1,
                JobStatus::Failed => summary.failed += 1,
                _ => summary.processing += 1,
            }
            videos.push(record);
        }

        PollReport {
            videos,
            all_completed: summary.processing == 0 && summary.failed == 0,
            summary,
        }
    }

    async fn check(
        &self,
        item: &PollItem,
        options: PollOptions,
    ) -> Result<VideoStatusRecord, PipelineError> {
        if item.uuid.is_empty() {
            return Err(CoreError::Validation("missing uuid".into()).into());
        }

        let history = match self.source.lookup(&item.uuid).await? {
            HistoryLookup::Found(history) => history,
            HistoryLookup::Missing { status } => {
                return Ok(VideoStatusRecord::failed(
                    item,
                    ERROR_NOT_FOUND,
                    format!("Video not found (HTTP {status})"),
                ));
            }
        };

        let mut record = VideoStatusRecord::from_history(item, &history);

        match history.job_status() {
            JobStatus::Completed => {
                if let Some(output) = history.output() {
                    record.duration = output.duration.clone();
                    record.resolution = output.resolution.clone();
                    record.aspect_ratio = output.aspect_ratio.clone();
                }
                record.video_url = history.asset_url().map(str::to_string);
                tracing::info!(uuid = %item.uuid, url = ?record.video_url, "Video completed");

                if let (true, Some(store), Some(external)) =
                    (options.upload_to_storage, self.store, record.video_url.clone())
                {
                    if let Some(owned) = self.rehost(store, item, &external).await {
                        record.storage_url = Some(owned.clone());
                        record.video_url = Some(owned);
                    }
                }

                if let (true, Some(sink)) = (options.update_db, self.sink) {
                    if let Err(e) = sink
                        .completed(
                            &item.uuid,
                            record.video_url.as_deref(),
                            record.thumbnail_url.as_deref(),
                        )
                        .await
                    {
                        tracing::error!(uuid = %item.uuid, error = %e, "Failed to record completed video");
                    }
                }
            }
            JobStatus::Failed => {
                let code = non_empty(history.error_code.as_deref()).unwrap_or(ERROR_PROCESSING);
                let message = non_empty(history.error_message.as_deref())
                    .or_else(|| non_empty(history.status_desc.as_deref()))
                    .unwrap_or(DEFAULT_FAILURE_MESSAGE);
                tracing::info!(uuid = %item.uuid, error = message, "Video failed");
                record.error_code = Some(code.to_string());
                record.error_message = Some(message.to_string());

                if let (true, Some(sink)) = (options.update_db, self.sink) {
                    if let Err(e) = sink.failed(&item.uuid, message).await {
                        tracing::error!(uuid = %item.uuid, error = %e, "Failed to record failed video");
                    }
                }
            }
            _ => {
                tracing::debug!(uuid = %item.uuid, progress = %record.status_percentage, "Video processing");
            }
        }

        Ok(record)
    }

    /// Re-host with one retry after `retry_delay`. `None` means both
    /// attempts failed and the caller keeps the provider URL.
    async fn rehost(&self, store: &dyn AssetStore, item: &PollItem, url: &str) -> Option<String> {
        match rehost_once(store, item, url).await {
            Ok(owned) => return Some(owned),
            Err(e) => {
                tracing::warn!(uuid = %item.uuid, error = %e, "Storage upload failed, retrying");
            }
        }

        tokio::time::sleep(self.retry_delay).await;

        match rehost_once(store, item, url).await {
            Ok(owned) => Some(owned),
            Err(e) => {
                tracing::error!(uuid = %item.uuid, error = %e, "Storage upload retry failed, keeping provider URL");
                None
            }
        }
    }
}

async fn rehost_once(
    store: &dyn AssetStore,
    item: &PollItem,
    url: &str,
) -> Result<String, PipelineError> {
    let key = naming::rehosted_video_key(
        Utc::now().timestamp_millis(),
        &item.uuid,
        item.segment_type.as_deref(),
        item.segment_number,
    );
    store.rehost(url, &key).await
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use serde_json::json;
    use sparkfluence_providers::ProviderError;

    use super::*;

    enum Answer {
        History(Value),
        Missing(u16),
        Broken,
    }

    #[derive(Default)]
    struct FakeSource {
        answers: HashMap<String, Answer>,
    }

    impl FakeSource {
        fn with(mut self, uuid: &str, answer: Answer) -> Self {
            self.answers.insert(uuid.to_string(), answer);
            self
        }
    }

    #[async_trait]
    impl VideoStatusSource for FakeSource {
        async fn lookup(&self, uuid: &str) -> Result<HistoryLookup, PipelineError> {
            match self.answers.get(uuid) {
                Some(Answer::History(body)) => Ok(HistoryLookup::Found(
                    serde_json::from_value(body.clone()).unwrap(),
                )),
                Some(Answer::Missing(status)) => Ok(HistoryLookup::Missing { status: *status }),
                Some(Answer::Broken) | None => Err(ProviderError::InvalidResponse {
                    provider: "VEO",
                    detail: "expected value at line 1 column 1".into(),
                }
                .into()),
            }
        }
    }

    /// Scripted upload outcomes, consumed in order. Succeeds once the
    /// script runs out.
    #[derive(Default)]
    struct FakeStore {
        outcomes: Mutex<VecDeque<bool>>,
        keys: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn scripted(outcomes: &[bool]) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                keys: Mutex::default(),
            }
        }

        fn calls(&self) -> usize {
            self.keys.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AssetStore for FakeStore {
        async fn rehost(&self, _source_url: &str, object_key: &str) -> Result<String, PipelineError> {
            self.keys.lock().unwrap().push(object_key.to_string());
            let ok = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(format!("https://owned.test/{object_key}"))
            } else {
                Err(ProviderError::Rejected("upload failed".into()).into())
            }
        }
    }

    #[derive(Default)]
    struct FakeSink {
        writes: Mutex<Vec<(String, String)>>,
        broken: bool,
    }

    #[async_trait]
    impl JobOutcomeSink for FakeSink {
        async fn completed(
            &self,
            uuid: &str,
            video_url: Option<&str>,
            _thumbnail_url: Option<&str>,
        ) -> Result<(), PipelineError> {
            if self.broken {
                return Err(sqlx::Error::PoolTimedOut.into());
            }
            self.writes
                .lock()
                .unwrap()
                .push((uuid.to_string(), video_url.unwrap_or_default().to_string()));
            Ok(())
        }

        async fn failed(&self, uuid: &str, error_message: &str) -> Result<(), PipelineError> {
            if self.broken {
                return Err(sqlx::Error::PoolTimedOut.into());
            }
            self.writes
                .lock()
                .unwrap()
                .push((uuid.to_string(), error_message.to_string()));
            Ok(())
        }
    }

    fn completed(url: &str) -> Answer {
        Answer::History(json!({
            "status": 2,
            "status_percentage": 100,
            "thumbnail_url": "https://provider.test/thumb.jpg",
            "generated_video": [{ "file_download_url": url, "duration": 8, "resolution": "720p" }]
        }))
    }

    fn items(uuids: &[&str]) -> Vec<PollItem> {
        uuids.iter().map(|u| PollItem::new(*u)).collect()
    }

    fn poller<'a>(source: &'a FakeSource, store: &'a FakeStore, sink: &'a FakeSink) -> StatusPoller<'a> {
        StatusPoller::new(source)
            .with_store(store)
            .with_sink(sink)
            .with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn one_record_per_input_in_order() {
        let source = FakeSource::default()
            .with("a", completed("https://provider.test/a.mp4"))
            .with("b", Answer::Missing(404))
            .with("c", Answer::Broken)
            .with("d", Answer::History(json!({ "status": 1, "status_percentage": 40 })));
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let input = vec![
            PollItem::new("a"),
            PollItem::new("b"),
            PollItem::new("c"),
            PollItem::new("d"),
            PollItem::default(),
        ];
        let report = poller(&source, &store, &sink).poll(&input, PollOptions::default()).await;

        assert_eq!(report.videos.len(), input.len());
        let uuids: Vec<_> = report.videos.iter().map(|v| v.uuid.as_str()).collect();
        assert_eq!(uuids, ["a", "b", "c", "d", ""]);
        assert_eq!(
            report.summary,
            PollSummary { total: 5, completed: 1, processing: 1, failed: 3 }
        );
        assert!(!report.all_completed);

        assert_eq!(report.videos[1].error_code.as_deref(), Some(ERROR_NOT_FOUND));
        assert_eq!(
            report.videos[1].error_message.as_deref(),
            Some("Video not found (HTTP 404)")
        );
        assert_eq!(report.videos[2].error_code.as_deref(), Some(ERROR_CHECK));
        assert_eq!(report.videos[4].error_code.as_deref(), Some(ERROR_CHECK));
        assert_eq!(report.videos[3].status_percentage, json!(40));
    }

    #[tokio::test]
    async fn terminal_records_carry_url_or_message() {
        let source = FakeSource::default()
            .with("done", completed("https://provider.test/done.mp4"))
            .with("bad", Answer::History(json!({ "status": 3, "status_desc": "moderation" })))
            .with("odd", Answer::History(json!({ "status": 7 })));
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let report = poller(&source, &store, &sink)
            .poll(&items(&["done", "bad", "odd"]), PollOptions::default())
            .await;

        let done = &report.videos[0];
        assert_eq!(done.job_status(), JobStatus::Completed);
        assert!(done.video_url.is_some());
        assert_eq!(done.duration, Some(json!(8)));

        let bad = &report.videos[1];
        assert_eq!(bad.error_code.as_deref(), Some(ERROR_PROCESSING));
        assert_eq!(bad.error_message.as_deref(), Some("moderation"));

        assert_eq!(report.videos[2].job_status(), JobStatus::Processing);
        assert_eq!(report.summary.processing, 1);
    }

    #[tokio::test]
    async fn failure_message_falls_back_to_default() {
        let source = FakeSource::default()
            .with("x", Answer::History(json!({ "status": 3, "error_code": "SAFETY" })));
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let report = poller(&source, &store, &sink)
            .poll(&items(&["x"]), PollOptions::default())
            .await;

        assert_eq!(report.videos[0].error_code.as_deref(), Some("SAFETY"));
        assert_eq!(
            report.videos[0].error_message.as_deref(),
            Some(DEFAULT_FAILURE_MESSAGE)
        );
        assert_eq!(
            sink.writes.lock().unwrap().as_slice(),
            [("x".to_string(), DEFAULT_FAILURE_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn null_output_list_while_rendering_stays_processing() {
        let source = FakeSource::default().with(
            "p",
            Answer::History(json!({
                "uuid": "p",
                "status": 1,
                "status_percentage": 30,
                "generated_video": null
            })),
        );
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let report = poller(&source, &store, &sink)
            .poll(&items(&["p"]), PollOptions::default())
            .await;

        let video = &report.videos[0];
        assert_eq!(video.job_status(), JobStatus::Processing);
        assert_eq!(video.error_code, None);
        assert_eq!(video.status_percentage, json!(30));
        assert_eq!(
            report.summary,
            PollSummary { total: 1, completed: 0, processing: 1, failed: 0 }
        );
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rehost_retry_then_success_uses_owned_url() {
        let source = FakeSource::default()
            .with("a1b2c3d4e5", completed("https://provider.test/a.mp4"));
        let store = FakeStore::scripted(&[false, true]);
        let sink = FakeSink::default();

        let input = vec![PollItem {
            uuid: "a1b2c3d4e5".into(),
            segment_type: Some("HOOK".into()),
            segment_number: Some(1),
        }];
        let report = poller(&source, &store, &sink).poll(&input, PollOptions::default()).await;

        assert_eq!(store.calls(), 2);
        let video = &report.videos[0];
        let owned = video.video_url.as_deref().unwrap();
        assert!(owned.starts_with("https://owned.test/"));
        assert!(owned.ends_with("_HOOK_a1b2c3d4.mp4"));
        assert_eq!(video.storage_url.as_deref(), Some(owned));
        assert_eq!(sink.writes.lock().unwrap()[0].1, owned);
    }

    #[tokio::test]
    async fn rehost_failing_twice_keeps_provider_url() {
        let source = FakeSource::default().with("a", completed("https://provider.test/a.mp4"));
        let store = FakeStore::scripted(&[false, false]);
        let sink = FakeSink::default();

        let report = poller(&source, &store, &sink)
            .poll(&items(&["a"]), PollOptions::default())
            .await;

        assert_eq!(store.calls(), 2);
        let video = &report.videos[0];
        assert_eq!(video.video_url.as_deref(), Some("https://provider.test/a.mp4"));
        assert_eq!(video.storage_url, None);
        assert_eq!(report.summary.completed, 1);
        assert_eq!(sink.writes.lock().unwrap()[0].1, "https://provider.test/a.mp4");
    }

    #[tokio::test]
    async fn completed_and_failed_pair_counts_as_all_completed() {
        let source = FakeSource::default()
            .with("uuid-A", completed("https://provider.test/a.mp4"))
            .with("uuid-B", Answer::History(json!({ "status": 3 })));
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let report = poller(&source, &store, &sink)
            .poll(&items(&["uuid-A", "uuid-B"]), PollOptions::default())
            .await;

        assert_eq!(
            report.summary,
            PollSummary { total: 2, completed: 1, processing: 0, failed: 1 }
        );
        assert!(report.all_completed);
        assert_eq!(sink.writes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn flags_disable_storage_and_write_back() {
        let source = FakeSource::default().with("a", completed("https://provider.test/a.mp4"));
        let (store, sink) = (FakeStore::default(), FakeSink::default());

        let options = PollOptions {
            update_db: false,
            upload_to_storage: false,
        };
        let report = poller(&source, &store, &sink).poll(&items(&["a"]), options).await;

        assert_eq!(store.calls(), 0);
        assert!(sink.writes.lock().unwrap().is_empty());
        assert_eq!(
            report.videos[0].video_url.as_deref(),
            Some("https://provider.test/a.mp4")
        );
    }

    #[tokio::test]
    async fn write_back_errors_do_not_change_the_record() {
        let source = FakeSource::default().with("a", completed("https://provider.test/a.mp4"));
        let store = FakeStore::default();
        let sink = FakeSink {
            broken: true,
            ..FakeSink::default()
        };

        let report = poller(&source, &store, &sink)
            .poll(&items(&["a"]), PollOptions::default())
            .await;

        assert_eq!(report.videos[0].job_status(), JobStatus::Completed);
        assert_eq!(report.videos[0].error_code, None);
        assert!(report.all_completed);
    }

    #[test]
    fn poll_item_accepts_strings_and_objects() {
        assert_eq!(PollItem::from_value(&json!("abc")), PollItem::new("abc"));
        assert_eq!(
            PollItem::from_value(&json!({ "uuid": "abc", "segment_type": "CTA", "segment_number": 4 })),
            PollItem {
                uuid: "abc".into(),
                segment_type: Some("CTA".into()),
                segment_number: Some(4),
            }
        );
        assert_matches!(PollItem::from_value(&json!(12)), PollItem { uuid, .. } if uuid.is_empty());
    }
}
