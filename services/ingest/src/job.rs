use async_trait::async_trait;
use athena_common::error::AthenaResult;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub job: String,
    pub ingested_blobs: usize,
    pub upserted: usize,
    pub skipped_blobs: usize,
    /// Watermark stored at the end of the run.
    pub watermark: DateTime<Utc>,
}

#[async_trait]
pub trait SyncJob: Send + Sync {
    fn job_name(&self) -> &str;
    async fn run(&self) -> AthenaResult<SyncResult>;
}
