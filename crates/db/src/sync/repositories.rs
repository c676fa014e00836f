use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::sync::models::SyncJobRecord;
use athena_common::error::AthenaResult;

#[async_trait]
pub trait SyncJobRecordRepository: Send + Sync {
    /// Current record for the job, or `None` if it has never run.
    async fn get_record(&self, job_name: &str) -> AthenaResult<Option<SyncJobRecord>>;

    /// Create (`expected_version = None`) or update the job's record.
    ///
    /// Updates only apply if the stored version still equals `expected_version`;
    /// otherwise `AthenaError::Conflict` is returned and nothing is written.
    /// The stored `last_run_at` never moves backward.
    async fn create_or_update(
        &self,
        job_name: &str,
        succeeded: bool,
        last_run_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AthenaResult<SyncJobRecord>;
}
