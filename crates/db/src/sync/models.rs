use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partition shared by every watermark row.
pub const SYNC_JOB_RECORD_PARTITION: &str = "SyncJobRecord";

/// Watermark of a recurring job: one row per job name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobRecord {
    pub job_name: String,
    pub last_run_at: DateTime<Utc>,
    pub succeeded: bool,
    /// Bumped on every write; callers pass it back to update.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}
