use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::table::TableEntity;

/// One immutable entry per job execution. Partitioned by job name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobStatusRecord {
    pub id: Uuid,
    pub job_name: String,
    pub ran_at: DateTime<Utc>,
    pub succeeded: bool,
    pub failure_reason: Option<String>,
}

impl TableEntity for SyncJobStatusRecord {
    const TABLE: &'static str = "sync_job_status";

    fn partition_key(&self) -> String {
        self.job_name.clone()
    }

    fn row_key(&self) -> String {
        self.id.to_string()
    }
}
