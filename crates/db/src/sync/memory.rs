use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::sync::models::SyncJobRecord;
use crate::sync::pg_repository::stale_write;
use crate::sync::repositories::SyncJobRecordRepository;
use athena_common::error::{AthenaError, AthenaResult};

/// In-memory watermark store with the same versioning rules as the Postgres one.
#[derive(Clone, Default)]
pub struct MemorySyncJobRecordRepository {
    records: Arc<Mutex<HashMap<String, SyncJobRecord>>>,
}

impl MemorySyncJobRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncJobRecordRepository for MemorySyncJobRecordRepository {
    async fn get_record(&self, job_name: &str) -> AthenaResult<Option<SyncJobRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| AthenaError::Internal("sync record lock poisoned".to_string()))?;
        Ok(records.get(job_name).cloned())
    }

    async fn create_or_update(
        &self,
        job_name: &str,
        succeeded: bool,
        last_run_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AthenaResult<SyncJobRecord> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AthenaError::Internal("sync record lock poisoned".to_string()))?;

        let next = match (records.get(job_name), expected_version) {
            (None, None) => SyncJobRecord {
                job_name: job_name.to_string(),
                last_run_at,
                succeeded,
                version: 1,
                updated_at: Utc::now(),
            },
            (Some(current), Some(v)) if current.version == v => SyncJobRecord {
                job_name: job_name.to_string(),
                last_run_at: current.last_run_at.max(last_run_at),
                succeeded,
                version: v + 1,
                updated_at: Utc::now(),
            },
            _ => return Err(stale_write(job_name, expected_version)),
        };

        records.insert(job_name.to_string(), next.clone());
        Ok(next)
    }
}
