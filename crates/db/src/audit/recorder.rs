use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::audit::models::SyncJobStatusRecord;
use crate::table::TableRepository;
use athena_common::error::AthenaResult;

const UNKNOWN_FAILURE: &str = "unknown failure";

#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Append the outcome of one execution. Called exactly once per run.
    async fn record_run(
        &self,
        succeeded: bool,
        failure_reason: Option<&str>,
    ) -> AthenaResult<SyncJobStatusRecord>;
}

/// Appends [`SyncJobStatusRecord`]s for one job into a table store.
#[derive(Clone)]
pub struct AuditTrailRecorder<R> {
    job_name: String,
    table: R,
}

impl<R> AuditTrailRecorder<R>
where
    R: TableRepository<SyncJobStatusRecord>,
{
    pub fn new(job_name: impl Into<String>, table: R) -> Self {
        Self {
            job_name: job_name.into(),
            table,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }
}

#[async_trait]
impl<R> AuditTrail for AuditTrailRecorder<R>
where
    R: TableRepository<SyncJobStatusRecord>,
{
    async fn record_run(
        &self,
        succeeded: bool,
        failure_reason: Option<&str>,
    ) -> AthenaResult<SyncJobStatusRecord> {
        let failure_reason = if succeeded {
            None
        } else {
            Some(
                failure_reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(UNKNOWN_FAILURE)
                    .to_string(),
            )
        };

        let record = SyncJobStatusRecord {
            id: Uuid::new_v4(),
            job_name: self.job_name.clone(),
            ran_at: Utc::now(),
            succeeded,
            failure_reason,
        };

        self.table.insert(record).await
    }
}

/// Most recent runs of `job_name`, newest first.
pub async fn recent_runs<R>(
    table: &R,
    job_name: &str,
    limit: usize,
) -> AthenaResult<Vec<SyncJobStatusRecord>>
where
    R: TableRepository<SyncJobStatusRecord> + ?Sized,
{
    let mut runs = table.list(job_name).await?;
    runs.sort_by(|a, b| b.ran_at.cmp(&a.ran_at));
    runs.truncate(limit);
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryTableStore;

    fn recorder() -> (
        AuditTrailRecorder<MemoryTableStore<SyncJobStatusRecord>>,
        MemoryTableStore<SyncJobStatusRecord>,
    ) {
        let table = MemoryTableStore::new();
        (AuditTrailRecorder::new("NewsSyncJob", table.clone()), table)
    }

    #[tokio::test]
    async fn success_has_no_reason() {
        let (rec, _) = recorder();
        let entry = rec.record_run(true, Some("ignored")).await.unwrap();
        assert!(entry.succeeded);
        assert_eq!(entry.failure_reason, None);
        assert_eq!(entry.job_name, "NewsSyncJob");
    }

    #[tokio::test]
    async fn failure_always_carries_a_reason() {
        let (rec, _) = recorder();
        let with = rec.record_run(false, Some("blob store offline")).await.unwrap();
        assert_eq!(with.failure_reason.as_deref(), Some("blob store offline"));

        let blank = rec.record_run(false, Some("   ")).await.unwrap();
        assert_eq!(blank.failure_reason.as_deref(), Some(UNKNOWN_FAILURE));

        let none = rec.record_run(false, None).await.unwrap();
        assert_eq!(none.failure_reason.as_deref(), Some(UNKNOWN_FAILURE));
    }

    #[tokio::test]
    async fn every_call_appends_a_distinct_record() {
        let (rec, table) = recorder();
        rec.record_run(true, None).await.unwrap();
        rec.record_run(false, Some("boom")).await.unwrap();
        rec.record_run(true, None).await.unwrap();

        let runs = table.list("NewsSyncJob").await.unwrap();
        assert_eq!(runs.len(), 3);
    }

    #[tokio::test]
    async fn recent_runs_newest_first_and_limited() {
        let (rec, table) = recorder();
        let first = rec.record_run(true, None).await.unwrap();
        let mut later = rec.record_run(false, Some("boom")).await.unwrap();
        // Guarantee a strictly later stamp regardless of clock resolution.
        table.delete("NewsSyncJob", &later.id.to_string()).await.unwrap();
        later.ran_at = first.ran_at + chrono::Duration::seconds(1);
        table.insert(later.clone()).await.unwrap();

        let runs = recent_runs(&table, "NewsSyncJob", 1).await.unwrap();
        assert_eq!(runs, vec![later]);
        assert!(recent_runs(&table, "EventsSyncJob", 10).await.unwrap().is_empty());
    }
}
