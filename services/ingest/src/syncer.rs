use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use athena_blob::{pull_since, BlobStore, IncrementalPull};
use athena_common::error::AthenaResult;
use athena_db::audit::recorder::AuditTrail;
use athena_db::sync::models::SyncJobRecord;
use athena_db::sync::repositories::SyncJobRecordRepository;
use athena_db::table::{TableEntity, TableRepository};
use chrono::{DateTime, Utc};

use crate::config::SyncJobConfig;
use crate::job::{SyncJob, SyncResult};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Pulls blobs published after the job's watermark into a table.
///
/// The watermark only moves forward after every record of the window has been
/// written, so a failed run is retried from the same place (at-least-once).
/// Row keys are domain ids, which keeps a retried window from duplicating rows.
pub struct IncrementalSyncer<T, B, S, A, R> {
    config: SyncJobConfig,
    blobs: B,
    records: S,
    audit: A,
    table: R,
    clock: Clock,
    _record: PhantomData<fn() -> T>,
}

impl<T, B, S, A, R> IncrementalSyncer<T, B, S, A, R>
where
    T: TableEntity,
    B: BlobStore,
    S: SyncJobRecordRepository,
    A: AuditTrail,
    R: TableRepository<T>,
{
    pub fn new(config: SyncJobConfig, blobs: B, records: S, audit: A, table: R) -> Self {
        Self {
            config,
            blobs,
            records,
            audit,
            table,
            clock: Arc::new(Utc::now),
            _record: PhantomData,
        }
    }

    /// Replace the clock that supplies the run instant.
    #[cfg(test)]
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn watermark(record: Option<&SyncJobRecord>) -> DateTime<Utc> {
        record.map_or(DateTime::UNIX_EPOCH, |r| r.last_run_at)
    }

    async fn ingest(&self, record: Option<&SyncJobRecord>) -> AthenaResult<SyncResult> {
        let job = self.config.job_name.as_str();
        let container = self.config.container.as_str();
        let watermark = Self::watermark(record);
        let now = (self.clock)();

        let pull: IncrementalPull<T> = pull_since(&self.blobs, container, watermark, now).await?;

        tracing::info!(
            job,
            container,
            %watermark,
            blobs = pull.ingested.len(),
            records = pull.records.len(),
            skipped = pull.skipped.len(),
            "pulled new blobs"
        );

        let ingested_blobs = pull.ingested.len();
        let skipped_blobs = pull.skipped.len();
        let next_watermark = pull.newest.map_or(watermark, |newest| newest.max(watermark));

        let mut upserted = 0;
        for item in pull.records {
            self.table.upsert(item).await?;
            upserted += 1;
        }

        let stored = self
            .records
            .create_or_update(job, true, next_watermark, record.map(|r| r.version))
            .await?;

        Ok(SyncResult {
            job: job.to_string(),
            ingested_blobs,
            upserted,
            skipped_blobs,
            watermark: stored.last_run_at,
        })
    }

    /// Flag the failure on the watermark record without moving its timestamp.
    async fn mark_failed(&self, record: Option<&SyncJobRecord>) {
        let job = self.config.job_name.as_str();
        if let Err(e) = self
            .records
            .create_or_update(job, false, Self::watermark(record), record.map(|r| r.version))
            .await
        {
            tracing::warn!(job, error = %e, "could not flag failed run on watermark record");
        }
    }
}

#[async_trait]
impl<T, B, S, A, R> SyncJob for IncrementalSyncer<T, B, S, A, R>
where
    T: TableEntity,
    B: BlobStore,
    S: SyncJobRecordRepository,
    A: AuditTrail,
    R: TableRepository<T>,
{
    fn job_name(&self) -> &str {
        &self.config.job_name
    }

    async fn run(&self) -> AthenaResult<SyncResult> {
        let job = self.config.job_name.as_str();

        let outcome = match self.records.get_record(job).await {
            Ok(record) => {
                let result = self.ingest(record.as_ref()).await;
                if result.is_err() {
                    self.mark_failed(record.as_ref()).await;
                }
                result
            }
            Err(e) => Err(e),
        };

        let audited = match &outcome {
            Ok(_) => self.audit.record_run(true, None).await,
            Err(e) => self.audit.record_run(false, Some(&e.to_string())).await,
        };

        match (outcome, audited) {
            (Ok(result), Ok(_)) => {
                tracing::info!(?result, "sync job completed");
                Ok(result)
            }
            (Ok(_), Err(audit_err)) => {
                tracing::error!(
                    job,
                    error = %audit_err,
                    "sync job succeeded but audit write failed"
                );
                Err(audit_err)
            }
            (Err(e), audited) => {
                if let Err(audit_err) = audited {
                    tracing::error!(job, error = %audit_err, "audit write failed");
                }
                tracing::error!(job, error = %e, "sync job failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_blob::MemoryBlobStore;
    use athena_common::error::AthenaError;
    use athena_db::audit::models::SyncJobStatusRecord;
    use athena_db::audit::recorder::AuditTrailRecorder;
    use athena_db::content::models::NewsArticle;
    use athena_db::sync::memory::MemorySyncJobRecordRepository;
    use athena_db::table::MemoryTableStore;
    use chrono::TimeZone;

    const JOB: &str = "NewsSyncJob";
    const CONTAINER: &str = "athena-news";

    type Audit = AuditTrailRecorder<MemoryTableStore<SyncJobStatusRecord>>;
    type TestSyncer<S, R> = IncrementalSyncer<NewsArticle, Arc<MemoryBlobStore>, S, Audit, R>;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    fn next_day_at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, h, m, s).unwrap()
    }

    fn article_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "newsId": id,
            "title": format!("Article {id}"),
            "url": format!("https://example.com/{id}"),
            "publishedAt": "2024-03-01T00:00:00Z"
        })
    }

    // ── Harness ─────────────────────────────────────────────────

    struct Harness {
        blobs: Arc<MemoryBlobStore>,
        records: MemorySyncJobRecordRepository,
        audit: MemoryTableStore<SyncJobStatusRecord>,
        news: MemoryTableStore<NewsArticle>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                blobs: Arc::new(MemoryBlobStore::new()),
                records: MemorySyncJobRecordRepository::new(),
                audit: MemoryTableStore::new(),
                news: MemoryTableStore::new(),
            }
        }

        fn config() -> SyncJobConfig {
            SyncJobConfig {
                job_name: JOB.to_string(),
                container: CONTAINER.to_string(),
            }
        }

        fn build<S, R>(&self, records: S, table: R) -> TestSyncer<S, R>
        where
            S: SyncJobRecordRepository,
            R: TableRepository<NewsArticle>,
        {
            IncrementalSyncer::new(
                Self::config(),
                Arc::clone(&self.blobs),
                records,
                AuditTrailRecorder::new(JOB, self.audit.clone()),
                table,
            )
            .with_clock(|| at(23, 0, 0))
        }

        fn syncer(
            &self,
        ) -> TestSyncer<MemorySyncJobRecordRepository, MemoryTableStore<NewsArticle>> {
            self.build(self.records.clone(), self.news.clone())
        }

        fn syncer_at(
            &self,
            now: DateTime<Utc>,
        ) -> TestSyncer<MemorySyncJobRecordRepository, MemoryTableStore<NewsArticle>> {
            self.syncer().with_clock(move || now)
        }

        fn put(&self, blob: &str, ids: &[&str]) {
            let body: Vec<serde_json::Value> = ids.iter().map(|id| article_json(id)).collect();
            self.blobs
                .put(CONTAINER, blob, serde_json::to_vec(&body).unwrap());
        }

        async fn stored_ids(&self) -> Vec<String> {
            self.news
                .list(NewsArticle::PARTITION)
                .await
                .unwrap()
                .into_iter()
                .map(|a| a.news_id)
                .collect()
        }

        async fn audit_entries(&self) -> Vec<SyncJobStatusRecord> {
            self.audit.list(JOB).await.unwrap()
        }
    }

    // ── Failing collaborators ───────────────────────────────────

    struct OfflineTable;

    #[async_trait]
    impl TableRepository<NewsArticle> for OfflineTable {
        async fn get(&self, _p: &str, _r: &str) -> AthenaResult<Option<NewsArticle>> {
            Ok(None)
        }

        async fn upsert(&self, _entity: NewsArticle) -> AthenaResult<NewsArticle> {
            Err(AthenaError::Database("news table offline".to_string()))
        }

        async fn insert(&self, _entity: NewsArticle) -> AthenaResult<NewsArticle> {
            Err(AthenaError::Database("news table offline".to_string()))
        }

        async fn list(&self, _p: &str) -> AthenaResult<Vec<NewsArticle>> {
            Ok(Vec::new())
        }

        async fn find_by(&self, _p: &str, _f: &str, _v: &str) -> AthenaResult<Vec<NewsArticle>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _p: &str, _r: &str) -> AthenaResult<bool> {
            Ok(false)
        }
    }

    /// Another runner bumps the record between our read and our write.
    struct RacingRecords {
        inner: MemorySyncJobRecordRepository,
    }

    #[async_trait]
    impl SyncJobRecordRepository for RacingRecords {
        async fn get_record(&self, job_name: &str) -> AthenaResult<Option<SyncJobRecord>> {
            let seen = self.inner.get_record(job_name).await?;
            if let Some(r) = &seen {
                self.inner
                    .create_or_update(job_name, true, r.last_run_at, Some(r.version))
                    .await?;
            }
            Ok(seen)
        }

        async fn create_or_update(
            &self,
            job_name: &str,
            succeeded: bool,
            last_run_at: DateTime<Utc>,
            expected_version: Option<i64>,
        ) -> AthenaResult<SyncJobRecord> {
            self.inner
                .create_or_update(job_name, succeeded, last_run_at, expected_version)
                .await
        }
    }

    // ── Tests ───────────────────────────────────────────────────

    #[tokio::test]
    async fn first_run_ingests_everything_and_stores_newest_stamp() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["a", "b"]);
        h.put("news-10.00.00.json", &["c"]);

        let result = h.syncer().run().await.expect("sync should succeed");

        assert_eq!(result.job, JOB);
        assert_eq!(result.ingested_blobs, 2);
        assert_eq!(result.upserted, 3);
        assert_eq!(result.watermark, at(10, 0, 0));
        assert_eq!(h.stored_ids().await, vec!["a", "b", "c"]);

        let record = h.records.get_record(JOB).await.unwrap().unwrap();
        assert_eq!(record.last_run_at, at(10, 0, 0));
        assert!(record.succeeded);
    }

    #[tokio::test]
    async fn rerun_without_new_blobs_changes_nothing() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["a"]);

        let first = h.syncer().run().await.unwrap();
        let second = h.syncer().run().await.unwrap();

        assert_eq!(second.upserted, 0);
        assert_eq!(second.ingested_blobs, 0);
        assert_eq!(second.watermark, first.watermark);
        assert_eq!(h.stored_ids().await, vec!["a"]);
        assert_eq!(h.records.get_record(JOB).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn only_blobs_after_the_watermark_are_ingested() {
        let h = Harness::new();
        h.put("news-10.00.00.json", &["a"]);
        h.syncer().run().await.unwrap();

        h.put("feed-10.00.00.json", &["same-instant"]);
        h.put("news-10.00.01.json", &["one-second-later"]);

        let result = h.syncer().run().await.unwrap();

        assert_eq!(result.upserted, 1);
        assert_eq!(result.watermark, at(10, 0, 1));
        assert_eq!(h.stored_ids().await, vec!["a", "one-second-later"]);
    }

    #[tokio::test]
    async fn watermark_tracks_most_recent_blob_across_runs() {
        let h = Harness::new();
        h.put("news-08.00.00.json", &["a"]);
        h.syncer().run().await.unwrap();

        h.put("news-12.15.00.json", &["b"]);
        h.put("news-11.00.00.json", &["c"]);
        h.syncer().run().await.unwrap();

        let record = h.records.get_record(JOB).await.unwrap().unwrap();
        assert_eq!(record.last_run_at, at(12, 15, 0));
        assert_eq!(record.version, 2);
    }

    #[tokio::test]
    async fn malformed_blob_name_is_skipped_not_fatal() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["a"]);
        h.put("news-latest.json", &["ignored"]);

        let result = h.syncer().run().await.expect("bad name must not abort the run");

        assert_eq!(result.skipped_blobs, 1);
        assert_eq!(h.stored_ids().await, vec!["a"]);
        let entries = h.audit_entries().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].succeeded);
    }

    #[tokio::test]
    async fn failed_write_keeps_watermark_and_window_is_retried() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["a", "b"]);

        let err = h
            .build(h.records.clone(), OfflineTable)
            .run()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("news table offline"));

        let record = h.records.get_record(JOB).await.unwrap().unwrap();
        assert_eq!(record.last_run_at, DateTime::UNIX_EPOCH);
        assert!(!record.succeeded);

        let retried = h.syncer().run().await.expect("retry should succeed");
        assert_eq!(retried.upserted, 2);
        assert_eq!(retried.watermark, at(9, 0, 0));

        let entries = h.audit_entries().await;
        assert_eq!(entries.len(), 2);
        let failed: Vec<_> = entries.iter().filter(|e| !e.succeeded).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0]
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.contains("news table offline")));
        assert!(entries
            .iter()
            .filter(|e| e.succeeded)
            .all(|e| e.failure_reason.is_none()));
    }

    #[tokio::test]
    async fn concurrent_watermark_write_is_detected() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["a"]);
        h.syncer().run().await.unwrap();
        h.put("news-10.00.00.json", &["b"]);

        let racing = RacingRecords {
            inner: h.records.clone(),
        };
        let err = h.build(racing, h.news.clone()).run().await.unwrap_err();

        assert!(matches!(err, AthenaError::Conflict(_)));
        // The other runner's write stands; ours did not overwrite it.
        let record = h.records.get_record(JOB).await.unwrap().unwrap();
        assert_eq!(record.last_run_at, at(9, 0, 0));
        assert_eq!(record.version, 2);

        let entries = h.audit_entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().filter(|e| !e.succeeded).count(), 1);
    }

    #[tokio::test]
    async fn corrupt_blob_fails_run_with_audit_entry() {
        let h = Harness::new();
        h.blobs.put(CONTAINER, "news-09.00.00.json", "{oops");

        let err = h.syncer().run().await.unwrap_err();
        assert!(matches!(err, AthenaError::Serialization(_)));

        let entries = h.audit_entries().await;
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].succeeded);
        assert!(h.stored_ids().await.is_empty());
    }

    #[tokio::test]
    async fn time_of_day_blobs_are_not_lost_across_midnight() {
        let h = Harness::new();
        h.put("news-22.00.00.json", &["a"]);
        h.syncer_at(at(23, 0, 0)).run().await.unwrap();

        // Just after midnight the 22:00 blob still belongs to yesterday.
        let after_midnight = h.syncer_at(next_day_at(1, 0, 0)).run().await.unwrap();
        assert_eq!(after_midnight.upserted, 0);
        assert_eq!(after_midnight.watermark, at(22, 0, 0));

        h.put("news-10.00.00.json", &["b"]);
        let midday = h.syncer_at(next_day_at(16, 0, 0)).run().await.unwrap();

        assert_eq!(midday.upserted, 1);
        assert_eq!(midday.watermark, next_day_at(10, 0, 0));
        assert_eq!(h.stored_ids().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn future_stamped_blob_does_not_advance_watermark() {
        let h = Harness::new();
        h.put("news-2024-03-05T08.00.00Z.json", &["scheduled"]);

        let early = h.syncer_at(at(12, 0, 0)).run().await.unwrap();
        assert_eq!(early.upserted, 1);
        assert_eq!(early.watermark, DateTime::UNIX_EPOCH);

        h.put("news-13.00.00.json", &["c"]);
        let later = h.syncer_at(at(14, 0, 0)).run().await.unwrap();

        assert_eq!(later.upserted, 2);
        assert_eq!(later.watermark, at(13, 0, 0));
        assert_eq!(h.stored_ids().await, vec!["c", "scheduled"]);
    }

    #[tokio::test]
    async fn runs_on_consecutive_days_pick_up_each_days_blobs() {
        let h = Harness::new();
        h.put("news-09.00.00.json", &["monday"]);
        let first = h.syncer_at(at(12, 0, 0)).run().await.unwrap();
        assert_eq!(first.watermark, at(9, 0, 0));

        // Same name pattern, next day: a new instant, so it is ingested again.
        h.put("news-08.00.00.json", &["tuesday"]);
        let second = h.syncer_at(next_day_at(12, 0, 0)).run().await.unwrap();

        assert_eq!(second.upserted, 2);
        assert_eq!(second.watermark, next_day_at(9, 0, 0));
        assert_eq!(h.stored_ids().await, vec!["monday", "tuesday"]);
    }
}
