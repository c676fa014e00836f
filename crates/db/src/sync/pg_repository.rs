use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::sync::models::{SyncJobRecord, SYNC_JOB_RECORD_PARTITION};
use crate::sync::repositories::SyncJobRecordRepository;
use athena_common::error::{AthenaError, AthenaResult};

pub(crate) const CREATE_SYNC_JOB_RECORDS: &str = "create table if not exists sync_job_records (
    partition_key text not null,
    job_name text not null,
    last_run_at timestamptz not null,
    succeeded boolean not null,
    version bigint not null,
    updated_at timestamptz not null default now(),
    primary key (partition_key, job_name)
)";

#[derive(Clone)]
pub struct PgSyncJobRecordRepository {
    pool: PgPool,
}

impl PgSyncJobRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: sqlx::postgres::PgRow) -> AthenaResult<SyncJobRecord> {
        let get = |e: sqlx::Error| AthenaError::Database(e.to_string());
        Ok(SyncJobRecord {
            job_name: row.try_get("job_name").map_err(get)?,
            last_run_at: row.try_get("last_run_at").map_err(get)?,
            succeeded: row.try_get("succeeded").map_err(get)?,
            version: row.try_get("version").map_err(get)?,
            updated_at: row.try_get("updated_at").map_err(get)?,
        })
    }
}

#[async_trait]
impl SyncJobRecordRepository for PgSyncJobRecordRepository {
    async fn get_record(&self, job_name: &str) -> AthenaResult<Option<SyncJobRecord>> {
        let row = sqlx::query(
            "select job_name, last_run_at, succeeded, version, updated_at
             from sync_job_records
             where partition_key = $1 and job_name = $2",
        )
        .bind(SYNC_JOB_RECORD_PARTITION)
        .bind(job_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn create_or_update(
        &self,
        job_name: &str,
        succeeded: bool,
        last_run_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> AthenaResult<SyncJobRecord> {
        let row = match expected_version {
            None => sqlx::query(
                "insert into sync_job_records
                   (partition_key, job_name, last_run_at, succeeded, version, updated_at)
                 values ($1, $2, $3, $4, 1, $5)
                 on conflict (partition_key, job_name) do nothing
                 returning job_name, last_run_at, succeeded, version, updated_at",
            )
            .bind(SYNC_JOB_RECORD_PARTITION)
            .bind(job_name)
            .bind(last_run_at)
            .bind(succeeded)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await,
            Some(version) => sqlx::query(
                "update sync_job_records
                 set last_run_at = greatest(last_run_at, $3),
                     succeeded = $4,
                     version = version + 1,
                     updated_at = $5
                 where partition_key = $1 and job_name = $2 and version = $6
                 returning job_name, last_run_at, succeeded, version, updated_at",
            )
            .bind(SYNC_JOB_RECORD_PARTITION)
            .bind(job_name)
            .bind(last_run_at)
            .bind(succeeded)
            .bind(Utc::now())
            .bind(version)
            .fetch_optional(&self.pool)
            .await,
        }
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        match row {
            Some(r) => Self::map_row(r),
            None => Err(stale_write(job_name, expected_version)),
        }
    }
}

pub(crate) fn stale_write(job_name: &str, expected_version: Option<i64>) -> AthenaError {
    match expected_version {
        None => AthenaError::Conflict(format!(
            "sync job record {job_name} was created concurrently"
        )),
        Some(v) => AthenaError::Conflict(format!(
            "sync job record {job_name} is no longer at version {v}"
        )),
    }
}
