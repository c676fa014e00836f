mod config;
mod job;
mod syncer;

use std::sync::Arc;

use athena_blob::FsBlobStore;
use athena_config::{init_tracing, AppConfig};
use athena_db::audit::models::SyncJobStatusRecord;
use athena_db::audit::recorder::AuditTrailRecorder;
use athena_db::content::models::{NewsArticle, ResearchEvent};
use athena_db::sync::pg_repository::PgSyncJobRecordRepository;
use athena_db::table::{PgTableStore, TableEntity};
use sqlx::PgPool;

use crate::config::SyncJobConfig;
use crate::job::SyncJob;
use crate::syncer::IncrementalSyncer;

type PgSyncer<T> = IncrementalSyncer<
    T,
    Arc<FsBlobStore>,
    PgSyncJobRecordRepository,
    AuditTrailRecorder<PgTableStore<SyncJobStatusRecord>>,
    PgTableStore<T>,
>;

fn pg_syncer<T: TableEntity>(
    config: SyncJobConfig,
    blobs: Arc<FsBlobStore>,
    pool: &PgPool,
) -> PgSyncer<T> {
    let audit = AuditTrailRecorder::new(config.job_name.clone(), PgTableStore::new(pool.clone()));
    IncrementalSyncer::new(
        config,
        blobs,
        PgSyncJobRecordRepository::new(pool.clone()),
        audit,
        PgTableStore::new(pool.clone()),
    )
}

/// Runs every sync job once. Scheduling is left to the external timer.
#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("failed to load config");
    tracing::info!(service = "athena-ingest", blob_root = %config.blob_root, "starting");

    let pool = athena_db::create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    athena_db::ensure_schema(&pool)
        .await
        .expect("failed to prepare schema");

    let blobs = Arc::new(FsBlobStore::new(&config.blob_root));

    let jobs: Vec<Box<dyn SyncJob>> = vec![
        Box::new(pg_syncer::<NewsArticle>(
            SyncJobConfig::news_from_env(),
            Arc::clone(&blobs),
            &pool,
        )),
        Box::new(pg_syncer::<ResearchEvent>(
            SyncJobConfig::events_from_env(),
            Arc::clone(&blobs),
            &pool,
        )),
    ];

    let mut failed = 0;
    for job in &jobs {
        match job.run().await {
            Ok(result) => {
                tracing::info!(
                    job = %result.job,
                    ingested_blobs = result.ingested_blobs,
                    upserted = result.upserted,
                    skipped_blobs = result.skipped_blobs,
                    watermark = %result.watermark,
                    "sync completed"
                );
            }
            Err(e) => {
                tracing::error!(job = job.job_name(), error = %e, "sync failed");
                failed += 1;
            }
        }
    }

    tracing::info!(jobs = jobs.len(), failed, "ingest service finished");
    if failed > 0 {
        std::process::exit(1);
    }
}
