pub mod audit;
pub mod content;
pub mod sync;
pub mod table;

use athena_common::error::{AthenaError, AthenaResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> AthenaResult<PgPool> {
    tracing::info!("connecting to database");
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))
}

/// Create the tables used by the table store and the sync job record store.
pub async fn ensure_schema(pool: &PgPool) -> AthenaResult<()> {
    for statement in [
        table::pg_store::CREATE_TABLE_ENTITIES,
        sync::pg_repository::CREATE_SYNC_JOB_RECORDS,
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AthenaError::Database(e.to_string()))?;
    }
    Ok(())
}
