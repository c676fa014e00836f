use std::marker::PhantomData;

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};
use sqlx::{PgPool, Row};

use super::{TableEntity, TableRepository};

pub(crate) const CREATE_TABLE_ENTITIES: &str = "create table if not exists table_entities (
    table_name text not null,
    partition_key text not null,
    row_key text not null,
    body jsonb not null,
    updated_at timestamptz not null default now(),
    primary key (table_name, partition_key, row_key)
)";

/// Postgres-backed [`TableRepository`]: every entity kind shares `table_entities`.
pub struct PgTableStore<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PgTableStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: TableEntity> PgTableStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn map_row(row: sqlx::postgres::PgRow) -> AthenaResult<T> {
        let body: serde_json::Value = row
            .try_get("body")
            .map_err(|e| AthenaError::Database(e.to_string()))?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl<T: TableEntity> TableRepository<T> for PgTableStore<T> {
    async fn get(&self, partition_key: &str, row_key: &str) -> AthenaResult<Option<T>> {
        let row = sqlx::query(
            "select body from table_entities
             where table_name = $1 and partition_key = $2 and row_key = $3",
        )
        .bind(T::TABLE)
        .bind(partition_key)
        .bind(row_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn upsert(&self, entity: T) -> AthenaResult<T> {
        let body = serde_json::to_value(&entity)?;
        sqlx::query(
            "insert into table_entities (table_name, partition_key, row_key, body, updated_at)
             values ($1, $2, $3, $4, now())
             on conflict (table_name, partition_key, row_key)
             do update set body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(T::TABLE)
        .bind(entity.partition_key())
        .bind(entity.row_key())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        Ok(entity)
    }

    async fn insert(&self, entity: T) -> AthenaResult<T> {
        let body = serde_json::to_value(&entity)?;
        let inserted = sqlx::query(
            "insert into table_entities (table_name, partition_key, row_key, body, updated_at)
             values ($1, $2, $3, $4, now())
             on conflict (table_name, partition_key, row_key) do nothing
             returning row_key",
        )
        .bind(T::TABLE)
        .bind(entity.partition_key())
        .bind(entity.row_key())
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        match inserted {
            Some(_) => Ok(entity),
            None => Err(AthenaError::Conflict(format!(
                "{} row {}/{} already exists",
                T::TABLE,
                entity.partition_key(),
                entity.row_key()
            ))),
        }
    }

    async fn list(&self, partition_key: &str) -> AthenaResult<Vec<T>> {
        let rows = sqlx::query(
            "select body from table_entities
             where table_name = $1 and partition_key = $2
             order by row_key",
        )
        .bind(T::TABLE)
        .bind(partition_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn find_by(&self, partition_key: &str, field: &str, value: &str) -> AthenaResult<Vec<T>> {
        let rows = sqlx::query(
            "select body from table_entities
             where table_name = $1 and partition_key = $2 and body ->> $3 = $4
             order by row_key",
        )
        .bind(T::TABLE)
        .bind(partition_key)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AthenaResult<bool> {
        let result = sqlx::query(
            "delete from table_entities
             where table_name = $1 and partition_key = $2 and row_key = $3",
        )
        .bind(T::TABLE)
        .bind(partition_key)
        .bind(row_key)
        .execute(&self.pool)
        .await
        .map_err(|e| AthenaError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
