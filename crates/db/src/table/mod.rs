//! One storage abstraction for every entity kind: rows addressed by
//! `(table, partition key, row key)` holding a JSON body.

pub mod memory;
pub mod pg_store;

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use memory::MemoryTableStore;
pub use pg_store::PgTableStore;

pub trait TableEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Logical table name.
    const TABLE: &'static str;

    fn partition_key(&self) -> String;
    fn row_key(&self) -> String;
}

#[async_trait]
pub trait TableRepository<T: TableEntity>: Send + Sync {
    async fn get(&self, partition_key: &str, row_key: &str) -> AthenaResult<Option<T>>;

    /// Insert or replace. Last writer wins.
    async fn upsert(&self, entity: T) -> AthenaResult<T>;

    /// Insert only. Fails with `Conflict` if the row already exists.
    async fn insert(&self, entity: T) -> AthenaResult<T>;

    /// All rows of a partition, ordered by row key.
    async fn list(&self, partition_key: &str) -> AthenaResult<Vec<T>>;

    /// Rows of a partition whose top-level JSON `field` renders as `value`.
    async fn find_by(&self, partition_key: &str, field: &str, value: &str) -> AthenaResult<Vec<T>>;

    /// Returns whether a row was removed.
    async fn delete(&self, partition_key: &str, row_key: &str) -> AthenaResult<bool>;

    /// Lookup by a field expected to be unique. Several matches are an
    /// `Ambiguous` error rather than an arbitrary pick or a silent `None`.
    async fn find_single_by(
        &self,
        partition_key: &str,
        field: &str,
        value: &str,
    ) -> AthenaResult<Option<T>> {
        let mut matches = self.find_by(partition_key, field, value).await?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            n => Err(AthenaError::Ambiguous(format!(
                "{n} {} rows have {field} = {value}",
                T::TABLE
            ))),
        }
    }
}

/// Text form of a top-level JSON field, as Postgres `->>` renders it.
pub(crate) fn field_text(body: &serde_json::Value, field: &str) -> Option<String> {
    match body.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
