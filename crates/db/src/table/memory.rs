use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};

use super::{field_text, TableEntity, TableRepository};

type Rows<T> = BTreeMap<(String, String), T>;

/// In-memory [`TableRepository`] with the same semantics as the Postgres store.
/// Clones share rows.
pub struct MemoryTableStore<T> {
    rows: Arc<Mutex<Rows<T>>>,
}

impl<T> Clone for MemoryTableStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T> Default for MemoryTableStore<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<T: TableEntity> MemoryTableStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> AthenaResult<MutexGuard<'_, Rows<T>>> {
        self.rows
            .lock()
            .map_err(|_| AthenaError::Internal(format!("{} store lock poisoned", T::TABLE)))
    }

    fn partition(rows: &Rows<T>, partition_key: &str) -> Vec<T> {
        rows.iter()
            .filter(|((p, _), _)| p == partition_key)
            .map(|(_, entity)| entity.clone())
            .collect()
    }
}

#[async_trait]
impl<T: TableEntity> TableRepository<T> for MemoryTableStore<T> {
    async fn get(&self, partition_key: &str, row_key: &str) -> AthenaResult<Option<T>> {
        let rows = self.rows()?;
        Ok(rows
            .get(&(partition_key.to_string(), row_key.to_string()))
            .cloned())
    }

    async fn upsert(&self, entity: T) -> AthenaResult<T> {
        let mut rows = self.rows()?;
        rows.insert((entity.partition_key(), entity.row_key()), entity.clone());
        Ok(entity)
    }

    async fn insert(&self, entity: T) -> AthenaResult<T> {
        let mut rows = self.rows()?;
        let key = (entity.partition_key(), entity.row_key());
        if rows.contains_key(&key) {
            return Err(AthenaError::Conflict(format!(
                "{} row {}/{} already exists",
                T::TABLE,
                key.0,
                key.1
            )));
        }
        rows.insert(key, entity.clone());
        Ok(entity)
    }

    async fn list(&self, partition_key: &str) -> AthenaResult<Vec<T>> {
        let rows = self.rows()?;
        Ok(Self::partition(&rows, partition_key))
    }

    async fn find_by(&self, partition_key: &str, field: &str, value: &str) -> AthenaResult<Vec<T>> {
        let candidates = {
            let rows = self.rows()?;
            Self::partition(&rows, partition_key)
        };

        let mut matches = Vec::new();
        for entity in candidates {
            let body = serde_json::to_value(&entity)?;
            if field_text(&body, field).as_deref() == Some(value) {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AthenaResult<bool> {
        let mut rows = self.rows()?;
        Ok(rows
            .remove(&(partition_key.to_string(), row_key.to_string()))
            .is_some())
    }
}
