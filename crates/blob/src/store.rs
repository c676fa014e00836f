use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use athena_common::error::{AthenaError, AthenaResult};

/// Read-only view of a blob container store. Sync jobs never write or delete blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// All blob names in `container`. A container that does not exist is empty.
    async fn list_names(&self, container: &str) -> AthenaResult<Vec<String>>;

    async fn read(&self, container: &str, name: &str) -> AthenaResult<Vec<u8>>;
}

#[async_trait]
impl<B: BlobStore + ?Sized> BlobStore for Arc<B> {
    async fn list_names(&self, container: &str) -> AthenaResult<Vec<String>> {
        (**self).list_names(container).await
    }

    async fn read(&self, container: &str, name: &str) -> AthenaResult<Vec<u8>> {
        (**self).read(container, name).await
    }
}

/// Containers are directories under `root`, blobs are the regular files inside them.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> AthenaResult<PathBuf> {
        validate_component("container", container)?;
        Ok(self.root.join(container))
    }
}

/// Reject names that would escape the container directory.
fn validate_component(kind: &str, value: &str) -> AthenaResult<()> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
    {
        return Err(AthenaError::Validation(format!(
            "invalid {kind} name: {value:?}"
        )));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn list_names(&self, container: &str) -> AthenaResult<Vec<String>> {
        let dir = self.container_dir(container)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(container, path = %dir.display(), "container directory missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(AthenaError::Storage(format!("list {container}: {e}"))),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AthenaError::Storage(format!("list {container}: {e}")))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| AthenaError::Storage(format!("list {container}: {e}")))?;
            if !file_type.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::warn!(container, name = ?raw, "skipping non UTF-8 blob name");
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn read(&self, container: &str, name: &str) -> AthenaResult<Vec<u8>> {
        validate_component("blob", name)?;
        let path = self.container_dir(container)?.join(name);

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AthenaError::NotFound(format!("blob {container}/{name}")),
            _ => AthenaError::Storage(format!("read {container}/{name}: {e}")),
        })
    }
}

/// In-process blob store for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    containers: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob. Not part of [`BlobStore`]: readers cannot write.
    pub fn put(&self, container: &str, name: &str, content: impl Into<Vec<u8>>) {
        let mut containers = self
            .containers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        containers
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), content.into());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list_names(&self, container: &str) -> AthenaResult<Vec<String>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| AthenaError::Internal("blob store lock poisoned".to_string()))?;
        Ok(containers
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn read(&self, container: &str, name: &str) -> AthenaResult<Vec<u8>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| AthenaError::Internal("blob store lock poisoned".to_string()))?;
        containers
            .get(container)
            .and_then(|blobs| blobs.get(name))
            .cloned()
            .ok_or_else(|| AthenaError::NotFound(format!("blob {container}/{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_lists_files_sorted_and_ignores_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = dir.path().join("athena-news");
        std::fs::create_dir_all(container.join("nested")).unwrap();
        std::fs::write(container.join("news-10.00.00.json"), b"[]").unwrap();
        std::fs::write(container.join("news-09.00.00.json"), b"[]").unwrap();

        let store = FsBlobStore::new(dir.path());
        let names = store.list_names("athena-news").await.expect("list");
        assert_eq!(names, vec!["news-09.00.00.json", "news-10.00.00.json"]);
    }

    #[tokio::test]
    async fn fs_store_missing_container_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let names = store.list_names("athena-events").await.expect("list");
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn fs_store_reads_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = dir.path().join("athena-news");
        std::fs::create_dir_all(&container).unwrap();
        std::fs::write(container.join("news-10.00.00.json"), b"[1,2]").unwrap();

        let store = FsBlobStore::new(dir.path());
        let bytes = store
            .read("athena-news", "news-10.00.00.json")
            .await
            .expect("read");
        assert_eq!(bytes, b"[1,2]");
    }

    #[tokio::test]
    async fn fs_store_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let err = store.read("athena-news", "nope.json").await.unwrap_err();
        assert!(matches!(err, AthenaError::NotFound(_)));
    }

    #[tokio::test]
    async fn fs_store_rejects_path_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());
        let err = store.read("athena-news", "../secret").await.unwrap_err();
        assert!(matches!(err, AthenaError::Validation(_)));
        let err = store.list_names("..").await.unwrap_err();
        assert!(matches!(err, AthenaError::Validation(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trips_seeded_blobs() {
        let store = MemoryBlobStore::new();
        store.put("athena-news", "news-b.json", "[]");
        store.put("athena-news", "news-a.json", "[1]");

        let names = store.list_names("athena-news").await.unwrap();
        assert_eq!(names, vec!["news-a.json", "news-b.json"]);
        assert_eq!(store.read("athena-news", "news-a.json").await.unwrap(), b"[1]");
        assert!(store.list_names("other").await.unwrap().is_empty());
    }
}
