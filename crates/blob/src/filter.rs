use athena_common::error::{AthenaError, AthenaResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::naming::BlobName;
use crate::store::BlobStore;

/// How a single blob name was classified against the watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Included {
        name: String,
        stamped_at: DateTime<Utc>,
    },
    /// Stamped at or before the watermark.
    NotNewer {
        name: String,
        stamped_at: DateTime<Utc>,
    },
    Skipped {
        name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedBlob {
    pub name: String,
    pub stamped_at: DateTime<Utc>,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlob {
    pub name: String,
    pub reason: String,
}

/// Records from every blob newer than the watermark, concatenated in publish order.
#[derive(Debug, Clone)]
pub struct IncrementalPull<T> {
    pub records: Vec<T>,
    pub ingested: Vec<IngestedBlob>,
    pub skipped: Vec<SkippedBlob>,
    /// Latest stamp among ingested blobs that is not after the run instant.
    /// A blob stamped in the future is ingested but never moves the
    /// watermark past blobs that may still be published before it.
    pub newest: Option<DateTime<Utc>>,
}

impl<T> Default for IncrementalPull<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            ingested: Vec::new(),
            skipped: Vec::new(),
            newest: None,
        }
    }
}

/// Classify blob names against `last_run_at` (strictly newer wins). Bare
/// time-of-day stamps are dated relative to `now`, the run instant.
///
/// Names that do not follow the naming convention are reported as
/// [`Selection::Skipped`] instead of failing the whole batch.
pub fn select_since<I, S>(
    names: I,
    last_run_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<Selection>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            match BlobName::parse(name) {
                Ok(parsed) => {
                    let stamped_at = parsed.stamp.resolve(now);
                    if stamped_at > last_run_at {
                        Selection::Included {
                            name: name.to_string(),
                            stamped_at,
                        }
                    } else {
                        Selection::NotNewer {
                            name: name.to_string(),
                            stamped_at,
                        }
                    }
                }
                Err(e) => Selection::Skipped {
                    name: name.to_string(),
                    reason: e.to_string(),
                },
            }
        })
        .collect()
}

/// List `container`, pick the blobs newer than `last_run_at` and deserialize
/// each one as a JSON array of `T`.
///
/// Blobs are read one at a time, oldest stamp first. A blob whose content is
/// not a JSON array of `T` fails the pull.
pub async fn pull_since<T, B>(
    store: &B,
    container: &str,
    last_run_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AthenaResult<IncrementalPull<T>>
where
    T: DeserializeOwned,
    B: BlobStore + ?Sized,
{
    let names = store.list_names(container).await?;
    let mut pull = IncrementalPull::default();
    let mut included = Vec::new();

    for selection in select_since(&names, last_run_at, now) {
        match selection {
            Selection::Included { name, stamped_at } => included.push((stamped_at, name)),
            Selection::NotNewer { .. } => {}
            Selection::Skipped { name, reason } => {
                tracing::warn!(container, blob = %name, %reason, "skipping malformed blob name");
                pull.skipped.push(SkippedBlob { name, reason });
            }
        }
    }

    included.sort();

    for (stamped_at, name) in included {
        let bytes = store.read(container, &name).await?;
        let mut records: Vec<T> = serde_json::from_slice(&bytes).map_err(|e| {
            AthenaError::Serialization(format!("blob {container}/{name}: {e}"))
        })?;

        tracing::debug!(container, blob = %name, records = records.len(), "read blob");

        pull.ingested.push(IngestedBlob {
            name,
            stamped_at,
            records: records.len(),
        });
        pull.records.append(&mut records);
        if stamped_at <= now {
            pull.newest = Some(pull.newest.map_or(stamped_at, |n| n.max(stamped_at)));
        }
    }

    Ok(pull)
}
