//! Read-only access to timestamped JSON blob snapshots and the incremental
//! "everything published after the watermark" pull built on top of it.

pub mod filter;
pub mod naming;
pub mod store;

pub use filter::{pull_since, select_since, IncrementalPull, Selection};
pub use naming::{BlobName, BlobNameError, BlobStamp};
pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};
