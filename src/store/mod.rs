//! Document stores backing the dataset cache
//!
//! Two stores share one data directory: the metadata store holds a single
//! refresh timestamp per dataset, and the dataset store holds the records of
//! every snapshot ever fetched. Both are the system of record; nothing is
//! kept in process memory between calls.

pub mod dataset;
pub mod metadata;

pub use dataset::{DatasetStore, Stamped};
pub use metadata::MetadataStore;

use thiserror::Error;

/// Errors from reading or writing the document stores
///
/// Store failures always propagate to the caller; no call site treats a
/// failed read as "no data".
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a store file failed
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A store file exists but does not parse
    #[error("store file corrupted: {0}")]
    Corrupt(#[from] serde_json::Error),
}
