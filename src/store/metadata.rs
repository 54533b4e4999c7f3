//! Metadata store: one refresh timestamp per dataset
//!
//! Persists a single JSON document mapping `<dataset>_last_update` keys to
//! epoch-millisecond timestamps. A timestamp is written only by a successful
//! refresh, so it always points at a complete snapshot in the dataset store.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::StoreError;

/// File name of the metadata document inside the data directory
const METADATA_FILE: &str = "metadata.json";

/// Store for per-dataset refresh timestamps
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Opens the metadata store inside the given data directory,
    /// creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(METADATA_FILE),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, i64>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Returns the stored value for `key`, or `None` if it was never written
    pub fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.load()?.get(key).copied())
    }

    /// Writes `value` under `key`, inserting or overwriting (upsert)
    pub fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut fields = self.load()?;
        fields.insert(key.to_string(), value);
        let contents = serde_json::to_string_pretty(&fields)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
