//! Dataset store: snapshot-stamped records, one JSON file per dataset
//!
//! Every record is wrapped in a [`Stamped`] envelope carrying the
//! `last_update_time` of the refresh cycle that produced it. All records
//! sharing one stamp form a snapshot; inserts are additive and never touch
//! earlier snapshots, so stale rows accumulate under their old stamps.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::StoreError;

/// A dataset record tagged with the refresh cycle that fetched it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamped<T> {
    /// Epoch-millisecond stamp shared by every record of one snapshot
    pub last_update_time: i64,
    /// The domain record itself, flattened into the stored document
    #[serde(flatten)]
    pub record: T,
}

/// Store for dataset records, keyed by dataset name
///
/// Clones share one lock, so concurrent inserts through any handle are
/// serialized: an insert rewrites the whole dataset file, and an unguarded
/// load-extend-write pair racing another insert would erase its snapshot.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DatasetStore {
    /// Opens the dataset store inside the given data directory,
    /// creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Arc::new(Mutex::new(())),
        })
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guard protects a file, not in-memory state, so a panic while
        // holding it leaves nothing to recover.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dataset_path(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{}.json", dataset))
    }

    fn load_all<T: DeserializeOwned>(&self, dataset: &str) -> Result<Vec<Stamped<T>>, StoreError> {
        let path = self.dataset_path(dataset);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Bulk-inserts one snapshot's records. Additive: earlier snapshots stay,
    /// including snapshots another handle inserts concurrently.
    pub fn append_snapshot<T>(
        &self,
        dataset: &str,
        records: Vec<Stamped<T>>,
    ) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.guard();
        let mut all = self.load_all::<T>(dataset)?;
        all.extend(records);
        let contents = serde_json::to_string_pretty(&all)?;
        fs::write(self.dataset_path(dataset), contents)?;
        Ok(())
    }

    /// Returns every record stamped with exactly `last_update_time`.
    ///
    /// A dataset that was never written yields an empty vec, not an error;
    /// the same holds for a stamp no snapshot carries.
    pub fn query_snapshot<T>(
        &self,
        dataset: &str,
        last_update_time: i64,
    ) -> Result<Vec<Stamped<T>>, StoreError>
    where
        T: DeserializeOwned,
    {
        let _guard = self.guard();
        Ok(self
            .load_all(dataset)?
            .into_iter()
            .filter(|r: &Stamped<T>| r.last_update_time == last_update_time)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        name: String,
        value: i32,
    }

    fn record(name: &str, value: i32) -> TestRecord {
        TestRecord {
            name: name.to_string(),
            value,
        }
    }

    fn stamped(ts: i64, r: TestRecord) -> Stamped<TestRecord> {
        Stamped {
            last_update_time: ts,
            record: r,
        }
    }

    fn create_test_store() -> (DatasetStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DatasetStore::open(temp_dir.path()).expect("Failed to open store");
        (store, temp_dir)
    }

    #[test]
    fn test_query_missing_dataset_returns_empty() {
        let (store, _temp_dir) = create_test_store();
        let result: Vec<Stamped<TestRecord>> = store.query_snapshot("weather", 123).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_append_then_query_by_stamp() {
        let (store, _temp_dir) = create_test_store();
        store
            .append_snapshot(
                "weather",
                vec![stamped(100, record("seoul", 1)), stamped(100, record("busan", 2))],
            )
            .unwrap();

        let result: Vec<Stamped<TestRecord>> = store.query_snapshot("weather", 100).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.last_update_time == 100));
    }

    #[test]
    fn test_snapshots_never_mix() {
        let (store, _temp_dir) = create_test_store();
        store
            .append_snapshot("news", vec![stamped(100, record("old", 1))])
            .unwrap();
        store
            .append_snapshot("news", vec![stamped(200, record("new", 2))])
            .unwrap();

        let old: Vec<Stamped<TestRecord>> = store.query_snapshot("news", 100).unwrap();
        let new: Vec<Stamped<TestRecord>> = store.query_snapshot("news", 200).unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].record.name, "old");
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].record.name, "new");
    }

    #[test]
    fn test_append_is_additive() {
        let (store, _temp_dir) = create_test_store();
        store
            .append_snapshot("news", vec![stamped(100, record("a", 1))])
            .unwrap();
        store
            .append_snapshot("news", vec![stamped(200, record("b", 2))])
            .unwrap();

        // The first snapshot survives the second insert.
        let old: Vec<Stamped<TestRecord>> = store.query_snapshot("news", 100).unwrap();
        assert_eq!(old.len(), 1);
    }

    #[test]
    fn test_datasets_are_isolated() {
        let (store, _temp_dir) = create_test_store();
        store
            .append_snapshot("weather", vec![stamped(100, record("seoul", 1))])
            .unwrap();

        let other: Vec<Stamped<TestRecord>> = store.query_snapshot("news", 100).unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_stamp_flattens_into_document() {
        let entry = stamped(42, record("seoul", 7));
        let json = serde_json::to_value(&entry).unwrap();
        // The wrapper is invisible in the stored document: domain fields and
        // the stamp sit side by side, matching the upstream document shape.
        assert_eq!(json["last_update_time"], 42);
        assert_eq!(json["name"], "seoul");
        assert_eq!(json["value"], 7);
    }

    #[test]
    fn test_concurrent_appends_keep_both_snapshots() {
        let (store, _temp_dir) = create_test_store();

        for round in 0..20 {
            let dataset = format!("news_{}", round);
            let barrier = Arc::new(std::sync::Barrier::new(2));
            let handles: Vec<_> = [100i64, 200]
                .into_iter()
                .map(|ts| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    let dataset = dataset.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        store
                            .append_snapshot(&dataset, vec![stamped(ts, record("r", ts as i32))])
                            .unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let first: Vec<Stamped<TestRecord>> = store.query_snapshot(&dataset, 100).unwrap();
            let second: Vec<Stamped<TestRecord>> = store.query_snapshot(&dataset, 200).unwrap();
            assert_eq!(first.len(), 1, "round {}: snapshot 100 was lost", round);
            assert_eq!(second.len(), 1, "round {}: snapshot 200 was lost", round);
        }
    }

    #[test]
    fn test_empty_snapshot_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        store
            .append_snapshot::<TestRecord>("vaccine", Vec::new())
            .unwrap();
        let result: Vec<Stamped<TestRecord>> = store.query_snapshot("vaccine", 100).unwrap();
        assert!(result.is_empty());
    }
}
