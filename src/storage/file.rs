//! Flat-file store: one JSON document map per collection
//!
//! Each collection lives in `<data_dir>/<collection>.json` as an object
//! keyed by document key. A single mutex serializes all access within the
//! process, and writes go through a temp-file rename so a crash never leaves
//! a half-written collection behind.

use crate::error::{CarryDeskError, Result};
use crate::storage::PersistentStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type CollectionMap = BTreeMap<String, Value>;

/// File-backed document store
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    // Guards every read-modify-write cycle; collection files are not
    // safe to update concurrently without it.
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (creating if needed) a store rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            guard: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }

    fn read_collection(&self, collection: &str) -> Result<CollectionMap> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(CollectionMap::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(CollectionMap::new());
        }
        serde_json::from_str(&content).map_err(|source| CarryDeskError::CorruptRecord {
            collection: collection.to_string(),
            source,
        })
    }

    fn write_collection(&self, collection: &str, docs: &CollectionMap) -> Result<()> {
        let path = self.collection_path(collection);
        let tmp_path = self.data_dir.join(format!("{collection}.json.tmp"));
        let content = serde_json::to_string_pretty(docs)
            .map_err(|e| CarryDeskError::storage(format!("failed to encode collection: {e}")))?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| CarryDeskError::storage("file store lock poisoned"))
    }
}

impl PersistentStore for JsonFileStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let _guard = self.locked()?;
        Ok(self.read_collection(collection)?.remove(key))
    }

    fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
        let _guard = self.locked()?;
        let mut docs = self.read_collection(collection)?;
        docs.insert(key.to_string(), value);
        self.write_collection(collection, &docs)
    }

    fn compare_and_swap(
        &self,
        collection: &str,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool> {
        let _guard = self.locked()?;
        let mut docs = self.read_collection(collection)?;
        if docs.get(key) != expected {
            return Ok(false);
        }
        docs.insert(key.to_string(), new);
        self.write_collection(collection, &docs)?;
        Ok(true)
    }

    fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let _guard = self.locked()?;
        let mut docs = self.read_collection(collection)?;
        let existed = docs.remove(key).is_some();
        if existed {
            self.write_collection(collection, &docs)?;
        }
        Ok(existed)
    }

    fn scan(&self, collection: &str, predicate: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>> {
        let _guard = self.locked()?;
        Ok(self
            .read_collection(collection)?
            .into_values()
            .filter(|doc| predicate(doc))
            .collect())
    }
}
