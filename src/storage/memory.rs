//! In-process store backed by a single mutex
//!
//! Replaces the bare shared maps a naive implementation would mutate from
//! multiple handlers: every operation, including compare-and-swap, takes the
//! one lock, so each call is atomic with respect to all others.

use crate::error::{CarryDeskError, Result};
use crate::storage::PersistentStore;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// Mutex-guarded in-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| CarryDeskError::storage("memory store lock poisoned"))
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
        let mut guard = self.lock()?;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn compare_and_swap(
        &self,
        collection: &str,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool> {
        let mut guard = self.lock()?;
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.get(key) != expected {
            return Ok(false);
        }
        docs.insert(key.to_string(), new);
        Ok(true)
    }

    fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut guard = self.lock()?;
        Ok(guard
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(key).is_some()))
    }

    fn scan(&self, collection: &str, predicate: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| predicate(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
