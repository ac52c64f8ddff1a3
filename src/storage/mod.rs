//! Storage layer for carry-desk
//!
//! All persistence goes through the [`PersistentStore`] trait: a small
//! key-value/document interface with an atomic compare-and-swap. The ticket
//! registry, claim coordinator, and lifecycle are written entirely against
//! this trait, so swapping the concrete store (in-memory, flat files, a real
//! database) never touches them.
//!
//! The compare-and-swap primitive is the only place the claim race and the
//! ticket-number counter are linearized. Callers must re-read a document and
//! pass the exact stored value as `expected`; a read-then-unconditional-put
//! on contended documents is a lost-update bug.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{CarryDeskError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Collection names used by the desk.
pub mod collections {
    /// Live and archived ticket documents, keyed by ticket number
    pub const TICKETS: &str = "tickets";
    /// One feedback record per ticket, keyed by ticket number
    pub const FEEDBACK: &str = "feedback";
    /// Append-only activity log, keyed by event id
    pub const TICKET_LOGS: &str = "ticket_logs";
    /// Counter documents, e.g. the ticket-number allocator
    pub const COUNTERS: &str = "counters";
}

/// Abstract document store
///
/// Documents are JSON values grouped into named collections. Implementations
/// must make each single operation atomic; multi-step flows compose
/// atomicity out of `compare_and_swap`.
pub trait PersistentStore: Send + Sync {
    /// Fetches the document at `(collection, key)`, if present
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// Unconditionally writes the document at `(collection, key)`
    fn put(&self, collection: &str, key: &str, value: Value) -> Result<()>;

    /// Atomically replaces the document only if its current value equals
    /// `expected` (`None` meaning the key is absent, which makes this a
    /// unique insert). Returns `false` without writing when the comparison
    /// fails.
    fn compare_and_swap(
        &self,
        collection: &str,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool>;

    /// Removes the document; returns whether it existed
    fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Returns all documents in `collection` matching `predicate`
    fn scan(&self, collection: &str, predicate: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>>;
}

/// Loads and decodes a document, returning the raw value alongside the typed
/// record so the raw value can serve as the CAS `expected` snapshot.
pub(crate) fn load_document<T: DeserializeOwned>(
    store: &dyn PersistentStore,
    collection: &str,
    key: &str,
) -> Result<Option<(Value, T)>> {
    match store.get(collection, key)? {
        Some(raw) => {
            let typed =
                serde_json::from_value(raw.clone()).map_err(|source| CarryDeskError::CorruptRecord {
                    collection: collection.to_string(),
                    source,
                })?;
            Ok(Some((raw, typed)))
        },
        None => Ok(None),
    }
}

/// Encodes a record for storage
pub(crate) fn to_document<T: Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record)
        .map_err(|e| CarryDeskError::storage(format!("failed to encode document: {e}")))
}

/// Decodes every scanned document of a collection into typed records,
/// skipping nothing: a corrupt record is an error, not a silent drop.
pub(crate) fn decode_all<T: DeserializeOwned>(
    collection: &str,
    raw: Vec<Value>,
) -> Result<Vec<T>> {
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|source| CarryDeskError::CorruptRecord {
                collection: collection.to_string(),
                source,
            })
        })
        .collect()
}
