//! Ticket identity and the one-open-ticket-per-requester rule
//!
//! Numbers come from a counter document advanced by compare-and-swap, so
//! two concurrent allocations can never hand out the same value. When the
//! backing store is down the allocator degrades to a random surrogate in
//! the 90000-99999 range instead of refusing the ticket; this trades strict
//! sequential uniqueness for availability and is always logged. `register`
//! performs a unique insert, so even a colliding surrogate turns into a
//! clean rejection rather than an overwrite.

use crate::config::DeskConfig;
use crate::core::{Ticket, TicketNumber, TicketStatus};
use crate::error::{CarryDeskError, Result};
use crate::storage::{PersistentStore, collections, decode_all, load_document, to_document};
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key of the allocator's counter document
const COUNTER_KEY: &str = "ticket_number";

/// Surrogate numbers handed out when sequential allocation fails
const SURROGATE_MIN: u64 = 90_000;
const SURROGATE_MAX: u64 = 99_999;

/// Retry budget for CAS loops before reporting the store as contended
pub(crate) const CAS_RETRY_LIMIT: usize = 32;

/// Owns ticket-number allocation and per-requester uniqueness
#[derive(Clone)]
pub struct TicketRegistry {
    store: Arc<dyn PersistentStore>,
    start_number: u64,
}

/// Aggregate ticket counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeskStatistics {
    pub total: usize,
    pub open: usize,
    pub claimed: usize,
    pub closed: usize,
    pub archived: usize,
    /// Ticket totals per category display name
    pub per_category: HashMap<String, usize>,
}

impl TicketRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn PersistentStore>, config: &DeskConfig) -> Self {
        Self {
            store,
            start_number: config.start_number,
        }
    }

    /// Returns the next ticket number.
    ///
    /// Sequential under normal operation; on storage failure falls back to
    /// a random surrogate and logs the degraded condition. The surrogate is
    /// not reconciled with the sequential counter once the store recovers.
    pub fn allocate_ticket_number(&self) -> TicketNumber {
        match self.allocate_sequential() {
            Ok(number) => number,
            Err(error) => {
                let surrogate = rand::thread_rng().gen_range(SURROGATE_MIN..=SURROGATE_MAX);
                warn!(
                    %error,
                    surrogate,
                    degraded = true,
                    "sequential allocation failed, issuing surrogate ticket number"
                );
                TicketNumber::new(surrogate)
            },
        }
    }

    fn allocate_sequential(&self) -> Result<TicketNumber> {
        for _ in 0..CAS_RETRY_LIMIT {
            let current = self.store.get(collections::COUNTERS, COUNTER_KEY)?;
            let next = match &current {
                Some(doc) => doc
                    .as_u64()
                    .ok_or_else(|| CarryDeskError::storage("counter document is not an integer"))?
                    + 1,
                None => self.start_number,
            };
            if self.store.compare_and_swap(
                collections::COUNTERS,
                COUNTER_KEY,
                current.as_ref(),
                json!(next),
            )? {
                return Ok(TicketNumber::new(next));
            }
        }
        Err(CarryDeskError::storage(
            "ticket counter contention exceeded retry budget",
        ))
    }

    /// Whether the requester currently has a ticket in Open or Claimed state
    pub fn has_open_ticket(&self, requester_id: &str) -> Result<bool> {
        Ok(self.open_ticket(requester_id)?.is_some())
    }

    /// The requester's active ticket, if any
    pub fn open_ticket(&self, requester_id: &str) -> Result<Option<Ticket>> {
        let raw = self.store.scan(collections::TICKETS, &|doc| {
            doc["requester_id"] == requester_id
                && (doc["status"] == "open" || doc["status"] == "claimed")
        })?;
        let mut tickets: Vec<Ticket> = decode_all(collections::TICKETS, raw)?;
        // The create path upholds at-most-one; if storage ever holds more,
        // surface the oldest so the caller points at a real channel.
        tickets.sort_by_key(|t| t.created_at);
        Ok(tickets.into_iter().next())
    }

    /// Channel backing the requester's active ticket, for "you already have
    /// a ticket" messaging
    pub fn get_open_ticket_channel(&self, requester_id: &str) -> Result<Option<String>> {
        Ok(self.open_ticket(requester_id)?.map(|t| t.channel_ref))
    }

    /// Persists a new ticket. Returns `false` (writing nothing) when
    /// required fields are missing or the ticket number is already taken.
    pub fn register(&self, ticket: &Ticket) -> Result<bool> {
        if !Self::validate(ticket) {
            return Ok(false);
        }

        let doc = to_document(ticket)?;
        let inserted = self.store.compare_and_swap(
            collections::TICKETS,
            &ticket.ticket_number.key(),
            None,
            doc,
        )?;
        if inserted {
            info!(
                ticket_number = %ticket.ticket_number,
                requester_id = %ticket.requester_id,
                category = %ticket.category,
                "registered ticket"
            );
        } else {
            warn!(
                ticket_number = %ticket.ticket_number,
                "duplicate ticket number rejected"
            );
        }
        Ok(inserted)
    }

    fn validate(ticket: &Ticket) -> bool {
        if ticket.ticket_number.value() == 0
            || ticket.requester_id.is_empty()
            || ticket.channel_ref.is_empty()
        {
            warn!(ticket_number = %ticket.ticket_number, "missing required ticket fields");
            return false;
        }
        true
    }

    /// Loads a ticket by number
    pub fn get(&self, number: TicketNumber) -> Result<Option<Ticket>> {
        Ok(self.get_raw(number)?.map(|(_, ticket)| ticket))
    }

    /// Loads a ticket along with the raw stored document, which callers use
    /// as the `expected` snapshot for compare-and-swap updates
    pub(crate) fn get_raw(&self, number: TicketNumber) -> Result<Option<(Value, Ticket)>> {
        load_document(self.store.as_ref(), collections::TICKETS, &number.key())
    }

    /// Atomically replaces a ticket document previously read via `get_raw`
    pub(crate) fn swap(&self, expected: &Value, updated: &Ticket) -> Result<bool> {
        let doc = to_document(updated)?;
        self.store.compare_and_swap(
            collections::TICKETS,
            &updated.ticket_number.key(),
            Some(expected),
            doc,
        )
    }

    /// All tickets currently in `status`
    pub fn tickets_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>> {
        let key = json!(status);
        let raw = self
            .store
            .scan(collections::TICKETS, &|doc| doc["status"] == key)?;
        decode_all(collections::TICKETS, raw)
    }

    /// Every ticket the requester has ever opened
    pub fn tickets_by_requester(&self, requester_id: &str) -> Result<Vec<Ticket>> {
        let raw = self
            .store
            .scan(collections::TICKETS, &|doc| {
                doc["requester_id"] == requester_id
            })?;
        decode_all(collections::TICKETS, raw)
    }

    /// Aggregate counts across the whole desk
    pub fn statistics(&self) -> Result<DeskStatistics> {
        let raw = self.store.scan(collections::TICKETS, &|_| true)?;
        let tickets: Vec<Ticket> = decode_all(collections::TICKETS, raw)?;

        let mut stats = DeskStatistics {
            total: tickets.len(),
            ..DeskStatistics::default()
        };
        for ticket in &tickets {
            match ticket.status {
                TicketStatus::Open => stats.open += 1,
                TicketStatus::Claimed => stats.claimed += 1,
                TicketStatus::Closed => stats.closed += 1,
                TicketStatus::Archived => stats.archived += 1,
            }
            *stats
                .per_category
                .entry(ticket.category.name().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, TicketBuilder};
    use crate::storage::MemoryStore;
    use std::thread;

    fn registry() -> TicketRegistry {
        TicketRegistry::new(Arc::new(MemoryStore::new()), &DeskConfig::default())
    }

    /// Store stub where every operation reports the backend as down
    struct FailingStore;

    impl PersistentStore for FailingStore {
        fn get(&self, _: &str, _: &str) -> Result<Option<Value>> {
            Err(CarryDeskError::storage("store offline"))
        }

        fn put(&self, _: &str, _: &str, _: Value) -> Result<()> {
            Err(CarryDeskError::storage("store offline"))
        }

        fn compare_and_swap(
            &self,
            _: &str,
            _: &str,
            _: Option<&Value>,
            _: Value,
        ) -> Result<bool> {
            Err(CarryDeskError::storage("store offline"))
        }

        fn delete(&self, _: &str, _: &str) -> Result<bool> {
            Err(CarryDeskError::storage("store offline"))
        }

        fn scan(&self, _: &str, _: &dyn Fn(&Value) -> bool) -> Result<Vec<Value>> {
            Err(CarryDeskError::storage("store offline"))
        }
    }

    fn ticket(number: u64, requester: &str) -> Ticket {
        TicketBuilder::new()
            .ticket_number(TicketNumber::new(number))
            .requester_id(requester)
            .category(Category::SlayerCarry)
            .channel_ref(format!("chan-{number}"))
            .build()
    }

    #[test]
    fn test_allocation_is_sequential_from_start() {
        let registry = registry();
        assert_eq!(registry.allocate_ticket_number(), TicketNumber::new(10_000));
        assert_eq!(registry.allocate_ticket_number(), TicketNumber::new(10_001));
        assert_eq!(registry.allocate_ticket_number(), TicketNumber::new(10_002));
    }

    #[test]
    fn test_allocation_degrades_to_surrogate_when_store_is_down() {
        let registry = TicketRegistry::new(Arc::new(FailingStore), &DeskConfig::default());
        for _ in 0..16 {
            let number = registry.allocate_ticket_number().value();
            assert!(
                (SURROGATE_MIN..=SURROGATE_MAX).contains(&number),
                "surrogate {number} outside the degraded-mode range"
            );
        }
    }

    #[test]
    fn test_concurrent_allocation_yields_distinct_numbers() {
        let store = Arc::new(MemoryStore::new());
        let config = DeskConfig::default();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry =
                TicketRegistry::new(Arc::clone(&store) as Arc<dyn PersistentStore>, &config);
            handles.push(thread::spawn(move || {
                (0..25)
                    .map(|_| registry.allocate_ticket_number())
                    .collect::<Vec<_>>()
            }));
        }

        let mut numbers: Vec<TicketNumber> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        numbers.sort_unstable();
        let before = numbers.len();
        numbers.dedup();
        assert_eq!(numbers.len(), before, "duplicate ticket numbers allocated");
        assert_eq!(before, 200);
    }

    #[test]
    fn test_register_rejects_duplicates_and_invalid_input() {
        let registry = registry();
        let t = ticket(10_001, "user-1");

        assert!(registry.register(&t).unwrap());
        assert!(!registry.register(&t).unwrap(), "duplicate number accepted");

        let mut missing_channel = ticket(10_002, "user-2");
        missing_channel.channel_ref.clear();
        assert!(!registry.register(&missing_channel).unwrap());
        assert!(registry.get(TicketNumber::new(10_002)).unwrap().is_none());
    }

    #[test]
    fn test_open_ticket_lookup() {
        let registry = registry();
        assert!(!registry.has_open_ticket("user-1").unwrap());

        registry.register(&ticket(10_001, "user-1")).unwrap();
        assert!(registry.has_open_ticket("user-1").unwrap());
        assert_eq!(
            registry.get_open_ticket_channel("user-1").unwrap(),
            Some("chan-10001".to_string())
        );
        assert!(!registry.has_open_ticket("user-2").unwrap());
    }

    #[test]
    fn test_statistics_counts_by_status() {
        let registry = registry();
        registry.register(&ticket(10_001, "user-1")).unwrap();
        registry.register(&ticket(10_002, "user-2")).unwrap();

        let mut closed = ticket(10_003, "user-3");
        closed.apply_close("Admin", "done", chrono::Utc::now());
        registry.register(&closed).unwrap();

        let stats = registry.statistics().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.per_category.get("Slayer Carry"), Some(&3));
    }
}
