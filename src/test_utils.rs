//! Test utilities for carry-desk
//!
//! Common fixtures shared by the unit tests: a fully wired desk over an
//! in-memory store, plus small factories for tickets and role sets.

#![cfg(test)]

use crate::audit::AuditLog;
use crate::claim::ClaimCoordinator;
use crate::config::DeskConfig;
use crate::core::{Category, Ticket, TicketBuilder, TicketNumber};
use crate::feedback::FeedbackCollector;
use crate::lifecycle::{CloseHook, TicketLifecycle};
use crate::registry::TicketRegistry;
use crate::storage::{MemoryStore, PersistentStore, collections, to_document};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A desk wired over a shared in-memory store
pub struct TestDesk {
    pub store: Arc<dyn PersistentStore>,
    pub registry: TicketRegistry,
    pub claims: ClaimCoordinator,
    pub lifecycle: TicketLifecycle,
    pub feedback: FeedbackCollector,
    pub audit: AuditLog,
}

impl TestDesk {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_close_hook(hook: Arc<dyn CloseHook>) -> Self {
        Self::build(Some(hook))
    }

    fn build(hook: Option<Arc<dyn CloseHook>>) -> Self {
        let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
        let config = DeskConfig::default();

        let registry = TicketRegistry::new(Arc::clone(&store), &config);
        let audit = AuditLog::new(Arc::clone(&store));
        let claims = ClaimCoordinator::new(registry.clone(), audit.clone(), &config);
        let feedback = FeedbackCollector::new(
            Arc::clone(&store),
            registry.clone(),
            audit.clone(),
            config.feedback_window_hours,
        );
        let mut lifecycle = TicketLifecycle::new(registry.clone(), audit.clone(), config);
        if let Some(hook) = hook {
            lifecycle = lifecycle.with_close_hook(hook);
        }

        Self {
            store,
            registry,
            claims,
            lifecycle,
            feedback,
            audit,
        }
    }

    /// Creates an open ticket and returns its number
    pub fn open_ticket(&self, requester_id: &str, category: Category) -> TicketNumber {
        self.lifecycle
            .create(
                requester_id,
                category,
                &format!("chan-{requester_id}"),
                "test details",
            )
            .expect("failed to create ticket")
            .ticket_number
    }

    /// Rewrites a ticket's `closed_at` to `days_ago`, for retention and
    /// feedback-window tests
    pub fn backdate_close(&self, number: TicketNumber, days_ago: i64) {
        let mut ticket = self
            .registry
            .get(number)
            .expect("failed to load ticket")
            .expect("ticket missing");
        ticket.closed_at = Some(Utc::now() - Duration::days(days_ago));
        let doc = to_document(&ticket).expect("failed to encode ticket");
        self.store
            .put(collections::TICKETS, &number.key(), doc)
            .expect("failed to backdate ticket");
    }
}

/// Role set from static names
pub fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// A ticket with sensible defaults for state-machine tests
pub fn sample_ticket(number: u64, requester_id: &str, category: Category) -> Ticket {
    TicketBuilder::new()
        .ticket_number(TicketNumber::new(number))
        .requester_id(requester_id)
        .category(category)
        .channel_ref(format!("chan-{number}"))
        .details("test details")
        .build()
}

/// Close hook that counts invocations and keeps the last snapshot
#[derive(Default)]
pub struct CountingCloseHook {
    calls: AtomicUsize,
    last: Mutex<Option<Ticket>>,
}

impl CountingCloseHook {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_snapshot(&self) -> Option<Ticket> {
        self.last.lock().unwrap().clone()
    }
}

impl CloseHook for CountingCloseHook {
    fn on_close(&self, ticket: &Ticket) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(ticket.clone());
    }
}
