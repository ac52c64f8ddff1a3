//! Append-only activity log of ticket actions
//!
//! Every lifecycle mutation (create, claim, unclaim, close, archive,
//! feedback) leaves an event here. The log is advisory: a failed write is
//! reported through `tracing` but never fails the operation that produced
//! it.

use crate::core::TicketNumber;
use crate::error::Result;
use crate::storage::{PersistentStore, collections, decode_all, to_document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// One logged ticket action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketEvent {
    pub id: Uuid,
    pub ticket_number: TicketNumber,
    /// Action name, e.g. "create", "claim", "close"
    pub action: String,
    /// Who performed it
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

/// Writer/reader for the activity log collection
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn PersistentStore>,
}

impl AuditLog {
    #[must_use]
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// Appends an event. Best-effort: storage failures are logged and
    /// swallowed so an audit hiccup cannot fail the mutation it describes.
    pub fn record(&self, ticket_number: TicketNumber, action: &str, actor: &str) {
        let event = TicketEvent {
            id: Uuid::new_v4(),
            ticket_number,
            action: action.to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
        };

        let outcome = to_document(&event).and_then(|doc| {
            self.store
                .put(collections::TICKET_LOGS, &event.id.to_string(), doc)
        });
        if let Err(error) = outcome {
            warn!(%ticket_number, action, %error, "failed to write audit event");
        }
    }

    /// Most recent events across all tickets, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<TicketEvent>> {
        let raw = self.store.scan(collections::TICKET_LOGS, &|_| true)?;
        let mut events: Vec<TicketEvent> = decode_all(collections::TICKET_LOGS, raw)?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }

    /// Full history for one ticket, oldest first
    pub fn events_for(&self, ticket_number: TicketNumber) -> Result<Vec<TicketEvent>> {
        let key = serde_json::json!(ticket_number);
        let raw = self
            .store
            .scan(collections::TICKET_LOGS, &|doc| doc["ticket_number"] == key)?;
        let mut events: Vec<TicketEvent> = decode_all(collections::TICKET_LOGS, raw)?;
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }
}
