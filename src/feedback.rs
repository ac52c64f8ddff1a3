//! Post-close feedback collection
//!
//! Star ratings (1-5) tied to closed tickets. One record per ticket, first
//! submission wins; later duplicates are dropped, not merged. The
//! feedback-request prompt has a bounded validity window after close.
//! There is no background expiry task, the window is checked lazily when a
//! submission arrives, and a late submission is simply inert.

use crate::audit::AuditLog;
use crate::core::{FeedbackRecord, TicketNumber, TicketStatus};
use crate::error::{CarryDeskError, Result};
use crate::registry::TicketRegistry;
use crate::storage::{PersistentStore, collections, decode_all, load_document, to_document};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

/// Aggregate feedback figures
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackStats {
    pub count: usize,
    /// Mean rating across all records; 0.0 for an empty set by convention
    pub average_rating: f64,
}

/// Records and aggregates post-close star ratings
#[derive(Clone)]
pub struct FeedbackCollector {
    store: Arc<dyn PersistentStore>,
    registry: TicketRegistry,
    audit: AuditLog,
    window_hours: i64,
}

impl FeedbackCollector {
    #[must_use]
    pub fn new(
        store: Arc<dyn PersistentStore>,
        registry: TicketRegistry,
        audit: AuditLog,
        window_hours: i64,
    ) -> Self {
        Self {
            store,
            registry,
            audit,
            window_hours,
        }
    }

    /// Submits feedback for a closed ticket.
    ///
    /// Returns `Ok(true)` when the record was stored, `Ok(false)` when it
    /// was dropped (duplicate submission, or the validity window has
    /// lapsed). A rating outside 1-5 is a validation error and nothing is
    /// persisted.
    pub fn submit(
        &self,
        number: TicketNumber,
        user_id: &str,
        rating: u8,
        comment: &str,
        suggestions: &str,
    ) -> Result<bool> {
        if !(1..=5).contains(&rating) {
            return Err(CarryDeskError::RatingOutOfRange { rating });
        }

        let ticket = self
            .registry
            .get(number)?
            .ok_or(CarryDeskError::TicketNotFound { number })?;
        if !matches!(ticket.status, TicketStatus::Closed | TicketStatus::Archived) {
            return Err(CarryDeskError::validation(format!(
                "ticket #{number} is {}; feedback is accepted only after close",
                ticket.status
            )));
        }

        if self.window_hours > 0 {
            let lapsed = ticket
                .closed_at
                .is_some_and(|closed_at| Utc::now() - closed_at > Duration::hours(self.window_hours));
            if lapsed {
                info!(ticket_number = %number, user_id, "feedback window lapsed, dropping submission");
                return Ok(false);
            }
        }

        let record = FeedbackRecord {
            ticket_number: number,
            user_id: user_id.to_string(),
            rating,
            comment: comment.to_string(),
            suggestions: suggestions.to_string(),
            submitted_at: Utc::now(),
        };
        let doc = to_document(&record)?;
        let inserted =
            self.store
                .compare_and_swap(collections::FEEDBACK, &number.key(), None, doc)?;
        if inserted {
            info!(ticket_number = %number, user_id, rating, "feedback recorded");
            self.audit.record(number, "feedback", user_id);
        } else {
            info!(ticket_number = %number, user_id, "duplicate feedback dropped");
        }
        Ok(inserted)
    }

    /// The feedback record for a ticket, if one was submitted
    pub fn get(&self, number: TicketNumber) -> Result<Option<FeedbackRecord>> {
        Ok(
            load_document(self.store.as_ref(), collections::FEEDBACK, &number.key())?
                .map(|(_, record)| record),
        )
    }

    /// Count and mean rating over every stored record
    pub fn aggregate_stats(&self) -> Result<FeedbackStats> {
        let raw = self.store.scan(collections::FEEDBACK, &|_| true)?;
        let records: Vec<FeedbackRecord> = decode_all(collections::FEEDBACK, raw)?;

        if records.is_empty() {
            return Ok(FeedbackStats::default());
        }
        let sum: u64 = records.iter().map(|r| u64::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_rating = sum as f64 / records.len() as f64;
        Ok(FeedbackStats {
            count: records.len(),
            average_rating,
        })
    }
}
