//! Ticket lifecycle orchestration: Open → (Claimed) → Closed → Archived
//!
//! Composes the registry and the claim coordinator's storage discipline:
//! every mutation re-reads the stored document and commits by
//! compare-and-swap. Creation is all-or-nothing; the duplicate-open check
//! runs before a number is allocated, so a rejected request never burns
//! one. Close is idempotent and hands the finalized snapshot to the
//! configured [`CloseHook`] exactly once.

use crate::audit::AuditLog;
use crate::config::DeskConfig;
use crate::core::{Category, Ticket, TicketBuilder, TicketNumber, TicketStatus};
use crate::error::{CarryDeskError, Result};
use crate::registry::{CAS_RETRY_LIMIT, TicketRegistry};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Receives the finalized ticket snapshot when a close transition wins.
///
/// This is the hand-off point for transcript generation and close
/// notifications; the lifecycle guarantees at most one invocation per
/// ticket close.
pub trait CloseHook: Send + Sync {
    fn on_close(&self, ticket: &Ticket);
}

/// Orchestrates the full ticket state machine
#[derive(Clone)]
pub struct TicketLifecycle {
    registry: TicketRegistry,
    audit: AuditLog,
    config: DeskConfig,
    close_hook: Option<Arc<dyn CloseHook>>,
}

impl TicketLifecycle {
    #[must_use]
    pub fn new(registry: TicketRegistry, audit: AuditLog, config: DeskConfig) -> Self {
        Self {
            registry,
            audit,
            config,
            close_hook: None,
        }
    }

    /// Installs the collaborator notified on each successful close
    #[must_use]
    pub fn with_close_hook(mut self, hook: Arc<dyn CloseHook>) -> Self {
        self.close_hook = Some(hook);
        self
    }

    /// Opens a new ticket for `requester_id`.
    ///
    /// Rejected with `DuplicateOpenTicket` while the requester already has
    /// an active ticket, unless that ticket's category is no longer
    /// actively serviced; such ghosts do not block. The check runs before
    /// allocation, so rejection never consumes a ticket number.
    pub fn create(
        &self,
        requester_id: &str,
        category: Category,
        channel_ref: &str,
        details: &str,
    ) -> Result<Ticket> {
        if requester_id.is_empty() || channel_ref.is_empty() {
            return Err(CarryDeskError::validation(
                "requester_id and channel_ref are required",
            ));
        }

        if let Some(existing) = self.registry.open_ticket(requester_id)? {
            if self.config.is_active(existing.category) {
                return Err(CarryDeskError::DuplicateOpenTicket {
                    requester_id: requester_id.to_string(),
                    channel_ref: Some(existing.channel_ref),
                });
            }
            info!(
                requester_id,
                ghost_ticket = %existing.ticket_number,
                ghost_category = %existing.category,
                "existing open ticket is in an inactive category, allowing new ticket"
            );
        }

        let number = self.registry.allocate_ticket_number();
        let ticket = TicketBuilder::new()
            .ticket_number(number)
            .requester_id(requester_id)
            .category(category)
            .channel_ref(channel_ref)
            .details(details)
            .created_at(Utc::now())
            .build();

        if !self.registry.register(&ticket)? {
            return Err(CarryDeskError::AllocationFailed {
                reason: format!("ticket #{number} could not be registered"),
            });
        }
        self.audit.record(number, "create", requester_id);
        Ok(ticket)
    }

    /// Records the first staff response time. First-write-wins: repeat
    /// calls return `false` and leave the original timestamp untouched.
    pub fn record_first_response(&self, number: TicketNumber, responder_id: &str) -> Result<bool> {
        self.update(number, "first_response", responder_id, |ticket, actor| {
            ticket.record_first_response(actor, Utc::now())
        })
    }

    /// Records resolution under the same first-write-wins rule; the
    /// ticket's status is not changed.
    pub fn resolve(&self, number: TicketNumber, resolver_id: &str) -> Result<bool> {
        self.update(number, "resolve", resolver_id, |ticket, actor| {
            ticket.record_resolution(actor, Utc::now())
        })
    }

    /// Closes the ticket. Returns `true` on the winning transition, during
    /// which the close hook receives the finalized snapshot; a repeat close
    /// returns `false` and fires nothing.
    pub fn close(&self, number: TicketNumber, closer_id: &str, reason: &str) -> Result<bool> {
        for _ in 0..CAS_RETRY_LIMIT {
            let (raw, ticket) = self
                .registry
                .get_raw(number)?
                .ok_or(CarryDeskError::TicketNotFound { number })?;

            let mut updated = ticket.clone();
            if !updated.apply_close(closer_id, reason, Utc::now()) {
                return Ok(false);
            }
            if self.registry.swap(&raw, &updated)? {
                info!(ticket_number = %number, closer_id, reason, "ticket closed");
                self.audit.record(number, "close", closer_id);
                if let Some(hook) = &self.close_hook {
                    hook.on_close(&updated);
                }
                return Ok(true);
            }
        }
        Err(CarryDeskError::storage(
            "close contention exceeded retry budget",
        ))
    }

    /// Runs [`cleanup`](Self::cleanup) with the configured retention period
    pub fn cleanup_expired(&self) -> Result<usize> {
        self.cleanup(self.config.retention_days)
    }

    /// Archives Closed tickets whose `closed_at` is older than
    /// `max_age_days`. Returns how many were archived. Tickets in any other
    /// state are never touched.
    pub fn cleanup(&self, max_age_days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let mut archived = 0;

        for ticket in self.registry.tickets_by_status(TicketStatus::Closed)? {
            let eligible = ticket.closed_at.is_some_and(|closed_at| closed_at < cutoff);
            if !eligible {
                continue;
            }
            match self.archive_one(ticket.ticket_number) {
                Ok(true) => archived += 1,
                Ok(false) => {},
                Err(e) => {
                    // Keep sweeping; one stuck ticket should not stall the
                    // whole retention pass.
                    error!(ticket_number = %ticket.ticket_number, error = %e, "archive failed");
                },
            }
        }

        if archived > 0 {
            info!(archived, max_age_days, "cleanup sweep archived tickets");
        }
        Ok(archived)
    }

    fn archive_one(&self, number: TicketNumber) -> Result<bool> {
        for _ in 0..CAS_RETRY_LIMIT {
            let Some((raw, ticket)) = self.registry.get_raw(number)? else {
                return Ok(false);
            };
            let mut updated = ticket.clone();
            if !updated.apply_archive() {
                return Ok(false);
            }
            if self.registry.swap(&raw, &updated)? {
                self.audit.record(number, "archive", "retention-sweep");
                return Ok(true);
            }
        }
        Err(CarryDeskError::storage(
            "archive contention exceeded retry budget",
        ))
    }

    /// Shared CAS loop for first-write-wins timestamp updates
    fn update(
        &self,
        number: TicketNumber,
        action: &str,
        actor: &str,
        apply: impl Fn(&mut Ticket, &str) -> bool,
    ) -> Result<bool> {
        for _ in 0..CAS_RETRY_LIMIT {
            let (raw, ticket) = self
                .registry
                .get_raw(number)?
                .ok_or(CarryDeskError::TicketNotFound { number })?;

            let mut updated = ticket.clone();
            if !apply(&mut updated, actor) {
                return Ok(false);
            }
            if self.registry.swap(&raw, &updated)? {
                self.audit.record(number, action, actor);
                return Ok(true);
            }
        }
        Err(CarryDeskError::storage(format!(
            "{action} contention exceeded retry budget"
        )))
    }
}
