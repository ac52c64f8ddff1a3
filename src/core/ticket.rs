//! The ticket record and its state machine
//!
//! Status moves `Open → Claimed → Open` (unclaim) while active, then
//! `→ Closed → Archived`. Timing fields are first-write-wins: once a
//! timestamp is recorded it never changes, and the derived durations are
//! computed against `created_at` at record time.

use crate::core::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically assigned ticket identifier, never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketNumber(u64);

impl TicketNumber {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Storage key for this ticket's documents
    #[must_use]
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TicketNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Claimed,
    Closed,
    Archived,
}

impl TicketStatus {
    /// Whether the ticket still blocks its requester from opening another
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::Claimed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Closed => "closed",
            Self::Archived => "archived",
        };
        f.write_str(s)
    }
}

/// A support ticket tracked from creation to archival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_number: TicketNumber,
    /// User who opened the ticket
    pub requester_id: String,
    pub category: Category,
    /// Opaque reference to the communication channel backing this ticket;
    /// owned by the platform binding, stored but never interpreted here
    pub channel_ref: String,
    pub status: TicketStatus,
    /// Claiming staff member; `Some` exactly when status is `Claimed`
    pub claimed_by: Option<String>,
    /// Display name of the claimant, for user-facing messages; follows
    /// `claimed_by`
    #[serde(default)]
    pub claimed_by_name: Option<String>,
    /// Free-text service request parameters supplied at creation
    #[serde(default)]
    pub details: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_response_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Seconds from creation to first staff response
    #[serde(default)]
    pub response_duration_secs: Option<i64>,
    /// Seconds from creation to resolution
    #[serde(default)]
    pub resolution_duration_secs: Option<i64>,
    #[serde(default)]
    pub responder_id: Option<String>,
    #[serde(default)]
    pub resolver_id: Option<String>,
    /// Staff member who had the claim when the ticket was closed
    #[serde(default)]
    pub handled_by: Option<String>,
    #[serde(default)]
    pub closed_by: Option<String>,
    #[serde(default)]
    pub close_reason: Option<String>,
}

impl Ticket {
    /// Whether the ticket is still in an active (Open or Claimed) state
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Applies a claim by `actor`. Caller has already verified the ticket is
    /// unclaimed and the actor is eligible. `claimed_at` is first-write-wins
    /// across claim/unclaim cycles.
    pub(crate) fn apply_claim(&mut self, actor: &str, actor_display: &str, at: DateTime<Utc>) {
        self.claimed_by = Some(actor.to_string());
        self.claimed_by_name = Some(actor_display.to_string());
        self.status = TicketStatus::Claimed;
        if self.claimed_at.is_none() {
            self.claimed_at = Some(at);
        }
    }

    /// Releases the claim, returning the ticket to `Open`
    pub(crate) fn release_claim(&mut self) {
        self.claimed_by = None;
        self.claimed_by_name = None;
        self.status = TicketStatus::Open;
    }

    /// Records the first staff response. Returns `false` without touching
    /// anything if one was already recorded.
    pub(crate) fn record_first_response(&mut self, responder: &str, at: DateTime<Utc>) -> bool {
        if self.first_response_at.is_some() {
            return false;
        }
        self.first_response_at = Some(at);
        self.response_duration_secs = Some((at - self.created_at).num_seconds());
        self.responder_id = Some(responder.to_string());
        true
    }

    /// Records resolution under the same first-write-wins rule. Does not
    /// change `status`.
    pub(crate) fn record_resolution(&mut self, resolver: &str, at: DateTime<Utc>) -> bool {
        if self.resolved_at.is_some() {
            return false;
        }
        self.resolved_at = Some(at);
        self.resolution_duration_secs = Some((at - self.created_at).num_seconds());
        self.resolver_id = Some(resolver.to_string());
        true
    }

    /// Transitions to `Closed`. Returns `false` if already closed or
    /// archived. The claimer moves into `handled_by` so the claim invariant
    /// (`claimed_by` set only while `Claimed`) holds after close.
    pub(crate) fn apply_close(&mut self, closer: &str, reason: &str, at: DateTime<Utc>) -> bool {
        if matches!(self.status, TicketStatus::Closed | TicketStatus::Archived) {
            return false;
        }
        if self.claimed_by.is_some() {
            self.handled_by = self.claimed_by.take();
            self.claimed_by_name = None;
        }
        self.status = TicketStatus::Closed;
        self.closed_at = Some(at);
        self.closed_by = Some(closer.to_string());
        self.close_reason = Some(reason.to_string());
        true
    }

    /// Transitions `Closed → Archived`; anything else is left untouched
    pub(crate) fn apply_archive(&mut self) -> bool {
        if self.status != TicketStatus::Closed {
            return false;
        }
        self.status = TicketStatus::Archived;
        true
    }
}
