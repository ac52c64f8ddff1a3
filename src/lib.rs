//! carry-desk - ticket lifecycle and claim coordination for a community
//! support desk
//!
//! This crate is the platform-independent core of a support-ticket
//! workflow: users open tickets, staff claim and close them, and feedback
//! is collected after close. It provides:
//! - Sequential ticket numbering with a logged surrogate fallback
//! - A one-open-ticket-per-requester invariant
//! - A claim/unclaim state machine safe against simultaneous claims
//! - First-write-wins response/resolution timing
//! - Idempotent close with exactly-once snapshot hand-off
//! - Post-close star-rating feedback with a lazy validity window
//!
//! # Concurrent Safety
//!
//! All shared mutable state (the ticket-number counter and each ticket's
//! claim field) is linearized through the storage layer's
//! compare-and-swap. Components re-read the stored document before every
//! mutation and never write back a cached copy, so interleaved handlers
//! cannot lose updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use carry_desk::config::DeskConfig;
//! use carry_desk::core::Category;
//! use carry_desk::storage::MemoryStore;
//! use carry_desk::{AuditLog, ClaimCoordinator, TicketLifecycle, TicketRegistry};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let config = DeskConfig::default();
//! let registry = TicketRegistry::new(store.clone(), &config);
//! let audit = AuditLog::new(store.clone());
//! let claims = ClaimCoordinator::new(registry.clone(), audit.clone(), &config);
//! let lifecycle = TicketLifecycle::new(registry.clone(), audit, config);
//!
//! let ticket = lifecycle.create("user-1", Category::SlayerCarry, "chan-1", "t4 x3")?;
//! claims.claim(ticket.ticket_number, "staff-1001", "Alice", &["Slayer Carrier".to_string()])?;
//! lifecycle.close(ticket.ticket_number, "Alice", "done")?;
//! ```

pub mod audit;
pub mod claim;
pub mod config;
pub mod core;
pub mod error;
pub mod feedback;
pub mod lifecycle;
pub mod registry;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use crate::audit::{AuditLog, TicketEvent};
pub use crate::claim::{ClaimCoordinator, ClaimOutcome};
pub use crate::config::DeskConfig;
pub use crate::core::{Category, FeedbackRecord, Ticket, TicketNumber, TicketStatus};
pub use crate::error::{CarryDeskError, Result};
pub use crate::feedback::{FeedbackCollector, FeedbackStats};
pub use crate::lifecycle::{CloseHook, TicketLifecycle};
pub use crate::registry::{DeskStatistics, TicketRegistry};
