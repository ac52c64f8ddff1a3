//! Error types for carry-desk
//!
//! Expected business conditions (duplicate open tickets, claim conflicts,
//! authorization failures) are surfaced as dedicated variants so callers can
//! render distinct user-facing messages. Storage faults are transient: the
//! caller may retry the operation, and each single operation is atomic, so a
//! failed call never leaves partial state behind.

use crate::core::TicketNumber;
use thiserror::Error;

/// Result type alias using `CarryDeskError`
pub type Result<T> = std::result::Result<T, CarryDeskError>;

/// Errors produced by the ticket lifecycle and claim subsystem
#[derive(Debug, Error)]
pub enum CarryDeskError {
    /// No ticket exists with the given number
    #[error("Ticket #{number} not found")]
    TicketNotFound { number: TicketNumber },

    /// The requester already has a ticket in an open state
    #[error("Requester '{requester_id}' already has an open ticket")]
    DuplicateOpenTicket {
        requester_id: String,
        /// Channel backing the existing ticket, for "you already have a
        /// ticket in ..." messaging
        channel_ref: Option<String>,
    },

    /// The actor lacks the staff role required for the ticket's category
    #[error("Missing required role '{required_role}' for category '{category}'")]
    Unauthorized {
        category: String,
        required_role: String,
    },

    /// Ticket-number allocation or registration failed terminally
    #[error("Failed to allocate ticket: {reason}")]
    AllocationFailed { reason: String },

    /// Malformed input, rejected before anything is persisted
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Star rating outside the accepted 1-5 range
    #[error("Rating {rating} is out of range (must be 1-5)")]
    RatingOutOfRange { rating: u8 },

    /// The backing store failed or stayed contended past the retry budget
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// A stored document could not be decoded
    #[error("Corrupt record in collection '{collection}': {source}")]
    CorruptRecord {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error from a file-backed store
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CarryDeskError {
    /// Storage-fault helper used by store implementations
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Validation helper
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether a caller may usefully retry the failed operation
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. } | Self::Io(_))
    }
}
