//! Core domain types for carry-desk
//!
//! The ticket model, its status state machine, the fixed category table,
//! and the feedback record. Pure data and transition logic only; everything
//! touching the store lives in the registry/claim/lifecycle modules.

mod builders;
mod category;
mod feedback;
mod ticket;

pub use builders::TicketBuilder;
pub use category::Category;
pub use feedback::FeedbackRecord;
pub use ticket::{Ticket, TicketNumber, TicketStatus};
