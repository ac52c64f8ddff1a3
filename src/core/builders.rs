use super::{Category, Ticket, TicketNumber, TicketStatus};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
#[derive(Debug, Default)]
pub struct TicketBuilder {
    ticket_number: Option<TicketNumber>,
    requester_id: Option<String>,
    category: Option<Category>,
    channel_ref: Option<String>,
    details: String,
    status: Option<TicketStatus>,
    created_at: Option<DateTime<Utc>>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket number
    #[must_use]
    pub const fn ticket_number(mut self, number: TicketNumber) -> Self {
        self.ticket_number = Some(number);
        self
    }

    /// Set the requester
    #[must_use]
    pub fn requester_id(mut self, requester_id: impl Into<String>) -> Self {
        self.requester_id = Some(requester_id.into());
        self
    }

    /// Set the category
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the backing channel reference
    #[must_use]
    pub fn channel_ref(mut self, channel_ref: impl Into<String>) -> Self {
        self.channel_ref = Some(channel_ref.into());
        self
    }

    /// Set the free-text service details
    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Set the status (defaults to `Open`)
    #[must_use]
    pub const fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set `created_at` (defaults to now)
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the ticket, filling unset fields with defaults
    #[must_use]
    pub fn build(self) -> Ticket {
        Ticket {
            ticket_number: self.ticket_number.unwrap_or(TicketNumber::new(0)),
            requester_id: self.requester_id.unwrap_or_default(),
            category: self.category.unwrap_or(Category::SupportTickets),
            channel_ref: self.channel_ref.unwrap_or_default(),
            status: self.status.unwrap_or(TicketStatus::Open),
            claimed_by: None,
            claimed_by_name: None,
            details: self.details,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            claimed_at: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            response_duration_secs: None,
            resolution_duration_secs: None,
            responder_id: None,
            resolver_id: None,
            handled_by: None,
            closed_by: None,
            close_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_with_all_fields() {
        let created = Utc::now();
        let ticket = TicketBuilder::new()
            .ticket_number(TicketNumber::new(10001))
            .requester_id("user-1")
            .category(Category::SlayerCarry)
            .channel_ref("chan-42")
            .details("t4 voidgloom x3")
            .created_at(created)
            .build();

        assert_eq!(ticket.ticket_number, TicketNumber::new(10001));
        assert_eq!(ticket.requester_id, "user-1");
        assert_eq!(ticket.category, Category::SlayerCarry);
        assert_eq!(ticket.channel_ref, "chan-42");
        assert_eq!(ticket.details, "t4 voidgloom x3");
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.created_at, created);
        assert!(ticket.claimed_by.is_none());
    }

    #[test]
    fn test_builder_defaults() {
        let ticket = TicketBuilder::new().build();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.close_reason.is_none());
        assert!(ticket.details.is_empty());
    }
}
