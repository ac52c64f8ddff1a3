use crate::core::TicketNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post-close star rating tied to a single ticket
///
/// One record per ticket, enforced at submission; the first submission wins
/// and later ones are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub ticket_number: TicketNumber,
    /// User who submitted the feedback
    pub user_id: String,
    /// Star rating, 1-5
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub suggestions: String,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_roundtrips_through_json() {
        let record = FeedbackRecord {
            ticket_number: TicketNumber::new(10001),
            user_id: "user-1".to_string(),
            rating: 5,
            comment: "fast and friendly".to_string(),
            suggestions: String::new(),
            submitted_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ticket_number"], 10001);
        let back: FeedbackRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
