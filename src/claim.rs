//! Claim/unclaim state machine
//!
//! The only true read-modify-write race in the desk: two staff members can
//! press "claim" at the same instant. Every transition re-reads the ticket
//! from the store and commits through a single compare-and-swap against the
//! exact document that was read, so of N simultaneous claims exactly one
//! wins and the rest observe `ClaimedByOther`. Claims are not stealable; a
//! claimant can only be replaced by first unclaiming.

use crate::audit::AuditLog;
use crate::config::DeskConfig;
use crate::core::{Ticket, TicketNumber};
use crate::error::{CarryDeskError, Result};
use crate::registry::{CAS_RETRY_LIMIT, TicketRegistry};
use chrono::Utc;
use tracing::info;

/// Result of a claim attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The actor now holds the claim
    Claimed,
    /// The actor already held the claim; nothing changed. Reported
    /// distinctly so the caller may treat it as a toggle or a no-op.
    AlreadyClaimedBySelf,
    /// Someone else holds the claim; nothing changed. Carries the holder's
    /// display name for "claimed by" messaging.
    ClaimedByOther(String),
}

/// Coordinates claim ownership for tickets
#[derive(Clone)]
pub struct ClaimCoordinator {
    registry: TicketRegistry,
    audit: AuditLog,
    superuser_role: String,
}

impl ClaimCoordinator {
    #[must_use]
    pub fn new(registry: TicketRegistry, audit: AuditLog, config: &DeskConfig) -> Self {
        Self {
            registry,
            audit,
            superuser_role: config.superuser_role.clone(),
        }
    }

    /// Attempts to claim the ticket for `actor_id`.
    ///
    /// The actor must hold the staff role mapped to the ticket's category,
    /// or the superuser role. `actor_display` is the human name stored for
    /// "claimed by" messaging; `ClaimedByOther` carries the holder's
    /// display name. A lost race against a concurrent claimant surfaces as
    /// `ClaimedByOther`, never as a silent double-claim.
    pub fn claim(
        &self,
        number: TicketNumber,
        actor_id: &str,
        actor_display: &str,
        actor_roles: &[String],
    ) -> Result<ClaimOutcome> {
        for _ in 0..CAS_RETRY_LIMIT {
            let (raw, ticket) = self
                .registry
                .get_raw(number)?
                .ok_or(CarryDeskError::TicketNotFound { number })?;

            self.check_eligibility(&ticket, actor_roles)?;

            if !ticket.status.is_active() {
                return Err(CarryDeskError::validation(format!(
                    "ticket #{number} is {} and cannot be claimed",
                    ticket.status
                )));
            }

            match ticket.claimed_by.as_deref() {
                None => {
                    let mut updated = ticket.clone();
                    updated.apply_claim(actor_id, actor_display, Utc::now());
                    if self.registry.swap(&raw, &updated)? {
                        info!(ticket_number = %number, actor_id, actor_display, "ticket claimed");
                        self.audit.record(number, "claim", actor_id);
                        return Ok(ClaimOutcome::Claimed);
                    }
                    // Lost the race: someone touched the document between
                    // our read and the swap. Re-read and re-dispatch.
                },
                Some(current) if current == actor_id => {
                    return Ok(ClaimOutcome::AlreadyClaimedBySelf);
                },
                Some(other) => {
                    let holder = ticket
                        .claimed_by_name
                        .clone()
                        .unwrap_or_else(|| other.to_string());
                    return Ok(ClaimOutcome::ClaimedByOther(holder));
                },
            }
        }
        Err(CarryDeskError::storage(
            "claim contention exceeded retry budget",
        ))
    }

    /// Releases the claim if and only if `actor_id` currently holds it.
    /// Returns `false` without changing anything otherwise.
    pub fn unclaim(&self, number: TicketNumber, actor_id: &str) -> Result<bool> {
        for _ in 0..CAS_RETRY_LIMIT {
            let Some((raw, ticket)) = self.registry.get_raw(number)? else {
                return Ok(false);
            };
            if ticket.claimed_by.as_deref() != Some(actor_id) {
                return Ok(false);
            }

            let mut updated = ticket.clone();
            updated.release_claim();
            if self.registry.swap(&raw, &updated)? {
                info!(ticket_number = %number, actor_id, "ticket unclaimed");
                self.audit.record(number, "unclaim", actor_id);
                return Ok(true);
            }
        }
        Err(CarryDeskError::storage(
            "unclaim contention exceeded retry budget",
        ))
    }

    fn check_eligibility(&self, ticket: &Ticket, actor_roles: &[String]) -> Result<()> {
        let required = ticket.category.required_role();
        let eligible = actor_roles
            .iter()
            .any(|role| role == required || *role == self.superuser_role);
        if eligible {
            Ok(())
        } else {
            Err(CarryDeskError::Unauthorized {
                category: ticket.category.name().to_string(),
                required_role: required.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestDesk, roles};

    #[test]
    fn test_claim_requires_category_role() {
        let desk = TestDesk::new();
        let number = desk.open_ticket("user-1", crate::core::Category::SlayerCarry);

        let err = desk
            .claims
            .claim(number, "Mallory", "Mallory", &roles(&["Normal Dungeon Carrier"]))
            .unwrap_err();
        assert!(matches!(err, CarryDeskError::Unauthorized { .. }));

        // superuser role claims anything
        let outcome = desk
            .claims
            .claim(number, "Root", "Root", &roles(&["Admin"]))
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);
    }

    #[test]
    fn test_claim_is_exclusive_and_idempotent_for_self() {
        let desk = TestDesk::new();
        let number = desk.open_ticket("user-1", crate::core::Category::SlayerCarry);
        let carrier = roles(&["Slayer Carrier"]);

        assert_eq!(
            desk.claims.claim(number, "Alice", "Alice", &carrier).unwrap(),
            ClaimOutcome::Claimed
        );
        assert_eq!(
            desk.claims.claim(number, "Alice", "Alice", &carrier).unwrap(),
            ClaimOutcome::AlreadyClaimedBySelf
        );
        assert_eq!(
            desk.claims.claim(number, "Bob", "Bob", &carrier).unwrap(),
            ClaimOutcome::ClaimedByOther("Alice".to_string())
        );

        let ticket = desk.registry.get(number).unwrap().unwrap();
        assert_eq!(ticket.claimed_by.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_claimed_by_other_reports_display_name() {
        let desk = TestDesk::new();
        let number = desk.open_ticket("user-1", crate::core::Category::SlayerCarry);
        let carrier = roles(&["Slayer Carrier"]);

        desk.claims
            .claim(number, "staff-1001", "Alice", &carrier)
            .unwrap();
        assert_eq!(
            desk.claims
                .claim(number, "staff-1002", "Bob", &carrier)
                .unwrap(),
            ClaimOutcome::ClaimedByOther("Alice".to_string())
        );

        // the raw id is what ownership checks run against
        let ticket = desk.registry.get(number).unwrap().unwrap();
        assert_eq!(ticket.claimed_by.as_deref(), Some("staff-1001"));
        assert_eq!(ticket.claimed_by_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_unclaim_only_by_claimant() {
        let desk = TestDesk::new();
        let number = desk.open_ticket("user-1", crate::core::Category::SlayerCarry);
        let carrier = roles(&["Slayer Carrier"]);

        desk.claims.claim(number, "Alice", "Alice", &carrier).unwrap();
        assert!(!desk.claims.unclaim(number, "Bob").unwrap());
        assert!(desk.claims.unclaim(number, "Alice").unwrap());
        assert!(!desk.claims.unclaim(number, "Alice").unwrap());

        // ticket is open for the next claimant
        assert_eq!(
            desk.claims.claim(number, "Bob", "Bob", &carrier).unwrap(),
            ClaimOutcome::Claimed
        );
    }

    #[test]
    fn test_claim_missing_ticket() {
        let desk = TestDesk::new();
        let err = desk
            .claims
            .claim(TicketNumber::new(99_999), "Alice", "Alice", &roles(&["Admin"]))
            .unwrap_err();
        assert!(matches!(err, CarryDeskError::TicketNotFound { .. }));
    }

    #[test]
    fn test_claim_closed_ticket_rejected() {
        let desk = TestDesk::new();
        let number = desk.open_ticket("user-1", crate::core::Category::SlayerCarry);
        desk.lifecycle.close(number, "Admin", "done").unwrap();

        let err = desk
            .claims
            .claim(number, "Alice", "Alice", &roles(&["Slayer Carrier"]))
            .unwrap_err();
        assert!(matches!(err, CarryDeskError::Validation { .. }));
    }
}
