//! Ticket categories and their staff-role table
//!
//! A fixed enum-to-role mapping rather than string matching scattered
//! across call sites: each category names exactly one staff role allowed to
//! claim its tickets (superusers aside).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service category of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Slayer Carry")]
    SlayerCarry,
    #[serde(rename = "Normal Dungeon Carry")]
    NormalDungeonCarry,
    #[serde(rename = "Master Dungeon Carry")]
    MasterDungeonCarry,
    #[serde(rename = "Support Tickets")]
    SupportTickets,
    #[serde(rename = "Staff Applications")]
    StaffApplications,
    #[serde(rename = "Bug Reports")]
    BugReports,
    #[serde(rename = "Ban Appeals")]
    BanAppeals,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Self; 7] = [
        Self::SlayerCarry,
        Self::NormalDungeonCarry,
        Self::MasterDungeonCarry,
        Self::SupportTickets,
        Self::StaffApplications,
        Self::BugReports,
        Self::BanAppeals,
    ];

    /// Human-readable category name (also the serialized form)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SlayerCarry => "Slayer Carry",
            Self::NormalDungeonCarry => "Normal Dungeon Carry",
            Self::MasterDungeonCarry => "Master Dungeon Carry",
            Self::SupportTickets => "Support Tickets",
            Self::StaffApplications => "Staff Applications",
            Self::BugReports => "Bug Reports",
            Self::BanAppeals => "Ban Appeals",
        }
    }

    /// Staff role required to claim tickets in this category
    #[must_use]
    pub const fn required_role(self) -> &'static str {
        match self {
            Self::SlayerCarry => "Slayer Carrier",
            Self::NormalDungeonCarry => "Normal Dungeon Carrier",
            Self::MasterDungeonCarry => "Master Dungeon Carrier",
            Self::SupportTickets => "Support Staff",
            Self::StaffApplications => "Admin",
            Self::BugReports => "Developer",
            Self::BanAppeals => "Moderator",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}
