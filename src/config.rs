//! Desk configuration
//!
//! Defaults mirror the production deployment (ticket numbers start at
//! 10000, the three carry categories are actively serviced, admins can
//! claim anything). `load` layers an optional config file and
//! `CARRY_DESK_*` environment variables on top of those defaults.

use crate::core::Category;
use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Runtime configuration for the ticket desk
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// First sequential ticket number handed out by the allocator
    pub start_number: u64,
    /// Categories currently accepting tickets; an open ticket in any other
    /// category is treated as a ghost and does not block a new one
    pub active_categories: Vec<Category>,
    /// Role allowed to claim tickets of any category
    pub superuser_role: String,
    /// How long after close a feedback submission stays valid; 0 disables
    /// the window check
    pub feedback_window_hours: i64,
    /// Age (from close) after which the cleanup sweep archives a ticket
    pub retention_days: i64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            start_number: 10_000,
            active_categories: vec![
                Category::SlayerCarry,
                Category::NormalDungeonCarry,
                Category::MasterDungeonCarry,
            ],
            superuser_role: "Admin".to_string(),
            feedback_window_hours: 24,
            retention_days: 30,
        }
    }
}

impl DeskConfig {
    /// Loads configuration, layering `path` (if given) and then
    /// `CARRY_DESK_*` environment variables over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("CARRY_DESK").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Whether `category` is currently accepting tickets
    #[must_use]
    pub fn is_active(&self, category: Category) -> bool {
        self.active_categories.contains(&category)
    }
}
