// Ledger configuration

use crate::application::constants::{
    DEFAULT_ACTIVE_WINDOW_DAYS, DEFAULT_REOPENING_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
use crate::error::{AppError, Result};
use chrono::Duration;

/// Retention and reopening thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Instances posted within this many days are duplicates
    pub active_window_days: i64,

    /// Source dates at most this many days old mark a genuine reopening
    pub reopening_window_days: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            active_window_days: DEFAULT_ACTIVE_WINDOW_DAYS,
            reopening_window_days: DEFAULT_REOPENING_WINDOW_DAYS,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, days) in [
            ("active_window_days", self.active_window_days),
            ("reopening_window_days", self.reopening_window_days),
        ] {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(AppError::Config(format!(
                    "{} must be between 1 and {} (got {})",
                    name, MAX_WINDOW_DAYS, days
                )));
            }
        }
        Ok(())
    }

    pub fn active_window(&self) -> Duration {
        Duration::days(self.active_window_days)
    }

    pub fn reopening_window(&self) -> Duration {
        Duration::days(self.reopening_window_days)
    }
}
