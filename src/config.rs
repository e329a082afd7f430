//! Pipeline configuration
//!
//! Thresholds that callers may reasonably tune. Everything else (reference
//! ranges, rule cut-offs) is fixed in the module that owns it.

use serde::{Deserialize, Serialize};

use crate::error::CoachError;

/// Default daily step goal
pub const DEFAULT_STEP_GOAL: u32 = 10_000;

/// Default weekly active minutes target
pub const DEFAULT_ACTIVE_MINUTES_TARGET: u32 = 150;

/// Default number of most recent journal entries scored
pub const DEFAULT_JOURNAL_WINDOW: usize = 10;

/// Default seasonal period for the sleep forecaster (days)
pub const DEFAULT_SEASONAL_PERIOD_DAYS: usize = 7;

/// Tunable pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub step_goal: u32,
    pub active_minutes_target: u32,
    pub journal_window: usize,
    pub seasonal_period_days: usize,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            step_goal: DEFAULT_STEP_GOAL,
            active_minutes_target: DEFAULT_ACTIVE_MINUTES_TARGET,
            journal_window: DEFAULT_JOURNAL_WINDOW,
            seasonal_period_days: DEFAULT_SEASONAL_PERIOD_DAYS,
        }
    }
}

impl CoachConfig {
    /// Load configuration from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, CoachError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject settings that would make a stage divide by zero or score nothing
    pub fn validate(&self) -> Result<(), CoachError> {
        if self.step_goal == 0 {
            return Err(CoachError::MalformedInput(
                "step_goal must be greater than zero".to_string(),
            ));
        }
        if self.journal_window == 0 {
            return Err(CoachError::MalformedInput(
                "journal_window must be greater than zero".to_string(),
            ));
        }
        if self.seasonal_period_days < 2 {
            return Err(CoachError::MalformedInput(
                "seasonal_period_days must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}
