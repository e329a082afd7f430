//! Fitness coaching rules

use tracing::debug;

use super::latest_two;
use crate::config::{CoachConfig, DEFAULT_ACTIVE_MINUTES_TARGET, DEFAULT_STEP_GOAL};
use crate::error::CoachError;
use crate::types::{PercentChange, WeeklyFitnessAggregate};

pub const STEP_GOAL_UNDER: &str =
    "You're below 80% of your weekly step goal. Try adding 2,000 more steps daily.";
pub const STEP_GOAL_NEAR: &str =
    "You're close to your step goal. Add 500 steps daily to exceed it!";
pub const STEP_GOAL_MET: &str =
    "Great job on meeting your step goal! Consider adding strength or flexibility exercises.";

/// Advice for a week below `target` active minutes
pub fn active_minutes_advice(target: u32) -> String {
    format!(
        "Increase your weekly active minutes by 10% to meet the recommended {} minutes.",
        target
    )
}

/// Step ratio below which the under-goal advice fires
const UNDER_GOAL_RATIO: f64 = 0.8;

/// Decision list over weekly fitness aggregates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessRules {
    pub step_goal: u32,
    pub active_minutes_target: u32,
}

impl Default for FitnessRules {
    fn default() -> Self {
        Self {
            step_goal: DEFAULT_STEP_GOAL,
            active_minutes_target: DEFAULT_ACTIVE_MINUTES_TARGET,
        }
    }
}

impl From<&CoachConfig> for FitnessRules {
    fn from(config: &CoachConfig) -> Self {
        Self {
            step_goal: config.step_goal,
            active_minutes_target: config.active_minutes_target,
        }
    }
}

impl FitnessRules {
    pub fn with_step_goal(step_goal: u32) -> Self {
        Self {
            step_goal,
            ..Self::default()
        }
    }

    /// Evaluate the rules against the latest week
    pub fn evaluate(&self, trends: &[WeeklyFitnessAggregate]) -> Result<Vec<String>, CoachError> {
        let (last_week, previous_week) = latest_two(trends)?;
        let mut recommendations = Vec::new();

        // A zero goal would make every ratio infinite; fall back to the default
        let step_goal = if self.step_goal == 0 {
            DEFAULT_STEP_GOAL
        } else {
            self.step_goal
        };
        let steps_ratio = last_week.average_steps / step_goal as f64;

        if steps_ratio < UNDER_GOAL_RATIO {
            recommendations.push(STEP_GOAL_UNDER.to_string());
        } else if steps_ratio < 1.0 {
            recommendations.push(STEP_GOAL_NEAR.to_string());
        } else {
            recommendations.push(STEP_GOAL_MET.to_string());
        }

        if last_week.average_active_minutes < self.active_minutes_target as f64 {
            recommendations.push(active_minutes_advice(self.active_minutes_target));
        }

        if previous_week.is_some() {
            recommendations.push(format!(
                "In the last week, your steps changed by {}, calories burned changed by {}, and active minutes changed by {}.",
                render_change(last_week.weekly_steps_change),
                render_change(last_week.weekly_calories_change),
                render_change(last_week.weekly_active_minutes_change),
            ));
        }

        debug!(
            week = last_week.week_index,
            steps_ratio,
            advice = recommendations.len(),
            "Evaluated fitness rules"
        );
        Ok(recommendations)
    }
}

fn render_change(change: Option<PercentChange>) -> String {
    change.unwrap_or(PercentChange::Undefined).to_string()
}
