//! Recommendation rules
//!
//! Three independent decision lists mapping the latest aggregate(s) to advice.
//! Each list is evaluated top to bottom without early exit; the returned
//! advice keeps rule order, not severity.

mod fitness;
mod journal;
mod sleep;

pub use fitness::{
    active_minutes_advice, FitnessRules, STEP_GOAL_MET, STEP_GOAL_NEAR, STEP_GOAL_UNDER,
};
pub use journal::{JournalRules, BALANCED_FEEDBACK, NEGATIVE_FEEDBACK, POSITIVE_FEEDBACK};
pub use sleep::{
    SleepRules, SLEEP_DISTURBANCE_ADVICE, SLEEP_DURATION_GOOD, SLEEP_DURATION_LOW,
    SLEEP_DURATION_NEAR,
};

use crate::error::CoachError;

/// Latest and previous periods of an aggregate sequence
fn latest_two<T>(aggregates: &[T]) -> Result<(&T, Option<&T>), CoachError> {
    match aggregates {
        [] => Err(CoachError::insufficient(1, 0, "aggregated periods")),
        [.., prev, last] => Ok((last, Some(prev))),
        [last] => Ok((last, None)),
    }
}
