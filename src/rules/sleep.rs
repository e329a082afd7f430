//! Sleep coaching rules

use tracing::debug;

use super::latest_two;
use crate::aggregate::MIN_SLEEP_HOURS;
use crate::error::CoachError;
use crate::types::WeeklySleepAggregate;

pub const SLEEP_DURATION_LOW: &str =
    "Your average sleep time has dropped below 6 hours. Consider a consistent bedtime routine.";
pub const SLEEP_DURATION_NEAR: &str =
    "You're close to the recommended 7-8 hours of sleep. Try to sleep a little earlier.";
pub const SLEEP_DURATION_GOOD: &str = "Great job maintaining good sleep duration!";
pub const SLEEP_DISTURBANCE_ADVICE: &str = "You have frequent sleep disturbances. Consider reducing screen time before bed or trying relaxation techniques.";

/// Recommended minimum sleep (hours)
const RECOMMENDED_SLEEP_HOURS: f64 = 7.0;

/// Average nightly disturbances above which the disturbance advice fires
const MAX_AVG_DISTURBANCES: f64 = 2.0;

/// Short nights per week above which the count advice fires
const MAX_SHORT_NIGHTS: u32 = 1;

/// Decision list over weekly sleep aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SleepRules;

impl SleepRules {
    /// Evaluate the rules against the latest week
    pub fn evaluate(&self, trends: &[WeeklySleepAggregate]) -> Result<Vec<String>, CoachError> {
        let (last_week, previous_week) = latest_two(trends)?;
        let mut recommendations = Vec::new();

        if last_week.avg_duration < MIN_SLEEP_HOURS {
            recommendations.push(SLEEP_DURATION_LOW.to_string());
        } else if last_week.avg_duration < RECOMMENDED_SLEEP_HOURS {
            recommendations.push(SLEEP_DURATION_NEAR.to_string());
        } else {
            recommendations.push(SLEEP_DURATION_GOOD.to_string());
        }

        if last_week.avg_disturbances > MAX_AVG_DISTURBANCES {
            recommendations.push(SLEEP_DISTURBANCE_ADVICE.to_string());
        }

        let below_min = last_week.below_min_duration;
        if below_min > MAX_SHORT_NIGHTS {
            recommendations.push(format!(
                "Sleep duration was less than 6 hours {} times in the last week. Consider improving your sleep quality by reducing caffeine intake or establishing a relaxing bedtime ritual.",
                below_min
            ));
        }

        if let Some(prev_week) = previous_week {
            recommendations.push(format!(
                "In the past two weeks, sleep duration was less than 6 hours {} times in total. Focus on consistent sleep habits.",
                below_min + prev_week.below_min_duration
            ));
        }

        debug!(
            week = last_week.week_index,
            avg_duration = last_week.avg_duration,
            advice = recommendations.len(),
            "Evaluated sleep rules"
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn week(
        index: u32,
        avg_duration: f64,
        avg_disturbances: f64,
        below: u32,
    ) -> WeeklySleepAggregate {
        WeeklySleepAggregate {
            week_index: index,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            avg_duration,
            avg_disturbances,
            below_min_duration: below,
            duration_change: None,
            disturbances_change: None,
        }
    }

    #[test]
    fn test_single_short_week() {
        let advice = SleepRules.evaluate(&[week(1, 5.5, 3.0, 4)]).unwrap();

        assert_eq!(advice.len(), 3);
        assert_eq!(advice[0], SLEEP_DURATION_LOW);
        assert_eq!(advice[1], SLEEP_DISTURBANCE_ADVICE);
        assert!(advice[2].contains("less than 6 hours 4 times in the last week"));
        assert!(!advice.iter().any(|a| a.contains("past two weeks")));
    }

    #[test]
    fn test_two_week_cumulative() {
        let advice = SleepRules
            .evaluate(&[week(1, 6.5, 1.0, 1), week(2, 7.5, 1.0, 0)])
            .unwrap();

        assert_eq!(
            advice,
            vec![
                SLEEP_DURATION_GOOD.to_string(),
                "In the past two weeks, sleep duration was less than 6 hours 1 times in total. Focus on consistent sleep habits.".to_string(),
            ]
        );
    }

    #[test]
    fn test_only_latest_two_weeks_counted() {
        let advice = SleepRules
            .evaluate(&[week(1, 5.0, 0.0, 7), week(2, 6.5, 0.0, 2), week(3, 6.5, 0.0, 3)])
            .unwrap();

        assert_eq!(advice[0], SLEEP_DURATION_NEAR);
        assert!(advice[1].contains("3 times in the last week"));
        assert!(advice[2].contains("5 times in total"));
    }

    #[test]
    fn test_exactly_one_duration_advice() {
        for avg in [0.0, 5.99, 6.0, 6.99, 7.0, 12.0] {
            let advice = SleepRules.evaluate(&[week(1, avg, 0.0, 0)]).unwrap();
            let duration_advice = advice
                .iter()
                .filter(|a| {
                    [SLEEP_DURATION_LOW, SLEEP_DURATION_NEAR, SLEEP_DURATION_GOOD]
                        .contains(&a.as_str())
                })
                .count();
            assert_eq!(duration_advice, 1, "avg_duration = {}", avg);
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        let advice = SleepRules.evaluate(&[week(1, 7.0, 2.0, 1)]).unwrap();
        assert_eq!(advice, vec![SLEEP_DURATION_GOOD.to_string()]);
    }

    #[test]
    fn test_empty_trends() {
        assert!(matches!(
            SleepRules.evaluate(&[]),
            Err(CoachError::InsufficientData { .. })
        ));
    }
}
