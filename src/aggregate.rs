//! Weekly aggregation
//!
//! This module groups a bucketed series by week and computes per-week means
//! plus week-over-week percentage changes:
//! - Weeks are emitted in ascending order; empty weeks are never synthesized
//! - Changes compare against the previous *emitted* week
//! - A zero previous mean yields an undefined change instead of a fault

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::schema::{FitnessActivity, SleepMetric};
use crate::types::{
    Bucketed, BucketedSeries, PercentChange, WeeklyFitnessAggregate, WeeklySleepAggregate,
};

/// Nights shorter than this (hours) count towards `below_min_duration`
pub const MIN_SLEEP_HOURS: f64 = 6.0;

/// Records sharing one week bucket
struct WeekGroup<'a, R> {
    week_index: u32,
    entries: &'a [Bucketed<R>],
}

impl<R> WeekGroup<'_, R> {
    fn start_date(&self) -> NaiveDate {
        self.entries
            .iter()
            .map(|e| e.date())
            .min()
            .unwrap_or(NaiveDate::MIN)
    }

    fn mean(&self, field: impl Fn(&R) -> f64) -> f64 {
        let sum: f64 = self.entries.iter().map(|e| field(&e.record)).sum();
        sum / self.entries.len() as f64
    }
}

/// Split an ordered series into contiguous week groups
fn group_by_week<R>(entries: &[Bucketed<R>]) -> Vec<WeekGroup<'_, R>> {
    let mut groups = Vec::new();
    let mut start = 0;

    for i in 1..=entries.len() {
        if i == entries.len() || entries[i].week_index != entries[start].week_index {
            groups.push(WeekGroup {
                week_index: entries[start].week_index,
                entries: &entries[start..i],
            });
            start = i;
        }
    }

    groups
}

/// Aggregator for weekly statistics
pub struct WeeklyAggregator;

impl WeeklyAggregator {
    /// Aggregate fitness activity by week.
    ///
    /// Means are rounded to whole numbers, halves to even, before changes are
    /// computed.
    pub fn fitness(series: &BucketedSeries<FitnessActivity>) -> Vec<WeeklyFitnessAggregate> {
        let mut weeks: Vec<WeeklyFitnessAggregate> = Vec::new();

        for group in group_by_week(&series.entries) {
            let average_steps = group.mean(|r| r.steps as f64).round_ties_even();
            let average_calories = group.mean(|r| r.calories as f64).round_ties_even();
            let average_active_minutes =
                group.mean(|r| r.active_minutes as f64).round_ties_even();

            let prev = weeks.last();
            let aggregate = WeeklyFitnessAggregate {
                week_index: group.week_index,
                week: group.start_date(),
                average_steps,
                average_calories,
                average_active_minutes,
                weekly_steps_change: prev
                    .map(|p| change("steps", p.average_steps, average_steps)),
                weekly_calories_change: prev
                    .map(|p| change("calories", p.average_calories, average_calories)),
                weekly_active_minutes_change: prev.map(|p| {
                    change(
                        "active_minutes",
                        p.average_active_minutes,
                        average_active_minutes,
                    )
                }),
            };
            weeks.push(aggregate);
        }

        debug!(
            records = series.len(),
            weeks = weeks.len(),
            "Aggregated fitness activity"
        );
        weeks
    }

    /// Aggregate sleep by week, counting nights below the minimum duration
    pub fn sleep(series: &BucketedSeries<SleepMetric>) -> Vec<WeeklySleepAggregate> {
        let mut weeks: Vec<WeeklySleepAggregate> = Vec::new();

        for group in group_by_week(&series.entries) {
            let avg_duration = group.mean(|r| r.duration);
            let avg_disturbances = group.mean(|r| r.disturbances as f64);
            let below_min_duration = group
                .entries
                .iter()
                .filter(|e| e.record.duration < MIN_SLEEP_HOURS)
                .count() as u32;

            let prev = weeks.last();
            let aggregate = WeeklySleepAggregate {
                week_index: group.week_index,
                start_date: group.start_date(),
                avg_duration,
                avg_disturbances,
                below_min_duration,
                duration_change: prev.map(|p| change("duration", p.avg_duration, avg_duration)),
                disturbances_change: prev
                    .map(|p| change("disturbances", p.avg_disturbances, avg_disturbances)),
            };
            weeks.push(aggregate);
        }

        debug!(
            records = series.len(),
            weeks = weeks.len(),
            "Aggregated sleep"
        );
        weeks
    }
}

fn change(field: &'static str, prev: f64, curr: f64) -> PercentChange {
    let pct = PercentChange::between(prev, curr);
    if !pct.is_defined() {
        warn!(field, prev, curr, "Percentage change undefined for zero baseline");
    }
    pct
}
