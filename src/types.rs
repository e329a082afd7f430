//! Core types for the trends pipeline
//!
//! This module defines the data structures that flow between stages: bucketed
//! series, normalized metrics, weekly aggregates, sentiment distributions and
//! the per-domain reports handed back to callers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{Domain, DomainRecord, HealthMetric, JournalEntry};

/// A record annotated with its parsed timestamp and week bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucketed<R> {
    pub record: R,
    pub timestamp: NaiveDateTime,
    /// 1-based week index relative to the earliest record
    pub week_index: u32,
}

impl<R> Bucketed<R> {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Chronologically ordered, week-bucketed records of one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedSeries<R> {
    pub entries: Vec<Bucketed<R>>,
}

impl<R: DomainRecord> BucketedSeries<R> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucketed<R>> {
        self.entries.iter()
    }

    /// Number of distinct week buckets present
    pub fn week_count(&self) -> usize {
        let mut weeks: Vec<u32> = self.entries.iter().map(|e| e.week_index).collect();
        weeks.dedup();
        weeks.len()
    }
}

/// Health record with its vitals rescaled onto [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedHealthMetric {
    #[serde(flatten)]
    pub record: HealthMetric,
    pub week: u32,
    pub steps_normalized: f64,
    pub heart_rate_normalized: f64,
    pub sleep_normalized: f64,
    pub hrv_normalized: f64,
}

/// Period-over-period percentage change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    Defined(f64),
    /// Previous period was zero, so no ratio exists
    Undefined,
}

impl PercentChange {
    /// `(curr - prev) / prev * 100`, or `Undefined` when `prev` is zero
    pub fn between(prev: f64, curr: f64) -> Self {
        if prev == 0.0 {
            return PercentChange::Undefined;
        }
        let pct = (curr - prev) / prev * 100.0;
        if pct.is_finite() {
            PercentChange::Defined(pct)
        } else {
            PercentChange::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PercentChange::Defined(v) => Some(*v),
            PercentChange::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, PercentChange::Defined(_))
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentChange::Defined(v) => {
                let rounded = v.round_ties_even();
                // avoid "-0%" for tiny negative changes
                let rounded = if rounded == 0.0 { 0.0 } else { rounded };
                write!(f, "{:+.0}%", rounded)
            }
            PercentChange::Undefined => f.write_str("undefined"),
        }
    }
}

impl Serialize for PercentChange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One week of fitness activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyFitnessAggregate {
    pub week_index: u32,
    /// Earliest date observed in the week
    pub week: NaiveDate,
    pub average_steps: f64,
    pub average_calories: f64,
    pub average_active_minutes: f64,
    /// Absent for the first emitted week
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_steps_change: Option<PercentChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_calories_change: Option<PercentChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_active_minutes_change: Option<PercentChange>,
}

/// One week of sleep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySleepAggregate {
    pub week_index: u32,
    pub start_date: NaiveDate,
    pub avg_duration: f64,
    pub avg_disturbances: f64,
    /// Nights in the week shorter than the minimum duration
    pub below_min_duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_change: Option<PercentChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disturbances_change: Option<PercentChange>,
}

/// Polarity label produced by a [`crate::sentiment::PolarityScorer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

/// Percentage of the evaluated window carrying each label.
///
/// Labels that never occurred are absent rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentDistribution(pub BTreeMap<SentimentLabel, f64>);

impl SentimentDistribution {
    pub fn get(&self, label: SentimentLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    /// Percentage for a label, treating an absent label as zero
    pub fn percent(&self, label: SentimentLabel) -> f64 {
        self.get(label).unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized health vitals for a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub health_data: Vec<NormalizedHealthMetric>,
}

/// Weekly fitness trends and coaching advice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitnessReport {
    pub weekly_trends: Vec<WeeklyFitnessAggregate>,
    pub recommendations: Vec<String>,
}

/// Weekly sleep patterns and coaching advice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepReport {
    pub sleep_patterns: Vec<WeeklySleepAggregate>,
    pub recommendations: Vec<String>,
}

/// Journal sentiment summary and feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalReport {
    pub summary: SentimentDistribution,
    pub feedback: Vec<String>,
    /// Entries that fell inside the scoring window
    #[serde(skip)]
    pub window: Vec<JournalEntry>,
}

/// Latest artifacts computed for one user, keyed by domain
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserInsights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<FitnessReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<JournalReport>,
}

impl UserInsights {
    pub fn is_empty(&self) -> bool {
        self.health.is_none()
            && self.fitness.is_none()
            && self.sleep.is_none()
            && self.journal.is_none()
    }

    /// Replace the stored artifact for the report's domain
    pub fn apply(&mut self, report: DomainReport) {
        match report {
            DomainReport::Health(r) => self.health = Some(r),
            DomainReport::Fitness(r) => self.fitness = Some(r),
            DomainReport::Sleep(r) => self.sleep = Some(r),
            DomainReport::Journal(r) => self.journal = Some(r),
        }
    }
}

/// Report of any domain; serializes as the inner report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainReport {
    Health(HealthReport),
    Fitness(FitnessReport),
    Sleep(SleepReport),
    Journal(JournalReport),
}

impl DomainReport {
    pub fn domain(&self) -> Domain {
        match self {
            DomainReport::Health(_) => Domain::Health,
            DomainReport::Fitness(_) => Domain::Fitness,
            DomainReport::Sleep(_) => Domain::Sleep,
            DomainReport::Journal(_) => Domain::Journal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change_formatting() {
        assert_eq!(PercentChange::between(12000.0, 9000.0).to_string(), "-25%");
        assert_eq!(PercentChange::between(100.0, 105.0).to_string(), "+5%");
        assert_eq!(PercentChange::between(100.0, 100.0).to_string(), "+0%");
        assert_eq!(PercentChange::between(1000.0, 999.9).to_string(), "+0%");
    }

    #[test]
    fn test_percent_change_halves_round_to_even() {
        assert_eq!(PercentChange::between(8000.0, 9000.0).to_string(), "+12%");
        assert_eq!(PercentChange::between(160.0, 140.0).to_string(), "-12%");
        assert_eq!(PercentChange::between(8000.0, 11000.0).to_string(), "+38%");
    }

    #[test]
    fn test_percent_change_zero_previous() {
        let change = PercentChange::between(0.0, 50.0);
        assert_eq!(change, PercentChange::Undefined);
        assert_eq!(change.to_string(), "undefined");
        assert!(change.value().is_none());

        assert_eq!(PercentChange::between(0.0, 0.0), PercentChange::Undefined);
    }

    #[test]
    fn test_percent_change_serializes_as_text() {
        let json = serde_json::to_value(PercentChange::between(2000.0, 1900.0)).unwrap();
        assert_eq!(json, "-5%");
    }

    #[test]
    fn test_distribution_absent_labels() {
        let mut map = BTreeMap::new();
        map.insert(SentimentLabel::Positive, 100.0);
        let dist = SentimentDistribution(map);

        assert_eq!(dist.get(SentimentLabel::Negative), None);
        assert_eq!(dist.percent(SentimentLabel::Negative), 0.0);
        assert!((dist.total() - 100.0).abs() < 1e-9);

        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["positive"], 100.0);
        assert!(json.get("negative").is_none());
    }
}
