//! Health metric normalization
//!
//! This module rescales health vitals onto a bounded [0, 1] scale using fixed
//! reference ranges per metric.
//! - Values below the range map to 0, above it to 1
//! - Outputs are rounded to 1 decimal
//! - Non-numeric fields pass through unchanged

use tracing::debug;

use crate::error::CoachError;
use crate::ingest::Ingestor;
use crate::schema::{Domain, HealthMetric, RecordBatch};
use crate::types::{BucketedSeries, NormalizedHealthMetric};

/// Inclusive reference range for a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Linear rescale into [0, 1], clipped at the bounds
    pub fn scale(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Daily step goal
pub const STEP_GOAL: f64 = 10_000.0;

pub const STEPS_RANGE: ReferenceRange = ReferenceRange::new(0.0, STEP_GOAL);
/// Heart rate (bpm)
pub const HEART_RATE_RANGE: ReferenceRange = ReferenceRange::new(60.0, 200.0);
/// Sleep (hours)
pub const SLEEP_RANGE: ReferenceRange = ReferenceRange::new(7.0, 9.0);
/// HRV (ms)
pub const HRV_RANGE: ReferenceRange = ReferenceRange::new(20.0, 100.0);

/// Normalizer for health vitals
pub struct Normalizer;

impl Normalizer {
    /// Normalize every record of a bucketed health series
    pub fn normalize(series: &BucketedSeries<HealthMetric>) -> Vec<NormalizedHealthMetric> {
        let normalized: Vec<_> = series
            .iter()
            .map(|entry| normalize_metric(&entry.record, entry.week_index))
            .collect();

        debug!(records = normalized.len(), "Normalized health metrics");
        normalized
    }

    /// Normalize a batch, rejecting any domain other than health
    pub fn normalize_batch(
        batch: &RecordBatch,
    ) -> Result<Vec<NormalizedHealthMetric>, CoachError> {
        match batch {
            RecordBatch::Health(records) => {
                let series = Ingestor::ingest(records)?;
                Ok(Self::normalize(&series))
            }
            other => Err(CoachError::UnsupportedDomain {
                expected: Domain::Health.as_str(),
                actual: other.domain().as_str(),
            }),
        }
    }
}

fn normalize_metric(record: &HealthMetric, week: u32) -> NormalizedHealthMetric {
    NormalizedHealthMetric {
        record: record.clone(),
        week,
        steps_normalized: round1(STEPS_RANGE.scale(record.steps as f64)),
        heart_rate_normalized: round1(HEART_RATE_RANGE.scale(record.heart_rate as f64)),
        sleep_normalized: round1(SLEEP_RANGE.scale(record.sleep_hours)),
        hrv_normalized: round1(HRV_RANGE.scale(record.hrv as f64)),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
