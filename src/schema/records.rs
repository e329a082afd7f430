//! Per-domain metric records
//!
//! Records are immutable observations owned by the caller. Each carries its
//! date as a string; parsing happens in the ingestor so that a bad date is
//! reported as malformed input rather than a deserialization failure.

use serde::{Deserialize, Serialize};

/// Record domain, used as the discriminant of [`RecordBatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Health,
    Fitness,
    Sleep,
    Journal,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Health => "health",
            Domain::Fitness => "fitness",
            Domain::Sleep => "sleep",
            Domain::Journal => "journal",
        }
    }

    /// Key holding the record array inside a user request envelope
    pub fn envelope_key(&self) -> &'static str {
        match self {
            Domain::Health => "metrics",
            Domain::Fitness | Domain::Sleep => "activity",
            Domain::Journal => "journal_entries",
        }
    }
}

/// Field access shared by every record shape
pub trait DomainRecord: Clone {
    /// Domain this record shape belongs to
    const DOMAIN: Domain;

    /// Raw date string as supplied by the caller
    fn date(&self) -> &str;
}

/// Daily health vitals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetric {
    pub date: String,
    pub steps: u32,
    /// Heart rate (bpm)
    pub heart_rate: u32,
    pub sleep_hours: f64,
    /// Heart rate variability (ms)
    pub hrv: u32,
}

/// Daily fitness activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessActivity {
    pub date: String,
    pub steps: u32,
    pub calories: u32,
    pub active_minutes: u32,
}

/// One night of sleep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepMetric {
    pub date: String,
    /// Sleep duration (hours)
    pub duration: f64,
    pub disturbances: u32,
}

/// Free-text mood journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: String,
    pub entry: String,
}

/// Feature triple for the next-day calorie estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Day of week, Monday = 0
    pub day_of_week: u32,
    pub active_minutes: u32,
    pub steps: u32,
}

impl DomainRecord for HealthMetric {
    const DOMAIN: Domain = Domain::Health;

    fn date(&self) -> &str {
        &self.date
    }
}

impl DomainRecord for FitnessActivity {
    const DOMAIN: Domain = Domain::Fitness;

    fn date(&self) -> &str {
        &self.date
    }
}

impl DomainRecord for SleepMetric {
    const DOMAIN: Domain = Domain::Sleep;

    fn date(&self) -> &str {
        &self.date
    }
}

impl DomainRecord for JournalEntry {
    const DOMAIN: Domain = Domain::Journal;

    fn date(&self) -> &str {
        &self.date
    }
}

/// A batch of records from a single domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "records", rename_all = "lowercase")]
pub enum RecordBatch {
    Health(Vec<HealthMetric>),
    Fitness(Vec<FitnessActivity>),
    Sleep(Vec<SleepMetric>),
    Journal(Vec<JournalEntry>),
}

impl RecordBatch {
    pub fn domain(&self) -> Domain {
        match self {
            RecordBatch::Health(_) => Domain::Health,
            RecordBatch::Fitness(_) => Domain::Fitness,
            RecordBatch::Sleep(_) => Domain::Sleep,
            RecordBatch::Journal(_) => Domain::Journal,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Health(r) => r.len(),
            RecordBatch::Fitness(r) => r.len(),
            RecordBatch::Sleep(r) => r.len(),
            RecordBatch::Journal(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
