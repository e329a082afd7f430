//! wellness-trends - Rule-based wellness trend analytics
//!
//! Turns daily health, fitness, sleep and journal records into weekly trends
//! and coaching advice through a deterministic pipeline: ingestion → week
//! bucketing → normalization / weekly aggregation → rule evaluation.
//!
//! ## Modules
//!
//! - **Reports**: per-domain pipelines behind [`TrendsProcessor`] and the `*_from_json`
//!   entry points
//! - **Predictions**: next-day calories (regression) and sleep duration (seasonal forecast)
//! - **Insights**: per-user report store and holistic narrative generation

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod normalizer;
pub mod pipeline;
pub mod predict;
pub mod rules;
pub mod schema;
pub mod sentiment;
pub mod types;

pub use config::CoachConfig;
pub use error::CoachError;
pub use pipeline::{
    fitness_tracking_from_json, health_metrics_from_json, journal_sentiment_from_json,
    predict_calories_from_json, predict_sleep_from_json, sleep_analysis_from_json,
    TrendsProcessor,
};

// Schema exports
pub use schema::{Domain, RecordAdapter, RecordBatch};

// Capability seams
pub use insights::{
    aggregated_insights, record_report, InsightStore, MemoryInsightStore, NarrativeGenerator,
    SummaryNarrator,
};
pub use predict::{RegressionFitter, SeasonalForecaster};
pub use sentiment::{LexiconScorer, PolarityScorer};

/// Crate version reported by the CLI
pub const TRENDS_VERSION: &str = env!("CARGO_PKG_VERSION");
