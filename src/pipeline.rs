//! Pipeline orchestration
//!
//! This module provides the public API for wellness-trends.
//! It wires ingestion, normalization, weekly aggregation, the rule engine,
//! sentiment scoring and the predictors into per-domain reports.

use serde_json::json;
use tracing::debug;

use crate::aggregate::WeeklyAggregator;
use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::ingest::Ingestor;
use crate::normalizer::Normalizer;
use crate::predict::{
    self, AdditiveSeasonalForecaster, OrdinaryLeastSquares, RegressionFitter, SeasonalForecaster,
};
use crate::rules::{FitnessRules, JournalRules, SleepRules};
use crate::schema::{
    Domain, FitnessActivity, HealthMetric, JournalEntry, PredictionInput, RecordAdapter,
    RecordBatch, RecordEnvelope, SleepMetric,
};
use crate::sentiment::{LexiconScorer, PolarityScorer, SentimentAggregator};
use crate::types::{DomainReport, FitnessReport, HealthReport, JournalReport, SleepReport};

/// Normalize health metrics from a JSON array or `{"user_id", "metrics"}` envelope.
///
/// # Example
/// ```ignore
/// let report = health_metrics_from_json(r#"[{"date": "2024-01-01", ...}]"#.to_string())?;
/// ```
pub fn health_metrics_from_json(raw_json: String) -> Result<String, CoachError> {
    report_from_json(Domain::Health, &raw_json)
}

/// Weekly fitness trends and advice from a JSON array or `{"user_id", "activity"}` envelope
pub fn fitness_tracking_from_json(raw_json: String) -> Result<String, CoachError> {
    report_from_json(Domain::Fitness, &raw_json)
}

/// Weekly sleep patterns and advice from a JSON array or `{"user_id", "activity"}` envelope
pub fn sleep_analysis_from_json(raw_json: String) -> Result<String, CoachError> {
    report_from_json(Domain::Sleep, &raw_json)
}

/// Journal sentiment and feedback from a JSON array or `{"user_id", "journal_entries"}` envelope
pub fn journal_sentiment_from_json(raw_json: String) -> Result<String, CoachError> {
    report_from_json(Domain::Journal, &raw_json)
}

/// Predict next-day calories.
///
/// # Arguments
/// * `raw_json` - Fitness history (array or envelope)
/// * `input_json` - `{"day_of_week", "active_minutes", "steps"}`
///
/// # Returns
/// `{"predicted_calories": <integer>}`
pub fn predict_calories_from_json(
    raw_json: String,
    input_json: String,
) -> Result<String, CoachError> {
    let envelope: RecordEnvelope<FitnessActivity> = RecordAdapter::parse(&raw_json)?;
    let input = RecordAdapter::parse_prediction_input(&input_json)?;
    let calories = TrendsProcessor::new().predict_calories(&envelope.records, &input)?;
    Ok(json!({ "predicted_calories": calories }).to_string())
}

/// Forecast next-day sleep duration; returns `{"predicted_sleep_duration": <hours>}`
pub fn predict_sleep_from_json(raw_json: String) -> Result<String, CoachError> {
    let envelope: RecordEnvelope<SleepMetric> = RecordAdapter::parse(&raw_json)?;
    let hours = TrendsProcessor::new().predict_sleep_duration(&envelope.records)?;
    Ok(json!({ "predicted_sleep_duration": hours }).to_string())
}

fn report_from_json(domain: Domain, raw_json: &str) -> Result<String, CoachError> {
    let (_, report) = TrendsProcessor::new().process_json(domain, raw_json)?;
    Ok(serde_json::to_string(&report)?)
}

/// Configured processor with injectable scoring and prediction capabilities.
///
/// Holds no per-user state; pair it with an
/// [`InsightStore`](crate::insights::InsightStore) to keep reports between calls.
pub struct TrendsProcessor {
    config: CoachConfig,
    scorer: Box<dyn PolarityScorer>,
    fitter: Box<dyn RegressionFitter>,
    forecaster: Box<dyn SeasonalForecaster>,
}

impl Default for TrendsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendsProcessor {
    /// Create a processor with default settings and the built-in capabilities
    pub fn new() -> Self {
        Self::with_config(CoachConfig::default())
    }

    /// Create a processor with specific settings
    pub fn with_config(config: CoachConfig) -> Self {
        let forecaster = AdditiveSeasonalForecaster::new(config.seasonal_period_days);
        Self {
            config,
            scorer: Box::new(LexiconScorer),
            fitter: Box::new(OrdinaryLeastSquares),
            forecaster: Box::new(forecaster),
        }
    }

    /// Replace the journal polarity scorer
    pub fn with_scorer(mut self, scorer: impl PolarityScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Replace the calorie regression
    pub fn with_fitter(mut self, fitter: impl RegressionFitter + 'static) -> Self {
        self.fitter = Box::new(fitter);
        self
    }

    /// Replace the sleep forecaster
    pub fn with_forecaster(mut self, forecaster: impl SeasonalForecaster + 'static) -> Self {
        self.forecaster = Box::new(forecaster);
        self
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Ingest and normalize health vitals
    pub fn health_metrics(&self, records: &[HealthMetric]) -> Result<HealthReport, CoachError> {
        let series = Ingestor::ingest(records)?;
        let health_data = Normalizer::normalize(&series);
        Ok(HealthReport { health_data })
    }

    /// Weekly fitness aggregates plus step and activity advice.
    ///
    /// Pipeline stages:
    /// 1. Ingestor - Order and bucket by week
    /// 2. WeeklyAggregator - Weekly means and week-over-week deltas
    /// 3. FitnessRules - Advice from the latest week(s)
    pub fn fitness_tracking(
        &self,
        records: &[FitnessActivity],
    ) -> Result<FitnessReport, CoachError> {
        let series = Ingestor::ingest(records)?;
        let weekly_trends = WeeklyAggregator::fitness(&series);
        let recommendations = FitnessRules::from(&self.config).evaluate(&weekly_trends)?;

        debug!(
            records = records.len(),
            weeks = weekly_trends.len(),
            recommendations = recommendations.len(),
            "Fitness tracking complete"
        );
        Ok(FitnessReport {
            weekly_trends,
            recommendations,
        })
    }

    /// Weekly sleep aggregates plus duration and disturbance advice
    pub fn sleep_analysis(&self, records: &[SleepMetric]) -> Result<SleepReport, CoachError> {
        let series = Ingestor::ingest(records)?;
        let sleep_patterns = WeeklyAggregator::sleep(&series);
        let recommendations = SleepRules.evaluate(&sleep_patterns)?;

        debug!(
            records = records.len(),
            weeks = sleep_patterns.len(),
            recommendations = recommendations.len(),
            "Sleep analysis complete"
        );
        Ok(SleepReport {
            sleep_patterns,
            recommendations,
        })
    }

    /// Sentiment distribution over the most recent entries plus feedback
    pub fn journal_sentiment(&self, entries: &[JournalEntry]) -> Result<JournalReport, CoachError> {
        let series = Ingestor::ingest(entries)?;
        let ordered: Vec<JournalEntry> = series.entries.into_iter().map(|e| e.record).collect();

        let aggregator = SentimentAggregator::new(self.config.journal_window);
        let summary = aggregator.summarize(&ordered, self.scorer.as_ref());
        let feedback = JournalRules.evaluate(&summary)?;

        Ok(JournalReport {
            summary,
            feedback,
            window: aggregator.window(&ordered).to_vec(),
        })
    }

    /// Next-day calories, truncated toward zero
    pub fn predict_calories(
        &self,
        records: &[FitnessActivity],
        input: &PredictionInput,
    ) -> Result<i64, CoachError> {
        let series = Ingestor::ingest(records)?;
        predict::predict_calories(&series, input, self.fitter.as_ref())
    }

    /// Next-day sleep duration, rounded to whole hours
    pub fn predict_sleep_duration(&self, records: &[SleepMetric]) -> Result<f64, CoachError> {
        let series = Ingestor::ingest(records)?;
        predict::predict_sleep_duration(&series, self.forecaster.as_ref())
    }

    /// Run the report pipeline matching the batch's domain
    pub fn process_batch(&self, batch: &RecordBatch) -> Result<DomainReport, CoachError> {
        let report = match batch {
            RecordBatch::Health(records) => DomainReport::Health(self.health_metrics(records)?),
            RecordBatch::Fitness(records) => DomainReport::Fitness(self.fitness_tracking(records)?),
            RecordBatch::Sleep(records) => DomainReport::Sleep(self.sleep_analysis(records)?),
            RecordBatch::Journal(entries) => {
                DomainReport::Journal(self.journal_sentiment(entries)?)
            }
        };
        Ok(report)
    }

    /// Parse a request body for `domain` and run its pipeline.
    ///
    /// Returns the envelope's `user_id` (if any) alongside the report.
    pub fn process_json(
        &self,
        domain: Domain,
        raw_json: &str,
    ) -> Result<(Option<String>, DomainReport), CoachError> {
        let value: serde_json::Value = serde_json::from_str(raw_json)?;
        self.process_value(domain, value)
    }

    /// Same as [`process_json`](Self::process_json) for an already-decoded body
    pub fn process_value(
        &self,
        domain: Domain,
        value: serde_json::Value,
    ) -> Result<(Option<String>, DomainReport), CoachError> {
        let (user_id, batch) = match domain {
            Domain::Health => {
                let e = RecordAdapter::from_value(value)?;
                (e.user_id, RecordBatch::Health(e.records))
            }
            Domain::Fitness => {
                let e = RecordAdapter::from_value(value)?;
                (e.user_id, RecordBatch::Fitness(e.records))
            }
            Domain::Sleep => {
                let e = RecordAdapter::from_value(value)?;
                (e.user_id, RecordBatch::Sleep(e.records))
            }
            Domain::Journal => {
                let e = RecordAdapter::from_value(value)?;
                (e.user_id, RecordBatch::Journal(e.records))
            }
        };

        debug!(
            domain = domain.as_str(),
            records = batch.len(),
            has_user = user_id.is_some(),
            "Processing request"
        );
        Ok((user_id, self.process_batch(&batch)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{
        NEGATIVE_FEEDBACK, SLEEP_DISTURBANCE_ADVICE, STEP_GOAL_NEAR, STEP_GOAL_UNDER,
    };
    use crate::types::SentimentLabel;
    use pretty_assertions::assert_eq;

    fn sample_fitness_json() -> &'static str {
        r#"{
            "user_id": "user-1",
            "activity": [
                {"date": "2024-01-08", "steps": 9000, "calories": 1900, "active_minutes": 140},
                {"date": "2024-01-01", "steps": 12000, "calories": 2000, "active_minutes": 160}
            ]
        }"#
    }

    fn sample_sleep_json() -> &'static str {
        r#"[
            {"date": "2024-01-01", "duration": 5.5, "disturbances": 3},
            {"date": "2024-01-02", "duration": 5.5, "disturbances": 3},
            {"date": "2024-01-03", "duration": 5.5, "disturbances": 3}
        ]"#
    }

    #[test]
    fn test_fitness_tracking_from_json() {
        let result = fitness_tracking_from_json(sample_fitness_json().to_string());

        assert!(result.is_ok());
        let report: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();

        let trends = report["weekly_trends"].as_array().unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0]["average_steps"], 12000.0);
        assert_eq!(trends[1]["weekly_steps_change"], "-25%");
        // 9000 / 10000 sits between 80% and 100%
        assert_eq!(report["recommendations"][0], STEP_GOAL_NEAR);
    }

    #[test]
    fn test_process_json_returns_user() {
        let processor = TrendsProcessor::new();
        let (user_id, report) = processor
            .process_json(Domain::Fitness, sample_fitness_json())
            .unwrap();

        assert_eq!(user_id.as_deref(), Some("user-1"));
        assert_eq!(report.domain(), Domain::Fitness);
    }

    #[test]
    fn test_sleep_analysis_from_json() {
        let result = sleep_analysis_from_json(sample_sleep_json().to_string()).unwrap();
        let report: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(report["sleep_patterns"][0]["below_min_duration"], 3);
        let advice: Vec<&str> = report["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(advice.contains(&SLEEP_DISTURBANCE_ADVICE));
    }

    #[test]
    fn test_custom_step_goal() {
        let config = CoachConfig {
            step_goal: 20_000,
            ..CoachConfig::default()
        };
        let processor = TrendsProcessor::with_config(config);
        let records = vec![FitnessActivity {
            date: "2024-01-01".to_string(),
            steps: 12000,
            calories: 2000,
            active_minutes: 160,
        }];

        let report = processor.fitness_tracking(&records).unwrap();
        assert_eq!(report.recommendations, vec![STEP_GOAL_UNDER.to_string()]);
    }

    #[test]
    fn test_fitness_requires_records() {
        let result = fitness_tracking_from_json("[]".to_string());
        assert!(matches!(result, Err(CoachError::InsufficientData { .. })));
    }

    #[test]
    fn test_empty_journal_is_insufficient() {
        let result = journal_sentiment_from_json("[]".to_string());
        assert!(matches!(
            result,
            Err(CoachError::InsufficientData {
                required: 1,
                actual: 0,
                ..
            })
        ));
        assert!(matches!(
            TrendsProcessor::new().journal_sentiment(&[]),
            Err(CoachError::InsufficientData { .. })
        ));
    }

    struct AlwaysNegative;

    impl PolarityScorer for AlwaysNegative {
        fn score(&self, _: &str) -> SentimentLabel {
            SentimentLabel::Negative
        }
    }

    #[test]
    fn test_injected_scorer() {
        let processor = TrendsProcessor::new().with_scorer(AlwaysNegative);
        let entries: Vec<JournalEntry> = (1..=3)
            .map(|d| JournalEntry {
                date: format!("2024-01-0{}", d),
                entry: "Went for a walk".to_string(),
            })
            .collect();

        let report = processor.journal_sentiment(&entries).unwrap();
        assert_eq!(report.summary.percent(SentimentLabel::Negative), 100.0);
        assert_eq!(report.feedback, vec![NEGATIVE_FEEDBACK.to_string()]);
        assert_eq!(report.window.len(), 3);
    }

    struct FixedFitter(f64);

    impl RegressionFitter for FixedFitter {
        fn fit_predict(&self, _: &[Vec<f64>], _: &[f64], _: &[f64]) -> Result<f64, CoachError> {
            Ok(self.0)
        }
    }

    struct FixedForecaster(f64);

    impl SeasonalForecaster for FixedForecaster {
        fn forecast_next(&self, _: &[(chrono::NaiveDate, f64)]) -> Result<f64, CoachError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_injected_fitter() {
        let processor = TrendsProcessor::new().with_fitter(FixedFitter(1234.9));
        let records: Vec<FitnessActivity> = (1..=2)
            .map(|d| FitnessActivity {
                date: format!("2024-01-0{}", d),
                steps: 8000,
                calories: 2000,
                active_minutes: 30,
            })
            .collect();
        let input = PredictionInput {
            day_of_week: 2,
            active_minutes: 45,
            steps: 9000,
        };

        assert_eq!(processor.predict_calories(&records, &input).unwrap(), 1234);
    }

    #[test]
    fn test_injected_forecaster() {
        let processor = TrendsProcessor::new().with_forecaster(FixedForecaster(6.5));
        let records: Vec<SleepMetric> = (1..=2)
            .map(|d| SleepMetric {
                date: format!("2024-01-0{}", d),
                duration: 7.0,
                disturbances: 1,
            })
            .collect();

        // half hours round to the even hour
        assert_eq!(processor.predict_sleep_duration(&records).unwrap(), 6.0);
    }

    #[test]
    fn test_journal_window_uses_latest_entries() {
        let config = CoachConfig {
            journal_window: 2,
            ..CoachConfig::default()
        };
        let processor = TrendsProcessor::with_config(config);
        // out of order on purpose
        let entries = vec![
            JournalEntry {
                date: "2024-01-03".to_string(),
                entry: "third".to_string(),
            },
            JournalEntry {
                date: "2024-01-01".to_string(),
                entry: "first".to_string(),
            },
            JournalEntry {
                date: "2024-01-02".to_string(),
                entry: "second".to_string(),
            },
        ];

        let report = processor.journal_sentiment(&entries).unwrap();
        let kept: Vec<&str> = report.window.iter().map(|e| e.entry.as_str()).collect();
        assert_eq!(kept, vec!["second", "third"]);
    }

    #[test]
    fn test_predict_calories_from_json() {
        let history = r#"[
            {"date": "2024-01-01", "steps": 8000, "calories": 2000, "active_minutes": 30},
            {"date": "2024-01-02", "steps": 10000, "calories": 2300, "active_minutes": 60}
        ]"#;
        let input = r#"{"day_of_week": 1, "active_minutes": 60, "steps": 10000}"#;

        let result = predict_calories_from_json(history.to_string(), input.to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        let calories = value["predicted_calories"].as_i64().unwrap();
        assert!((2299..=2300).contains(&calories));
    }

    #[test]
    fn test_predict_sleep_from_json() {
        let history = r#"{"activity": [
            {"date": "2024-01-01", "duration": 7.0, "disturbances": 1},
            {"date": "2024-01-02", "duration": 7.4, "disturbances": 1}
        ]}"#;

        let result = predict_sleep_from_json(history.to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value["predicted_sleep_duration"], 8.0);
    }

    #[test]
    fn test_invalid_json() {
        let result = health_metrics_from_json("not json".to_string());
        assert!(matches!(result, Err(CoachError::JsonError(_))));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let result = health_metrics_from_json(r#"[{"date": "2024-01-01"}]"#.to_string());
        assert!(matches!(result, Err(CoachError::MalformedInput(_))));
    }
}
