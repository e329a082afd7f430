//! Aggregated insights
//!
//! Hands the latest per-domain reports of a user to a narrative generator and
//! returns its text. The generator (typically an LLM-backed service) and the
//! per-user store are supplied by the caller; generator failures are turned
//! into a descriptive string instead of an error.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::CoachError;
use crate::types::{DomainReport, UserInsights};

/// Role given to the narrative generator
pub const COACH_SYSTEM_PROMPT: &str = "You are a professional fitness coach. Your role is to analyze multiple data insights such as sleep quality, stress levels, and fitness activity, and provide a holistic recommendation. Format your response with actionable advice for the user.";

/// Prompt pair plus the key/value summary it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub summary: Map<String, Value>,
}

impl NarrativeRequest {
    pub fn new(summary: Map<String, Value>) -> Self {
        let user_prompt = format!(
            "Provide a holistic recommendation based on the following data:\n{}",
            Value::Object(summary.clone())
        );
        Self {
            system_prompt: COACH_SYSTEM_PROMPT.to_string(),
            user_prompt,
            summary,
        }
    }
}

/// Produces a holistic narrative from a summary
pub trait NarrativeGenerator: Send + Sync {
    fn generate(&self, request: &NarrativeRequest) -> Result<String, CoachError>;
}

/// Caller-owned store of the latest insights per user.
///
/// Implementations hand out owned copies so the backing map can sit behind a
/// lock or a remote service. Concurrent writes for one user are serialized by
/// the caller.
pub trait InsightStore: Send + Sync {
    fn load(&self, user_id: &str) -> Option<UserInsights>;

    fn save(&self, user_id: &str, insights: UserInsights);
}

/// In-memory [`InsightStore`] shared across threads
#[derive(Debug, Default)]
pub struct MemoryInsightStore {
    users: RwLock<HashMap<String, UserInsights>>,
}

impl MemoryInsightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicked writer leaves whole entries behind, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, UserInsights>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, UserInsights>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InsightStore for MemoryInsightStore {
    fn load(&self, user_id: &str) -> Option<UserInsights> {
        self.read().get(user_id).cloned()
    }

    fn save(&self, user_id: &str, insights: UserInsights) {
        self.write().insert(user_id.to_string(), insights);
    }
}

/// Store `report` as the user's latest artifact for its domain
pub fn record_report(store: &dyn InsightStore, user_id: &str, report: DomainReport) {
    let mut insights = store.load(user_id).unwrap_or_default();
    debug!(user_id, domain = report.domain().as_str(), "Recording report");
    insights.apply(report);
    store.save(user_id, insights);
}

/// Flatten a user's insights into the key/value summary sent to the generator
pub fn summarize(insights: &UserInsights) -> Result<Map<String, Value>, CoachError> {
    match serde_json::to_value(insights)? {
        Value::Object(map) => Ok(map),
        other => Err(CoachError::MalformedInput(format!(
            "Insights did not serialize to an object: {}",
            other
        ))),
    }
}

/// Narrative for a stored user.
///
/// # Errors
///
/// Returns `UserNotFound` when the store has nothing for `user_id`. Generator
/// failures are not errors; they come back as `"Error generating insights: ..."`.
pub fn aggregated_insights(
    store: &dyn InsightStore,
    user_id: &str,
    generator: &dyn NarrativeGenerator,
) -> Result<String, CoachError> {
    let insights = store
        .load(user_id)
        .filter(|insights| !insights.is_empty())
        .ok_or_else(|| CoachError::UserNotFound(user_id.to_string()))?;

    let request = NarrativeRequest::new(summarize(&insights)?);
    match generator.generate(&request) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(user_id, error = %e, "Narrative generation failed");
            Ok(format!("Error generating insights: {}", e))
        }
    }
}

/// Offline generator that stitches the computed advice into a short note
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryNarrator;

impl NarrativeGenerator for SummaryNarrator {
    fn generate(&self, request: &NarrativeRequest) -> Result<String, CoachError> {
        let sections = [
            ("fitness", "recommendations", "Activity"),
            ("sleep", "recommendations", "Sleep"),
            ("journal", "feedback", "Mood"),
        ];

        let mut paragraphs = Vec::new();
        for (domain, field, heading) in sections {
            let advice: Vec<&str> = request
                .summary
                .get(domain)
                .and_then(|report| report.get(field))
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            if !advice.is_empty() {
                paragraphs.push(format!("{}: {}", heading, advice.join(" ")));
            }
        }

        if let Some(days) = request
            .summary
            .get("health")
            .and_then(|h| h.get("health_data"))
            .and_then(Value::as_array)
        {
            paragraphs.push(format!(
                "Vitals: {} days of normalized health data on record.",
                days.len()
            ));
        }

        if paragraphs.is_empty() {
            return Err(CoachError::Narrative(
                "summary contains no advice to narrate".to_string(),
            ));
        }
        Ok(paragraphs.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JournalReport, SentimentDistribution, SleepReport};
    use std::sync::Mutex;

    struct FailingGenerator;

    impl NarrativeGenerator for FailingGenerator {
        fn generate(&self, _: &NarrativeRequest) -> Result<String, CoachError> {
            Err(CoachError::Narrative("service unavailable".to_string()))
        }
    }

    fn sample_insights() -> UserInsights {
        UserInsights {
            sleep: Some(SleepReport {
                sleep_patterns: vec![],
                recommendations: vec!["Great job maintaining good sleep duration!".to_string()],
            }),
            journal: Some(JournalReport {
                summary: SentimentDistribution::default(),
                feedback: vec!["Keep journaling.".to_string()],
                window: vec![],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_user() {
        let store = MemoryInsightStore::new();
        let result = aggregated_insights(&store, "nobody", &SummaryNarrator);
        assert!(matches!(result, Err(CoachError::UserNotFound(id)) if id == "nobody"));
    }

    #[test]
    fn test_generator_failure_becomes_text() {
        let store = MemoryInsightStore::new();
        store.save("user-1", sample_insights());

        let text = aggregated_insights(&store, "user-1", &FailingGenerator).unwrap();
        assert_eq!(
            text,
            "Error generating insights: Narrative generation failed: service unavailable"
        );
    }

    #[test]
    fn test_summary_narrator() {
        let store = MemoryInsightStore::new();
        store.save("user-1", sample_insights());

        let text = aggregated_insights(&store, "user-1", &SummaryNarrator).unwrap();
        assert_eq!(
            text,
            "Sleep: Great job maintaining good sleep duration!\nMood: Keep journaling."
        );
    }

    #[test]
    fn test_request_carries_summary() {
        let summary = summarize(&sample_insights()).unwrap();
        assert!(summary.contains_key("sleep"));
        assert!(!summary.contains_key("fitness"));

        let request = NarrativeRequest::new(summary);
        assert_eq!(request.system_prompt, COACH_SYSTEM_PROMPT);
        assert!(request.user_prompt.contains("Great job maintaining good sleep duration!"));
    }

    #[test]
    fn test_record_report_keeps_other_domains() {
        let store = MemoryInsightStore::new();
        store.save("user-1", sample_insights());

        let fitness = crate::types::FitnessReport {
            weekly_trends: vec![],
            recommendations: vec!["Keep moving.".to_string()],
        };
        record_report(&store, "user-1", DomainReport::Fitness(fitness));

        let stored = store.load("user-1").unwrap();
        assert!(stored.fitness.is_some());
        assert!(stored.sleep.is_some());
        assert!(stored.journal.is_some());
    }

    #[test]
    fn test_store_is_per_user() {
        let store = MemoryInsightStore::new();
        let sample = sample_insights();
        record_report(&store, "a", DomainReport::Sleep(sample.sleep.unwrap()));
        record_report(&store, "b", DomainReport::Journal(sample.journal.unwrap()));

        assert_eq!(store.len(), 2);
        assert!(store.load("a").unwrap().journal.is_none());
        assert!(store.load("b").unwrap().sleep.is_none());
    }

    /// Store behind a plain mutex, the way a caller would wrap its own map
    #[derive(Default)]
    struct MutexStore(Mutex<HashMap<String, UserInsights>>);

    impl InsightStore for MutexStore {
        fn load(&self, user_id: &str) -> Option<UserInsights> {
            self.0.lock().unwrap().get(user_id).cloned()
        }

        fn save(&self, user_id: &str, insights: UserInsights) {
            self.0.lock().unwrap().insert(user_id.to_string(), insights);
        }
    }

    #[test]
    fn test_mutex_backed_store_across_threads() {
        let store = MutexStore::default();
        let users = ["a", "b", "c", "d"];

        std::thread::scope(|scope| {
            for user in users {
                let store = &store;
                scope.spawn(move || {
                    let sleep = sample_insights().sleep.unwrap();
                    record_report(store, user, DomainReport::Sleep(sleep));
                });
            }
        });

        assert_eq!(store.0.lock().unwrap().len(), users.len());
        for user in users {
            let text = aggregated_insights(&store, user, &SummaryNarrator).unwrap();
            assert_eq!(text, "Sleep: Great job maintaining good sleep duration!");
        }
    }
}
