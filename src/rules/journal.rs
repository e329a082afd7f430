//! Journaling sentiment feedback rules

use crate::error::CoachError;
use crate::types::{SentimentDistribution, SentimentLabel};

pub const NEGATIVE_FEEDBACK: &str = "Your recent journal entries reflect sadness or negativity. Would you like some tips for managing negative emotions?";
pub const POSITIVE_FEEDBACK: &str =
    "Your journal entries are mostly positive. Keep up the great mindset!";
pub const BALANCED_FEEDBACK: &str = "Your journal entries are balanced between positive and negative tones. Continue journaling to track your emotional well-being.";

/// Negative share (percent) above which support is offered
const NEGATIVE_THRESHOLD: f64 = 50.0;

/// Positive share (percent) above which the mindset is reinforced
const POSITIVE_THRESHOLD: f64 = 70.0;

/// Decision list over a sentiment distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JournalRules;

impl JournalRules {
    /// Exactly one feedback line; the negative check takes precedence.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when no entry was scored.
    pub fn evaluate(&self, summary: &SentimentDistribution) -> Result<Vec<String>, CoachError> {
        if summary.is_empty() {
            return Err(CoachError::insufficient(1, 0, "journal entries"));
        }

        let feedback = if summary.percent(SentimentLabel::Negative) > NEGATIVE_THRESHOLD {
            NEGATIVE_FEEDBACK
        } else if summary.percent(SentimentLabel::Positive) > POSITIVE_THRESHOLD {
            POSITIVE_FEEDBACK
        } else {
            BALANCED_FEEDBACK
        };
        Ok(vec![feedback.to_string()])
    }
}
