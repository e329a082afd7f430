//! Error types for wellness-trends

use thiserror::Error;

/// Errors that can occur during trend computation
#[derive(Debug, Error)]
pub enum CoachError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported domain: expected {expected}, got {actual}")]
    UnsupportedDomain {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Insufficient data: need at least {required} {unit}, got {actual}")]
    InsufficientData {
        required: usize,
        actual: usize,
        unit: &'static str,
    },

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("User data not found: {0}")]
    UserNotFound(String),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),
}

impl CoachError {
    pub(crate) fn insufficient(required: usize, actual: usize, unit: &'static str) -> Self {
        CoachError::InsufficientData {
            required,
            actual,
            unit,
        }
    }
}
