//! JSON adapter for metric records
//!
//! Accepts either a bare JSON array of records or the user envelope used by
//! the request layer, e.g. `{"user_id": "u1", "activity": [...]}`.

use crate::error::CoachError;
use crate::schema::records::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Records parsed from a request, with the owning user when one was supplied
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEnvelope<R> {
    pub user_id: Option<String>,
    pub records: Vec<R>,
}

/// Adapter for parsing domain records from JSON
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse records of one domain from a bare array or a user envelope
    pub fn parse<R>(json: &str) -> Result<RecordEnvelope<R>, CoachError>
    where
        R: DomainRecord + DeserializeOwned,
    {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse records of one domain from an already-decoded JSON value
    pub fn from_value<R>(value: Value) -> Result<RecordEnvelope<R>, CoachError>
    where
        R: DomainRecord + DeserializeOwned,
    {
        let key = R::DOMAIN.envelope_key();

        match value {
            Value::Array(_) => Ok(RecordEnvelope {
                user_id: None,
                records: decode_records(value)?,
            }),
            Value::Object(mut map) => {
                let user_id = match map.remove("user_id") {
                    Some(Value::String(id)) => Some(id),
                    Some(Value::Null) | None => None,
                    Some(other) => {
                        return Err(CoachError::MalformedInput(format!(
                            "user_id must be a string, got {}",
                            other
                        )))
                    }
                };
                let records = map.remove(key).ok_or_else(|| {
                    CoachError::MalformedInput(format!("Missing required field: {}", key))
                })?;
                Ok(RecordEnvelope {
                    user_id,
                    records: decode_records(records)?,
                })
            }
            other => Err(CoachError::MalformedInput(format!(
                "Expected a record array or an object with `{}`, got {}",
                key,
                json_type_name(&other)
            ))),
        }
    }

    /// Parse the feature triple used by the calorie estimator
    pub fn parse_prediction_input(json: &str) -> Result<PredictionInput, CoachError> {
        serde_json::from_str(json).map_err(classify_serde_error)
    }
}

fn decode_records<R: DeserializeOwned>(value: Value) -> Result<Vec<R>, CoachError> {
    serde_json::from_value(value).map_err(classify_serde_error)
}

/// Shape errors (missing fields, wrong types) are malformed input; syntax
/// errors stay JSON errors.
fn classify_serde_error(e: serde_json::Error) -> CoachError {
    match e.classify() {
        serde_json::error::Category::Data => CoachError::MalformedInput(e.to_string()),
        _ => CoachError::JsonError(e),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
