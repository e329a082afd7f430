//! Record ingestion
//!
//! Turns an unordered slice of domain records into a chronologically ordered,
//! week-bucketed series. Week buckets are counted from the earliest record:
//! `week_index = floor(days_since_earliest / 7) + 1`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::CoachError;
use crate::schema::DomainRecord;
use crate::types::{Bucketed, BucketedSeries};

/// Days per week bucket
pub const DAYS_PER_WEEK: i64 = 7;

/// Ingestor for converting raw records into a bucketed series
pub struct Ingestor;

impl Ingestor {
    /// Parse dates, sort ascending (stable) and assign week buckets
    pub fn ingest<R: DomainRecord>(records: &[R]) -> Result<BucketedSeries<R>, CoachError> {
        let mut parsed = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let timestamp = parse_record_date(record.date()).ok_or_else(|| {
                CoachError::MalformedInput(format!(
                    "Unparseable date {:?} in {} record {}",
                    record.date(),
                    R::DOMAIN.as_str(),
                    idx
                ))
            })?;
            parsed.push((timestamp, record.clone()));
        }

        // sort_by_key is stable, so equal dates keep input order
        parsed.sort_by_key(|(timestamp, _)| *timestamp);

        let Some(earliest) = parsed.first().map(|(timestamp, _)| *timestamp) else {
            return Ok(BucketedSeries {
                entries: Vec::new(),
            });
        };

        let entries: Vec<Bucketed<R>> = parsed
            .into_iter()
            .map(|(timestamp, record)| Bucketed {
                record,
                timestamp,
                week_index: week_index(earliest, timestamp),
            })
            .collect();

        debug!(
            domain = R::DOMAIN.as_str(),
            records = entries.len(),
            weeks = entries.last().map(|e| e.week_index).unwrap_or(0),
            "Ingested records"
        );

        Ok(BucketedSeries { entries })
    }
}

/// Week bucket of `timestamp` relative to `earliest` (1-based)
pub fn week_index(earliest: NaiveDateTime, timestamp: NaiveDateTime) -> u32 {
    // timestamp >= earliest, so whole-day truncation is the floor
    let days = (timestamp - earliest).num_days().max(0);
    (days / DAYS_PER_WEEK) as u32 + 1
}

/// Parse a record date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (also with a space
/// separator) and RFC 3339 timestamps. Offsets are converted to UTC.
pub fn parse_record_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
