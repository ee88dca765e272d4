//! Date-like value normalization.
//!
//! Journal documents carry timestamps in three shapes: ISO-8601 strings, epoch
//! milliseconds, and `{seconds, nanoseconds}` pairs written by the document
//! store. Every comparison goes through [`DateLike::to_instant`] so all three
//! land on the same `DateTime<Utc>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::lenient;

/// Largest magnitude, in milliseconds, of a representable instant (±100M days).
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Marker returned when a date-like value does not describe an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value is not a recognizable instant")]
pub struct UnparseableInstant;

/// A timestamp as it arrived on the wire, parsed lazily.
///
/// Variant order matters for deserialization: strings land in `Text`, numbers
/// in `Millis`, `{seconds, ...}` objects in `Timestamp`, and anything else in
/// `Other`. `Native` is only constructed in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateLike {
    Millis(serde_json::Number),
    Text(String),
    Timestamp(TimestampParts),
    Native(DateTime<Utc>),
    Other(Value),
}

/// Document-store timestamp: whole seconds plus a nanosecond remainder.
///
/// Accepts the `_seconds` / `_nanoseconds` spelling produced when a timestamp
/// is serialized by the admin SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampParts {
    #[serde(alias = "_seconds")]
    pub seconds: Value,
    #[serde(
        default,
        alias = "_nanoseconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub nanoseconds: Option<Value>,
}

impl DateLike {
    /// Normalize to a UTC instant.
    ///
    /// Fallback order: native value, then number/string, then the
    /// seconds/nanoseconds pair. Never defaults to "now".
    pub fn to_instant(&self) -> Result<DateTime<Utc>, UnparseableInstant> {
        match self {
            Self::Native(dt) => Ok(*dt),
            Self::Millis(ms) => ms
                .as_f64()
                .ok_or(UnparseableInstant)
                .and_then(from_epoch_millis),
            Self::Text(text) => parse_text(text),
            Self::Timestamp(parts) => parts.to_instant(),
            Self::Other(_) => Err(UnparseableInstant),
        }
    }

    /// Shorthand for `to_instant().is_ok()`.
    pub fn is_parseable(&self) -> bool {
        self.to_instant().is_ok()
    }
}

impl From<DateTime<Utc>> for DateLike {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Native(dt)
    }
}

impl From<&str> for DateLike {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<i64> for DateLike {
    fn from(millis: i64) -> Self {
        Self::Millis(millis.into())
    }
}

impl TimestampParts {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds: Value::from(seconds),
            nanoseconds: Some(Value::from(nanoseconds)),
        }
    }

    pub fn to_instant(&self) -> Result<DateTime<Utc>, UnparseableInstant> {
        let seconds = lenient::as_number(&self.seconds).ok_or(UnparseableInstant)?;
        let nanos = match &self.nanoseconds {
            None | Some(Value::Null) => 0.0,
            Some(v) => lenient::as_number(v).ok_or(UnparseableInstant)?,
        };
        from_epoch_millis(seconds * 1000.0 + (nanos / 1e6).floor())
    }
}

/// Whole minutes are not required: the result keeps sub-minute precision.
pub fn minutes_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds().abs() as f64 / 60_000.0
}

fn from_epoch_millis(ms: f64) -> Result<DateTime<Utc>, UnparseableInstant> {
    if !ms.is_finite() || ms.abs() > MAX_EPOCH_MILLIS {
        return Err(UnparseableInstant);
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64).ok_or(UnparseableInstant)
}

fn parse_text(text: &str) -> Result<DateTime<Utc>, UnparseableInstant> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(naive.and_utc());
        }
    }
    // Date-only strings are UTC midnight.
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(UnparseableInstant)
}
