//! ISO-8601 timestamp parsing and the serde adapters used by persisted tasks and config.
//!
//! Accepts date-only values (`2026-03-01`, meaning midnight) as well as full datetimes
//! with either a `T` or space separator, optional seconds and optional fraction.
//! Always writes full datetimes.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Timestamp parsing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid ISO timestamp: {0:?}")]
pub struct TimestampError(pub String);

/// Parse an ISO date or datetime. Date-only values resolve to midnight.
pub fn parse_iso_datetime(s: &str) -> Result<NaiveDateTime, TimestampError> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| TimestampError(s.to_string()))
}

/// Format a datetime the way it is persisted.
pub fn format_iso_datetime(dt: &NaiveDateTime) -> String {
    dt.format(OUTPUT_FORMAT).to_string()
}

/// `#[serde(with = "...")]` adapter for required timestamps.
pub mod iso {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_iso_datetime(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_iso_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` adapter for optional timestamps (`null` when absent).
pub mod iso_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_str(&super::format_iso_datetime(dt)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_iso_datetime(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
