//! Tolerant timestamp deserialization.
//!
//! The API is inconsistent about date formats: most endpoints use RFC 3339,
//! older ones emit `"2013-04-01 00:00:00 +1100"` or ctime-style strings like
//! `"Mon Apr 01 00:00:00 +1100 2013"`, and a few return bare dates. These
//! helpers are meant for `#[serde(with = ...)]` / `deserialize_with` on
//! `chrono` fields of typed responses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

const FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// Parses a timestamp in any of the formats the API is known to emit.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    // Bare dates are interpreted as midnight UTC.
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}

/// Deserializes a required timestamp field.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

/// Deserializes an optional timestamp field. Missing, `null`, and empty
/// values all map to `None`.
pub mod optional {
    use super::*;

    /// See the module docs.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {value}"))),
        }
    }
}
