//! Row-to-record parsing helpers.
//!
//! Timestamps are written as fixed-width RFC 3339 (`2026-02-09T14:30:00.000000Z`)
//! so that lexical order in SQL equals chronological order. Reads also accept
//! `SQLite`'s `datetime('now')` format.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::DatabaseError;

/// Current time truncated to the stored (microsecond) precision, so values
/// returned from a write compare equal to the same values read back.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all forge-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column holding a version number.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the stored value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let raw = row.get::<i64>(idx)?;
    u32::try_from(raw).map_err(|_| DatabaseError::Query(format!("Version out of range: {raw}")))
}

/// Parse a JSON TEXT column into a typed value.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the text is not valid JSON for `T`.
pub fn parse_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use forge_core::enums::DeckStatus;

    #[test]
    fn datetime_roundtrip_and_sqlite_format() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 9, 14, 30, 0).unwrap();
        let stored = format_datetime(&dt);
        assert_eq!(stored, "2026-02-09T14:30:00.000000Z");
        assert_eq!(parse_datetime(&stored).unwrap(), dt);
        assert_eq!(parse_datetime("2026-02-09 14:30:00").unwrap(), dt);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn stored_timestamps_sort_lexically() {
        let a = format_datetime(&Utc.with_ymd_and_hms(2026, 2, 9, 9, 0, 0).unwrap());
        let b = format_datetime(&Utc.with_ymd_and_hms(2026, 2, 9, 10, 0, 0).unwrap());
        assert!(a < b);
    }

    #[test]
    fn now_survives_storage_roundtrip() {
        let t = now();
        assert_eq!(parse_datetime(&format_datetime(&t)).unwrap(), t);
    }

    #[test]
    fn parse_enum_snake_case() {
        let status: DeckStatus = parse_enum("published").unwrap();
        assert_eq!(status, DeckStatus::Published);
        assert!(parse_enum::<DeckStatus>("gone").is_err());
    }
}
