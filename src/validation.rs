//! Field validators shared by the request types, plus date parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use validator::ValidationError;

use crate::models::{GoalStatus, Timeframe};

/// Parse an ISO 8601 date or timestamp. Values without an offset are UTC and
/// plain dates mean midnight.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// First and last instant (millisecond precision) of the UTC day containing `at`.
pub fn day_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = at.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start + TimeDelta::days(1) - TimeDelta::milliseconds(1);
    (start, end)
}

pub fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    match parse_datetime(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("iso8601")),
    }
}

pub fn validate_timeframe(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Timeframe>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("timeframe"))
}

pub fn validate_goal_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<GoalStatus>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("goal_status"))
}

/// Rejects blank strings, which `length(min = 1)` lets through.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_datetime("2025-03-01T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_parse_naive_timestamp_and_plain_date() {
        let dt = parse_datetime("2025-03-01T10:30:00.250").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (10, 30));

        let dt = parse_datetime("2025-12-31").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2025, 12, 31, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("tomorrow").is_none());
        assert!(parse_datetime("2025-13-01").is_none());
        assert!(validate_iso_date("31/12/2025").is_err());
    }

    #[test]
    fn test_day_bounds() {
        let at = parse_datetime("2025-06-15T17:45:00Z").unwrap();
        let (start, end) = day_bounds(at);
        assert_eq!(start, parse_datetime("2025-06-15T00:00:00Z").unwrap());
        assert_eq!(end, parse_datetime("2025-06-15T23:59:59.999Z").unwrap());
    }

    #[test]
    fn test_enum_validators() {
        assert!(validate_timeframe("3-year").is_ok());
        assert!(validate_timeframe("3 years").is_err());
        assert!(validate_goal_status("completed").is_ok());
        assert!(validate_goal_status("done").is_err());
        assert!(validate_not_blank("  ").is_err());
    }
}
