//! Common utility functions

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Timestamp format used for created/updated columns
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format shown to users and written into spreadsheets (DD/MM/YYYY)
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Convert DateTime to database string format
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Parse database datetime string
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DB_TIMESTAMP_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Current timestamp formatted for database
pub fn now_timestamp() -> String {
    format_datetime(&Utc::now())
}

/// Today's calendar date in UTC
///
/// Every date comparison in the crate uses this single policy.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Format a calendar date for display (DD/MM/YYYY)
pub fn format_display_date(date: &NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Trim a string and turn empty into None
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-15 08:30:00");
        assert_eq!(parse_datetime("2024-03-15 08:30:00").unwrap(), dt);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("invalid").is_none());
        assert!(parse_datetime("2023-13-01 00:00:00").is_none());
    }

    #[test]
    fn test_format_display_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(format_display_date(&date), "31/12/2024");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  abc ")), Some("abc".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_today_is_utc_date() {
        let before = Utc::now().date_naive();
        let result = today();
        let after = Utc::now().date_naive();
        assert!(result >= before && result <= after);
    }
}
