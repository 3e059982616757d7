//! Cell value coercion
//!
//! Spreadsheet cells arrive as text, numbers, booleans or dates depending on
//! how the sheet was authored. These helpers turn them into the typed values
//! a facility row needs.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use calamine::Data;
use crate::utils::format_display_date;

/// Day zero of the spreadsheet serial date system
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Words accepted as "yes" in boolean columns
const TRUE_WORDS: &[&str] = &["true", "1", "có", "yes", "x"];

/// A single cell, reduced to the kinds the import understands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) if s.trim().is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                excel_serial_to_date(serial)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Number(serial))
            }
            Data::DateTimeIso(s) => parse_text_date(s)
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell as trimmed text, None when blank
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Date(d) => Some(format_display_date(d)),
        }
    }
}

/// Render a number the way a user typed it: no trailing `.0` on integers
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Convert a spreadsheet serial day number to a calendar date
///
/// The time-of-day fraction is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor() as i64;
    serial_epoch()?.checked_add_signed(Duration::try_days(days)?)
}

/// Parse a date typed as text
///
/// Accepts `DD/MM/YYYY`, `YYYY-MM-DD` and ISO date-times.
pub fn parse_text_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// Interpret a cell as a date; None when it holds no recognizable date
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => excel_serial_to_date(*n),
        CellValue::Text(s) => parse_text_date(s),
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

/// Interpret a cell as a yes/no flag; anything unrecognized is "no"
pub fn parse_bool(cell: &CellValue) -> bool {
    match cell {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n == 1.0,
        CellValue::Text(s) => {
            let lower = s.trim().to_lowercase();
            TRUE_WORDS.contains(&lower.as_str())
        }
        CellValue::Date(_) | CellValue::Empty => false,
    }
}

/// Interpret a cell as a decimal number, accepting a comma separator
pub fn parse_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim()
            .replacen(',', ".", 1)
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_date(45292.0), Some(date(2024, 1, 1)));
        assert_eq!(excel_serial_to_date(45292.75), Some(date(2024, 1, 1)));
        assert_eq!(excel_serial_to_date(1.0), Some(date(1899, 12, 31)));
        assert_eq!(excel_serial_to_date(f64::NAN), None);
        assert_eq!(excel_serial_to_date(1e15), None);
        assert_eq!(excel_serial_to_date(-1e15), None);
        assert_eq!(excel_serial_to_date(f64::MAX), None);
    }

    #[test]
    fn test_text_dates() {
        assert_eq!(parse_text_date("31/12/2024"), Some(date(2024, 12, 31)));
        assert_eq!(parse_text_date(" 1/2/2024 "), Some(date(2024, 2, 1)));
        assert_eq!(parse_text_date("2024-02-01"), Some(date(2024, 2, 1)));
        assert_eq!(parse_text_date("2024-02-01T10:30:00Z"), Some(date(2024, 2, 1)));
        assert_eq!(parse_text_date("2024-02-01T10:30:00"), Some(date(2024, 2, 1)));
        assert_eq!(parse_text_date("32/01/2024"), None);
        assert_eq!(parse_text_date("hôm qua"), None);
        assert_eq!(parse_text_date(""), None);
    }

    #[test]
    fn test_parse_date_cells() {
        assert_eq!(parse_date(&CellValue::Date(date(2024, 5, 6))), Some(date(2024, 5, 6)));
        assert_eq!(parse_date(&CellValue::Number(45292.0)), Some(date(2024, 1, 1)));
        assert_eq!(parse_date(&text("06/05/2024")), Some(date(2024, 5, 6)));
        assert_eq!(parse_date(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["true", "TRUE", "1", "có", "Có", "yes", "x", " X "] {
            assert!(parse_bool(&text(yes)), "{} should be true", yes);
        }
        for no in ["false", "0", "không", "no", ""] {
            assert!(!parse_bool(&text(no)), "{} should be false", no);
        }
        assert!(parse_bool(&CellValue::Bool(true)));
        assert!(parse_bool(&CellValue::Number(1.0)));
        assert!(!parse_bool(&CellValue::Number(2.0)));
        assert!(!parse_bool(&CellValue::Empty));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&text("10,5")), Some(10.5));
        assert_eq!(parse_number(&text(" 106.7 ")), Some(106.7));
        assert_eq!(parse_number(&CellValue::Number(-3.0)), Some(-3.0));
        assert_eq!(parse_number(&text("abc")), None);
        assert_eq!(parse_number(&CellValue::Bool(true)), None);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(text("  Quán A ").as_text().as_deref(), Some("Quán A"));
        assert_eq!(text("   ").as_text(), None);
        assert_eq!(CellValue::Number(12345.0).as_text().as_deref(), Some("12345"));
        assert_eq!(CellValue::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(CellValue::Date(date(2024, 1, 2)).as_text().as_deref(), Some("02/01/2024"));
        assert!(CellValue::Empty.is_blank());
        assert!(text(" ").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(CellValue::from(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(CellValue::from(&Data::DateTimeIso("2024-03-04".to_string())), CellValue::Date(date(2024, 3, 4)));
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
    }
}
