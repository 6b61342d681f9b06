// Week-start date normalization across native dates, spreadsheet serials and
// the textual formats found in real timetables

use crate::models::CellValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Largest serial a spreadsheet can represent (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Days between the 1900 and 1904 date systems
const EPOCH_1904_OFFSET: i64 = 1462;

const SECONDS_PER_DAY: f64 = 86_400.0;

lazy_static::lazy_static! {
    /// Strict formats, tried in order: the shape regex guards the chrono pattern
    static ref STRICT_FORMATS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("valid regex"), "%Y/%m/%d"),
        (Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"), "%Y-%m-%d"),
        (Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid regex"), "%d/%m/%Y"),
        (Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("valid regex"), "%d/%m/%Y"),
        (Regex::new(r"^\d{2}-[A-Za-z]{3}-\d{4}$").expect("valid regex"), "%d-%b-%Y"),
        (Regex::new(r"^\d{1,2}-[A-Za-z]{3}-\d{4}$").expect("valid regex"), "%d-%b-%Y"),
    ];
    static ref ORDINAL_SUFFIX: Regex =
        Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Lenient date-only patterns
const LENIENT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%d %b, %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%a %b %d %Y",
    "%A %d %B %Y",
    "%a %d %b %Y",
    "%a, %d %b %Y",
    "%d-%B-%Y",
    "%B %Y",
];

/// Lenient date-time patterns (time of day is discarded)
const LENIENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Normalize a week-start cell to a calendar date.
///
/// Returns `None` on total failure; callers treat that as a row to skip.
pub fn normalize_date(cell: &CellValue, date1904: bool) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => {
            serial_to_date(*n, date1904).or_else(|| parse_date_text(&cell.to_text()))
        }
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Empty => None,
    }
}

/// Convert a spreadsheet serial number to a date.
///
/// The 1900 system keeps the phantom 29 Feb 1900 at serial 60, which lands
/// on 1 Mar 1900 once materialized as a real date.
pub fn serial_to_date(serial: f64, date1904: bool) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }

    let mut days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round();
    if seconds >= SECONDS_PER_DAY {
        days += 1;
    }

    if date1904 {
        days += EPOCH_1904_OFFSET;
    }

    match days {
        60 => NaiveDate::from_ymd_opt(1900, 3, 1),
        d if d < 60 => NaiveDate::from_ymd_opt(1899, 12, 31)?
            .checked_add_signed(Duration::days(d)),
        d => NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(d)),
    }
}

/// Parse a textual date: strict formats first, then a lenient pass
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    parse_strict(s).or_else(|| parse_lenient(s))
}

fn parse_strict(s: &str) -> Option<NaiveDate> {
    STRICT_FORMATS
        .iter()
        .filter(|(shape, _)| shape.is_match(s))
        .find_map(|(_, format)| NaiveDate::parse_from_str(s, format).ok())
}

fn parse_lenient(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(s, "$1");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim_end_matches(|c: char| c == 'Z' || c == 'z');

    for format in LENIENT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(dt.date());
        }
    }
    for format in LENIENT_DATE_FORMATS {
        if *format == "%B %Y" {
            // Month-and-year only: first day of that month
            let with_day = format!("1 {}", cleaned);
            if let Ok(d) = NaiveDate::parse_from_str(&with_day, "%d %B %Y") {
                return Some(d);
            }
            continue;
        }
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_strict_formats() {
        let expected = ymd(2025, 1, 6);
        for text in [
            "2025/01/06",
            "2025-01-06",
            "06/01/2025",
            "6/1/2025",
            "06-Jan-2025",
            "6-Jan-2025",
        ] {
            assert_eq!(parse_date_text(text), Some(expected), "format {}", text);
        }
    }

    #[test]
    fn test_day_first_wins_over_month_first() {
        assert_eq!(parse_date_text("03/02/2025"), Some(ymd(2025, 2, 3)));
        // Not a valid day-first date, so the lenient US reading applies
        assert_eq!(parse_date_text("02/13/2025"), Some(ymd(2025, 2, 13)));
    }

    #[test]
    fn test_lenient_formats() {
        assert_eq!(parse_date_text("2025-01-06T00:00:00"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("2025-01-06T08:30:00Z"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("January 6, 2025"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("6 Jan 2025"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("Mon Jan 06 2025"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("6th January 2025"), Some(ymd(2025, 1, 6)));
        assert_eq!(parse_date_text("2025-1-6"), Some(ymd(2025, 1, 6)));
    }

    #[test]
    fn test_unparseable_text() {
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("TBD"), None);
        assert_eq!(parse_date_text("Week 2"), None);
        assert_eq!(parse_date_text("2025-02-30"), None);
    }

    #[test]
    fn test_serial_dates_1900() {
        assert_eq!(serial_to_date(45663.0, false), Some(ymd(2025, 1, 6)));
        assert_eq!(serial_to_date(1.0, false), Some(ymd(1900, 1, 1)));
        assert_eq!(serial_to_date(59.0, false), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_date(60.0, false), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_date(61.0, false), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_date(45663.75, false), Some(ymd(2025, 1, 6)));
        assert_eq!(serial_to_date(45663.999_999_9, false), Some(ymd(2025, 1, 7)));
    }

    #[test]
    fn test_serial_dates_1904() {
        assert_eq!(serial_to_date(0.0, true), Some(ymd(1904, 1, 1)));
        assert_eq!(serial_to_date(44201.0, true), Some(ymd(2025, 1, 6)));
    }

    #[test]
    fn test_serial_out_of_range() {
        assert_eq!(serial_to_date(-1.0, false), None);
        assert_eq!(serial_to_date(f64::NAN, false), None);
        assert_eq!(serial_to_date(3_000_000.0, false), None);
    }

    #[test]
    fn test_normalize_branches_on_cell_kind() {
        let expected = ymd(2025, 1, 6);
        assert_eq!(normalize_date(&CellValue::Date(expected), false), Some(expected));
        assert_eq!(normalize_date(&CellValue::Number(45663.0), false), Some(expected));
        assert_eq!(normalize_date(&CellValue::text("06-Jan-2025"), false), Some(expected));
        assert_eq!(normalize_date(&CellValue::Empty, false), None);
        assert_eq!(normalize_date(&CellValue::text("garbage"), false), None);
    }
}
