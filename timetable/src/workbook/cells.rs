// Cell micro-parsing: header names, class cohort headers, course cells and
// calendar week counters

use crate::models::{CellValue, Intake, Mode};
use regex::Regex;

lazy_static::lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
    static ref WEEK_START: Regex = Regex::new(r"(?i)^week\s*start$").expect("valid week start regex");
    static ref START: Regex = Regex::new(r"(?i)^start$").expect("valid start regex");
    static ref CALENDAR_WEEK: Regex =
        Regex::new(r"(?i)^calendar\s*week$").expect("valid calendar week regex");
    static ref WEEK: Regex = Regex::new(r"(?i)^week$").expect("valid week regex");
    static ref CLASS_HEADER: Regex =
        Regex::new(r"(?i)^(Jan|Mar|Aug|Oct)(\d{2})(FT|PT)$").expect("valid class header regex");
    static ref COURSE_CELL: Regex =
        Regex::new(r"^(\d+)[.\s]+\s*([A-Za-z0-9]+)$").expect("valid course cell regex");
}

/// Trim a header cell and collapse inner whitespace runs to a single space
pub fn normalize_header(cell: &CellValue) -> String {
    WHITESPACE.replace_all(&cell.to_text(), " ").into_owned()
}

/// Header roles the parser needs to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRole {
    WeekStart,
    CalendarWeek,
}

impl HeaderRole {
    /// Find the column of this role: the primary pattern wins over the fallback
    pub fn find(self, headers: &[String]) -> Option<usize> {
        let (primary, fallback) = match self {
            HeaderRole::WeekStart => (&*WEEK_START, &*START),
            HeaderRole::CalendarWeek => (&*CALENDAR_WEEK, &*WEEK),
        };
        headers
            .iter()
            .position(|h| primary.is_match(h))
            .or_else(|| headers.iter().position(|h| fallback.is_match(h)))
    }
}

/// Whether a header is the full week-start name, not the bare `Start` fallback
pub fn is_week_start_header(header: &str) -> bool {
    WEEK_START.is_match(header)
}

/// Decomposed class cohort header, e.g. `Jan25FT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub intake: Intake,
    pub year: u8,
    pub mode: Mode,
}

pub fn is_class_header(header: &str) -> bool {
    CLASS_HEADER.is_match(header)
}

/// Parse a class cohort header; `None` if it does not follow the naming convention
pub fn parse_class_header(header: &str) -> Option<ClassHeader> {
    let caps = CLASS_HEADER.captures(header)?;
    Some(ClassHeader {
        intake: Intake::parse(caps.get(1)?.as_str())?,
        year: caps.get(2)?.as_str().parse().ok()?,
        mode: Mode::parse(caps.get(3)?.as_str())?,
    })
}

/// Parsed course cell: `"12. PME"` or `"12 PME"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseCell {
    pub course_week: u32,
    pub course_code: String,
}

/// Split a course cell into week number and upper-cased code.
///
/// The course week is a `u32`; a week number beyond `u32::MAX` does not parse
/// and the cell is skipped like any other unrecognized text.
pub fn parse_course_cell(cell: &CellValue) -> Option<CourseCell> {
    let text = cell.to_text();
    if text.is_empty() {
        return None;
    }
    let caps = COURSE_CELL.captures(&text)?;
    Some(CourseCell {
        course_week: caps.get(1)?.as_str().parse().ok()?,
        course_code: caps.get(2)?.as_str().to_uppercase(),
    })
}

/// Strip every non-digit character and parse the remainder.
///
/// Returns `None` when nothing numeric is left or the digits exceed
/// `u32::MAX`; the row is still kept with no calendar week.
pub fn parse_calendar_week(cell: Option<&CellValue>) -> Option<u32> {
    let digits: String = cell
        .map(CellValue::to_text)
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
