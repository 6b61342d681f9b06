use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Raw Cell Models
// ============================================================================

/// A raw spreadsheet cell as handed over by the spreadsheet reader
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for `Empty` and for text that is blank after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// Trimmed text rendering of the cell.
    ///
    /// Integral numbers render without a fractional part, other numbers in
    /// their shortest decimal form and dates as ISO `YYYY-MM-DD`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

// ============================================================================
// Entry Models
// ============================================================================

/// Intake month of a class cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intake {
    Jan,
    Mar,
    Aug,
    Oct,
}

impl Intake {
    /// Case-insensitive parse of a three-letter intake abbreviation
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "jan" => Some(Intake::Jan),
            "mar" => Some(Intake::Mar),
            "aug" => Some(Intake::Aug),
            "oct" => Some(Intake::Oct),
            _ => None,
        }
    }
}

impl fmt::Display for Intake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intake::Jan => "Jan",
            Intake::Mar => "Mar",
            Intake::Aug => "Aug",
            Intake::Oct => "Oct",
        };
        f.write_str(s)
    }
}

/// Study mode of a class cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "FT" => Some(Mode::FullTime),
            "PT" => Some(Mode::PartTime),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::FullTime => f.write_str("FT"),
            Mode::PartTime => f.write_str("PT"),
        }
    }
}

/// One (week, class, course) observation extracted from the timetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub date: NaiveDate,
    /// `None` when the calendar week cell holds no digits
    pub calendar_week: Option<u32>,
    pub class_id: String,
    pub intake: Intake,
    pub year: u8,
    pub mode: Mode,
    pub course_code: String,
    pub course_week: u32,
    pub is_start: bool,
    pub is_assessment: bool,
}

impl Entry {
    pub fn run_key(&self) -> RunKey {
        RunKey::new(&self.class_id, &self.course_code)
    }
}

// ============================================================================
// Run Models
// ============================================================================

/// Composite (class, course) key used for grouping entries and keying runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    pub class_id: String,
    pub course_code: String,
}

impl RunKey {
    pub fn new(class_id: impl Into<String>, course_code: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            course_code: course_code.into(),
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.class_id, self.course_code)
    }
}

impl Serialize for RunKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One teaching unit to be staffed: a class/course pair over its weeks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: RunKey,
    pub class_id: String,
    pub course_code: String,
    /// Ascending, de-duplicated week-start dates; never empty
    pub weeks: Vec<NaiveDate>,
    pub weight: f64,
    pub eligible: Vec<String>,
}

impl Run {
    /// Total load the run contributes: `weight × weekCount`
    pub fn impact(&self) -> f64 {
        self.weight * self.weeks.len() as f64
    }
}

/// Per-teacher weekly ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub weekly_slots: f64,
}

impl Capacity {
    pub fn new(weekly_slots: f64) -> Self {
        Self { weekly_slots }
    }
}

// ============================================================================
// Assignment Models
// ============================================================================

pub const UNASSIGNED: &str = "(unassigned)";

/// Outcome of the smoothing decision for a single run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Assignment {
    Teacher(String),
    Unassigned,
}

impl Assignment {
    pub fn teacher(&self) -> Option<&str> {
        match self {
            Assignment::Teacher(t) => Some(t),
            Assignment::Unassigned => None,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Assignment::Unassigned)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Assignment::Teacher(t) => t,
            Assignment::Unassigned => UNASSIGNED,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Assignment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Assignment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == UNASSIGNED {
            Ok(Assignment::Unassigned)
        } else {
            Ok(Assignment::Teacher(s))
        }
    }
}

/// Flattened display row of an assignment result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub class_id: String,
    pub course_code: String,
    pub teacher: Assignment,
    pub weeks: usize,
    pub students_per_week: f64,
}
