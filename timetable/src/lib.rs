// Timetable parsing and teacher assignment library

pub mod config;
pub mod errors;
pub mod export;
pub mod models;
pub mod planner;
pub mod profile;
pub mod telemetry;
pub mod weeks;
pub mod workbook;

pub use errors::{ExportError, ProfileError, WorkbookError};
pub use models::{Assignment, AssignmentRow, Capacity, CellValue, Entry, Run, RunKey};
pub use planner::{build_runs, greedy_smooth_assign, AssignResult, ClassTotals, ScoreWeights, Smoother};
pub use workbook::{parse_rows, parse_workbook_file, ParseOptions};
