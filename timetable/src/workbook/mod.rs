// Workbook parser: raw timetable cells → ordered, flagged entries
//
// Spreadsheet data is assumed messy at the cell level but well-formed at the
// shape level: structural problems fail the whole parse, cell and row
// anomalies are skipped silently.

pub mod cells;
pub mod dates;
pub mod excel;

use crate::errors::WorkbookError;
use crate::models::{CellValue, Entry, RunKey};
use crate::telemetry;
use crate::weeks::monday_of;
use cells::{
    is_class_header, is_week_start_header, normalize_header, parse_calendar_week,
    parse_class_header, parse_course_cell, HeaderRole,
};
use dates::normalize_date;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Only the first rows are searched for the header
pub const HEADER_SCAN_LIMIT: usize = 100;

/// Rows embedded in the "header not found" diagnostic
pub const SAMPLE_ROWS: usize = 10;

/// Options controlling how a sheet is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Numeric dates use the 1904 epoch
    #[serde(default)]
    pub date1904: bool,
    /// Move every week-start to the Monday of its week
    #[serde(default)]
    pub snap_to_monday: bool,
}

impl ParseOptions {
    pub fn with_date1904(mut self, date1904: bool) -> Self {
        self.date1904 = date1904;
        self
    }

    pub fn with_snap_to_monday(mut self, snap: bool) -> Self {
        self.snap_to_monday = snap;
        self
    }
}

/// Resolved header layout of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderLayout {
    /// 0-based index of the header row
    row: usize,
    week_start_col: usize,
    calendar_week_col: usize,
    /// (header name, column index) in header order
    class_cols: Vec<(String, usize)>,
}

/// Read the timetable sheet of an `.xlsx`/`.xls`/`.ods` file and parse it
#[instrument(skip(path, options), fields(path = %path.as_ref().display()))]
pub fn parse_workbook_file<P: AsRef<Path>>(
    path: P,
    sheet: Option<&str>,
    options: ParseOptions,
) -> Result<Vec<Entry>, WorkbookError> {
    let rows = excel::read_workbook(path.as_ref(), sheet)?;
    parse_rows(&rows, options)
}

/// Parse a raw cell matrix into entries sorted by `(classId, date)`
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn parse_rows(rows: &[Vec<CellValue>], options: ParseOptions) -> Result<Vec<Entry>, WorkbookError> {
    if rows.is_empty() {
        return Err(WorkbookError::EmptySheet);
    }

    let layout = locate_header(rows)?;
    debug!(
        header_row = layout.row + 1,
        class_columns = ?layout.class_cols.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        "Header row located"
    );

    let mut prelim: Vec<Entry> = Vec::new();
    let mut skipped_rows = 0u64;

    for (row_idx, row) in rows.iter().enumerate().skip(layout.row + 1) {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }

        let week_start = match row.get(layout.week_start_col) {
            Some(cell) if !cell.is_blank() => cell,
            _ => {
                debug!(row = row_idx + 1, "Skipping row without week start");
                skipped_rows += 1;
                continue;
            }
        };

        let date = match normalize_date(week_start, options.date1904) {
            Some(d) if options.snap_to_monday => monday_of(d),
            Some(d) => d,
            None => {
                debug!(
                    row = row_idx + 1,
                    value = %week_start.to_text(),
                    "Skipping row with unparseable week start"
                );
                skipped_rows += 1;
                continue;
            }
        };

        let calendar_week = parse_calendar_week(row.get(layout.calendar_week_col));

        for (class_id, col) in &layout.class_cols {
            let Some(course) = row.get(*col).and_then(parse_course_cell) else {
                continue;
            };
            let Some(class) = parse_class_header(class_id) else {
                continue;
            };

            prelim.push(Entry {
                date,
                calendar_week,
                class_id: class_id.clone(),
                intake: class.intake,
                year: class.year,
                mode: class.mode,
                course_code: course.course_code,
                course_week: course.course_week,
                is_start: false,
                is_assessment: false,
            });
        }
    }

    let entries = flag_groups(prelim, options.snap_to_monday);

    telemetry::record_entries_parsed(entries.len() as u64);
    telemetry::record_rows_skipped(skipped_rows);
    info!(
        entries = entries.len(),
        skipped_rows = skipped_rows,
        "Workbook parsed"
    );

    Ok(entries)
}

/// Find the header row and resolve the required and class columns
fn locate_header(rows: &[Vec<CellValue>]) -> Result<HeaderLayout, WorkbookError> {
    let mut partial: Option<(usize, Vec<String>)> = None;
    let mut header: Option<(usize, Vec<String>)> = None;

    for (idx, row) in rows.iter().take(HEADER_SCAN_LIMIT).enumerate() {
        let names: Vec<String> = row.iter().map(normalize_header).collect();
        let has_week_start = HeaderRole::WeekStart.find(&names).is_some();
        let has_calendar_week = HeaderRole::CalendarWeek.find(&names).is_some();

        if has_week_start && has_calendar_week {
            header = Some((idx, names));
            break;
        }
        if partial.is_none() && names.iter().any(|name| is_week_start_header(name)) {
            partial = Some((idx, names));
        }
    }

    let (row, names) = match (header, partial) {
        (Some(found), _) => found,
        // A week-start header without its calendar-week partner is reported
        // against that row so the caller sees which headers were present
        (None, Some((idx, names))) => {
            return Err(WorkbookError::MissingRequiredColumns {
                row: idx + 1,
                found: names,
            })
        }
        (None, None) => return Err(WorkbookError::HeaderNotFound { sample: sample_rows(rows) }),
    };

    // Later duplicates of a header name win, as a name→column map does
    let col_index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let resolve = |role: HeaderRole| {
        role.find(&names)
            .and_then(|pos| col_index.get(names[pos].as_str()).copied())
    };

    let (Some(week_start_col), Some(calendar_week_col)) =
        (resolve(HeaderRole::WeekStart), resolve(HeaderRole::CalendarWeek))
    else {
        return Err(WorkbookError::MissingRequiredColumns {
            row: row + 1,
            found: names,
        });
    };

    let mut class_cols: Vec<(String, usize)> = Vec::new();
    for name in names.iter().filter(|name| is_class_header(name)) {
        if class_cols.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        if let Some(&col) = col_index.get(name.as_str()) {
            class_cols.push((name.clone(), col));
        }
    }

    if class_cols.is_empty() {
        return Err(WorkbookError::NoClassColumns {
            row: row + 1,
            found: names,
        });
    }

    Ok(HeaderLayout {
        row,
        week_start_col,
        calendar_week_col,
        class_cols,
    })
}

/// First rows of the sheet, cells joined by `" | "`, one row per line
fn sample_rows(rows: &[Vec<CellValue>]) -> String {
    rows.iter()
        .take(SAMPLE_ROWS)
        .map(|row| {
            row.iter()
                .map(CellValue::to_text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group by (class, course), flag first/last of each group and sort globally.
///
/// With `collapse_same_date`, rows of a group landing on one date keep only
/// the first sheet row, so group dates stay strictly increasing.
fn flag_groups(prelim: Vec<Entry>, collapse_same_date: bool) -> Vec<Entry> {
    let mut index: HashMap<RunKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<Entry>> = Vec::new();

    for entry in prelim {
        let key = entry.run_key();
        match index.get(&key) {
            Some(&i) => groups[i].push(entry),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![entry]);
            }
        }
    }

    let mut result: Vec<Entry> = Vec::new();
    for mut group in groups {
        group.sort_by(|a, b| a.date.cmp(&b.date));
        if collapse_same_date {
            group.dedup_by(|dropped, kept| {
                let same = dropped.date == kept.date;
                if same {
                    debug!(
                        class_id = %dropped.class_id,
                        course_code = %dropped.course_code,
                        date = %dropped.date,
                        course_week = dropped.course_week,
                        "Collapsing row snapped onto an existing week"
                    );
                }
                same
            });
        }
        let last = group.len() - 1;
        for (i, mut entry) in group.into_iter().enumerate() {
            entry.is_start = i == 0;
            entry.is_assessment = i == last;
            result.push(entry);
        }
    }

    result.sort_by(|a, b| a.class_id.cmp(&b.class_id).then(a.date.cmp(&b.date)));
    result
}
