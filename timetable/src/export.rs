// Assignment and entry exporters (xlsx, csv, json)

use crate::errors::ExportError;
use crate::models::{AssignmentRow, Entry};
use crate::planner::AssignResult;
use crate::weeks::week_label;
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

pub const ASSIGNMENT_HEADERS: [&str; 5] = ["Class", "Course", "Teacher", "Weeks", "Students/Week"];
pub const ASSIGNMENTS_SHEET: &str = "Assignments";
pub const LOAD_SHEET: &str = "Load";

/// Output format chosen from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Write the assignment result in the format implied by `path`
pub fn export_assignments(result: &AssignResult, path: &Path) -> Result<(), ExportError> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Xlsx => write_assignments_xlsx(result, path),
        ExportFormat::Csv => write_assignments_csv(&result.assignment_table(), path),
    }
}

/// Build the `Assignments` and `Load` sheets into an in-memory workbook
pub fn assignments_xlsx_buffer(result: &AssignResult) -> Result<Vec<u8>, ExportError> {
    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(ASSIGNMENTS_SHEET)?;
    write_assignment_sheet(sheet, &result.assignment_table(), &header)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(LOAD_SHEET)?;
    write_load_sheet(sheet, result, &header)?;

    Ok(workbook.save_to_buffer()?)
}

#[instrument(skip(result), fields(path = %path.display()))]
pub fn write_assignments_xlsx(result: &AssignResult, path: &Path) -> Result<(), ExportError> {
    let buffer = assignments_xlsx_buffer(result)?;
    fs::write(path, &buffer)?;
    info!(runs = result.runs.len(), bytes = buffer.len(), "Assignments written");
    Ok(())
}

fn write_assignment_sheet(
    sheet: &mut Worksheet,
    rows: &[AssignmentRow],
    header: &Format,
) -> Result<(), ExportError> {
    for (col, title) in ASSIGNMENT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, &row.class_id)?;
        sheet.write_string(r, 1, &row.course_code)?;
        sheet.write_string(r, 2, row.teacher.as_str())?;
        sheet.write_number(r, 3, row.weeks as f64)?;
        sheet.write_number(r, 4, row.students_per_week)?;
    }

    sheet.set_column_width(0, 12.0)?;
    sheet.set_column_width(2, 18.0)?;
    sheet.set_column_width(4, 14.0)?;
    Ok(())
}

/// Teacher rows by week columns; cells without load stay empty
fn write_load_sheet(
    sheet: &mut Worksheet,
    result: &AssignResult,
    header: &Format,
) -> Result<(), ExportError> {
    let weeks = result.load.weeks();

    sheet.write_string_with_format(0, 0, "Teacher", header)?;
    for (idx, week) in weeks.iter().enumerate() {
        sheet.write_string_with_format(0, idx as u16 + 1, &week_label(*week), header)?;
    }

    for (row_idx, teacher) in result.load.teachers().enumerate() {
        let r = row_idx as u32 + 1;
        sheet.write_string(r, 0, teacher)?;
        for (idx, week) in weeks.iter().enumerate() {
            let value = result.load.get(teacher, *week);
            if value != 0.0 {
                sheet.write_number(r, idx as u16 + 1, value)?;
            }
        }
    }

    sheet.set_column_width(0, 18.0)?;
    Ok(())
}

#[instrument(skip(rows), fields(path = %path.display()))]
pub fn write_assignments_csv(rows: &[AssignmentRow], path: &Path) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(ASSIGNMENT_HEADERS)?;

    for row in rows {
        writer.write_record([
            row.class_id.clone(),
            row.course_code.clone(),
            row.teacher.as_str().to_string(),
            row.weeks.to_string(),
            row.students_per_week.to_string(),
        ])?;
    }

    writer.flush()?;
    info!(rows = rows.len(), "Assignments written");
    Ok(())
}

/// Pretty-printed JSON array of entries
#[instrument(skip(entries), fields(path = %path.display()))]
pub fn write_entries_json(entries: &[Entry], path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json)?;
    info!(entries = entries.len(), "Entries written");
    Ok(())
}
