// Excel file reader
// Converts a calamine worksheet into the raw cell matrix the parser consumes

use crate::errors::WorkbookError;
use crate::models::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Read one sheet of a workbook as rows of `CellValue`.
///
/// The first sheet is used unless `sheet` names another one. Blank rows are
/// dropped so the header scan window counts only rows with content.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<CellValue>>, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))?,
        None => sheet_names.first().cloned().ok_or(WorkbookError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let rows = range_to_rows(&range);

    info!(
        sheet = %sheet_name,
        rows = rows.len(),
        "Worksheet loaded"
    );

    Ok(rows)
}

/// Convert a calamine range, dropping rows without any content
pub fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let mut rows = Vec::new();
    let mut blank = 0usize;

    for row in range.rows() {
        let cells: Vec<CellValue> = row.iter().map(cell_value).collect();
        if cells.iter().all(CellValue::is_blank) {
            blank += 1;
            continue;
        }
        rows.push(cells);
    }

    if blank > 0 {
        debug!(blank_rows = blank, "Dropped blank rows");
    }
    rows
}

/// Map a calamine cell onto the parser's tagged union
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if dt.is_datetime() => CellValue::Date(value.date()),
            _ => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}
