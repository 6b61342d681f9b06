// Integration tests for the timetable planner
// These tests drive real workbooks through parsing, run building, smoothing and export

use anyhow::Result;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use timetable::config::Settings;
use timetable::errors::WorkbookError;
use timetable::export::{export_assignments, write_entries_json};
use timetable::models::{Assignment, Capacity, RunKey};
use timetable::planner::{build_runs, greedy_smooth_assign, ClassTotals, Smoother};
use timetable::workbook::{parse_workbook_file, ParseOptions};

/// A worksheet cell to write
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    /// Spreadsheet serial shown with a date format
    Date(f64),
}

/// Helper function to write a single-sheet workbook into `dir`
fn write_workbook(dir: &Path, name: &str, sheet: &str, rows: &[Vec<Cell>]) -> Result<PathBuf> {
    let path = dir.join(name);
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Text("") => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, c, *s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Date(serial) => {
                    worksheet.write_number_with_format(r, c, *serial, &date_format)?;
                }
            }
        }
    }

    workbook.save(&path)?;
    Ok(path)
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Three weeks, two classes: Jan25FT runs PRF over W1-W2, Oct24PT runs API over W2-W3
fn two_class_sheet(dir: &Path) -> Result<PathBuf> {
    use Cell::*;
    write_workbook(
        dir,
        "two_class.xlsx",
        "Timetable",
        &[
            vec![Text("Programme timetable 2025")],
            vec![Text("Week Start"), Text("Calendar Week"), Text("Jan25FT"), Text("Oct24PT"), Text("Notes")],
            vec![Date(45663.0), Text("Week 2"), Text("1. PRF"), Text(""), Text("term start")],
            vec![Date(45670.0), Text("Week 3"), Text("2. PRF"), Text("1. API")],
            vec![Date(45677.0), Text("Week 4"), Text(""), Text("2. api")],
        ],
    )
}

#[test]
fn test_single_entry_sheet() -> Result<()> {
    use Cell::*;
    let dir = TempDir::new()?;
    let path = write_workbook(
        dir.path(),
        "single.xlsx",
        "Sheet1",
        &[
            vec![Text("Week Start"), Text("Calendar Week"), Text("Jan25FT")],
            vec![Text("2025-01-06"), Text("2"), Text("1. PRF")],
        ],
    )?;

    let entries = parse_workbook_file(&path, None, ParseOptions::default())?;
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.class_id, "Jan25FT");
    assert_eq!(entry.course_code, "PRF");
    assert_eq!(entry.course_week, 1);
    assert_eq!(entry.date, ymd(2025, 1, 6));
    assert_eq!(entry.calendar_week, Some(2));
    assert!(entry.is_start);
    assert!(entry.is_assessment);

    let json = serde_json::to_value(entry)?;
    assert_eq!(json["date"], "2025-01-06");
    assert_eq!(json["classId"], "Jan25FT");
    Ok(())
}

#[test]
fn test_date_formatted_serials_and_title_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let path = two_class_sheet(dir.path())?;

    let entries = parse_workbook_file(&path, Some("Timetable"), ParseOptions::default())?;
    assert_eq!(entries.len(), 4);

    // Sorted by class then date
    let keys: Vec<(String, NaiveDate)> = entries.iter().map(|e| (e.class_id.clone(), e.date)).collect();
    assert_eq!(
        keys,
        vec![
            ("Jan25FT".to_string(), ymd(2025, 1, 6)),
            ("Jan25FT".to_string(), ymd(2025, 1, 13)),
            ("Oct24PT".to_string(), ymd(2025, 1, 13)),
            ("Oct24PT".to_string(), ymd(2025, 1, 20)),
        ]
    );
    assert!(entries[0].is_start && !entries[0].is_assessment);
    assert!(!entries[1].is_start && entries[1].is_assessment);
    assert_eq!(entries[3].course_code, "API");
    assert_eq!(entries[3].calendar_week, Some(4));
    Ok(())
}

#[test]
fn test_larger_run_wins_contended_capacity() -> Result<()> {
    let dir = TempDir::new()?;
    let path = two_class_sheet(dir.path())?;
    let entries = parse_workbook_file(&path, None, ParseOptions::default())?;

    let totals: ClassTotals = [("JAN25FT", 20.0), ("OCT24PT", 15.0)].into_iter().collect();
    let runs = build_runs(&entries, &totals, &HashMap::new(), &names(&["T"]));

    let mut capacity = HashMap::new();
    capacity.insert("T".to_string(), Capacity::new(30.0));
    let result = greedy_smooth_assign(runs.clone(), &names(&["T"]), &capacity);

    assert_eq!(result.runs[0].id, RunKey::new("Jan25FT", "PRF"));
    assert_eq!(
        result.teacher_for(&RunKey::new("Jan25FT", "PRF")),
        Some(&Assignment::Teacher("T".to_string()))
    );
    assert_eq!(
        result.teacher_for(&RunKey::new("Oct24PT", "API")),
        Some(&Assignment::Unassigned)
    );
    assert_eq!(result.load.get("T", ymd(2025, 1, 13)), 20.0);

    // Enough room for both runs
    capacity.insert("T".to_string(), Capacity::new(35.0));
    let result = greedy_smooth_assign(runs, &names(&["T"]), &capacity);
    assert!(result.unassigned().is_empty());
    assert_eq!(result.peak_load("T"), 35.0);
    Ok(())
}

#[test]
fn test_no_eligible_teacher_is_unassigned() -> Result<()> {
    let dir = TempDir::new()?;
    let path = two_class_sheet(dir.path())?;
    let entries = parse_workbook_file(&path, None, ParseOptions::default())?;

    let runs = build_runs(&entries, &ClassTotals::new(), &HashMap::new(), &[]);
    let mut capacity = HashMap::new();
    capacity.insert("T".to_string(), Capacity::new(1000.0));
    let result = greedy_smooth_assign(runs, &names(&["T"]), &capacity);

    assert_eq!(result.unassigned().len(), 2);
    assert!(result
        .assignment_table()
        .iter()
        .all(|row| row.teacher.as_str() == "(unassigned)"));
    Ok(())
}

#[test]
fn test_missing_calendar_week_lists_headers() -> Result<()> {
    use Cell::*;
    let dir = TempDir::new()?;
    let path = write_workbook(
        dir.path(),
        "no_calendar.xlsx",
        "Sheet1",
        &[
            vec![Text("Week Start"), Text("Jan25FT")],
            vec![Text("2025-01-06"), Text("1. PRF")],
        ],
    )?;

    let err = parse_workbook_file(&path, None, ParseOptions::default()).unwrap_err();
    match &err {
        WorkbookError::MissingRequiredColumns { row, found } => {
            assert_eq!(*row, 1);
            assert_eq!(found, &names(&["Week Start", "Jan25FT"]));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Found: Week Start, Jan25FT"));
    Ok(())
}

#[test]
fn test_sheet_without_headers_reports_sample() -> Result<()> {
    use Cell::*;
    let dir = TempDir::new()?;
    let path = write_workbook(
        dir.path(),
        "no_header.xlsx",
        "Sheet1",
        &[vec![Text("Class"), Text("Room")], vec![Text("Jan25FT"), Number(12.0)]],
    )?;

    let err = parse_workbook_file(&path, None, ParseOptions::default()).unwrap_err();
    match err {
        WorkbookError::HeaderNotFound { sample } => {
            assert_eq!(sample, "Class | Room\nJan25FT | 12");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_unknown_sheet_name() -> Result<()> {
    let dir = TempDir::new()?;
    let path = two_class_sheet(dir.path())?;
    let err = parse_workbook_file(&path, Some("Spring"), ParseOptions::default()).unwrap_err();
    assert_eq!(err, WorkbookError::SheetNotFound("Spring".to_string()));
    Ok(())
}

#[test]
fn test_date1904_serials() -> Result<()> {
    use Cell::*;
    let dir = TempDir::new()?;
    let path = write_workbook(
        dir.path(),
        "epoch1904.xlsx",
        "Sheet1",
        &[
            vec![Text("Week Start"), Text("Calendar Week"), Text("Mar25PT")],
            vec![Number(44201.0), Number(2.0), Text("3 ux")],
        ],
    )?;

    let entries = parse_workbook_file(&path, None, ParseOptions::default().with_date1904(true))?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date, ymd(2025, 1, 6));
    assert_eq!(entries[0].course_code, "UX");
    assert_eq!(entries[0].course_week, 3);
    Ok(())
}

#[test]
fn test_configured_pipeline_exports() -> Result<()> {
    let dir = TempDir::new()?;
    let config_dir = dir.path().join("config");
    fs::create_dir(&config_dir)?;
    fs::write(
        config_dir.join("default.toml"),
        r#"
[scoring]
peak_weight = 2.0
delta_weight = 0.1

[[staffing.teachers]]
name = "Madri"
weekly_slots = 25.0

[[staffing.teachers]]
name = "Connor"

[[staffing.courses]]
code = "PRF"
teachers = ["Madri", "Connor"]

[[staffing.courses]]
code = "API"
teachers = ["Madri", "Connor"]

[staffing.class_totals]
JAN25FT = 20.0
OCT24PT = 15.0
"#,
    )?;

    let settings = Settings::load_from_path(&config_dir)?;
    assert!(settings.validate().is_ok());

    let path = two_class_sheet(dir.path())?;
    let entries = parse_workbook_file(&path, None, settings.parse_options())?;
    let runs = build_runs(
        &entries,
        &settings.class_totals(),
        &settings.eligibility(),
        &settings.staffing.fallback_teachers,
    );
    let result = Smoother::new(settings.score_weights()).assign(runs, &settings.roster(), &settings.capacity());

    // Madri takes PRF; API would push Madri past 25 in the shared week, so Connor gets it
    let table = result.assignment_table();
    assert_eq!(table[0].teacher.as_str(), "Madri");
    assert_eq!(table[1].teacher.as_str(), "Connor");

    let csv_path = dir.path().join("plan.csv");
    export_assignments(&result, &csv_path)?;
    let csv = fs::read_to_string(&csv_path)?;
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![
            "Class,Course,Teacher,Weeks,Students/Week",
            "Jan25FT,PRF,Madri,2,20",
            "Oct24PT,API,Connor,2,15",
        ]
    );

    let xlsx_path = dir.path().join("plan.xlsx");
    export_assignments(&result, &xlsx_path)?;
    assert!(fs::metadata(&xlsx_path)?.len() > 0);

    let json_path = dir.path().join("entries.json");
    write_entries_json(&entries, &json_path)?;
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
    assert_eq!(value.as_array().map(Vec::len), Some(4));
    Ok(())
}
