// Planner binary entry point
// Reads a timetable workbook, builds runs and assigns teachers

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use timetable::config::Settings;
use timetable::export::{export_assignments, write_entries_json};
use timetable::models::AssignmentRow;
use timetable::planner::{build_runs, Smoother};
use timetable::profile::{eligibility_from_profile, load_class_totals, load_profile};
use timetable::telemetry;
use timetable::workbook::parse_workbook_file;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "planner")]
#[command(version)]
#[command(about = "Parse a weekly timetable and balance teacher assignments")]
struct Cli {
    /// Timetable workbook (.xlsx, .xls, .ods)
    workbook: PathBuf,

    /// Directory holding default.toml / local.toml
    #[arg(long, default_value = "config")]
    config: PathBuf,

    /// Worksheet to read instead of the first one
    #[arg(long)]
    sheet: Option<String>,

    /// Numeric dates use the 1904 epoch
    #[arg(long)]
    date1904: bool,

    /// Move week starts to the Monday of their week
    #[arg(long)]
    snap_to_monday: bool,

    /// Course profile JSON; replaces configured course eligibility
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Class totals JSON; merged over configured totals
    #[arg(long)]
    class_totals: Option<PathBuf>,

    /// Write parsed entries as JSON
    #[arg(long)]
    entries_out: Option<PathBuf>,

    /// Export assignments (.xlsx or .csv)
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    settings
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        cli.json_logs || settings.observability.json_logs,
    )?;
    telemetry::describe_metrics();

    run(&cli, &settings)
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let mut options = settings.parse_options();
    options.date1904 |= cli.date1904;
    options.snap_to_monday |= cli.snap_to_monday;
    let sheet = cli.sheet.as_deref().or(settings.parser.sheet.as_deref());

    let entries = parse_workbook_file(&cli.workbook, sheet, options)
        .with_context(|| format!("Failed to parse {}", cli.workbook.display()))?;

    if let Some(path) = &cli.entries_out {
        write_entries_json(&entries, path)
            .with_context(|| format!("Failed to write entries to {}", path.display()))?;
    }

    let eligibility = match &cli.profile {
        Some(path) => {
            let profile = load_profile(path)?;
            eligibility_from_profile(&profile)
        }
        None => settings.eligibility(),
    };

    let mut class_totals = settings.class_totals();
    if let Some(path) = &cli.class_totals {
        class_totals.extend(&load_class_totals(path)?);
    }

    let fallback = &settings.staffing.fallback_teachers;
    let runs = build_runs(&entries, &class_totals, &eligibility, fallback);

    let mut roster = settings.roster();
    if roster.is_empty() {
        roster = derive_roster(&eligibility, fallback);
        warn!(
            teachers = roster.len(),
            "No teachers configured, using every teacher named in eligibility lists"
        );
    }

    let result = Smoother::new(settings.score_weights()).assign(runs, &roster, &settings.capacity());
    let table = result.assignment_table();

    match cli.format {
        OutputFormat::Table => print_table(&table),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }

    if let Some(path) = &cli.out {
        export_assignments(&result, path)
            .with_context(|| format!("Failed to export assignments to {}", path.display()))?;
    }

    info!(
        entries = entries.len(),
        runs = table.len(),
        unassigned = result.unassigned().len(),
        "Planning complete"
    );
    Ok(())
}

/// Teachers named anywhere in the eligibility lists or the fallback list,
/// fallback first, each once, courses in code order
fn derive_roster(eligibility: &HashMap<String, Vec<String>>, fallback: &[String]) -> Vec<String> {
    let mut codes: Vec<&String> = eligibility.keys().collect();
    codes.sort();

    let mut roster: Vec<String> = Vec::new();
    let named = fallback
        .iter()
        .chain(codes.into_iter().flat_map(|code| eligibility[code].iter()));
    for teacher in named {
        if !roster.contains(teacher) {
            roster.push(teacher.clone());
        }
    }
    roster
}

fn print_table(rows: &[AssignmentRow]) {
    println!(
        "{:<12} {:<10} {:<20} {:>6} {:>14}",
        "CLASS", "COURSE", "TEACHER", "WEEKS", "STUDENTS/WEEK"
    );
    for row in rows {
        println!(
            "{:<12} {:<10} {:<20} {:>6} {:>14}",
            row.class_id,
            row.course_code,
            row.teacher.as_str(),
            row.weeks,
            row.students_per_week
        );
    }
}
