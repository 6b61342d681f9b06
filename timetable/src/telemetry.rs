// Telemetry module for structured logging and metrics
//
// No metrics exporter is installed here; embedding applications may install
// any `metrics` recorder and the counters below will flow into it.

use anyhow::Result;
use metrics::{counter, describe_counter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence over `log_level`. With `json` set, events are
/// emitted as JSON lines carrying span context; otherwise a compact
/// human-readable format is used. Logs go to stderr so stdout stays free for
/// command output.
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, json = json, "Logging initialized");

    Ok(())
}

/// Register descriptions for every counter the library emits
pub fn describe_metrics() {
    describe_counter!(
        "timetable_entries_parsed_total",
        "Total number of timetable entries produced by the workbook parser"
    );
    describe_counter!(
        "timetable_rows_skipped_total",
        "Total number of data rows skipped for a blank or unparseable week start"
    );
    describe_counter!(
        "timetable_runs_assigned_total",
        "Total number of runs assigned to a teacher"
    );
    describe_counter!(
        "timetable_runs_unassigned_total",
        "Total number of runs left without a feasible teacher"
    );
}

#[inline]
pub fn record_entries_parsed(count: u64) {
    counter!("timetable_entries_parsed_total").increment(count);
}

#[inline]
pub fn record_rows_skipped(count: u64) {
    counter!("timetable_rows_skipped_total").increment(count);
}

#[inline]
pub fn record_assignments(assigned: u64, unassigned: u64) {
    counter!("timetable_runs_assigned_total").increment(assigned);
    counter!("timetable_runs_unassigned_total").increment(unassigned);
}
