// Error handling framework
// Structural workbook failures are fatal to a parse call; per-row and per-cell
// anomalies are skipped silently by the parser and never surface here.

use thiserror::Error;

/// Structural workbook errors (malformed or unrecognized sheet shape)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkbookError {
    #[error("No sheets found.")]
    NoSheets,

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Sheet appears to be empty.")]
    EmptySheet,

    #[error(
        "Could not locate header row with \"Week Start\" and \"Calendar Week\". Sample rows:\n{sample}"
    )]
    HeaderNotFound { sample: String },

    #[error("Required headers not found on row {row}. Found: {}", .found.join(", "))]
    MissingRequiredColumns { row: usize, found: Vec<String> },

    #[error(
        "No class columns matched /(Jan|Mar|Aug|Oct)\\d{{2}}(FT|PT)/ on row {row}. Found: {}",
        .found.join(", ")
    )]
    NoClassColumns { row: usize, found: Vec<String> },

    #[error("Failed to read workbook: {0}")]
    Read(String),
}

impl From<calamine::Error> for WorkbookError {
    fn from(err: calamine::Error) -> Self {
        WorkbookError::Read(err.to_string())
    }
}

/// Course profile / class totals loading errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read profile file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Excel export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}
