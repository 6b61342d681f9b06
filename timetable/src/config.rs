// Configuration management with layered configuration (file, env, CLI)

use crate::models::Capacity;
use crate::planner::{ClassTotals, ScoreWeights};
use crate::workbook::ParseOptions;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub staffing: StaffingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub date1904: bool,
    #[serde(default)]
    pub snap_to_monday: bool,
    /// Worksheet to read; the first sheet when unset
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_peak_weight")]
    pub peak_weight: f64,
    #[serde(default = "default_delta_weight")]
    pub delta_weight: f64,
}

fn default_peak_weight() -> f64 {
    ScoreWeights::default().peak
}

fn default_delta_weight() -> f64 {
    ScoreWeights::default().delta
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            peak_weight: default_peak_weight(),
            delta_weight: default_delta_weight(),
        }
    }
}

/// Teachers, course eligibility and class sizes.
///
/// Teacher names and course codes are carried as values rather than table
/// keys because configuration keys are case-folded when loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffingConfig {
    #[serde(default)]
    pub teachers: Vec<TeacherConfig>,
    /// Used for courses without an eligibility list of their own
    #[serde(default)]
    pub fallback_teachers: Vec<String>,
    #[serde(default)]
    pub courses: Vec<CourseConfig>,
    /// Students per week keyed by class id (case-insensitive)
    #[serde(default)]
    pub class_totals: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherConfig {
    pub name: String,
    /// Weekly ceiling; unbounded when unset
    pub weekly_slots: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    pub code: String,
    #[serde(default)]
    pub teachers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("PLANNER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("peak_weight", self.scoring.peak_weight),
            ("delta_weight", self.scoring.delta_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "Scoring {} must be a finite non-negative number",
                    name
                ));
            }
        }

        let mut seen = HashSet::new();
        for teacher in &self.staffing.teachers {
            if teacher.name.trim().is_empty() {
                return Err("Teacher name cannot be empty".to_string());
            }
            if !seen.insert(teacher.name.as_str()) {
                return Err(format!("Teacher '{}' is listed more than once", teacher.name));
            }
            if let Some(slots) = teacher.weekly_slots {
                if slots.is_nan() || slots < 0.0 {
                    return Err(format!(
                        "Teacher '{}' weekly_slots cannot be negative",
                        teacher.name
                    ));
                }
            }
        }

        if self.staffing.courses.iter().any(|c| c.code.trim().is_empty()) {
            return Err("Course code cannot be empty".to_string());
        }

        if self
            .staffing
            .class_totals
            .values()
            .any(|total| !total.is_finite() || *total < 0.0)
        {
            return Err("Class totals must be finite non-negative numbers".to_string());
        }

        if self.observability.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_date1904(self.parser.date1904)
            .with_snap_to_monday(self.parser.snap_to_monday)
    }

    pub fn score_weights(&self) -> ScoreWeights {
        ScoreWeights {
            peak: self.scoring.peak_weight,
            delta: self.scoring.delta_weight,
        }
    }

    /// Usable teacher names in configuration order
    pub fn roster(&self) -> Vec<String> {
        self.staffing.teachers.iter().map(|t| t.name.clone()).collect()
    }

    /// Capacity map of the teachers that declare a weekly ceiling
    pub fn capacity(&self) -> HashMap<String, Capacity> {
        self.staffing
            .teachers
            .iter()
            .filter_map(|t| t.weekly_slots.map(|slots| (t.name.clone(), Capacity::new(slots))))
            .collect()
    }

    /// Eligibility keyed by upper-cased course code
    pub fn eligibility(&self) -> HashMap<String, Vec<String>> {
        self.staffing
            .courses
            .iter()
            .map(|c| (c.code.trim().to_uppercase(), c.teachers.clone()))
            .collect()
    }

    pub fn class_totals(&self) -> ClassTotals {
        self.staffing
            .class_totals
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect()
    }
}
