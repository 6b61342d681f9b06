// Course profile and class totals loading
//
// A course profile maps course codes to their configuration; the teacher
// field doubles as the course's eligibility list.

use crate::errors::ProfileError;
use crate::planner::ClassTotals;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One course of a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub name: String,
    /// Ordering index within the programme
    #[serde(default)]
    pub number: u32,
    /// One or more teacher names separated by `,`, `/` or `;`
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub weeks: u32,
}

impl Course {
    pub fn teachers(&self) -> Vec<String> {
        split_teachers(&self.teacher)
    }
}

/// Course configuration keyed by course code, e.g. `PRF`, `JS1`
pub type CourseProfile = BTreeMap<String, Course>;

pub fn split_teachers(raw: &str) -> Vec<String> {
    raw.split([',', '/', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<CourseProfile, ProfileError> {
    let path = path.as_ref();
    let profile: CourseProfile = read_json(path)?;
    info!(path = %path.display(), courses = profile.len(), "Course profile loaded");
    Ok(profile)
}

/// Load class totals from a JSON object of class id → students per week
pub fn load_class_totals<P: AsRef<Path>>(path: P) -> Result<ClassTotals, ProfileError> {
    let path = path.as_ref();
    let raw: HashMap<String, f64> = read_json(path)?;
    info!(path = %path.display(), classes = raw.len(), "Class totals loaded");
    Ok(raw.into())
}

/// Eligibility mapping derived from a profile, keyed by upper-cased course code.
///
/// Courses without any teacher are left out so they fall back to the
/// default teacher list.
pub fn eligibility_from_profile(profile: &CourseProfile) -> HashMap<String, Vec<String>> {
    profile
        .iter()
        .filter_map(|(code, course)| {
            let teachers = course.teachers();
            if teachers.is_empty() {
                debug!(course = %code, "Course has no teacher in profile");
                None
            } else {
                Some((code.trim().to_uppercase(), teachers))
            }
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProfileError> {
    let text = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ProfileError::Json {
        path: path.display().to_string(),
        source,
    })
}
