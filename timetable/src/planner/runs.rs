// Run builder: groups entries into per-class-per-course teaching runs

use crate::models::{Entry, Run, RunKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Class totals keyed case-insensitively by class id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, f64>", into = "HashMap<String, f64>")]
pub struct ClassTotals {
    totals: HashMap<String, f64>,
}

impl ClassTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_id: &str, total: f64) {
        self.totals.insert(class_id.to_uppercase(), total);
    }

    pub fn get(&self, class_id: &str) -> Option<f64> {
        self.totals.get(&class_id.to_uppercase()).copied()
    }

    /// Weight of a class: its total, or 0 when unknown
    pub fn weight_of(&self, class_id: &str) -> f64 {
        self.get(class_id).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Merge another set of totals over this one
    pub fn extend(&mut self, other: &ClassTotals) {
        for (k, v) in &other.totals {
            self.totals.insert(k.clone(), *v);
        }
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for ClassTotals {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut totals = ClassTotals::new();
        for (k, v) in iter {
            totals.insert(k.as_ref(), v);
        }
        totals
    }
}

impl From<HashMap<String, f64>> for ClassTotals {
    fn from(map: HashMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ClassTotals> for HashMap<String, f64> {
    fn from(totals: ClassTotals) -> Self {
        totals.totals
    }
}

/// Resolve the eligible teachers of a course, falling back to the default list
pub fn eligible_for(
    course_code: &str,
    eligibility: &HashMap<String, Vec<String>>,
    fallback: &[String],
) -> Vec<String> {
    match eligibility.get(course_code) {
        Some(list) if !list.is_empty() => list.clone(),
        _ => fallback.to_vec(),
    }
}

/// Build one run per (class, course) pair, in first-seen order
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn build_runs(
    entries: &[Entry],
    class_totals: &ClassTotals,
    eligibility: &HashMap<String, Vec<String>>,
    fallback: &[String],
) -> Vec<Run> {
    let mut index: HashMap<RunKey, usize> = HashMap::new();
    let mut groups: Vec<(RunKey, BTreeSet<NaiveDate>)> = Vec::new();

    for entry in entries {
        let key = entry.run_key();
        match index.get(&key) {
            Some(&i) => {
                groups[i].1.insert(entry.date);
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, BTreeSet::from([entry.date])));
            }
        }
    }

    let mut fell_back = 0usize;
    let mut weightless = 0usize;

    let runs: Vec<Run> = groups
        .into_iter()
        .map(|(key, weeks)| {
            let weight = class_totals.weight_of(&key.class_id);
            let has_list = eligibility
                .get(&key.course_code)
                .is_some_and(|list| !list.is_empty());
            if !has_list {
                fell_back += 1;
            }
            if weight == 0.0 {
                weightless += 1;
            }

            let eligible = eligible_for(&key.course_code, eligibility, fallback);
            debug!(
                run = %key,
                weeks = weeks.len(),
                weight = weight,
                eligible = eligible.len(),
                "Run built"
            );

            Run {
                class_id: key.class_id.clone(),
                course_code: key.course_code.clone(),
                id: key,
                weeks: weeks.into_iter().collect(),
                weight,
                eligible,
            }
        })
        .collect();

    info!(
        runs = runs.len(),
        fallback_eligibility = fell_back,
        zero_weight = weightless,
        "Runs built"
    );

    runs
}
