// Greedy smoother: assigns each run to one teacher while flattening weekly load

use crate::models::{Assignment, AssignmentRow, Capacity, Run, RunKey};
use crate::telemetry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Weights of the candidate score `peak × postPeak + delta × deltaSum`.
///
/// The defaults (2 and 0.1) are heuristic and may be tuned per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub peak: f64,
    pub delta: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            peak: 2.0,
            delta: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn score(&self, post_peak: f64, delta_sum: f64) -> f64 {
        self.peak * post_peak + self.delta * delta_sum
    }
}

/// Accumulated load per teacher per week, owned by one smoothing pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadTable {
    load: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl LoadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load of `teacher` in `week`, 0 when nothing was placed there
    pub fn get(&self, teacher: &str, week: NaiveDate) -> f64 {
        self.load
            .get(teacher)
            .and_then(|weeks| weeks.get(&week))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn add(&mut self, teacher: &str, week: NaiveDate, value: f64) {
        *self
            .load
            .entry(teacher.to_string())
            .or_default()
            .entry(week)
            .or_insert(0.0) += value;
    }

    /// Highest weekly load of `teacher`, 0 for a teacher with no load
    pub fn peak(&self, teacher: &str) -> f64 {
        self.load
            .get(teacher)
            .map(|weeks| weeks.values().fold(0.0, |acc: f64, v| acc.max(*v)))
            .unwrap_or(0.0)
    }

    /// Teachers carrying any load, ascending
    pub fn teachers(&self) -> impl Iterator<Item = &str> {
        self.load.keys().map(String::as_str)
    }

    /// Union of all loaded weeks, ascending
    pub fn weeks(&self) -> Vec<NaiveDate> {
        let weeks: BTreeSet<NaiveDate> = self
            .load
            .values()
            .flat_map(|weeks| weeks.keys().copied())
            .collect();
        weeks.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.load.is_empty()
    }
}

/// Outcome of one smoothing pass
#[derive(Debug, Clone, Serialize)]
pub struct AssignResult {
    pub assign: HashMap<RunKey, Assignment>,
    pub load: LoadTable,
    /// Runs in the order they were processed
    pub runs: Vec<Run>,
}

impl AssignResult {
    pub fn teacher_for(&self, key: &RunKey) -> Option<&Assignment> {
        self.assign.get(key)
    }

    /// Flat display table, one row per run in processing order
    pub fn assignment_table(&self) -> Vec<AssignmentRow> {
        self.runs
            .iter()
            .map(|run| AssignmentRow {
                class_id: run.class_id.clone(),
                course_code: run.course_code.clone(),
                teacher: self
                    .assign
                    .get(&run.id)
                    .cloned()
                    .unwrap_or(Assignment::Unassigned),
                weeks: run.weeks.len(),
                students_per_week: run.weight,
            })
            .collect()
    }

    /// Runs no feasible teacher could take
    pub fn unassigned(&self) -> Vec<&Run> {
        self.runs
            .iter()
            .filter(|run| {
                self.assign
                    .get(&run.id)
                    .map_or(true, Assignment::is_unassigned)
            })
            .collect()
    }

    pub fn peak_load(&self, teacher: &str) -> f64 {
        self.load.peak(teacher)
    }
}

/// Greedy load-balancing assigner
#[derive(Debug, Clone, Default)]
pub struct Smoother {
    weights: ScoreWeights,
}

impl Smoother {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Assign every run, hardest first.
    ///
    /// Runs are processed in descending `weight × weekCount`; equal impact
    /// keeps input order. Each run goes to the eligible roster teacher with
    /// the strictly lowest score among those whose weekly capacity still
    /// holds on every week of the run. Ties keep the earlier candidate.
    #[instrument(skip_all, fields(runs = runs.len(), roster = roster.len()))]
    pub fn assign(
        &self,
        runs: Vec<Run>,
        roster: &[String],
        capacity: &HashMap<String, Capacity>,
    ) -> AssignResult {
        let mut runs = runs;
        // sort_by is stable
        runs.sort_by(|a, b| b.impact().total_cmp(&a.impact()));

        let usable: HashSet<&str> = roster.iter().map(String::as_str).collect();
        let mut load = LoadTable::new();
        let mut assign = HashMap::with_capacity(runs.len());
        let mut assigned = 0u64;
        let mut unassigned = 0u64;

        for run in &runs {
            match self.best_candidate(run, &usable, capacity, &load) {
                Some((teacher, score)) => {
                    for week in &run.weeks {
                        load.add(teacher, *week, run.weight);
                    }
                    debug!(run = %run.id, teacher = teacher, score = score, "Run assigned");
                    assign.insert(run.id.clone(), Assignment::Teacher(teacher.to_string()));
                    assigned += 1;
                }
                None => {
                    warn!(
                        run = %run.id,
                        eligible = run.eligible.len(),
                        "No feasible teacher for run"
                    );
                    assign.insert(run.id.clone(), Assignment::Unassigned);
                    unassigned += 1;
                }
            }
        }

        telemetry::record_assignments(assigned, unassigned);
        info!(
            assigned = assigned,
            unassigned = unassigned,
            teachers = load.teachers().count(),
            "Smoothing complete"
        );

        AssignResult { assign, load, runs }
    }

    fn best_candidate<'r>(
        &self,
        run: &'r Run,
        usable: &HashSet<&str>,
        capacity: &HashMap<String, Capacity>,
        load: &LoadTable,
    ) -> Option<(&'r str, f64)> {
        let mut best: Option<(&str, f64)> = None;

        for teacher in &run.eligible {
            if !usable.contains(teacher.as_str()) {
                continue;
            }

            let limit = capacity
                .get(teacher)
                .map_or(f64::INFINITY, |c| c.weekly_slots);
            let fits = run
                .weeks
                .iter()
                .all(|week| load.get(teacher, *week) + run.weight <= limit);
            if !fits {
                continue;
            }

            let mut post_peak = load.peak(teacher);
            let mut delta_sum = 0.0;
            for week in &run.weeks {
                let before = load.get(teacher, *week);
                let after = before + run.weight;
                post_peak = post_peak.max(after);
                delta_sum += (after - before).abs();
            }

            let score = self.weights.score(post_peak, delta_sum);
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((teacher.as_str(), score));
            }
        }

        best
    }
}

/// Smooth with the default score weights
pub fn greedy_smooth_assign(
    runs: Vec<Run>,
    roster: &[String],
    capacity: &HashMap<String, Capacity>,
) -> AssignResult {
    Smoother::default().assign(runs, roster, capacity)
}
