// Staffing planner: run building and greedy teacher assignment

pub mod runs;
pub mod smoother;

pub use runs::{build_runs, eligible_for, ClassTotals};
pub use smoother::{greedy_smooth_assign, AssignResult, LoadTable, ScoreWeights, Smoother};
