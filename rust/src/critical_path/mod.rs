//! Critical path analysis of a workflow.
//!
//! Computes earliest/latest start and finish, slack and one critical path
//! for the step graph alone, as a lower bound on per-sample turnaround.

mod calculation;
mod types;

pub use calculation::analyze_critical_path;
pub use types::{CriticalPathReport, StepTiming};
