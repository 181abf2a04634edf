//! Types for critical path analysis.

use pyo3::prelude::*;
use std::collections::HashMap;

/// Per-step PERT timing, in minutes from the workflow start.
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepTiming {
    /// Earliest possible start time (from forward pass).
    #[pyo3(get)]
    pub earliest_start: i64,
    /// Earliest possible finish time (from forward pass).
    #[pyo3(get)]
    pub earliest_finish: i64,
    /// Latest allowable start time (from backward pass).
    #[pyo3(get)]
    pub latest_start: i64,
    /// Latest allowable finish time (from backward pass).
    #[pyo3(get)]
    pub latest_finish: i64,
    /// Slack = latest_start - earliest_start.
    #[pyo3(get)]
    pub slack: i64,
}

#[pymethods]
impl StepTiming {
    pub fn is_critical(&self) -> bool {
        self.slack == 0
    }

    fn __repr__(&self) -> String {
        format!(
            "StepTiming(es={}, ef={}, ls={}, lf={}, slack={})",
            self.earliest_start,
            self.earliest_finish,
            self.latest_start,
            self.latest_finish,
            self.slack
        )
    }
}

/// Critical path analysis of a workflow, ignoring resources and calendar.
///
/// Note: We use std HashMap here for PyO3 interface compatibility
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CriticalPathReport {
    #[pyo3(get)]
    pub timings: HashMap<String, StepTiming>,
    /// Zero-slack chain from a source to the latest-finishing sink.
    #[pyo3(get)]
    pub critical_path: Vec<String>,
    /// Length of the longest dependency chain in minutes.
    #[pyo3(get)]
    pub horizon: i64,
}

#[pymethods]
impl CriticalPathReport {
    pub fn slack(&self, step: &str) -> Option<i64> {
        self.timings.get(step).map(|t| t.slack)
    }

    /// True if `step` has zero slack. Unknown steps are not critical.
    pub fn is_critical(&self, step: &str) -> bool {
        self.timings.get(step).is_some_and(StepTiming::is_critical)
    }

    fn __repr__(&self) -> String {
        format!(
            "CriticalPathReport(horizon={}, critical_path={:?})",
            self.horizon, self.critical_path
        )
    }
}
