//! Rust implementation of the lab sample batch scheduler.
//!
//! Plans when every sample passes through every workflow step, subject to
//! step dependencies, batching, staff and equipment capacity, and a business
//! calendar. Also provides resource-free critical path analysis and
//! completion metrics for staffing what-ifs.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::{NaiveDate, NaiveDateTime};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

pub mod calendar;
mod config;
pub mod critical_path;
pub mod dependency;
pub mod graph;
pub mod interner;
pub mod logging;
mod models;
pub mod report;
pub mod scenario;
pub mod scheduler;

pub use calendar::{CalendarConfig, CalendarError, LabCalendar};
pub use config::{default_role_map, BatchReadyPolicy, BatchingConfig, SchedulerConfig, DEFAULT_ROLE};
pub use critical_path::{analyze_critical_path, CriticalPathReport, StepTiming};
pub use graph::{GraphError, StepGraph};
pub use models::{EquipmentSpec, ScheduleResult, StepEvent, WorkflowStep};
pub use report::{burn_series, completion_times, summarize_completion, CompletionSummary};
pub use scenario::{run_scenarios, Scenario, ScenarioOutcome};
pub use scheduler::{BatchScheduler, EquipmentMatcher, SchedulerError, SubstringMatcher};

fn to_py_err(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn build_calendar(calendar: Option<CalendarConfig>) -> PyResult<LabCalendar> {
    LabCalendar::new(&calendar.unwrap_or_default()).map_err(to_py_err)
}

/// Schedule `sample_count` samples through `steps` starting at `start`.
///
/// # Arguments
/// * `steps` - Workflow steps, each listed after all of its dependencies
/// * `start` - Run start; snapped forward into the work window if needed
/// * `sample_count` - Number of identical samples (must be positive)
/// * `config` - Staff, equipment, batching and verbosity settings
/// * `calendar` - Workdays, holidays and daily work window
///
/// # Raises
/// * ValueError on any configuration error (unknown dependency, cycle,
///   unstaffed role, unknown policy, ...)
#[pyfunction]
#[pyo3(signature = (steps, start, sample_count, config=None, calendar=None))]
fn schedule_samples(
    steps: Vec<WorkflowStep>,
    start: NaiveDateTime,
    sample_count: usize,
    config: Option<SchedulerConfig>,
    calendar: Option<CalendarConfig>,
) -> PyResult<ScheduleResult> {
    let calendar = build_calendar(calendar)?;
    let config = config.unwrap_or_default();
    let scheduler = BatchScheduler::new(&steps, &config, calendar).map_err(to_py_err)?;
    scheduler.schedule(start, sample_count).map_err(to_py_err)
}

/// Critical path of the workflow, ignoring resources and calendar.
///
/// # Raises
/// * ValueError if the step graph is invalid or cyclic
#[pyfunction]
#[pyo3(name = "critical_path")]
fn py_critical_path(steps: Vec<WorkflowStep>) -> PyResult<CriticalPathReport> {
    analyze_critical_path(&steps).map_err(to_py_err)
}

/// Business days to 50% and 100% of samples finished.
#[pyfunction]
#[pyo3(name = "summarize_completion", signature = (result, calendar=None))]
fn py_summarize_completion(
    result: ScheduleResult,
    calendar: Option<CalendarConfig>,
) -> PyResult<CompletionSummary> {
    let calendar = build_calendar(calendar)?;
    Ok(summarize_completion(&result, &calendar))
}

/// Cumulative finished-sample counts per date, for burn-up plots.
#[pyfunction]
#[pyo3(name = "burn_series")]
fn py_burn_series(result: ScheduleResult) -> Vec<(NaiveDate, usize)> {
    burn_series(&result)
}

/// Schedule the same workload once per scenario.
///
/// # Raises
/// * ValueError if any scenario yields an invalid configuration
#[pyfunction]
#[pyo3(
    name = "run_scenarios",
    signature = (steps, scenarios, start, sample_count, config=None, calendar=None)
)]
fn py_run_scenarios(
    steps: Vec<WorkflowStep>,
    scenarios: Vec<Scenario>,
    start: NaiveDateTime,
    sample_count: usize,
    config: Option<SchedulerConfig>,
    calendar: Option<CalendarConfig>,
) -> PyResult<Vec<ScenarioOutcome>> {
    let calendar = build_calendar(calendar)?;
    let base = config.unwrap_or_default();
    run_scenarios(&steps, &base, &calendar, &scenarios, start, sample_count).map_err(to_py_err)
}

/// Python module definition.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<WorkflowStep>()?;
    m.add_class::<EquipmentSpec>()?;
    m.add_class::<StepEvent>()?;
    m.add_class::<ScheduleResult>()?;
    m.add_class::<StepTiming>()?;
    m.add_class::<CriticalPathReport>()?;
    m.add_class::<CompletionSummary>()?;
    m.add_class::<Scenario>()?;
    m.add_class::<ScenarioOutcome>()?;

    // Config types
    m.add_class::<CalendarConfig>()?;
    m.add_class::<BatchingConfig>()?;
    m.add_class::<SchedulerConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(schedule_samples, m)?)?;
    m.add_function(wrap_pyfunction!(py_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(py_summarize_completion, m)?)?;
    m.add_function(wrap_pyfunction!(py_burn_series, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_scenarios, m)?)?;

    Ok(())
}
