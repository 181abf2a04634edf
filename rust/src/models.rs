//! Core data types for the lab workflow scheduler.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use std::collections::HashMap;

// Note: We use std HashMap here for PyO3 interface compatibility

/// One step of the lab workflow, shared by every sample.
#[pyclass]
#[derive(Clone, Debug)]
pub struct WorkflowStep {
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub duration_minutes: i64,
    /// Free-form task type, mapped to a staff role through the role map.
    #[pyo3(get, set)]
    pub task_type: String,
    /// Names of steps that must be complete (per sample) before this one.
    #[pyo3(get, set)]
    pub dependencies: Vec<String>,
    #[pyo3(get, set)]
    pub batch_size: Option<usize>,
}

impl WorkflowStep {
    /// Convenience constructor for Rust callers.
    pub fn new(name: &str, duration_minutes: i64, task_type: &str, dependencies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            duration_minutes,
            task_type: task_type.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

#[pymethods]
impl WorkflowStep {
    #[new]
    #[pyo3(signature = (name, duration_minutes, task_type, dependencies=None, batch_size=None))]
    fn py_new(
        name: String,
        duration_minutes: i64,
        task_type: String,
        dependencies: Option<Vec<String>>,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            name,
            duration_minutes,
            task_type,
            dependencies: dependencies.unwrap_or_default(),
            batch_size,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "WorkflowStep(name={:?}, duration_minutes={}, task_type={:?}, deps={:?})",
            self.name, self.duration_minutes, self.task_type, self.dependencies
        )
    }
}

/// A kind of lab equipment and how many interchangeable units exist.
#[pyclass]
#[derive(Clone, Debug)]
pub struct EquipmentSpec {
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub quantity: usize,
}

impl EquipmentSpec {
    pub fn new(name: &str, quantity: usize) -> Self {
        Self {
            name: name.to_string(),
            quantity,
        }
    }
}

#[pymethods]
impl EquipmentSpec {
    #[new]
    #[pyo3(signature = (name, quantity=1))]
    fn py_new(name: String, quantity: usize) -> Self {
        Self { name, quantity }
    }

    fn __repr__(&self) -> String {
        format!("EquipmentSpec(name={:?}, quantity={})", self.name, self.quantity)
    }
}

/// Planned execution of one step for one sample.
///
/// All samples of a batch receive identical copies: the batch shares one
/// start, one end and one pair of resource slots.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepEvent {
    #[pyo3(get)]
    pub step: String,
    #[pyo3(get)]
    pub planned_start: NaiveDateTime,
    #[pyo3(get)]
    pub planned_end: NaiveDateTime,
    #[pyo3(get)]
    pub duration_minutes: i64,
    /// Staff role that performed the step.
    #[pyo3(get)]
    pub role: String,
    /// Batch number within the step, counting from 0.
    #[pyo3(get)]
    pub batch: usize,
    /// Index of the staff slot within the role's pool.
    #[pyo3(get)]
    pub staff_slot: usize,
    /// Index of the equipment unit, `None` when equipment is unconstrained.
    #[pyo3(get)]
    pub equipment_slot: Option<usize>,
}

#[pymethods]
impl StepEvent {
    fn __repr__(&self) -> String {
        format!(
            "StepEvent(step={:?}, start={}, end={}, role={:?}, batch={})",
            self.step, self.planned_start, self.planned_end, self.role, self.batch
        )
    }
}

/// Result of one scheduling run, detached from the scheduler.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleResult {
    /// Run start timestamp as supplied by the caller.
    #[pyo3(get)]
    pub start: NaiveDateTime,
    /// Per-sample event history, indexed by sample number.
    #[pyo3(get)]
    pub sample_events: Vec<Vec<StepEvent>>,
    #[pyo3(get)]
    pub algorithm_metadata: HashMap<String, String>,
}

impl ScheduleResult {
    pub fn sample_count(&self) -> usize {
        self.sample_events.len()
    }

    /// The event for `step` in `sample`'s history, if scheduled.
    pub fn event(&self, sample: usize, step: &str) -> Option<&StepEvent> {
        self.sample_events
            .get(sample)?
            .iter()
            .find(|event| event.step == step)
    }

    /// Total number of events across all samples.
    pub fn total_events(&self) -> usize {
        self.sample_events.iter().map(Vec::len).sum()
    }

    /// Latest planned end over all events, or the start for an empty run.
    pub fn finish(&self) -> NaiveDateTime {
        self.sample_events
            .iter()
            .flatten()
            .map(|event| event.planned_end)
            .max()
            .unwrap_or(self.start)
    }
}

#[pymethods]
impl ScheduleResult {
    #[pyo3(name = "event")]
    fn py_event(&self, sample: usize, step: &str) -> Option<StepEvent> {
        self.event(sample, step).cloned()
    }

    #[pyo3(name = "finish")]
    fn py_finish(&self) -> NaiveDateTime {
        self.finish()
    }

    fn __len__(&self) -> usize {
        self.sample_count()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(samples={}, events={}, finish={})",
            self.sample_count(),
            self.total_events(),
            self.finish()
        )
    }
}
