//! Staffing and equipment what-if sweeps.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::calendar::LabCalendar;
use crate::config::SchedulerConfig;
use crate::log_batches;
use crate::models::{EquipmentSpec, WorkflowStep};
use crate::report::{summarize_completion, CompletionSummary};
use crate::scheduler::{BatchScheduler, SchedulerError};

/// Resource variation applied on top of a base configuration.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    #[pyo3(get, set)]
    pub name: String,
    /// Staff counts overriding the base config, role by role.
    #[pyo3(get, set)]
    pub staff: HashMap<String, usize>,
    /// Replacement equipment inventory; `None` keeps the base inventory.
    #[pyo3(get, set)]
    pub equipment: Option<Vec<EquipmentSpec>>,
}

impl Scenario {
    pub fn new(name: &str, staff: &[(&str, usize)]) -> Self {
        Self {
            name: name.to_string(),
            staff: staff.iter().map(|&(role, n)| (role.to_string(), n)).collect(),
            equipment: None,
        }
    }

    /// `base` with this scenario's overrides applied.
    pub fn apply(&self, base: &SchedulerConfig) -> SchedulerConfig {
        let mut config = base.clone();
        config
            .staff
            .extend(self.staff.iter().map(|(role, &n)| (role.clone(), n)));
        if let Some(equipment) = &self.equipment {
            config.equipment = Some(equipment.clone());
        }
        config
    }
}

#[pymethods]
impl Scenario {
    #[new]
    #[pyo3(signature = (name, staff=None, equipment=None))]
    fn py_new(
        name: String,
        staff: Option<HashMap<String, usize>>,
        equipment: Option<Vec<EquipmentSpec>>,
    ) -> Self {
        Self {
            name,
            staff: staff.unwrap_or_default(),
            equipment,
        }
    }

    fn __repr__(&self) -> String {
        let mut staff: Vec<_> = self.staff.iter().collect();
        staff.sort();
        format!("Scenario(name={:?}, staff={:?})", self.name, staff)
    }
}

/// Result of scheduling one scenario.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioOutcome {
    #[pyo3(get)]
    pub name: String,
    /// Effective staff counts used for the run.
    #[pyo3(get)]
    pub staff: HashMap<String, usize>,
    #[pyo3(get)]
    pub summary: CompletionSummary,
    /// Latest planned end over all samples.
    #[pyo3(get)]
    pub finish: NaiveDateTime,
}

#[pymethods]
impl ScenarioOutcome {
    fn __repr__(&self) -> String {
        format!(
            "ScenarioOutcome(name={:?}, days_to_full={:?}, finish={})",
            self.name, self.summary.business_days_to_full, self.finish
        )
    }
}

/// Schedule the same workload once per scenario.
///
/// Each scenario gets its own scheduler, so outcomes are independent of
/// the order scenarios are listed in. The first invalid scenario aborts
/// the sweep.
pub fn run_scenarios(
    steps: &[WorkflowStep],
    base: &SchedulerConfig,
    calendar: &LabCalendar,
    scenarios: &[Scenario],
    start: NaiveDateTime,
    sample_count: usize,
) -> Result<Vec<ScenarioOutcome>, SchedulerError> {
    scenarios
        .iter()
        .map(|scenario| -> Result<ScenarioOutcome, SchedulerError> {
            let config = scenario.apply(base);
            let scheduler = BatchScheduler::new(steps, &config, calendar.clone())?;
            let result = scheduler.schedule(start, sample_count)?;
            let summary = summarize_completion(&result, calendar);

            log_batches!(
                config.verbosity,
                "Scenario {}: {:?} business days to full completion",
                scenario.name,
                summary.business_days_to_full
            );

            Ok(ScenarioOutcome {
                name: scenario.name.clone(),
                staff: config.staff,
                summary,
                finish: result.finish(),
            })
        })
        .collect()
}
