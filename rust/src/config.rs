//! Configuration types for the batch scheduler.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{EquipmentSpec, WorkflowStep};

/// Role used for task types missing from the role map.
pub const DEFAULT_ROLE: &str = "tech";

/// Rule for combining several completion times into one readiness time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchReadyPolicy {
    /// Ready once the latest input is done.
    All,
    /// Ready once the earliest input is done.
    Min,
    /// Accepted for compatibility; aggregates exactly like `Min`.
    First,
}

impl BatchReadyPolicy {
    /// Combine completion times under this policy. `None` for no inputs.
    pub fn aggregate<I>(self, times: I) -> Option<NaiveDateTime>
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        match self {
            Self::All => times.into_iter().max(),
            Self::Min | Self::First => times.into_iter().min(),
        }
    }
}

impl FromStr for BatchReadyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "min" => Ok(Self::Min),
            "first" => Ok(Self::First),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for BatchReadyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Min => "min",
            Self::First => "first",
        };
        f.write_str(name)
    }
}

/// Batching policy for a scheduling run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct BatchingConfig {
    /// When false every step runs one sample at a time with the "all" policy.
    #[pyo3(get, set)]
    pub enabled: bool,
    /// Per-step batch sizes, keyed by step name.
    #[pyo3(get, set)]
    pub per_step: HashMap<String, usize>,
    #[pyo3(get, set)]
    pub default_batch_size: usize,
    /// Batch-ready policy: "all", "min" or "first"
    #[pyo3(get, set)]
    pub policy: String,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_step: HashMap::new(),
            default_batch_size: 1,
            policy: "all".to_string(),
        }
    }
}

impl BatchingConfig {
    /// Batch size for `step`: per-step entry, then the step's own override,
    /// then the default. Always 1 when batching is disabled.
    pub fn batch_size_for(&self, step: &WorkflowStep) -> usize {
        if !self.enabled {
            return 1;
        }
        self.per_step
            .get(&step.name)
            .copied()
            .or(step.batch_size)
            .unwrap_or(self.default_batch_size)
    }

    /// Parse the configured policy. Disabled batching always behaves as "all",
    /// but an unparseable value is still rejected.
    pub fn effective_policy(&self) -> Result<BatchReadyPolicy, String> {
        let policy = self.policy.parse::<BatchReadyPolicy>()?;
        Ok(if self.enabled {
            policy
        } else {
            BatchReadyPolicy::All
        })
    }
}

#[pymethods]
impl BatchingConfig {
    #[new]
    #[pyo3(signature = (enabled=None, per_step=None, default_batch_size=None, policy=None))]
    fn new(
        enabled: Option<bool>,
        per_step: Option<HashMap<String, usize>>,
        default_batch_size: Option<usize>,
        policy: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            enabled: enabled.unwrap_or(defaults.enabled),
            per_step: per_step.unwrap_or(defaults.per_step),
            default_batch_size: default_batch_size.unwrap_or(defaults.default_batch_size),
            policy: policy.unwrap_or(defaults.policy),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "BatchingConfig(enabled={}, per_step={}, default_batch_size={}, policy={:?})",
            self.enabled,
            self.per_step.len(),
            self.default_batch_size,
            self.policy
        )
    }
}

/// Task type to staff role table used by the original lab workflows.
pub fn default_role_map() -> HashMap<String, String> {
    [
        ("sample prep", "tech"),
        ("instrument", "tech"),
        ("sample entry", "tech"),
        ("data analysis", "sci"),
        ("data review", "sci"),
        ("reporting", "sci"),
    ]
    .into_iter()
    .map(|(task_type, role)| (task_type.to_string(), role.to_string()))
    .collect()
}

/// Everything a scheduling run needs besides steps and calendar.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Staff slots per role, e.g. {"tech": 2, "sci": 2}.
    #[pyo3(get, set)]
    pub staff: HashMap<String, usize>,
    /// Lower-case task type -> role.
    #[pyo3(get, set)]
    pub role_map: HashMap<String, String>,
    /// Role for task types missing from `role_map`.
    #[pyo3(get, set)]
    pub default_role: String,
    /// Equipment inventory. `None` leaves equipment unconstrained.
    #[pyo3(get, set)]
    pub equipment: Option<Vec<EquipmentSpec>>,
    #[pyo3(get, set)]
    pub batching: BatchingConfig,
    /// Verbosity level: 0=silent, 1=batches, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            staff: [("tech".to_string(), 2), ("sci".to_string(), 2)]
                .into_iter()
                .collect(),
            role_map: default_role_map(),
            default_role: DEFAULT_ROLE.to_string(),
            equipment: None,
            batching: BatchingConfig::default(),
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Default config with `tech` and `sci` staff counts.
    pub fn with_staff(tech: usize, sci: usize) -> Self {
        Self {
            staff: [("tech".to_string(), tech), ("sci".to_string(), sci)]
                .into_iter()
                .collect(),
            ..Self::default()
        }
    }

    /// Role responsible for a task type (case-insensitive lookup).
    pub fn role_for(&self, task_type: &str) -> &str {
        let key = task_type.trim().to_lowercase();
        self.role_map
            .get(&key)
            .map(String::as_str)
            .unwrap_or(self.default_role.as_str())
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (
        staff=None,
        role_map=None,
        default_role=None,
        equipment=None,
        batching=None,
        verbosity=None
    ))]
    fn new(
        staff: Option<HashMap<String, usize>>,
        role_map: Option<HashMap<String, String>>,
        default_role: Option<String>,
        equipment: Option<Vec<EquipmentSpec>>,
        batching: Option<BatchingConfig>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            staff: staff.unwrap_or(defaults.staff),
            role_map: role_map
                .map(|m| m.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect())
                .unwrap_or(defaults.role_map),
            default_role: default_role.unwrap_or(defaults.default_role),
            equipment,
            batching: batching.unwrap_or(defaults.batching),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        let mut staff: Vec<_> = self.staff.iter().collect();
        staff.sort();
        format!(
            "SchedulerConfig(staff={:?}, equipment={}, batching={})",
            staff,
            self.equipment.as_ref().map_or(0, Vec::len),
            self.batching.enabled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("all".parse::<BatchReadyPolicy>(), Ok(BatchReadyPolicy::All));
        assert_eq!(" MIN ".parse::<BatchReadyPolicy>(), Ok(BatchReadyPolicy::Min));
        assert_eq!("first".parse::<BatchReadyPolicy>(), Ok(BatchReadyPolicy::First));
        assert_eq!(
            "latest".parse::<BatchReadyPolicy>(),
            Err("latest".to_string())
        );
    }

    #[test]
    fn test_policy_aggregate() {
        let times = [ts(11), ts(9), ts(10)];
        assert_eq!(BatchReadyPolicy::All.aggregate(times), Some(ts(11)));
        assert_eq!(BatchReadyPolicy::Min.aggregate(times), Some(ts(9)));
        assert_eq!(BatchReadyPolicy::First.aggregate(times), Some(ts(9)));
        assert_eq!(BatchReadyPolicy::All.aggregate(Vec::new()), None);
    }

    #[test]
    fn test_batch_size_resolution() {
        let step = WorkflowStep::new("XRF Scan", 10, "instrument", &[]).with_batch_size(20);
        let other = WorkflowStep::new("Prep", 15, "sample prep", &[]);

        let mut batching = BatchingConfig::default();
        assert_eq!(batching.batch_size_for(&step), 1);

        batching.enabled = true;
        batching.default_batch_size = 4;
        assert_eq!(batching.batch_size_for(&step), 20);
        assert_eq!(batching.batch_size_for(&other), 4);

        batching.per_step.insert("XRF Scan".to_string(), 40);
        assert_eq!(batching.batch_size_for(&step), 40);
    }

    #[test]
    fn test_disabled_batching_forces_all_policy() {
        let batching = BatchingConfig {
            policy: "min".to_string(),
            ..BatchingConfig::default()
        };
        assert_eq!(batching.effective_policy(), Ok(BatchReadyPolicy::All));

        let bogus = BatchingConfig {
            policy: "sometimes".to_string(),
            ..BatchingConfig::default()
        };
        assert!(bogus.effective_policy().is_err());
    }

    #[test]
    fn test_role_lookup() {
        let config = SchedulerConfig::default();
        assert_eq!(config.role_for("Data Analysis"), "sci");
        assert_eq!(config.role_for("sample prep"), "tech");
        assert_eq!(config.role_for("instrument analysis"), "tech");
        assert_eq!(config.role_for("something else"), DEFAULT_ROLE);
    }
}
