//! Core batch scheduler implementation.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use thiserror::Error;

use crate::calendar::LabCalendar;
use crate::config::{BatchReadyPolicy, SchedulerConfig};
use crate::dependency::DependencyIndex;
use crate::graph::{GraphError, StepGraph};
use crate::interner::StepId;
use crate::models::{ScheduleResult, StepEvent, WorkflowStep};
use crate::{log_batches, log_checks, log_debug};

use super::equipment::{resolve_units, EquipmentMatcher, EquipmentUnits, SubstringMatcher};
use super::resource_pool::ResourcePool;

/// Errors that can occur while configuring or running the scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Step '{step}' is listed before its dependency '{dependency}'")]
    StepOutOfOrder { step: String, dependency: String },
    #[error("Unknown batch-ready policy: {0:?}")]
    UnknownPolicy(String),
    #[error("Step '{step}' has batch size 0")]
    ZeroBatchSize { step: String },
    #[error("Role '{role}' required by step '{step}' has no staff")]
    RoleUnstaffed { role: String, step: String },
    #[error("Equipment '{0}' has quantity 0")]
    ZeroEquipment(String),
    #[error("Sample count must be positive")]
    NoSamples,
    #[error("Deadlock at step '{step}': no sample is ready but samples {remaining:?} are unscheduled")]
    Deadlock { step: String, remaining: Vec<usize> },
}

/// Per-step settings resolved once at construction.
#[derive(Clone, Debug)]
struct StepPlan {
    id: StepId,
    role: String,
    batch_size: usize,
    equipment: EquipmentUnits,
}

/// A finished run together with the resource pools it used.
#[derive(Clone, Debug)]
pub struct ScheduleRun {
    pub result: ScheduleResult,
    /// Staff pools keyed by role.
    pub staff_pools: FxHashMap<String, ResourcePool>,
    /// Equipment pools in step order.
    pub equipment_pools: Vec<ResourcePool>,
}

/// Greedy list scheduler for batched samples under staff, equipment and
/// calendar constraints.
///
/// Steps are processed in input order; for each step the earliest-ready
/// samples are batched and given the soonest-available staff slot and
/// equipment unit. No backtracking or lookahead across steps.
///
/// Holds only immutable configuration: every `schedule` call creates its
/// own pools and dependency record, so runs never share mutable state.
pub struct BatchScheduler {
    graph: StepGraph,
    plans: Vec<StepPlan>,
    calendar: LabCalendar,
    staff: FxHashMap<String, usize>,
    policy: BatchReadyPolicy,
    verbosity: u8,
}

impl BatchScheduler {
    /// Create a scheduler using the substring equipment matcher.
    pub fn new(
        steps: &[WorkflowStep],
        config: &SchedulerConfig,
        calendar: LabCalendar,
    ) -> Result<Self, SchedulerError> {
        Self::with_matcher(steps, config, calendar, &SubstringMatcher)
    }

    /// Create a scheduler, validating the whole configuration up front.
    pub fn with_matcher(
        steps: &[WorkflowStep],
        config: &SchedulerConfig,
        calendar: LabCalendar,
        matcher: &dyn EquipmentMatcher,
    ) -> Result<Self, SchedulerError> {
        let graph = StepGraph::new(steps)?;
        graph.topological_order()?;
        if let Some((step, dep)) = graph.first_out_of_order() {
            return Err(SchedulerError::StepOutOfOrder {
                step: graph.name(step).to_string(),
                dependency: graph.name(dep).to_string(),
            });
        }

        let policy = config
            .batching
            .effective_policy()
            .map_err(SchedulerError::UnknownPolicy)?;

        if let Some(spec) = config
            .equipment
            .iter()
            .flatten()
            .find(|spec| spec.quantity == 0)
        {
            return Err(SchedulerError::ZeroEquipment(spec.name.clone()));
        }

        let mut staff: FxHashMap<String, usize> = FxHashMap::default();
        let mut plans = Vec::with_capacity(steps.len());

        for (idx, step) in steps.iter().enumerate() {
            let batch_size = config.batching.batch_size_for(step);
            if batch_size == 0 {
                return Err(SchedulerError::ZeroBatchSize {
                    step: step.name.clone(),
                });
            }

            let role = config.role_for(&step.task_type).to_string();
            let count = config.staff.get(&role).copied().unwrap_or(0);
            if count == 0 {
                return Err(SchedulerError::RoleUnstaffed {
                    role,
                    step: step.name.clone(),
                });
            }
            staff.insert(role.clone(), count);

            let equipment = resolve_units(matcher, &step.name, config.equipment.as_deref());

            log_debug!(
                config.verbosity,
                "Step {}: role={} batch_size={} equipment={:?}",
                step.name,
                role,
                batch_size,
                equipment
            );

            plans.push(StepPlan {
                id: idx as StepId,
                role,
                batch_size,
                equipment,
            });
        }

        Ok(Self {
            graph,
            plans,
            calendar,
            staff,
            policy,
            verbosity: config.verbosity,
        })
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn calendar(&self) -> &LabCalendar {
        &self.calendar
    }

    pub fn policy(&self) -> BatchReadyPolicy {
        self.policy
    }

    fn plan(&self, step: &str) -> Option<&StepPlan> {
        let id = self.graph.index().get(step)?;
        self.plans.get(id as usize)
    }

    /// Staff role assigned to `step`.
    pub fn role_of(&self, step: &str) -> Option<&str> {
        self.plan(step).map(|p| p.role.as_str())
    }

    pub fn batch_size_of(&self, step: &str) -> Option<usize> {
        self.plan(step).map(|p| p.batch_size)
    }

    pub fn equipment_units_of(&self, step: &str) -> Option<EquipmentUnits> {
        self.plan(step).map(|p| p.equipment)
    }

    /// Schedule `sample_count` samples starting at `start`.
    pub fn schedule(
        &self,
        start: NaiveDateTime,
        sample_count: usize,
    ) -> Result<ScheduleResult, SchedulerError> {
        self.schedule_detailed(start, sample_count)
            .map(|run| run.result)
    }

    /// Like `schedule`, but also returns the resource pools of the run.
    pub fn schedule_detailed(
        &self,
        start: NaiveDateTime,
        sample_count: usize,
    ) -> Result<ScheduleRun, SchedulerError> {
        if sample_count == 0 {
            return Err(SchedulerError::NoSamples);
        }

        let mut staff_pools: FxHashMap<String, ResourcePool> = self
            .staff
            .iter()
            .map(|(role, &count)| (role.clone(), ResourcePool::bounded(role.clone(), count, start)))
            .collect();
        let mut equipment_pools = Vec::with_capacity(self.plans.len());
        let mut deps = DependencyIndex::new(&self.graph, sample_count);
        let mut events: Vec<Vec<StepEvent>> = vec![Vec::new(); sample_count];

        for plan in &self.plans {
            let name = self.graph.name(plan.id);
            let mut equipment_pool = match plan.equipment {
                EquipmentUnits::Unbounded => ResourcePool::unbounded(name),
                EquipmentUnits::Units(units) => ResourcePool::bounded(name, units, start),
            };
            let staff_pool = staff_pools.get_mut(&plan.role).ok_or_else(|| {
                SchedulerError::RoleUnstaffed {
                    role: plan.role.clone(),
                    step: name.to_string(),
                }
            })?;

            self.schedule_step(
                plan,
                start,
                &mut deps,
                staff_pool,
                &mut equipment_pool,
                &mut events,
            )?;
            equipment_pools.push(equipment_pool);
        }

        let mut metadata = HashMap::new();
        metadata.insert("algorithm".to_string(), "batch_list_scheduling".to_string());
        metadata.insert("batch_policy".to_string(), self.policy.to_string());
        metadata.insert("steps".to_string(), self.plans.len().to_string());
        metadata.insert("samples".to_string(), sample_count.to_string());

        Ok(ScheduleRun {
            result: ScheduleResult {
                start,
                sample_events: events,
                algorithm_metadata: metadata,
            },
            staff_pools,
            equipment_pools,
        })
    }

    /// Give every sample an event for one step, one batch at a time.
    fn schedule_step(
        &self,
        plan: &StepPlan,
        start: NaiveDateTime,
        deps: &mut DependencyIndex<'_>,
        staff_pool: &mut ResourcePool,
        equipment_pool: &mut ResourcePool,
        events: &mut [Vec<StepEvent>],
    ) -> Result<(), SchedulerError> {
        let verbosity = self.verbosity;
        let name = self.graph.name(plan.id);
        let duration = self.graph.duration(plan.id);

        let mut pending: Vec<usize> = (0..events.len())
            .filter(|&sample| !deps.is_complete(sample, plan.id))
            .collect();
        let mut batch_no = 0;

        while !pending.is_empty() {
            let mut ready_now: Vec<(NaiveDateTime, usize)> = pending
                .iter()
                .filter_map(|&sample| {
                    deps.ready_time(sample, plan.id, self.policy, start)
                        .map(|ready| (ready, sample))
                })
                .collect();

            if ready_now.is_empty() {
                return Err(SchedulerError::Deadlock {
                    step: name.to_string(),
                    remaining: pending,
                });
            }

            log_checks!(
                verbosity,
                "  {}: {} of {} pending samples ready",
                name,
                ready_now.len(),
                pending.len()
            );

            // Stable sort: equal ready times keep sample order
            ready_now.sort_by_key(|&(ready, _)| ready);
            ready_now.truncate(plan.batch_size);

            let batch_ready = self
                .policy
                .aggregate(ready_now.iter().map(|&(ready, _)| ready))
                .unwrap_or(start);

            let staff_choice = staff_pool.soonest();
            let equipment_choice = equipment_pool.soonest();
            log_checks!(
                verbosity,
                "    batch ready {} | {} slot {:?} free {:?} | equipment slot {:?} free {:?}",
                batch_ready,
                plan.role,
                staff_choice.slot,
                staff_choice.available_at,
                equipment_choice.slot,
                equipment_choice.available_at
            );

            let earliest = [staff_choice.available_at, equipment_choice.available_at]
                .into_iter()
                .flatten()
                .fold(batch_ready, Ord::max);
            let planned_start = self.calendar.add_work_minutes(earliest, 0);
            let planned_end = self.calendar.add_work_minutes(planned_start, duration);

            let staff_slot = staff_pool.assign(planned_end).ok_or_else(|| {
                SchedulerError::RoleUnstaffed {
                    role: plan.role.clone(),
                    step: name.to_string(),
                }
            })?;
            let equipment_slot = equipment_pool.assign(planned_end);

            log_batches!(
                verbosity,
                "  Scheduled {} batch {} ({} samples) on {}#{} from {} to {}",
                name,
                batch_no,
                ready_now.len(),
                plan.role,
                staff_slot,
                planned_start,
                planned_end
            );

            for &(_, sample) in &ready_now {
                deps.record(sample, plan.id, planned_end);
                events[sample].push(StepEvent {
                    step: name.to_string(),
                    planned_start,
                    planned_end,
                    duration_minutes: duration,
                    role: plan.role.clone(),
                    batch: batch_no,
                    staff_slot,
                    equipment_slot,
                });
            }

            pending.retain(|&sample| !deps.is_complete(sample, plan.id));
            batch_no += 1;
        }

        Ok(())
    }
}
