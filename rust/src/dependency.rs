//! Per-sample dependency tracking for a scheduling run.

use chrono::NaiveDateTime;

use crate::config::BatchReadyPolicy;
use crate::graph::StepGraph;
use crate::interner::StepId;

/// Which steps each step waits on, and which steps each sample has
/// already been scheduled through (with their planned end).
///
/// Owned by one run; records are append-only.
#[derive(Debug, Clone)]
pub struct DependencyIndex<'g> {
    graph: &'g StepGraph,
    /// completed[sample][step] = planned end of that sample's event.
    completed: Vec<Vec<Option<NaiveDateTime>>>,
}

impl<'g> DependencyIndex<'g> {
    pub fn new(graph: &'g StepGraph, sample_count: usize) -> Self {
        Self {
            graph,
            completed: vec![vec![None; graph.len()]; sample_count],
        }
    }

    pub fn dependencies(&self, step: StepId) -> &'g [StepId] {
        self.graph.dependencies(step)
    }

    /// Record that `sample` has an event for `step` ending at `end`.
    pub fn record(&mut self, sample: usize, step: StepId, end: NaiveDateTime) {
        if let Some(slot) = self
            .completed
            .get_mut(sample)
            .and_then(|row| row.get_mut(step as usize))
        {
            debug_assert!(slot.is_none(), "step recorded twice for one sample");
            *slot = Some(end);
        }
    }

    #[inline]
    pub fn completion(&self, sample: usize, step: StepId) -> Option<NaiveDateTime> {
        self.completed
            .get(sample)
            .and_then(|row| row.get(step as usize))
            .copied()
            .flatten()
    }

    #[inline]
    pub fn is_complete(&self, sample: usize, step: StepId) -> bool {
        self.completion(sample, step).is_some()
    }

    /// When `sample` becomes ready for `step`.
    ///
    /// Steps without dependencies are ready at `origin`. Returns `None`
    /// while any dependency is still unscheduled for this sample; otherwise
    /// the dependency end times are combined under `policy`.
    pub fn ready_time(
        &self,
        sample: usize,
        step: StepId,
        policy: BatchReadyPolicy,
        origin: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let deps = self.dependencies(step);
        if deps.is_empty() {
            return Some(origin);
        }
        let mut ends = Vec::with_capacity(deps.len());
        for &dep in deps {
            ends.push(self.completion(sample, dep)?);
        }
        policy.aggregate(ends)
    }

    /// Number of samples that have an event for `step`.
    pub fn completed_count(&self, step: StepId) -> usize {
        self.completed
            .iter()
            .filter(|row| row.get(step as usize).is_some_and(Option::is_some))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkflowStep;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn graph() -> StepGraph {
        StepGraph::new(&[
            WorkflowStep::new("Prep", 15, "sample prep", &[]),
            WorkflowStep::new("XRF", 10, "instrument", &["Prep"]),
            WorkflowStep::new("XRD", 60, "instrument", &["Prep"]),
            WorkflowStep::new("Analysis", 45, "data analysis", &["XRF", "XRD"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_step_ready_at_origin() {
        let graph = graph();
        let deps = DependencyIndex::new(&graph, 2);
        assert_eq!(
            deps.ready_time(1, 0, BatchReadyPolicy::All, ts(9, 0)),
            Some(ts(9, 0))
        );
    }

    #[test]
    fn test_not_ready_until_all_dependencies_recorded() {
        let graph = graph();
        let mut deps = DependencyIndex::new(&graph, 1);
        deps.record(0, 0, ts(9, 15));
        deps.record(0, 1, ts(9, 25));
        assert_eq!(deps.ready_time(0, 3, BatchReadyPolicy::Min, ts(9, 0)), None);

        deps.record(0, 2, ts(10, 15));
        assert_eq!(
            deps.ready_time(0, 3, BatchReadyPolicy::All, ts(9, 0)),
            Some(ts(10, 15))
        );
        assert_eq!(
            deps.ready_time(0, 3, BatchReadyPolicy::Min, ts(9, 0)),
            Some(ts(9, 25))
        );
    }

    #[test]
    fn test_completed_count() {
        let graph = graph();
        let mut deps = DependencyIndex::new(&graph, 3);
        deps.record(0, 0, ts(9, 15));
        deps.record(2, 0, ts(9, 15));
        assert_eq!(deps.completed_count(0), 2);
        assert_eq!(deps.completed_count(1), 0);
        assert!(deps.is_complete(2, 0));
        assert!(!deps.is_complete(1, 0));
    }
}
