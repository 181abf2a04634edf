//! Critical path calculation using forward and backward passes.

use crate::graph::{GraphError, StepGraph};
use crate::interner::StepId;
use crate::models::WorkflowStep;

use super::types::{CriticalPathReport, StepTiming};

/// Analyze `steps` as an activity-on-node network.
///
/// Durations are the step durations in minutes; resources and the
/// calendar are ignored. Fails on the same configuration errors as the
/// scheduler, including cycles.
pub fn analyze_critical_path(steps: &[WorkflowStep]) -> Result<CriticalPathReport, GraphError> {
    let graph = StepGraph::new(steps)?;
    let order = graph.topological_order()?;
    Ok(analyze_graph(&graph, &order))
}

/// Forward and backward pass over a graph already in topological `order`.
fn analyze_graph(graph: &StepGraph, order: &[StepId]) -> CriticalPathReport {
    let n = graph.len();
    let mut timings = vec![StepTiming::default(); n];

    // Forward pass
    for &id in order {
        let idx = id as usize;
        let earliest_start = graph
            .dependencies(id)
            .iter()
            .map(|&dep| timings[dep as usize].earliest_finish)
            .max()
            .unwrap_or(0);
        timings[idx].earliest_start = earliest_start;
        timings[idx].earliest_finish = earliest_start + graph.duration(id);
    }

    let horizon = timings.iter().map(|t| t.earliest_finish).max().unwrap_or(0);

    // Backward pass
    for &id in order.iter().rev() {
        let idx = id as usize;
        let latest_finish = graph
            .dependents(id)
            .iter()
            .map(|&dependent| timings[dependent as usize].latest_start)
            .min()
            .unwrap_or(horizon);
        let timing = &mut timings[idx];
        timing.latest_finish = latest_finish;
        timing.latest_start = latest_finish - graph.duration(id);
        timing.slack = timing.latest_start - timing.earliest_start;
    }

    let critical_path = trace_critical_path(graph, &timings)
        .into_iter()
        .map(|id| graph.name(id).to_string())
        .collect();

    CriticalPathReport {
        timings: (0..n as StepId)
            .map(|id| (graph.name(id).to_string(), timings[id as usize]))
            .collect(),
        critical_path,
        horizon,
    }
}

/// Walk back from the latest-finishing sink through predecessors whose
/// finish equals the current start. Ties go to the smallest name.
fn trace_critical_path(graph: &StepGraph, timings: &[StepTiming]) -> Vec<StepId> {
    let sink = (0..graph.len() as StepId)
        .filter(|&id| graph.dependents(id).is_empty())
        .max_by(|&a, &b| {
            timings[a as usize]
                .earliest_finish
                .cmp(&timings[b as usize].earliest_finish)
                .then_with(|| graph.name(b).cmp(graph.name(a)))
        });

    let mut path = Vec::new();
    let mut current = sink;
    while let Some(id) = current {
        path.push(id);
        let start = timings[id as usize].earliest_start;
        current = graph
            .dependencies(id)
            .iter()
            .copied()
            .filter(|&dep| timings[dep as usize].earliest_finish == start)
            .min_by(|&a, &b| graph.name(a).cmp(graph.name(b)));
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, duration: i64, deps: &[&str]) -> WorkflowStep {
        WorkflowStep::new(name, duration, "sample prep", deps)
    }

    fn linear_with_join() -> Vec<WorkflowStep> {
        vec![
            step("Entry", 5, &[]),
            step("Prep", 15, &["Entry"]),
            step("XRF", 10, &["Prep"]),
            step("XRD", 60, &["Prep"]),
            step("Analysis", 45, &["XRF", "XRD"]),
            step("Review", 20, &["Analysis"]),
            step("Report", 90, &["Review"]),
        ]
    }

    #[test]
    fn test_linear_with_join() {
        let report = analyze_critical_path(&linear_with_join()).unwrap();
        assert_eq!(
            report.critical_path,
            vec!["Entry", "Prep", "XRD", "Analysis", "Review", "Report"]
        );
        assert_eq!(report.horizon, 235);
        assert_eq!(report.slack("XRF"), Some(50));
        assert!(!report.is_critical("XRF"));

        let xrf = report.timings["XRF"];
        assert_eq!(xrf.earliest_start, 20);
        assert_eq!(xrf.earliest_finish, 30);
        assert_eq!(xrf.latest_start, 70);
        assert_eq!(xrf.latest_finish, 80);
    }

    #[test]
    fn test_critical_path_has_zero_slack_and_spans_horizon() {
        let steps = linear_with_join();
        let report = analyze_critical_path(&steps).unwrap();
        assert!(report.critical_path.iter().all(|s| report.is_critical(s)));

        let total: i64 = report
            .critical_path
            .iter()
            .map(|name| steps.iter().find(|s| &s.name == name).unwrap().duration_minutes)
            .sum();
        assert_eq!(total, report.horizon);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = analyze_critical_path(&[step("A", 5, &["B"]), step("B", 5, &["A"])]).unwrap_err();
        assert!(matches!(err, GraphError::CircularDependency(_)));
    }

    #[test]
    fn test_equal_paths_break_ties_by_name() {
        let steps = vec![
            step("Start", 5, &[]),
            step("Zeta", 10, &["Start"]),
            step("Alpha", 10, &["Start"]),
            step("End", 5, &["Zeta", "Alpha"]),
        ];
        let report = analyze_critical_path(&steps).unwrap();
        assert_eq!(report.critical_path, vec!["Start", "Alpha", "End"]);
        // Both branches are critical even though only one is reported
        assert!(report.is_critical("Zeta"));

        let again = analyze_critical_path(&steps).unwrap();
        assert_eq!(report, again);
    }

    #[test]
    fn test_disconnected_sinks() {
        let steps = vec![step("Short", 10, &[]), step("Long", 30, &[])];
        let report = analyze_critical_path(&steps).unwrap();
        assert_eq!(report.critical_path, vec!["Long"]);
        assert_eq!(report.horizon, 30);
        assert_eq!(report.slack("Short"), Some(20));
    }

    #[test]
    fn test_empty_workflow() {
        let report = analyze_critical_path(&[]).unwrap();
        assert_eq!(report.horizon, 0);
        assert!(report.critical_path.is_empty());
        assert!(report.timings.is_empty());
        assert_eq!(report.slack("anything"), None);
    }
}
