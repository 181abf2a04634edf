//! Step-level dependency graph.
//!
//! Validates workflow step definitions and provides the deterministic
//! topological ordering used by the scheduler's order check and by the
//! critical path pass.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;

use crate::interner::{StepId, StepIndex};
use crate::models::WorkflowStep;

/// Configuration errors in the step graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate step name: {0}")]
    DuplicateStep(String),
    #[error("Step '{step}' depends on undeclared step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },
    #[error("Step '{step}' has negative duration {duration}")]
    NegativeDuration { step: String, duration: i64 },
    #[error("Circular dependency among steps: {}", .0.join(", "))]
    CircularDependency(Vec<String>),
}

/// Validated DAG over workflow steps (nodes carry durations in minutes).
#[derive(Debug, Clone)]
pub struct StepGraph {
    index: StepIndex,
    durations: Vec<i64>,
    deps: Vec<Vec<StepId>>,
    dependents: Vec<Vec<StepId>>,
}

impl StepGraph {
    /// Build the graph. Rejects duplicate names, unknown dependencies and
    /// negative durations; cycles are reported by `topological_order`.
    pub fn new(steps: &[WorkflowStep]) -> Result<Self, GraphError> {
        let mut index = StepIndex::with_capacity(steps.len());
        for step in steps {
            if step.duration_minutes < 0 {
                return Err(GraphError::NegativeDuration {
                    step: step.name.clone(),
                    duration: step.duration_minutes,
                });
            }
            if index.insert(&step.name).is_none() {
                return Err(GraphError::DuplicateStep(step.name.clone()));
            }
        }

        let n = steps.len();
        let mut deps: Vec<Vec<StepId>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<StepId>> = vec![Vec::new(); n];

        for (idx, step) in steps.iter().enumerate() {
            for dep_name in &step.dependencies {
                let dep_id = index
                    .get(dep_name)
                    .ok_or_else(|| GraphError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dep_name.clone(),
                    })?;
                // Dependencies are a set: repeated names collapse to one edge.
                if !deps[idx].contains(&dep_id) {
                    deps[idx].push(dep_id);
                    dependents[dep_id as usize].push(idx as StepId);
                }
            }
        }

        Ok(Self {
            index,
            durations: steps.iter().map(|s| s.duration_minutes).collect(),
            deps,
            dependents,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &StepIndex {
        &self.index
    }

    #[inline]
    pub fn name(&self, id: StepId) -> &str {
        self.index.name(id)
    }

    #[inline]
    pub fn duration(&self, id: StepId) -> i64 {
        self.durations[id as usize]
    }

    /// Steps `id` depends on, in declaration order.
    #[inline]
    pub fn dependencies(&self, id: StepId) -> &[StepId] {
        &self.deps[id as usize]
    }

    /// Steps that depend on `id`.
    #[inline]
    pub fn dependents(&self, id: StepId) -> &[StepId] {
        &self.dependents[id as usize]
    }

    /// Topological order via Kahn's algorithm.
    ///
    /// Among simultaneously ready steps the lexicographically smallest name
    /// goes first, so the order depends only on the graph, not on hashing.
    pub fn topological_order(&self) -> Result<Vec<StepId>, GraphError> {
        let n = self.len();
        let mut in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();

        let mut ready: BinaryHeap<Reverse<(&str, StepId)>> = (0..n as StepId)
            .filter(|&id| in_degree[id as usize] == 0)
            .map(|id| Reverse((self.name(id), id)))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse((_, id))) = ready.pop() {
            order.push(id);
            for &dependent in self.dependents(id) {
                let degree = &mut in_degree[dependent as usize];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((self.name(dependent), dependent)));
                }
            }
        }

        if order.len() != n {
            let mut stuck: Vec<String> = (0..n)
                .filter(|&idx| in_degree[idx] > 0)
                .map(|idx| self.name(idx as StepId).to_string())
                .collect();
            stuck.sort();
            return Err(GraphError::CircularDependency(stuck));
        }

        Ok(order)
    }

    /// First (step, dependency) pair where the dependency is not declared
    /// strictly before the step, i.e. where the input order is not a
    /// topological order.
    pub fn first_out_of_order(&self) -> Option<(StepId, StepId)> {
        (0..self.len() as StepId).find_map(|id| {
            self.dependencies(id)
                .iter()
                .find(|&&dep| dep >= id)
                .map(|&dep| (id, dep))
        })
    }
}
