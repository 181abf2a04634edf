//! Step name interning.
//!
//! Workflow steps are referenced by name in the input but by dense integer
//! ids everywhere inside the scheduler and the critical path pass, so that
//! per-sample bookkeeping can be plain vectors.

use rustc_hash::FxHashMap;

/// Interned step id (position of the step in declaration order).
pub type StepId = u32;

/// Bidirectional mapping between step names and `StepId`s.
#[derive(Debug, Clone, Default)]
pub struct StepIndex {
    to_id: FxHashMap<String, StepId>,
    names: Vec<String>,
}

impl StepIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
        }
    }

    /// Register a new name. Returns `None` if the name is already present.
    pub fn insert(&mut self, name: &str) -> Option<StepId> {
        if self.to_id.contains_key(name) {
            return None;
        }
        let id = self.names.len() as StepId;
        self.names.push(name.to_string());
        self.to_id.insert(name.to_string(), id);
        Some(id)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<StepId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn name(&self, id: StepId) -> &str {
        self.names.get(id as usize).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
