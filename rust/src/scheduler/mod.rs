//! Batch list scheduler for lab samples.
//!
//! Places every (sample, step) pair on a business calendar, batching samples
//! per step and drawing on shared staff pools and per-step equipment pools.

mod core;
mod equipment;
mod resource_pool;

pub use core::{BatchScheduler, ScheduleRun, SchedulerError};
pub use equipment::{resolve_units, EquipmentMatcher, EquipmentUnits, SubstringMatcher};
pub use resource_pool::{ResourcePool, SlotChoice};
