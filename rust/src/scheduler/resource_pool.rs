//! Resource pools tracked by next-available timestamp.

use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The slot a pool would hand out next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotChoice {
    /// Slot index, `None` for an unbounded pool.
    pub slot: Option<usize>,
    /// When that slot frees up, `None` if it never constrains the start.
    pub available_at: Option<NaiveDateTime>,
}

/// A named set of interchangeable slots (staff of one role, or the units
/// of one piece of equipment).
///
/// Slots are kept in a min-heap keyed by `(available_at, slot_index)`, so
/// the soonest-available slot is chosen and ties go to the lowest index.
/// Slots are only ever released forward in time; `is_monotonic` checks it.
#[derive(Clone, Debug)]
pub struct ResourcePool {
    /// Pool name (for logging and errors)
    pub name: String,
    queue: BinaryHeap<Reverse<(NaiveDateTime, usize)>>,
    /// Every availability value each slot has held, starting with `origin`.
    history: Vec<Vec<NaiveDateTime>>,
    unbounded: bool,
}

impl ResourcePool {
    /// Pool of `slots` units, all available at `origin`.
    pub fn bounded(name: impl Into<String>, slots: usize, origin: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            queue: (0..slots).map(|idx| Reverse((origin, idx))).collect(),
            history: vec![vec![origin]; slots],
            unbounded: false,
        }
    }

    /// Pool with effectively infinite capacity: it never delays a start.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: BinaryHeap::new(),
            history: Vec::new(),
            unbounded: true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    /// Number of slots, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        (!self.unbounded).then_some(self.history.len())
    }

    /// Soonest-available slot, lowest index on ties.
    pub fn soonest(&self) -> SlotChoice {
        match self.queue.peek() {
            Some(Reverse((available_at, slot))) => SlotChoice {
                slot: Some(*slot),
                available_at: Some(*available_at),
            },
            None => SlotChoice {
                slot: None,
                available_at: None,
            },
        }
    }

    /// Occupy the soonest-available slot until `until`. Returns its index.
    ///
    /// `until` is recorded as given. Callers must not release a slot before
    /// its current availability; `is_monotonic` reports any that did.
    pub fn assign(&mut self, until: NaiveDateTime) -> Option<usize> {
        let mut top = self.queue.peek_mut()?;
        let Reverse((_, slot)) = *top;
        *top = Reverse((until, slot));
        drop(top);
        self.history[slot].push(until);
        Some(slot)
    }

    /// Current availability of `slot`.
    pub fn availability(&self, slot: usize) -> Option<NaiveDateTime> {
        self.history.get(slot).and_then(|h| h.last()).copied()
    }

    /// Sequence of availability values `slot` has held.
    pub fn history(&self, slot: usize) -> &[NaiveDateTime] {
        self.history.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if no slot's availability ever moved backwards.
    pub fn is_monotonic(&self) -> bool {
        self.history
            .iter()
            .all(|h| h.windows(2).all(|w| w[0] <= w[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let mut pool = ResourcePool::bounded("tech", 3, ts(9, 0));
        assert_eq!(
            pool.soonest(),
            SlotChoice {
                slot: Some(0),
                available_at: Some(ts(9, 0))
            }
        );
        assert_eq!(pool.assign(ts(10, 0)), Some(0));
        assert_eq!(pool.soonest().slot, Some(1));
        assert_eq!(pool.assign(ts(10, 0)), Some(1));
        assert_eq!(pool.assign(ts(9, 30)), Some(2));
        // Slot 2 frees first now
        assert_eq!(pool.soonest().slot, Some(2));
        assert_eq!(pool.soonest().available_at, Some(ts(9, 30)));
    }

    #[test]
    fn test_single_slot_serializes() {
        let mut pool = ResourcePool::bounded("sci", 1, ts(9, 0));
        pool.assign(ts(9, 45));
        assert_eq!(pool.soonest().available_at, Some(ts(9, 45)));
        pool.assign(ts(11, 0));
        assert_eq!(pool.availability(0), Some(ts(11, 0)));
        assert_eq!(pool.history(0), &[ts(9, 0), ts(9, 45), ts(11, 0)]);
    }

    #[test]
    fn test_forward_releases_are_monotonic() {
        let mut pool = ResourcePool::bounded("XRD", 2, ts(9, 0));
        pool.assign(ts(10, 0));
        pool.assign(ts(11, 0));
        pool.assign(ts(12, 0));
        assert!(pool.is_monotonic());
        assert_eq!(pool.history(0), &[ts(9, 0), ts(10, 0), ts(12, 0)]);
        assert_eq!(pool.availability(1), Some(ts(11, 0)));
    }

    #[test]
    fn test_early_release_breaks_monotonicity() {
        let mut pool = ResourcePool::bounded("tech", 1, ts(12, 0));
        assert_eq!(pool.assign(ts(9, 0)), Some(0));
        // Recorded as given, not clamped to the prior availability
        assert_eq!(pool.history(0), &[ts(12, 0), ts(9, 0)]);
        assert_eq!(pool.availability(0), Some(ts(9, 0)));
        assert!(!pool.is_monotonic());
    }

    #[test]
    fn test_unbounded_pool() {
        let mut pool = ResourcePool::unbounded("any");
        assert!(pool.is_unbounded());
        assert_eq!(pool.capacity(), None);
        assert_eq!(
            pool.soonest(),
            SlotChoice {
                slot: None,
                available_at: None
            }
        );
        assert_eq!(pool.assign(ts(10, 0)), None);
        assert!(pool.is_monotonic());
    }

    #[test]
    fn test_capacity() {
        let pool = ResourcePool::bounded("tech", 4, ts(9, 0));
        assert_eq!(pool.capacity(), Some(4));
        assert!(!pool.is_unbounded());
    }
}
