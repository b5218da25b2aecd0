//! Entity id allocation
//!
//! Ids are issued in strictly increasing order and never reused. The
//! generator is owned by the world and its next value travels with the
//! save document.

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume issuing ids from a persisted value
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// The value the next call to [`next_id`](Self::next_id) will return
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Make sure ids issued from now on are above `id`
    pub fn observe(&mut self, id: EntityId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase_monotonically() {
        let mut ids = IdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_observe_skips_past_loaded_ids() {
        let mut ids = IdGenerator::new();
        ids.observe(EntityId(41));
        assert_eq!(ids.next_id(), EntityId(42));
        ids.observe(EntityId(3));
        assert_eq!(ids.next_id(), EntityId(43));
    }

    #[test]
    fn test_starting_at_never_issues_zero() {
        let mut ids = IdGenerator::starting_at(0);
        assert_eq!(ids.next_id(), EntityId(1));
    }
}
