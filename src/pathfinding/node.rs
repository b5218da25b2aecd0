//! Search nodes and the A* open set
//!
//! Nodes live in an arena (`Vec<PathNode>`) and point back at their
//! predecessor by index. The open set orders arena indices by a scaled,
//! rounded `cost + estimate` so floating point jitter cannot reorder
//! otherwise equal nodes; equal keys pop in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::Vec2;

/// Index of a node in the search arena
pub type NodeIndex = usize;

/// `f` values are compared after scaling by this and rounding
const F_SCALE: f32 = 1000.0;

#[derive(Debug, Clone)]
pub struct PathNode {
    pub position: Vec2,
    /// Accumulated cost from the start
    pub cost: f32,
    /// Heuristic estimate to the goal
    pub estimate: f32,
    pub previous: Option<NodeIndex>,
}

impl PathNode {
    pub fn new(position: Vec2, cost: f32, estimate: f32, previous: Option<NodeIndex>) -> Self {
        Self {
            position,
            cost,
            estimate,
            previous,
        }
    }

    pub fn total(&self) -> f32 {
        self.cost + self.estimate
    }

    fn key(&self) -> i64 {
        (self.total() * F_SCALE).round() as i64
    }
}

/// Equality is positional, within [`crate::core::types::POSITION_EPSILON`]
impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.position.approx_eq(&other.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    key: i64,
    seq: u64,
    node: NodeIndex,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.key.cmp(&self.key).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of arena indices, lowest `f` first
#[derive(Debug, Default)]
pub struct OpenSet {
    heap: BinaryHeap<OpenEntry>,
    next_seq: u64,
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: NodeIndex, node: &PathNode) {
        self.heap.push(OpenEntry {
            key: node.key(),
            seq: self.next_seq,
            node: index,
        });
        self.next_seq += 1;
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        self.heap.pop().map(|entry| entry.node)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop_totals(arena: &[PathNode], open: &mut OpenSet) -> Vec<f32> {
        let mut out = Vec::new();
        while let Some(i) = open.pop() {
            out.push(arena[i].total());
        }
        out
    }

    #[test]
    fn test_equal_estimates_pop_by_cost() {
        let arena = vec![
            PathNode::new(Vec2::new(0.0, 0.0), 3.0, 1.0, None),
            PathNode::new(Vec2::new(1.0, 0.0), 1.0, 1.0, None),
            PathNode::new(Vec2::new(2.0, 0.0), 2.0, 1.0, None),
        ];
        let mut open = OpenSet::new();
        for (i, node) in arena.iter().enumerate() {
            open.push(i, node);
        }
        assert_eq!(pop_totals(&arena, &mut open), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ties_pop_in_insertion_order() {
        let arena = vec![
            PathNode::new(Vec2::new(5.0, 0.0), 2.0, 2.0, None),
            PathNode::new(Vec2::new(6.0, 0.0), 1.0, 3.0, None),
            // jitter below the rounding scale still ties
            PathNode::new(Vec2::new(7.0, 0.0), 3.0000001, 1.0, None),
        ];
        let mut open = OpenSet::new();
        for (i, node) in arena.iter().enumerate() {
            open.push(i, node);
        }
        assert_eq!(open.pop(), Some(0));
        assert_eq!(open.pop(), Some(1));
        assert_eq!(open.pop(), Some(2));
        assert!(open.is_empty());
    }

    #[test]
    fn test_node_equality_is_positional() {
        let a = PathNode::new(Vec2::new(1.0, 1.0), 5.0, 0.0, None);
        let b = PathNode::new(Vec2::new(1.0002, 0.9999), 9.0, 3.0, Some(4));
        let c = PathNode::new(Vec2::new(2.0, 1.0), 5.0, 0.0, None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
