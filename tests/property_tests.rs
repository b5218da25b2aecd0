//! Property tests for the claim ledger, memory expiry and the A* open set

use colony_sim::allocation::{AllocationId, AllocationLedger, Purpose, ResourceRef};
use colony_sim::core::types::{EntityId, Vec2};
use colony_sim::entity::memory::{MemoryKind, MemoryLedger};
use colony_sim::pathfinding::{OpenSet, PathNode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum LedgerOp {
    Allocate { claimant: u64, quantity: u32 },
    Cancel(usize),
    Consume { index: usize, amount: u32 },
    Resize(u32),
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (1u64..4, quantity()).prop_map(|(claimant, quantity)| LedgerOp::Allocate { claimant, quantity }),
        (0usize..16).prop_map(LedgerOp::Cancel),
        (0usize..16, quantity()).prop_map(|(index, amount)| LedgerOp::Consume { index, amount }),
        quantity().prop_map(LedgerOp::Resize),
    ]
}

/// Mostly small amounts, sometimes right at the top of the range
fn quantity() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => 0u32..30,
        1 => (u32::MAX - 8)..=u32::MAX,
        1 => any::<u32>(),
    ]
}

fn memory_kind() -> impl Strategy<Value = MemoryKind> {
    (0usize..MemoryKind::ALL.len()).prop_map(|i| MemoryKind::ALL[i])
}

proptest! {
    #[test]
    fn prop_claims_never_exceed_total(initial in quantity(), ops in prop::collection::vec(ledger_op(), 0..60)) {
        let stack = ResourceRef::Item(EntityId(99));
        let mut ledger = AllocationLedger::new();
        ledger.set_total(stack, initial);
        let mut issued: Vec<AllocationId> = Vec::new();

        for op in ops {
            match op {
                LedgerOp::Allocate { claimant, quantity } => {
                    if let Some(id) = ledger.allocate(stack, quantity, EntityId(claimant), Purpose::Hauling) {
                        issued.push(id);
                    }
                }
                LedgerOp::Cancel(index) => {
                    if let Some(id) = issued.get(index).copied() {
                        ledger.cancel(id);
                        let after = ledger.allocated(stack);
                        // second cancel is a no-op
                        prop_assert!(ledger.cancel(id).is_none());
                        prop_assert_eq!(ledger.allocated(stack), after);
                    }
                }
                LedgerOp::Consume { index, amount } => {
                    if let Some(id) = issued.get(index).copied() {
                        ledger.consume(id, amount);
                    }
                }
                LedgerOp::Resize(total) => {
                    ledger.set_total(stack, total);
                }
            }
            prop_assert!(ledger.allocated(stack) <= ledger.total(stack));
            prop_assert_eq!(
                ledger.available(stack),
                ledger.total(stack) - ledger.allocated(stack)
            );
        }
    }

    #[test]
    fn prop_memories_expire_after_their_duration(kind in memory_kind(), quarters in 0u32..4000, later in 0u32..200) {
        // quarter hours keep the sums exact
        let at = f64::from(quarters) / 4.0;
        let later = f64::from(later);
        let mut memories = MemoryLedger::new();
        memories.record(kind, at);
        let now = at + later;
        let alive = later < kind.duration_hours();

        prop_assert_eq!(memories.has_recent(kind, now), alive);
        let expected_mood = if alive { kind.mood_value() } else { 0 };
        prop_assert_eq!(memories.mood_total(now), expected_mood);
        prop_assert_eq!(memories.short_term_memories(now).len(), usize::from(alive));
        prop_assert_eq!(memories.len(), usize::from(alive));
    }

    #[test]
    fn prop_open_set_pops_lowest_total_first(costs in prop::collection::vec(0u32..500, 1..40)) {
        let nodes: Vec<PathNode> = costs
            .iter()
            .enumerate()
            .map(|(i, c)| PathNode::new(Vec2::new(i as f32, 0.0), *c as f32 / 4.0, 1.0, None))
            .collect();
        let mut open = OpenSet::new();
        for (index, node) in nodes.iter().enumerate() {
            open.push(index, node);
        }

        let mut last: Option<(f32, usize)> = None;
        while let Some(index) = open.pop() {
            let total = nodes[index].total();
            if let Some((previous, previous_index)) = last {
                prop_assert!(total >= previous);
                if total == previous {
                    // equal keys come out in insertion order
                    prop_assert!(index > previous_index);
                }
            }
            last = Some((total, index));
        }
        prop_assert!(open.is_empty());
    }
}

#[test]
fn test_open_set_pops_in_cost_order() {
    let nodes = [
        PathNode::new(Vec2::new(0.0, 0.0), 3.0, 1.0, None),
        PathNode::new(Vec2::new(1.0, 0.0), 1.0, 1.0, None),
        PathNode::new(Vec2::new(2.0, 0.0), 2.0, 1.0, None),
    ];
    let mut open = OpenSet::new();
    for (index, node) in nodes.iter().enumerate() {
        open.push(index, node);
    }
    let totals: Vec<f32> = std::iter::from_fn(|| open.pop()).map(|i| nodes[i].total()).collect();
    assert_eq!(totals, vec![2.0, 3.0, 4.0]);
}
