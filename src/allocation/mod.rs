//! Claims on finite resources
//!
//! Every claimable resource (an item stack, the free capacity of a
//! stockpile tile) is registered with a total. Claims against it can never
//! sum past that total. Released quantity is available again immediately.

pub mod stockpile;

pub use stockpile::{Stockpile, StockpileSlot, DEFAULT_STACK_CAP};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{EntityId, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceRef {
    /// Units in an item stack
    Item(EntityId),
    /// Free capacity of a stockpile tile
    StockpileSlot(TilePos),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Eating,
    Drinking,
    Hauling,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub resource: ResourceRef,
    pub claimant: EntityId,
    pub purpose: Purpose,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "LedgerRecord", into = "LedgerRecord")]
pub struct AllocationLedger {
    next_id: u64,
    totals: BTreeMap<ResourceRef, u32>,
    allocations: BTreeMap<AllocationId, Allocation>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource or change its total. If existing claims no
    /// longer fit, the newest are cancelled and returned.
    pub fn set_total(&mut self, resource: ResourceRef, total: u32) -> Vec<Allocation> {
        self.totals.insert(resource, total);
        let mut cancelled = Vec::new();
        while self.allocated(resource) > total {
            let newest = self
                .allocations
                .values()
                .filter(|a| a.resource == resource)
                .map(|a| a.id)
                .max();
            match newest.and_then(|id| self.allocations.remove(&id)) {
                Some(allocation) => cancelled.push(allocation),
                None => break,
            }
        }
        cancelled
    }

    /// Forget a resource and every claim against it
    pub fn remove_resource(&mut self, resource: ResourceRef) -> Vec<Allocation> {
        self.totals.remove(&resource);
        let ids: Vec<AllocationId> = self
            .allocations
            .values()
            .filter(|a| a.resource == resource)
            .map(|a| a.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.allocations.remove(&id))
            .collect()
    }

    pub fn is_registered(&self, resource: ResourceRef) -> bool {
        self.totals.contains_key(&resource)
    }

    pub fn total(&self, resource: ResourceRef) -> u32 {
        self.totals.get(&resource).copied().unwrap_or(0)
    }

    pub fn allocated(&self, resource: ResourceRef) -> u32 {
        self.allocations
            .values()
            .filter(|a| a.resource == resource)
            .fold(0u32, |sum, a| sum.saturating_add(a.quantity))
    }

    pub fn available(&self, resource: ResourceRef) -> u32 {
        self.total(resource).saturating_sub(self.allocated(resource))
    }

    /// Claim `quantity` of `resource`. Returns `None` when the resource is
    /// unknown, the quantity is zero, or the claim would exceed the total.
    /// A claim by the same holder for the same purpose merges into the
    /// existing record.
    pub fn allocate(
        &mut self,
        resource: ResourceRef,
        quantity: u32,
        claimant: EntityId,
        purpose: Purpose,
    ) -> Option<AllocationId> {
        if quantity == 0 || !self.is_registered(resource) {
            return None;
        }
        if quantity > self.available(resource) {
            return None;
        }

        if let Some(existing) = self
            .allocations
            .values_mut()
            .find(|a| a.resource == resource && a.claimant == claimant && a.purpose == purpose)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return Some(existing.id);
        }

        self.next_id += 1;
        let id = AllocationId(self.next_id);
        self.allocations.insert(
            id,
            Allocation {
                id,
                resource,
                claimant,
                purpose,
                quantity,
            },
        );
        Some(id)
    }

    /// Release a claim. Unknown or already cancelled ids are ignored.
    pub fn cancel(&mut self, id: AllocationId) -> Option<Allocation> {
        self.allocations.remove(&id)
    }

    /// Use up to `amount` of a claim: the claim and the resource total both
    /// shrink. Returns how much was consumed.
    pub fn consume(&mut self, id: AllocationId, amount: u32) -> u32 {
        let Some(allocation) = self.allocations.get_mut(&id) else {
            return 0;
        };
        let used = amount.min(allocation.quantity);
        allocation.quantity -= used;
        let resource = allocation.resource;
        if allocation.quantity == 0 {
            self.allocations.remove(&id);
        }
        if let Some(total) = self.totals.get_mut(&resource) {
            *total = total.saturating_sub(used);
        }
        used
    }

    /// Release everything held by `claimant`
    pub fn release_claimant(&mut self, claimant: EntityId) -> Vec<Allocation> {
        let ids: Vec<AllocationId> = self
            .allocations
            .values()
            .filter(|a| a.claimant == claimant)
            .map(|a| a.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.allocations.remove(&id))
            .collect()
    }

    pub fn get(&self, id: AllocationId) -> Option<&Allocation> {
        self.allocations.get(&id)
    }

    pub fn allocations_of(&self, claimant: EntityId) -> Vec<&Allocation> {
        self.allocations
            .values()
            .filter(|a| a.claimant == claimant)
            .collect()
    }

    pub fn allocations_against(&self, resource: ResourceRef) -> Vec<&Allocation> {
        self.allocations
            .values()
            .filter(|a| a.resource == resource)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.values()
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

/// Flat form used in save documents (map keys must be strings in JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerRecord {
    next_id: u64,
    totals: Vec<(ResourceRef, u32)>,
    allocations: Vec<Allocation>,
}

impl From<LedgerRecord> for AllocationLedger {
    fn from(record: LedgerRecord) -> Self {
        let next_id = record
            .allocations
            .iter()
            .map(|a| a.id.0)
            .max()
            .unwrap_or(0)
            .max(record.next_id);
        Self {
            next_id,
            totals: record.totals.into_iter().collect(),
            allocations: record.allocations.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

impl From<AllocationLedger> for LedgerRecord {
    fn from(ledger: AllocationLedger) -> Self {
        Self {
            next_id: ledger.next_id,
            totals: ledger.totals.into_iter().collect(),
            allocations: ledger.allocations.into_values().collect(),
        }
    }
}
