//! Stockpile - tiles that store hauled items
//!
//! Each slot holds a single item type up to its stack cap. The free
//! capacity of a slot is mirrored in the [`AllocationLedger`] so haulers can
//! reserve room before they set off.

use serde::{Deserialize, Serialize};

use super::{AllocationId, AllocationLedger, ResourceRef};
use crate::core::types::TilePos;
use crate::data::ItemTypeId;

pub const DEFAULT_STACK_CAP: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockpileSlot {
    pub tile: TilePos,
    pub item_type: Option<ItemTypeId>,
    pub stored: u32,
    pub capacity: u32,
    /// Type promised to haulers while the slot is still empty
    #[serde(default)]
    pub reserved_for: Option<ItemTypeId>,
}

impl StockpileSlot {
    pub fn free_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.stored)
    }

    fn holds(&self, item_type: ItemTypeId) -> bool {
        self.item_type.or(self.reserved_for) == Some(item_type)
    }

    /// An empty slot keeps its reservation only while storage claims are open
    fn accepts(&self, item_type: ItemTypeId, ledger: &AllocationLedger) -> bool {
        match (self.item_type, self.reserved_for) {
            (Some(stored), _) => stored == item_type,
            (None, Some(reserved)) => {
                reserved == item_type || ledger.allocated(ResourceRef::StockpileSlot(self.tile)) == 0
            }
            (None, None) => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stockpile {
    slots: Vec<StockpileSlot>,
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty slot with the default stack cap
    pub fn add_slot(&mut self, tile: TilePos, ledger: &mut AllocationLedger) {
        self.add_slot_with_capacity(tile, DEFAULT_STACK_CAP, ledger);
    }

    pub fn add_slot_with_capacity(&mut self, tile: TilePos, capacity: u32, ledger: &mut AllocationLedger) {
        if self.slot(tile).is_some() {
            return;
        }
        self.slots.push(StockpileSlot {
            tile,
            item_type: None,
            stored: 0,
            capacity,
            reserved_for: None,
        });
        ledger.set_total(ResourceRef::StockpileSlot(tile), capacity);
    }

    /// Put back a slot from a save; the ledger is restored separately
    pub fn restore_slot(&mut self, slot: StockpileSlot) {
        self.slots.push(slot);
    }

    pub fn slot(&self, tile: TilePos) -> Option<&StockpileSlot> {
        self.slots.iter().find(|s| s.tile == tile)
    }

    pub fn slots(&self) -> &[StockpileSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Units of `item_type` stored across all slots
    pub fn get(&self, item_type: ItemTypeId) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item_type == Some(item_type))
            .map(|s| s.stored)
            .sum()
    }

    /// Best slot with unreserved room for `item_type`: one already holding
    /// or promised to that type if possible, otherwise an empty one
    pub fn find_slot_for(&self, item_type: ItemTypeId, ledger: &AllocationLedger) -> Option<TilePos> {
        let has_room = |s: &&StockpileSlot| {
            s.accepts(item_type, ledger) && ledger.available(ResourceRef::StockpileSlot(s.tile)) > 0
        };
        self.slots
            .iter()
            .filter(has_room)
            .find(|s| s.holds(item_type))
            .or_else(|| self.slots.iter().find(has_room))
            .map(|s| s.tile)
    }

    /// Promise an empty slot to `item_type`. Call after [`find_slot_for`]
    /// picked the slot, so a second hauler with another type looks elsewhere.
    ///
    /// [`find_slot_for`]: Stockpile::find_slot_for
    pub fn reserve(&mut self, tile: TilePos, item_type: ItemTypeId) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.tile == tile) {
            if slot.item_type.is_none() {
                slot.reserved_for = Some(item_type);
            }
        }
    }

    /// Store items against a storage claim, returns amount actually added
    pub fn deposit(
        &mut self,
        tile: TilePos,
        item_type: ItemTypeId,
        amount: u32,
        allocation: AllocationId,
        ledger: &mut AllocationLedger,
    ) -> u32 {
        let Some(slot) = self.slots.iter_mut().find(|s| s.tile == tile) else {
            return 0;
        };
        if !slot.accepts(item_type, ledger) {
            return 0;
        }
        let added = ledger.consume(allocation, amount.min(slot.free_capacity()));
        if added > 0 {
            slot.item_type = Some(item_type);
            slot.reserved_for = None;
            slot.stored += added;
        }
        added
    }

    /// Take items out of a slot, returns amount actually removed
    pub fn withdraw(&mut self, tile: TilePos, amount: u32, ledger: &mut AllocationLedger) -> u32 {
        let Some(slot) = self.slots.iter_mut().find(|s| s.tile == tile) else {
            return 0;
        };
        let removed = amount.min(slot.stored);
        slot.stored -= removed;
        if slot.stored == 0 {
            slot.item_type = None;
            slot.reserved_for = None;
        }
        let resource = ResourceRef::StockpileSlot(tile);
        let total = ledger.total(resource) + removed;
        ledger.set_total(resource, total);
        removed
    }
}
