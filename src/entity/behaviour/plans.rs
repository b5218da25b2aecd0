//! Turning goals into step plans
//!
//! Planning reserves what the plan will use up front. A plan that cannot
//! get its reservations is not started.

use ordered_float::OrderedFloat;
use rand::Rng;

use super::driver::{remember_now, Plan, WorkEffect};
use super::BehaviourContext;
use crate::allocation::{Purpose, ResourceRef};
use crate::core::types::{EntityId, TilePos};
use crate::data::ItemTypeDef;
use crate::entity::goals::{Goal, GoalTarget};
use crate::entity::memory::MemoryKind;
use crate::pathfinding::{PathGoal, Terrain, TileGrid};

pub const EAT_HOURS: f64 = 0.5;
pub const DRINK_HOURS: f64 = 0.25;
pub const SLEEP_HOURS: f64 = 6.0;
pub const HANDLE_HOURS: f64 = 0.1;
pub const WANDER_HOURS: f64 = 0.5;

/// Most units a hauler moves in one trip
pub const CARRY_CAPACITY: u32 = 25;

pub const WANDER_RADIUS: i32 = 5;

pub fn plan_eat(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    let plan = plan_consume(goal, ctx, ItemTypeDef::is_edible, Purpose::Eating, EAT_HOURS);
    if plan.is_none() {
        remember_now(ctx, MemoryKind::FailedToFindFood);
    }
    plan
}

pub fn plan_drink(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    if let Some(plan) = plan_consume(goal, ctx, ItemTypeDef::is_drinkable, Purpose::Drinking, DRINK_HOURS) {
        return Some(plan);
    }
    let shore = water_access_tiles(ctx.grid);
    if shore.is_empty() {
        remember_now(ctx, MemoryKind::FailedToFindDrink);
        return None;
    }
    Some(
        Plan::new()
            .then_move(PathGoal::NearestOf(shore))
            .then_work(DRINK_HOURS, WorkEffect::DrinkFromSource),
    )
}

pub fn plan_sleep(_goal: &Goal, _ctx: &mut BehaviourContext) -> Option<Plan> {
    Some(Plan::new().then_work(SLEEP_HOURS, WorkEffect::Sleep))
}

pub fn plan_idle(_goal: &Goal, _ctx: &mut BehaviourContext) -> Option<Plan> {
    Some(Plan::idle())
}

pub fn plan_wander(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    let destination = match goal.target() {
        Some(GoalTarget::Tile(tile)) => Some(tile),
        _ => random_nearby_tile(ctx),
    }?;
    Some(
        Plan::new()
            .then_move(PathGoal::Tile(destination))
            .then_work(WANDER_HOURS, WorkEffect::Idle),
    )
}

/// Carry a loose stack into the stockpile
pub fn plan_haul(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    let item = match goal.target() {
        Some(GoalTarget::Entity(id)) => Some(id),
        _ => find_haulable(ctx),
    }?;
    let stack = ctx.others.get(&item)?;
    let item_type = stack.item()?.item_type;
    let item_tile = stack.tile();
    let slot = ctx.stockpile.find_slot_for(item_type, ctx.ledger)?;

    let item_ref = ResourceRef::Item(item);
    let slot_ref = ResourceRef::StockpileSlot(slot);
    let amount = ctx
        .ledger
        .available(item_ref)
        .min(ctx.ledger.available(slot_ref))
        .min(CARRY_CAPACITY);
    let me = ctx.me.id();
    let take = ctx.ledger.allocate(item_ref, amount, me, Purpose::Hauling)?;
    let Some(store) = ctx.ledger.allocate(slot_ref, amount, me, Purpose::Storage) else {
        ctx.ledger.cancel(take);
        return None;
    };
    ctx.stockpile.reserve(slot, item_type);

    Some(
        Plan::new()
            .then_move(PathGoal::Tile(item_tile))
            .then_work(
                HANDLE_HOURS,
                WorkEffect::PickUp {
                    item,
                    allocation: take,
                },
            )
            .then_move(PathGoal::Tile(slot))
            .then_work(
                HANDLE_HOURS,
                WorkEffect::Deposit {
                    slot,
                    allocation: store,
                },
            )
            .holding(take)
            .holding(store),
    )
}

/// Whether any loose stack could be hauled right now
pub fn haul_available(ctx: &BehaviourContext) -> bool {
    find_haulable(ctx).is_some()
}

fn plan_consume(
    goal: &Goal,
    ctx: &mut BehaviourContext,
    wanted: fn(&ItemTypeDef) -> bool,
    purpose: Purpose,
    hours: f64,
) -> Option<Plan> {
    let item = match goal.target() {
        Some(GoalTarget::Entity(id)) => Some(id),
        _ => nearest_item(ctx, wanted),
    }?;
    let tile = ctx.others.get(&item)?.tile();
    let allocation = ctx
        .ledger
        .allocate(ResourceRef::Item(item), 1, ctx.me.id(), purpose)?;
    Some(
        Plan::new()
            .then_move(PathGoal::Tile(tile))
            .then_work(hours, WorkEffect::Consume { item, allocation })
            .holding(allocation),
    )
}

/// Closest stack matching `wanted` with at least one unclaimed unit
fn nearest_item(ctx: &BehaviourContext, wanted: fn(&ItemTypeDef) -> bool) -> Option<EntityId> {
    let here = ctx.me.position;
    ctx.others
        .values()
        .filter(|e| {
            e.item()
                .and_then(|i| ctx.dictionaries.item_type(i.item_type))
                .is_some_and(wanted)
        })
        .filter(|e| ctx.ledger.available(ResourceRef::Item(e.id())) > 0)
        .min_by_key(|e| OrderedFloat(here.distance(&e.position)))
        .map(|e| e.id())
}

fn find_haulable(ctx: &BehaviourContext) -> Option<EntityId> {
    let here = ctx.me.position;
    ctx.others
        .values()
        .filter(|e| ctx.stockpile.slot(e.tile()).is_none())
        .filter(|e| {
            let Some(item) = e.item() else {
                return false;
            };
            let haulable = ctx
                .dictionaries
                .item_type(item.item_type)
                .is_some_and(|def| !def.is_consumable());
            haulable
                && ctx.ledger.available(ResourceRef::Item(e.id())) > 0
                && ctx.stockpile.find_slot_for(item.item_type, ctx.ledger).is_some()
        })
        .min_by_key(|e| OrderedFloat(here.distance(&e.position)))
        .map(|e| e.id())
}

fn random_nearby_tile(ctx: &mut BehaviourContext) -> Option<TilePos> {
    let origin = ctx.me.tile();
    for _ in 0..8 {
        let candidate = TilePos::new(
            origin.x + ctx.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
            origin.y + ctx.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS),
        );
        if candidate != origin && ctx.grid.is_passable(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Passable tiles bordering open water
pub fn water_access_tiles(grid: &TileGrid) -> Vec<TilePos> {
    grid.passable_tiles()
        .filter(|tile| {
            [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|(dx, dy)| {
                grid.terrain(TilePos::new(tile.x + dx, tile.y + dy)) == Some(Terrain::Water)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_access_tiles() {
        let mut grid = TileGrid::new(4, 3);
        grid.set_terrain(TilePos::new(3, 1), Terrain::Water);
        grid.set_terrain(TilePos::new(3, 0), Terrain::Wall);

        let shore = water_access_tiles(&grid);
        assert_eq!(shore, vec![TilePos::new(2, 1), TilePos::new(3, 2)]);
    }

    #[test]
    fn test_no_water_no_shore() {
        assert!(water_access_tiles(&TileGrid::new(5, 5)).is_empty());
    }
}
