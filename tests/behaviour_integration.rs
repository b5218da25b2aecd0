//! Integration tests for the behaviour controllers
//!
//! These drive whole worlds through `World::tick`:
//! - settlers finding food and water on their own
//! - assigned haul jobs ending up in the stockpile
//! - claims released when an entity goes away mid-goal
//! - mental breaks and recovery

use colony_sim::allocation::ResourceRef;
use colony_sim::core::config::SimulationConfig;
use colony_sim::core::error::SimError;
use colony_sim::core::types::{EntityId, TilePos};
use colony_sim::data::Dictionaries;
use colony_sim::ecs::world::World;
use colony_sim::entity::behaviour::{Controller, ControllerKind};
use colony_sim::entity::goals::{Goal, GoalAction, GoalPriority, GoalTarget};
use colony_sim::entity::memory::MemoryKind;
use colony_sim::entity::status::StatusKind;
use colony_sim::events::SimEvent;
use colony_sim::pathfinding::{Terrain, TileGrid};

/// Eight ticks of one second make one game hour, so the infrequent update
/// fires on every eighth tick.
fn fast_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.clock.game_hours_per_second = 0.125;
    config
}

fn world_with(grid: TileGrid) -> World {
    World::new(fast_config(), grid, Dictionaries::with_defaults())
}

fn run(world: &mut World, ticks: usize) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(world.tick(1.0));
    }
    events
}

fn kind_of(world: &World, id: EntityId) -> ControllerKind {
    world.entity(id).and_then(|e| e.behaviour()).map(|b| b.kind()).unwrap()
}

#[test]
fn test_hungry_settler_eats_nearby_bread() {
    let mut world = world_with(TileGrid::new(10, 10));
    let settler = world.spawn_settler("Urist", TilePos::new(1, 1)).unwrap();
    let bread = world
        .spawn_item_named("bread", Some("wheat"), 3, TilePos::new(4, 1))
        .unwrap();
    world.entity_mut(settler).unwrap().needs_mut().food = 40.0;

    let events = run(&mut world, 40);

    assert!(events.contains(&SimEvent::GoalCompleted {
        entity: settler,
        action: GoalAction::Eat,
    }));
    let entity = world.entity(settler).unwrap();
    assert!(entity.needs().unwrap().food > 80.0, "food should be restored");
    assert!(entity.memory().unwrap().iter().any(|m| m.kind() == MemoryKind::AteNiceMeal));

    // One unit eaten, nothing left claimed
    assert_eq!(world.entity(bread).unwrap().item().unwrap().quantity, 2);
    assert_eq!(world.ledger.total(ResourceRef::Item(bread)), 2);
    assert_eq!(world.ledger.allocated(ResourceRef::Item(bread)), 0);
}

#[test]
fn test_thirsty_settler_walks_to_the_pond() {
    let mut grid = TileGrid::new(10, 10);
    for y in 0..10 {
        grid.set_terrain(TilePos::new(8, y), Terrain::Water);
    }
    let mut world = world_with(grid);
    let settler = world.spawn_settler("Kib", TilePos::new(2, 2)).unwrap();
    world.entity_mut(settler).unwrap().needs_mut().drink = 40.0;

    let events = run(&mut world, 40);

    assert!(events.contains(&SimEvent::GoalCompleted {
        entity: settler,
        action: GoalAction::Drink,
    }));
    let entity = world.entity(settler).unwrap();
    assert!(entity.needs().unwrap().drink > 60.0);
    assert_eq!(entity.tile().x, 7, "drank from the shore");
}

#[test]
fn test_no_food_anywhere_is_remembered() {
    let mut world = world_with(TileGrid::new(8, 8));
    let settler = world.spawn_settler("Doren", TilePos::new(1, 1)).unwrap();
    world.entity_mut(settler).unwrap().needs_mut().food = 40.0;

    run(&mut world, 8);

    let memories = world.entity(settler).unwrap().memory().unwrap();
    assert!(memories.iter().any(|m| m.kind() == MemoryKind::FailedToFindFood));
}

#[test]
fn test_assigned_haul_ends_in_stockpile() {
    let mut world = world_with(TileGrid::new(10, 10));
    let settler = world.spawn_settler("Bomrek", TilePos::new(1, 1)).unwrap();
    let logs = world
        .spawn_item_named("log", Some("oak"), 5, TilePos::new(5, 5))
        .unwrap();
    let slot = TilePos::new(1, 1);
    world.add_stockpile_slot(slot);

    let job = Goal::new(GoalAction::Haul, settler, GoalPriority::Normal, 0).with_target(GoalTarget::Entity(logs));
    assert!(world.assign_job(settler, job).unwrap());

    let events = run(&mut world, 40);

    assert!(events.contains(&SimEvent::GoalCompleted {
        entity: settler,
        action: GoalAction::Haul,
    }));
    let log_type = world.dictionaries.resolve_item_type("log").unwrap();
    assert_eq!(world.stockpile.get(log_type), 5);
    assert!(world.entity(logs).is_none(), "emptied stack is removed");
    assert_eq!(world.ledger.available(ResourceRef::StockpileSlot(slot)), 95);
    assert!(world.entity(settler).unwrap().components.carried.is_none());
}

#[test]
fn test_settler_mid_goal_cannot_be_cloned() {
    let mut world = world_with(TileGrid::new(10, 10));
    let settler = world.spawn_settler("Litast", TilePos::new(1, 1)).unwrap();
    world
        .spawn_item_named("bread", Some("wheat"), 2, TilePos::new(8, 8))
        .unwrap();
    world.entity_mut(settler).unwrap().needs_mut().food = 40.0;

    let behaviour = world.entity(settler).unwrap().behaviour().unwrap();
    assert!(behaviour.try_clone().is_ok());

    run(&mut world, 8);

    let behaviour = world.entity(settler).unwrap().behaviour().unwrap();
    assert!(matches!(
        behaviour.try_clone(),
        Err(SimError::Unsupported { operation: "clone", .. })
    ));
}

#[test]
fn test_removal_mid_goal_releases_claims() {
    let mut world = world_with(TileGrid::new(10, 10));
    let settler = world.spawn_settler("Mafol", TilePos::new(1, 1)).unwrap();
    let bread = world
        .spawn_item_named("bread", Some("wheat"), 2, TilePos::new(8, 8))
        .unwrap();
    world.entity_mut(settler).unwrap().needs_mut().food = 40.0;

    run(&mut world, 9);
    assert_eq!(world.ledger.allocated(ResourceRef::Item(bread)), 1);

    world.remove_entity(settler).unwrap();
    assert!(world.entity(settler).is_none());
    assert_eq!(world.ledger.allocated(ResourceRef::Item(bread)), 0);
    assert!(world.ledger.allocations_of(settler).is_empty());
    assert_eq!(world.paths.pending_count(), 0);

    let events = run(&mut world, 1);
    assert!(events.contains(&SimEvent::EntityRemoved { entity: settler }));
}

#[test]
fn test_animals_refuse_jobs() {
    let mut world = world_with(TileGrid::new(10, 10));
    let goat = world.spawn_animal("Billy", "goat", TilePos::new(3, 3)).unwrap();
    let job = Goal::new(GoalAction::Haul, goat, GoalPriority::Normal, 0);

    assert!(!world.assign_job(goat, job).unwrap());
    let events = run(&mut world, 1);
    assert!(events.contains(&SimEvent::JobRejected {
        entity: goat,
        action: GoalAction::Haul,
    }));
}

#[test]
fn test_mental_break_and_recovery() {
    let mut world = world_with(TileGrid::new(10, 10));
    let settler = world.spawn_settler("Sodel", TilePos::new(4, 4)).unwrap();
    {
        let needs = world.entity_mut(settler).unwrap().needs_mut();
        needs.food = 0.5;
        needs.drink = 0.5;
    }
    world.apply_status(settler, StatusKind::Starving).unwrap();
    world.apply_status(settler, StatusKind::DyingOfThirst).unwrap();

    let events = run(&mut world, 8);

    assert_eq!(kind_of(&world, settler), ControllerKind::Broken);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::MentalBreak { entity, mood } if *entity == settler && *mood <= -70)));
    assert!(events.contains(&SimEvent::BehaviourChanged {
        entity: settler,
        from: ControllerKind::Settler,
        to: ControllerKind::Broken,
    }));

    // Broken settlers take no jobs
    let job = Goal::new(GoalAction::Haul, settler, GoalPriority::Normal, 0);
    assert!(!world.assign_job(settler, job).unwrap());

    {
        let needs = world.entity_mut(settler).unwrap().needs_mut();
        needs.food = 100.0;
        needs.drink = 100.0;
    }
    let events = run(&mut world, 24);

    assert_eq!(kind_of(&world, settler), ControllerKind::Settler);
    assert!(events.contains(&SimEvent::BehaviourChanged {
        entity: settler,
        from: ControllerKind::Broken,
        to: ControllerKind::Settler,
    }));
}

#[test]
fn test_repeated_hauls_stack_on_one_tile() {
    let mut config = fast_config();
    config.needs.food_decay_per_hour = 0.0;
    config.needs.drink_decay_per_hour = 0.0;
    config.needs.sleep_decay_per_hour = 0.0;
    let mut world = World::new(config, TileGrid::new(14, 8), Dictionaries::with_defaults());
    let settler = world.spawn_settler("Zefon", TilePos::new(1, 2)).unwrap();
    let first = TilePos::new(1, 1);
    let spare = TilePos::new(1, 5);
    world.add_stockpile_slot(first);
    world.add_stockpile_slot(spare);

    let stacks: Vec<EntityId> = (2..12)
        .map(|x| {
            world
                .spawn_item_named("log", Some("oak"), 1, TilePos::new(x, 3))
                .unwrap()
        })
        .collect();
    for (n, stack) in stacks.iter().enumerate() {
        let job = Goal::new(GoalAction::Haul, settler, GoalPriority::Normal, n as u64)
            .with_target(GoalTarget::Entity(*stack));
        assert!(world.assign_job(settler, job).unwrap());
    }

    let events = run(&mut world, 400);

    let hauled = events
        .iter()
        .filter(|e| {
            matches!(e, SimEvent::GoalCompleted { entity, action: GoalAction::Haul } if *entity == settler)
        })
        .count();
    assert_eq!(hauled, 10);
    assert!(!events.iter().any(|e| matches!(e, SimEvent::GoalAbandoned { .. })));

    let log_type = world.dictionaries.resolve_item_type("log").unwrap();
    let slot = world.stockpile.slot(first).unwrap();
    assert_eq!(slot.item_type, Some(log_type));
    assert_eq!(slot.stored, 10);
    assert_eq!(world.stockpile.slot(spare).unwrap().stored, 0);
    assert_eq!(world.ledger.available(ResourceRef::StockpileSlot(first)), 90);
    assert_eq!(world.ledger.available(ResourceRef::StockpileSlot(spare)), 100);
    assert!(stacks.iter().all(|s| world.entity(*s).is_none()));
    assert!(world.ledger.allocations_of(settler).is_empty());
}

#[test]
fn test_two_item_types_never_share_an_empty_tile() {
    let mut world = world_with(TileGrid::new(10, 10));
    let first = world.spawn_settler("Cog", TilePos::new(1, 2)).unwrap();
    let second = world.spawn_settler("Udib", TilePos::new(2, 2)).unwrap();
    let logs = world
        .spawn_item_named("log", Some("oak"), 5, TilePos::new(5, 5))
        .unwrap();
    let stone = world
        .spawn_item_named("stone_block", Some("granite"), 5, TilePos::new(6, 5))
        .unwrap();
    let tile = TilePos::new(1, 1);
    world.add_stockpile_slot(tile);

    let haul = |who: EntityId, what: EntityId| {
        Goal::new(GoalAction::Haul, who, GoalPriority::Normal, 0).with_target(GoalTarget::Entity(what))
    };
    // both jobs are planned in the same tick against the same empty tile
    assert!(world.assign_job(first, haul(first, logs)).unwrap());
    assert!(world.assign_job(second, haul(second, stone)).unwrap());

    let events = run(&mut world, 80);

    let completed: Vec<EntityId> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::GoalCompleted { entity, action: GoalAction::Haul } => Some(*entity),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 1, "only one hauler gets the tile");
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SimEvent::GoalAbandoned { action: GoalAction::Haul, .. })),
        "the loser never sets off"
    );

    let (stored_stack, left_stack, stored_name) = if completed[0] == first {
        (logs, stone, "log")
    } else {
        (stone, logs, "stone_block")
    };
    let stored_type = world.dictionaries.resolve_item_type(stored_name).unwrap();
    let slot = world.stockpile.slot(tile).unwrap();
    assert_eq!(slot.item_type, Some(stored_type));
    assert_eq!(slot.stored, 5);
    assert!(world.entity(stored_stack).is_none());

    let untouched = world.entity(left_stack).unwrap();
    assert_eq!(untouched.item().map(|i| i.quantity), Some(5));
    assert_eq!(world.ledger.allocated(ResourceRef::Item(left_stack)), 0);
    assert_eq!(world.ledger.available(ResourceRef::StockpileSlot(tile)), 95);
}
