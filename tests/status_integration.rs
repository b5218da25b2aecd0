//! Status effects and stockpile claims across full ticks

use colony_sim::allocation::{AllocationLedger, Purpose, ResourceRef, Stockpile};
use colony_sim::core::config::SimulationConfig;
use colony_sim::core::types::{EntityId, TilePos};
use colony_sim::data::Dictionaries;
use colony_sim::ecs::world::World;
use colony_sim::entity::behaviour::{Controller, ControllerKind};
use colony_sim::entity::status::{DeathCause, StatusKind};
use colony_sim::events::SimEvent;
use colony_sim::pathfinding::TileGrid;

/// One game hour per tick, no drink decay
fn still_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.clock.game_hours_per_second = 1.0;
    config.needs.drink_decay_per_hour = 0.0;
    config
}

fn statuses(world: &World, id: EntityId) -> Vec<StatusKind> {
    world.entity(id).and_then(|e| e.status()).map(|s| s.kinds()).unwrap_or_default()
}

#[test]
fn test_dying_of_thirst_holds_until_drink_recovers() {
    let mut world = World::new(still_config(), TileGrid::new(6, 6), Dictionaries::with_defaults());
    let settler = world.spawn_settler("Urist", TilePos::new(2, 2)).unwrap();
    world.entity_mut(settler).unwrap().needs_mut().drink = 0.5;
    world.apply_status(settler, StatusKind::DyingOfThirst).unwrap();

    world.tick(1.0);
    world.tick(1.0);
    assert!(statuses(&world, settler).contains(&StatusKind::DyingOfThirst));

    // Exactly at the recovery line is not enough
    world.entity_mut(settler).unwrap().needs_mut().drink = 1.0;
    world.tick(1.0);
    assert!(statuses(&world, settler).contains(&StatusKind::DyingOfThirst));

    world.entity_mut(settler).unwrap().needs_mut().drink = 1.5;
    let events = world.tick(1.0);
    assert!(!statuses(&world, settler).contains(&StatusKind::DyingOfThirst));
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::StatusRemoved { entity, kind: StatusKind::DyingOfThirst, .. } if *entity == settler
    )));
}

#[test]
fn test_shortened_thirst_chain_ends_in_death() {
    let mut config = still_config();
    for kind in ["thirsty", "very_thirsty", "dying_of_thirst"] {
        config.status.duration_overrides.insert(kind.to_string(), 1.0);
    }
    let mut world = World::new(config, TileGrid::new(6, 6), Dictionaries::with_defaults());
    let settler = world.spawn_settler("Kib", TilePos::new(2, 2)).unwrap();
    world.entity_mut(settler).unwrap().needs_mut().drink = 0.0;

    let mut events = Vec::new();
    for _ in 0..8 {
        events.extend(world.tick(1.0));
    }

    let entity = world.entity(settler).unwrap();
    assert!(entity.is_dead(), "statuses: {:?}", statuses(&world, settler));
    assert_eq!(statuses(&world, settler), vec![StatusKind::Death]);
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::EntityDied { entity, cause: DeathCause::Dehydration, .. } if *entity == settler
    )));
    assert_eq!(world.living_count(), 0);
}

#[test]
fn test_statuses_stop_after_death() {
    let mut world = World::new(still_config(), TileGrid::new(6, 6), Dictionaries::with_defaults());
    let settler = world.spawn_settler("Doren", TilePos::new(2, 2)).unwrap();
    world.apply_status(settler, StatusKind::Drunk).unwrap();
    world.tick(1.0);
    world.apply_status(settler, StatusKind::Death).unwrap();
    world.tick(1.0);
    assert_eq!(statuses(&world, settler), vec![StatusKind::Death]);

    world.apply_status(settler, StatusKind::Hungry).unwrap();
    world.tick(1.0);
    world.tick(1.0);
    assert_eq!(statuses(&world, settler), vec![StatusKind::Death]);
}

#[test]
fn test_repeated_unit_claims_merge() {
    let mut ledger = AllocationLedger::new();
    let mut stockpile = Stockpile::new();
    let slot = TilePos::new(0, 0);
    stockpile.add_slot(slot, &mut ledger);

    let hauler = EntityId(1);
    let stack = ResourceRef::Item(EntityId(7));
    let storage = ResourceRef::StockpileSlot(slot);
    ledger.set_total(stack, 10);

    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(ledger.allocate(stack, 1, hauler, Purpose::Hauling).unwrap());
        ledger.allocate(storage, 1, hauler, Purpose::Storage).unwrap();
    }

    assert!(ids.windows(2).all(|w| w[0] == w[1]), "one record per claim");
    let claims: Vec<_> = ledger
        .allocations_of(hauler)
        .into_iter()
        .filter(|a| a.resource == stack)
        .collect();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].quantity, 10);
    assert!(ledger.allocate(stack, 1, EntityId(2), Purpose::Hauling).is_none());

    assert_eq!(ledger.allocated(storage), 10);
    assert_eq!(ledger.available(storage), 90);
}

#[test]
fn test_hunger_chain_runs_to_death_on_default_durations() {
    let mut config = still_config();
    config.needs.food_decay_per_hour = 0.0;
    config.needs.sleep_decay_per_hour = 0.0;
    let mut world = World::new(config, TileGrid::new(6, 6), Dictionaries::with_defaults());
    let settler = world.spawn_settler("Olon", TilePos::new(2, 2)).unwrap();
    world.entity_mut(settler).unwrap().needs_mut().food = 0.0;

    let mut applied = Vec::new();
    let mut died_at = None;
    for tick in 1..=170u32 {
        for event in world.tick(1.0) {
            match event {
                SimEvent::StatusApplied { entity, kind, .. } if entity == settler => {
                    applied.push((kind, tick));
                }
                SimEvent::EntityDied { entity, cause, .. } if entity == settler => {
                    assert_eq!(cause, DeathCause::Starvation);
                    died_at = Some(tick);
                }
                _ => {}
            }
        }
    }

    let order: Vec<StatusKind> = applied.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        order,
        vec![
            StatusKind::Hungry,
            StatusKind::VeryHungry,
            StatusKind::Starving,
            StatusKind::Death
        ]
    );
    // a day hungry, two days very hungry, three days starving
    let at = |kind: StatusKind| applied.iter().find(|(k, _)| *k == kind).map(|(_, t)| *t).unwrap();
    assert!((20..=30).contains(&at(StatusKind::VeryHungry)), "{applied:?}");
    assert!((65..=80).contains(&at(StatusKind::Starving)), "{applied:?}");
    let died_at = died_at.expect("settler should starve");
    assert!((135..=155).contains(&died_at), "died at tick {died_at}");

    let entity = world.entity(settler).unwrap();
    assert!(entity.is_dead());
    assert_eq!(statuses(&world, settler), vec![StatusKind::Death]);
    assert_eq!(
        entity.behaviour().map(|b| b.kind()),
        Some(ControllerKind::DoNothing)
    );
}
