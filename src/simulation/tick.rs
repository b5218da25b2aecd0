//! Tick system - orchestrates simulation updates
//!
//! One tick runs, in order:
//! 1. Drain requests sent from other threads
//! 2. Process queued status requests
//! 3. Advance the clock
//! 4. Decay needs
//! 5. Per-frame controller updates, one entity at a time in id order
//! 6. Infrequent update when an interval boundary was crossed: memories,
//!    status progression, mood, deaths, goal selection
//! 7. Resolve the batch of path requests filed during the tick
//! 8. Dispatch events
//!
//! Entity logic is sequential. Only need decay and the path batch run in
//! parallel, and neither touches shared mutable state.

use rayon::prelude::*;

use crate::core::types::{EntityId, GameTime, TilePos};
use crate::ecs::world::World;
use crate::entity::behaviour::{Behaviour, BehaviourContext, Controller, ControllerKind, Transition, WorldCommand};
use crate::entity::memory::{Memory, MemoryKind};
use crate::entity::needs::{Mood, MoodSource};
use crate::entity::status::{DeathCause, StatusChange, StatusContext, StatusSet};
use crate::entity::Components;
use crate::events::{EventBus, ExternalRequest, SimEvent};

/// Settlers within this many tiles of a death remember it
pub const WITNESS_RADIUS: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
struct Delta {
    seconds: f32,
    hours: f64,
}

/// Run one tick of `delta_seconds` real time and return the events it produced
pub fn run_simulation_tick(world: &mut World, delta_seconds: f32) -> Vec<SimEvent> {
    let seconds = delta_seconds.max(0.0);
    let delta = Delta {
        seconds,
        hours: seconds as f64 * world.config.clock.game_hours_per_second,
    };

    drain_external_requests(world);
    process_status_requests(world);
    world.clock.advance(delta.hours);
    decay_needs(world, delta.hours);
    update_behaviours(world, delta);

    let interval = world.config.clock.infrequent_interval_hours;
    if let Some(elapsed) = world.clock.take_infrequent(interval) {
        infrequent_update(world, elapsed, delta);
    }

    let budget = world.config.pathfinding.budget();
    let resolved = world.paths.resolve_pending(&world.grid, budget);
    if resolved > 0 {
        tracing::trace!(resolved, tick = world.clock.current_tick(), "path batch resolved");
    }

    world.bus.dispatch()
}

fn drain_external_requests(world: &mut World) {
    for request in world.inbox.drain() {
        match request {
            ExternalRequest::ApplyStatus { entity, kind } => match world.entities.get_mut(&entity) {
                Some(target) => target.status_mut().request_apply(kind),
                None => tracing::debug!(entity = %entity, ?kind, "status request for unknown entity"),
            },
            ExternalRequest::RemoveEntity { entity } => {
                if let Err(err) = world.remove_entity(entity) {
                    tracing::warn!(%err, "remove request failed");
                }
            }
        }
    }
}

/// Apply status requests queued since the last tick (jobs, drinking, other threads)
fn process_status_requests(world: &mut World) {
    let now = world.clock.now();
    let mut deaths = Vec::new();
    for (id, entity) in world.entities.iter_mut() {
        let tile = entity.tile();
        let Some(status) = entity.components.status.as_mut() else {
            continue;
        };
        if !status.has_pending() {
            continue;
        }
        let changes = status.process_pending(&world.config);
        if let Some(cause) = publish_status_changes(&mut world.bus, *id, now, &changes) {
            deaths.push((*id, cause, tile));
        }
    }
    for (id, cause, tile) in deaths {
        handle_death(world, id, cause, tile);
    }
}

fn decay_needs(world: &mut World, delta_hours: f64) {
    let config = &world.config.needs;
    world.entities.par_iter_mut().for_each(|(_, entity)| {
        if entity.is_dead() {
            return;
        }
        let sleeping = entity.behaviour().map(Controller::is_sleeping).unwrap_or(false);
        if let Some(needs) = entity.components.needs.as_mut() {
            needs.decay(delta_hours as f32, config, sleeping);
        }
    });
}

fn update_behaviours(world: &mut World, delta: Delta) {
    let ids = controller_ids(world, |b| b.capabilities().per_frame);
    for id in ids {
        with_context(world, id, delta, |behaviour, ctx| behaviour.update(ctx));
    }
}

fn infrequent_update(world: &mut World, elapsed: f64, delta: Delta) {
    tracing::debug!(elapsed, now = world.clock.now(), "infrequent update");
    let now = world.clock.now();

    let ids: Vec<EntityId> = world.entities.keys().copied().collect();
    let mut deaths = Vec::new();
    for id in ids {
        if let Some(death) = update_statuses(world, id, elapsed, now) {
            deaths.push(death);
        }
    }
    for (id, cause, tile) in deaths {
        handle_death(world, id, cause, tile);
    }

    let ids = controller_ids(world, |b| b.capabilities().infrequent);
    for id in ids {
        let transition = with_context(world, id, delta, |behaviour, ctx| behaviour.infrequent_update(ctx));
        if let Some(Transition::Become(next)) = transition {
            switch_behaviour(world, id, next);
        }
    }
}

/// Living entities whose controller passes `filter`, in id order
fn controller_ids(world: &World, filter: impl Fn(&Behaviour) -> bool) -> Vec<EntityId> {
    world
        .entities
        .iter()
        .filter(|(_, e)| !e.is_dead() && e.behaviour().map(&filter).unwrap_or(false))
        .map(|(id, _)| *id)
        .collect()
}

/// Purge memories, progress statuses and rebuild mood for one entity.
/// Returns the death, if this cycle killed it.
fn update_statuses(
    world: &mut World,
    id: EntityId,
    elapsed: f64,
    now: GameTime,
) -> Option<(EntityId, DeathCause, TilePos)> {
    let config = &world.config;
    let entity = world.entities.get_mut(&id)?;
    if entity.is_dead() || (entity.needs().is_none() && entity.status().is_none()) {
        return None;
    }
    let tile = entity.tile();
    let Components {
        status,
        memory,
        needs,
        mood,
        ..
    } = &mut entity.components;

    if let Some(memory) = memory.as_mut() {
        memory.purge_expired(now);
    }
    let status = status.get_or_insert_with(StatusSet::new);
    let mood = mood.get_or_insert_with(Mood::new);
    if let Some(needs) = needs.as_ref() {
        status.apply_need_statuses(needs, &config.needs);
    }

    mood.clear();
    let ctx = StatusContext {
        now,
        needs: needs.as_ref(),
        memories: memory.as_ref(),
        needs_config: &config.needs,
    };
    let changes = status.update(elapsed, &ctx, mood, config);
    if let Some(memory) = memory.as_ref() {
        for remembered in memory.iter().filter(|m| !m.is_expired(now)) {
            let kind = remembered.kind();
            mood.add(MoodSource::Memory(kind), kind.mood_value());
        }
    }

    publish_status_changes(&mut world.bus, id, now, &changes).map(|cause| (id, cause, tile))
}

fn publish_status_changes(
    bus: &mut EventBus,
    entity: EntityId,
    at: GameTime,
    changes: &[StatusChange],
) -> Option<DeathCause> {
    let mut died = None;
    for change in changes {
        match *change {
            StatusChange::Applied(kind) => {
                tracing::debug!(entity = %entity, ?kind, "status applied");
                bus.publish(SimEvent::StatusApplied { entity, kind, at });
            }
            StatusChange::Removed(kind) => {
                tracing::debug!(entity = %entity, ?kind, "status removed");
                bus.publish(SimEvent::StatusRemoved { entity, kind, at });
            }
            StatusChange::Died(cause) => died = Some(cause),
        }
    }
    died
}

/// Turn a freshly dead entity into a corpse and let nearby settlers see it
fn handle_death(world: &mut World, id: EntityId, cause: DeathCause, tile: TilePos) {
    let now = world.clock.now();
    let Some(entity) = world.entities.get_mut(&id) else {
        return;
    };
    let previous = entity.behaviour().map(Controller::kind);
    if let Some(mut behaviour) = entity.take_behaviour() {
        behaviour.destroy(id, &mut world.ledger, &mut world.paths);
    }
    let mut corpse = Behaviour::do_nothing();
    corpse.init(id);
    entity.set_behaviour(corpse);
    let dropped = entity.components.carried.take();
    world.ledger.release_claimant(id);

    tracing::info!(entity = %id, ?cause, x = tile.x, y = tile.y, "entity died");
    world.bus.publish(SimEvent::EntityDied {
        entity: id,
        cause,
        tile,
        at: now,
    });
    if let Some(from) = previous.filter(|k| *k != ControllerKind::DoNothing) {
        world.bus.publish(SimEvent::BehaviourChanged {
            entity: id,
            from,
            to: ControllerKind::DoNothing,
        });
    }
    if let Some(carried) = dropped {
        world.spawn_item(carried.item_type, carried.material, carried.quantity, tile);
    }

    let witnesses: Vec<EntityId> = world
        .entities
        .values()
        .filter(|e| e.id() != id && !e.is_dead())
        .filter(|e| {
            matches!(
                e.behaviour().map(Controller::kind),
                Some(ControllerKind::Settler | ControllerKind::Broken)
            )
        })
        .filter(|e| e.tile().octile_distance(&tile) <= WITNESS_RADIUS)
        .map(|e| e.id())
        .collect();
    for witness in witnesses {
        if let Some(entity) = world.entities.get_mut(&witness) {
            entity
                .memory_mut()
                .record_memory(Memory::new(MemoryKind::WitnessedDeath, now));
            world.bus.publish(SimEvent::MemoryRecorded {
                entity: witness,
                kind: MemoryKind::WitnessedDeath,
            });
        }
    }
}

fn switch_behaviour(world: &mut World, id: EntityId, mut next: Behaviour) {
    let Some(entity) = world.entities.get_mut(&id) else {
        return;
    };
    let from = entity.behaviour().map(Controller::kind);
    if let Some(mut old) = entity.take_behaviour() {
        old.destroy(id, &mut world.ledger, &mut world.paths);
    }
    next.init(id);
    let to = next.kind();
    entity.set_behaviour(next);
    tracing::debug!(entity = %id, ?from, ?to, "controller switched");
    if let Some(from) = from {
        world.bus.publish(SimEvent::BehaviourChanged { entity: id, from, to });
    }
}

/// Detach the entity and its controller, run `f` with a full context, put
/// both back and apply the commands the controller issued
fn with_context<R>(
    world: &mut World,
    id: EntityId,
    delta: Delta,
    f: impl FnOnce(&mut Behaviour, &mut BehaviourContext) -> R,
) -> Option<R> {
    let mut me = world.entities.remove(&id)?;
    let Some(mut behaviour) = me.take_behaviour() else {
        world.entities.insert(id, me);
        return None;
    };

    let mut commands = Vec::new();
    let result = {
        let mut ctx = BehaviourContext {
            me: &mut me,
            others: &world.entities,
            now: world.clock.now(),
            tick: world.clock.current_tick(),
            delta_seconds: delta.seconds,
            delta_hours: delta.hours,
            config: &world.config,
            grid: &world.grid,
            dictionaries: &world.dictionaries,
            ledger: &mut world.ledger,
            stockpile: &mut world.stockpile,
            paths: &mut world.paths,
            bus: &mut world.bus,
            commands: &mut commands,
            rng: &mut world.rng,
        };
        f(&mut behaviour, &mut ctx)
    };

    me.set_behaviour(behaviour);
    world.entities.insert(id, me);
    apply_commands(world, commands);
    Some(result)
}

fn apply_commands(world: &mut World, commands: Vec<WorldCommand>) {
    for command in commands {
        match command {
            WorldCommand::TakeFromItem { item, amount } => {
                let remaining = match world.entities.get_mut(&item).and_then(|e| e.item_mut()) {
                    Some(stack) => {
                        stack.quantity = stack.quantity.saturating_sub(amount);
                        stack.quantity
                    }
                    None => continue,
                };
                if remaining == 0 {
                    if let Err(err) = world.remove_entity(item) {
                        tracing::warn!(%err, "could not remove empty stack");
                    }
                }
            }
            WorldCommand::DropItem {
                item_type,
                material,
                quantity,
                tile,
            } => {
                if quantity > 0 {
                    world.spawn_item(item_type, material, quantity, tile);
                }
            }
        }
    }
}
