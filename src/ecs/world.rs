//! World - owns every entity and the services they share

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::allocation::{AllocationLedger, ResourceRef, Stockpile};
use crate::core::clock::GameClock;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::ids::IdGenerator;
use crate::core::types::{EntityId, GameTime, Tick, TilePos};
use crate::data::{Dictionaries, ItemTypeId, MaterialId};
use crate::entity::behaviour::{Behaviour, Controller};
use crate::entity::goals::Goal;
use crate::entity::needs::{Mood, Needs};
use crate::entity::status::{StatusKind, StatusSet};
use crate::entity::{
    CreatureAttributes, Entity, EntityAttributes, ItemAttributes, MechanismAttributes, PlantAttributes,
};
use crate::events::{EventBus, RequestInbox, RequestSender, SimEvent};
use crate::pathfinding::{PathService, TileGrid};
use crate::simulation::tick::run_simulation_tick;

/// Body and profession names given to spawned settlers
pub const SETTLER_BODY: &str = "dwarf";
pub const SETTLER_PROFESSION: &str = "villager";

/// The game world containing all entities
#[derive(Debug)]
pub struct World {
    pub clock: GameClock,
    pub config: SimulationConfig,
    pub grid: TileGrid,
    pub dictionaries: Dictionaries,
    pub ledger: AllocationLedger,
    pub stockpile: Stockpile,
    pub paths: PathService,
    pub bus: EventBus,
    pub(crate) ids: IdGenerator,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) inbox: RequestInbox,
    pub(crate) rng: ChaCha8Rng,
}

impl World {
    pub fn new(config: SimulationConfig, grid: TileGrid, dictionaries: Dictionaries) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            clock: GameClock::new(),
            config,
            grid,
            dictionaries,
            ledger: AllocationLedger::new(),
            stockpile: Stockpile::new(),
            paths: PathService::new(),
            bus: EventBus::new(),
            ids: IdGenerator::new(),
            entities: BTreeMap::new(),
            inbox: RequestInbox::new(),
            rng,
        }
    }

    /// Spawn a settler with the default body and profession
    pub fn spawn_settler(&mut self, name: &str, tile: TilePos) -> Result<EntityId> {
        let attributes = CreatureAttributes {
            name: name.to_string(),
            body: self.dictionaries.resolve_body(SETTLER_BODY)?,
            profession: Some(self.dictionaries.resolve_profession(SETTLER_PROFESSION)?),
        };
        Ok(self.spawn_creature(attributes, tile, Behaviour::settler()))
    }

    /// Spawn an animal driven by the creature controller
    pub fn spawn_animal(&mut self, name: &str, body: &str, tile: TilePos) -> Result<EntityId> {
        let attributes = CreatureAttributes {
            name: name.to_string(),
            body: self.dictionaries.resolve_body(body)?,
            profession: None,
        };
        Ok(self.spawn_creature(attributes, tile, Behaviour::creature()))
    }

    /// Spawn any creature with needs, status, memory and mood attached
    pub fn spawn_creature(&mut self, attributes: CreatureAttributes, tile: TilePos, behaviour: Behaviour) -> EntityId {
        let id = self.ids.next_id();
        let mut entity = Entity::new(id, tile.center(), EntityAttributes::Creature(attributes));
        entity.components.needs = Some(Needs::default());
        entity.components.status = Some(StatusSet::new());
        entity.components.mood = Some(Mood::new());
        entity.memory_mut();
        self.insert(entity, behaviour);
        id
    }

    /// Spawn an item stack and register its quantity with the ledger
    pub fn spawn_item(
        &mut self,
        item_type: ItemTypeId,
        material: Option<MaterialId>,
        quantity: u32,
        tile: TilePos,
    ) -> EntityId {
        let id = self.ids.next_id();
        let entity = Entity::new(
            id,
            tile.center(),
            EntityAttributes::Item(ItemAttributes {
                item_type,
                material,
                quantity,
            }),
        );
        self.ledger.set_total(ResourceRef::Item(id), quantity);
        self.insert(entity, Behaviour::do_nothing());
        id
    }

    /// Spawn an item stack by dictionary names
    pub fn spawn_item_named(
        &mut self,
        item_type: &str,
        material: Option<&str>,
        quantity: u32,
        tile: TilePos,
    ) -> Result<EntityId> {
        let item_type = self.dictionaries.resolve_item_type(item_type)?;
        let material = material
            .map(|m| self.dictionaries.resolve_material(m))
            .transpose()?;
        Ok(self.spawn_item(item_type, material, quantity, tile))
    }

    pub fn spawn_mechanism(&mut self, name: &str, tile: TilePos) -> EntityId {
        let id = self.ids.next_id();
        let entity = Entity::new(
            id,
            tile.center(),
            EntityAttributes::Mechanism(MechanismAttributes {
                name: name.to_string(),
                powered: false,
            }),
        );
        self.insert(entity, Behaviour::do_nothing());
        id
    }

    pub fn spawn_plant(&mut self, species: &str, tile: TilePos) -> EntityId {
        let id = self.ids.next_id();
        let entity = Entity::new(
            id,
            tile.center(),
            EntityAttributes::Plant(PlantAttributes {
                species: species.to_string(),
                growth: 0.0,
            }),
        );
        self.insert(entity, Behaviour::do_nothing());
        id
    }

    fn insert(&mut self, mut entity: Entity, mut behaviour: Behaviour) {
        let id = entity.id();
        behaviour.init(id);
        entity.set_behaviour(behaviour);
        tracing::debug!(entity = %id, kind = ?entity.kind(), "spawned");
        self.entities.insert(id, entity);
    }

    pub fn add_stockpile_slot(&mut self, tile: TilePos) {
        self.stockpile.add_slot(tile, &mut self.ledger);
    }

    /// Destroy an entity: its controller is torn down, every claim it held
    /// is released and anything it carried is dropped where it stood
    pub fn remove_entity(&mut self, id: EntityId) -> Result<()> {
        let mut entity = self.entities.remove(&id).ok_or(SimError::EntityNotFound(id))?;
        if let Some(mut behaviour) = entity.take_behaviour() {
            behaviour.destroy(id, &mut self.ledger, &mut self.paths);
        }
        self.ledger.release_claimant(id);
        self.paths.cancel_entity(id);
        if entity.item().is_some() {
            let orphaned = self.ledger.remove_resource(ResourceRef::Item(id));
            if !orphaned.is_empty() {
                tracing::debug!(entity = %id, claims = orphaned.len(), "claims on removed stack dropped");
            }
        }
        if let Some(carried) = entity.components.carried.take() {
            self.spawn_item(carried.item_type, carried.material, carried.quantity, entity.tile());
        }
        tracing::info!(entity = %id, "entity removed");
        self.bus.publish(SimEvent::EntityRemoved { entity: id });
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities in id order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn living_count(&self) -> usize {
        self.entities.values().filter(|e| !e.is_dead()).count()
    }

    /// Queue a status application; it takes effect at the start of the next tick
    pub fn apply_status(&mut self, id: EntityId, kind: StatusKind) -> Result<()> {
        let entity = self.entities.get_mut(&id).ok_or(SimError::EntityNotFound(id))?;
        entity.status_mut().request_apply(kind);
        Ok(())
    }

    /// Offer a job to an entity. Returns whether its controller accepted it.
    pub fn assign_job(&mut self, id: EntityId, goal: Goal) -> Result<bool> {
        let entity = self.entities.get_mut(&id).ok_or(SimError::EntityNotFound(id))?;
        let action = goal.action();
        let accepted = !entity.is_dead()
            && entity.behaviour().map(|b| b.capabilities().job_assignable).unwrap_or(false)
            && entity.behaviour_mut().assign_job(goal);
        if !accepted {
            tracing::debug!(entity = %id, ?action, "job rejected");
            self.bus.publish(SimEvent::JobRejected { entity: id, action });
        }
        Ok(accepted)
    }

    /// Handle for other threads to send requests into the simulation
    pub fn request_sender(&self) -> RequestSender {
        self.inbox.sender()
    }

    /// Advance the simulation by `delta_seconds` of real time
    pub fn tick(&mut self, delta_seconds: f32) -> Vec<SimEvent> {
        run_simulation_tick(self, delta_seconds)
    }

    pub fn now(&self) -> GameTime {
        self.clock.now()
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick()
    }

    /// Next id the generator will issue
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default(), TileGrid::new(32, 32), Dictionaries::with_defaults())
    }
}
