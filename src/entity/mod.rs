//! Entities and their attached components
//!
//! An entity is an id, a position, a kind-specific attribute payload and a
//! set of optional components. Components are created the first time they
//! are asked for mutably.

pub mod behaviour;
pub mod goals;
pub mod memory;
pub mod needs;
pub mod status;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, EntityKind, TilePos, Vec2};
use crate::data::{BodyId, ItemTypeId, MaterialId, ProfessionId};

use behaviour::Behaviour;
use memory::MemoryLedger;
use needs::{Mood, Needs};
use status::StatusSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CreatureAttributes {
    pub name: String,
    pub body: BodyId,
    pub profession: Option<ProfessionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemAttributes {
    pub item_type: ItemTypeId,
    pub material: Option<MaterialId>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismAttributes {
    pub name: String,
    pub powered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantAttributes {
    pub species: String,
    /// 0.0 = seedling, 1.0 = mature
    pub growth: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityAttributes {
    Creature(CreatureAttributes),
    Item(ItemAttributes),
    Mechanism(MechanismAttributes),
    Plant(PlantAttributes),
}

/// Items held by a hauler between pick-up and deposit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Carried {
    pub item_type: ItemTypeId,
    pub material: Option<MaterialId>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Components {
    pub behaviour: Option<Behaviour>,
    pub status: Option<StatusSet>,
    pub memory: Option<MemoryLedger>,
    pub needs: Option<Needs>,
    pub mood: Option<Mood>,
    pub carried: Option<Carried>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub position: Vec2,
    pub attributes: EntityAttributes,
    pub components: Components,
}

impl Entity {
    pub fn new(id: EntityId, position: Vec2, attributes: EntityAttributes) -> Self {
        Self {
            id,
            position,
            attributes,
            components: Components::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        match self.attributes {
            EntityAttributes::Creature(_) => EntityKind::Creature,
            EntityAttributes::Item(_) => EntityKind::Item,
            EntityAttributes::Mechanism(_) => EntityKind::Mechanism,
            EntityAttributes::Plant(_) => EntityKind::Plant,
        }
    }

    pub fn tile(&self) -> TilePos {
        self.position.tile()
    }

    pub fn name(&self) -> Option<&str> {
        match &self.attributes {
            EntityAttributes::Creature(c) => Some(&c.name),
            EntityAttributes::Mechanism(m) => Some(&m.name),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&ItemAttributes> {
        match &self.attributes {
            EntityAttributes::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn item_mut(&mut self) -> Option<&mut ItemAttributes> {
        match &mut self.attributes {
            EntityAttributes::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn behaviour(&self) -> Option<&Behaviour> {
        self.components.behaviour.as_ref()
    }

    pub fn behaviour_mut(&mut self) -> &mut Behaviour {
        self.components.behaviour.get_or_insert_with(Behaviour::do_nothing)
    }

    pub fn take_behaviour(&mut self) -> Option<Behaviour> {
        self.components.behaviour.take()
    }

    pub fn set_behaviour(&mut self, behaviour: Behaviour) {
        self.components.behaviour = Some(behaviour);
    }

    pub fn status(&self) -> Option<&StatusSet> {
        self.components.status.as_ref()
    }

    pub fn status_mut(&mut self) -> &mut StatusSet {
        self.components.status.get_or_insert_with(StatusSet::new)
    }

    pub fn memory(&self) -> Option<&MemoryLedger> {
        self.components.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> &mut MemoryLedger {
        self.components.memory.get_or_insert_with(MemoryLedger::new)
    }

    pub fn needs(&self) -> Option<&Needs> {
        self.components.needs.as_ref()
    }

    pub fn needs_mut(&mut self) -> &mut Needs {
        self.components.needs.get_or_insert_with(Needs::default)
    }

    pub fn mood(&self) -> Option<&Mood> {
        self.components.mood.as_ref()
    }

    pub fn mood_mut(&mut self) -> &mut Mood {
        self.components.mood.get_or_insert_with(Mood::new)
    }

    pub fn mood_total(&self) -> i32 {
        self.mood().map(Mood::total).unwrap_or(0)
    }

    pub fn is_dead(&self) -> bool {
        self.status().map(StatusSet::is_dead).unwrap_or(false)
    }
}
