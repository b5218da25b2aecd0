//! Save documents
//!
//! A [`SaveDocument`] is a plain serde tree. Runtime components keep compact
//! dictionary ids; the document stores dictionary *names* instead so a save
//! survives reordered or extended dictionaries. Loading resolves every name
//! and aborts on the first one it cannot find.

pub mod autosave;

use std::collections::BTreeSet;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationLedger, ResourceRef, StockpileSlot};
use crate::core::clock::GameClock;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::ids::IdGenerator;
use crate::core::types::{EntityId, GameTime, TilePos, Vec2};
use crate::data::Dictionaries;
use crate::ecs::world::World;
use crate::entity::behaviour::{Behaviour, BehaviourState, Controller};
use crate::entity::memory::{Memory, MemoryKind, MemoryLedger};
use crate::entity::needs::{Mood, Needs};
use crate::entity::status::StatusSet;
use crate::entity::{
    Carried, Components, CreatureAttributes, Entity, EntityAttributes, ItemAttributes, MechanismAttributes,
    PlantAttributes,
};
use crate::pathfinding::TileGrid;

/// Bumped whenever the document layout changes incompatibly
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDocument {
    pub version: u32,
    pub clock: GameClock,
    pub next_id: u64,
    pub grid: TileGrid,
    pub entities: Vec<EntityRecord>,
    pub ledger: AllocationLedger,
    pub stockpile: Vec<SlotRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributesRecord {
    Creature {
        name: String,
        body: String,
        profession: Option<String>,
    },
    Item {
        item_type: String,
        material: Option<String>,
        quantity: u32,
    },
    Mechanism(MechanismAttributes),
    Plant(PlantAttributes),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub kind: MemoryKind,
    pub occurred_at: GameTime,
    pub expires_at: GameTime,
    pub item_type: Option<String>,
    pub material: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarriedRecord {
    pub item_type: String,
    pub material: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub position: Vec2,
    pub attributes: AttributesRecord,
    #[serde(default)]
    pub behaviour: Option<Behaviour>,
    #[serde(default)]
    pub status: Option<StatusSet>,
    #[serde(default)]
    pub memories: Option<Vec<MemoryRecord>>,
    #[serde(default)]
    pub needs: Option<Needs>,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub carried: Option<CarriedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRecord {
    pub tile: TilePos,
    pub item_type: Option<String>,
    pub stored: u32,
    pub capacity: u32,
    #[serde(default)]
    pub reserved_for: Option<String>,
}

impl SaveDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.version != SAVE_VERSION {
            return Err(SimError::CorruptSave(format!(
                "unsupported save version {} (expected {SAVE_VERSION})",
                doc.version
            )));
        }
        Ok(doc)
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn save_entity(entity: &Entity, dicts: &Dictionaries) -> Result<EntityRecord> {
    let attributes = match &entity.attributes {
        EntityAttributes::Creature(c) => AttributesRecord::Creature {
            name: c.name.clone(),
            body: dicts.body_name(c.body)?,
            profession: c.profession.map(|p| dicts.profession_name(p)).transpose()?,
        },
        EntityAttributes::Item(item) => AttributesRecord::Item {
            item_type: dicts.item_type_name(item.item_type)?,
            material: item.material.map(|m| dicts.material_name(m)).transpose()?,
            quantity: item.quantity,
        },
        EntityAttributes::Mechanism(m) => AttributesRecord::Mechanism(m.clone()),
        EntityAttributes::Plant(p) => AttributesRecord::Plant(p.clone()),
    };

    let memories = entity
        .memory()
        .map(|ledger| {
            ledger
                .iter()
                .map(|m| {
                    Ok(MemoryRecord {
                        kind: m.kind(),
                        occurred_at: m.occurred_at(),
                        expires_at: m.expires_at(),
                        item_type: m.related_item_type().map(|t| dicts.item_type_name(t)).transpose()?,
                        material: m.related_material().map(|t| dicts.material_name(t)).transpose()?,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let carried = entity
        .components
        .carried
        .map(|c| -> Result<CarriedRecord> {
            Ok(CarriedRecord {
                item_type: dicts.item_type_name(c.item_type)?,
                material: c.material.map(|m| dicts.material_name(m)).transpose()?,
                quantity: c.quantity,
            })
        })
        .transpose()?;

    Ok(EntityRecord {
        id: entity.id(),
        position: entity.position,
        attributes,
        behaviour: entity.components.behaviour.clone(),
        status: entity.components.status.clone(),
        memories,
        needs: entity.components.needs.clone(),
        mood: entity.components.mood.clone(),
        carried,
    })
}

fn load_entity(record: EntityRecord, dicts: &Dictionaries) -> Result<Entity> {
    let attributes = match record.attributes {
        AttributesRecord::Creature { name, body, profession } => EntityAttributes::Creature(CreatureAttributes {
            name,
            body: dicts.resolve_body(&body)?,
            profession: profession.map(|p| dicts.resolve_profession(&p)).transpose()?,
        }),
        AttributesRecord::Item {
            item_type,
            material,
            quantity,
        } => EntityAttributes::Item(ItemAttributes {
            item_type: dicts.resolve_item_type(&item_type)?,
            material: material.map(|m| dicts.resolve_material(&m)).transpose()?,
            quantity,
        }),
        AttributesRecord::Mechanism(m) => EntityAttributes::Mechanism(m),
        AttributesRecord::Plant(p) => EntityAttributes::Plant(p),
    };

    let memory = match record.memories {
        Some(records) => {
            let mut ledger = MemoryLedger::new();
            for m in records {
                ledger.record_memory(Memory::restore(
                    m.kind,
                    m.occurred_at,
                    m.expires_at,
                    m.item_type.map(|t| dicts.resolve_item_type(&t)).transpose()?,
                    m.material.map(|t| dicts.resolve_material(&t)).transpose()?,
                ));
            }
            Some(ledger)
        }
        None => None,
    };

    let carried = match record.carried {
        Some(c) => Some(Carried {
            item_type: dicts.resolve_item_type(&c.item_type)?,
            material: c.material.map(|m| dicts.resolve_material(&m)).transpose()?,
            quantity: c.quantity,
        }),
        None => None,
    };

    let mut entity = Entity::new(record.id, record.position, attributes);
    entity.components = Components {
        behaviour: record.behaviour,
        status: record.status,
        memory,
        needs: record.needs,
        mood: record.mood,
        carried,
    };
    Ok(entity)
}

impl World {
    /// Snapshot the world into a save document
    pub fn save(&self) -> Result<SaveDocument> {
        let entities = self
            .entities
            .values()
            .map(|e| save_entity(e, &self.dictionaries))
            .collect::<Result<Vec<_>>>()?;
        let stockpile = self
            .stockpile
            .slots()
            .iter()
            .map(|slot| -> Result<SlotRecord> {
                Ok(SlotRecord {
                    tile: slot.tile,
                    item_type: slot.item_type.map(|t| self.dictionaries.item_type_name(t)).transpose()?,
                    stored: slot.stored,
                    capacity: slot.capacity,
                    reserved_for: slot
                        .reserved_for
                        .map(|t| self.dictionaries.item_type_name(t))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            entities = entities.len(),
            tick = self.clock.current_tick(),
            "world saved"
        );
        Ok(SaveDocument {
            version: SAVE_VERSION,
            clock: self.clock.clone(),
            next_id: self.ids.peek(),
            grid: self.grid.clone(),
            entities,
            ledger: self.ledger.clone(),
            stockpile,
        })
    }

    /// Rebuild a world from a save document. Nothing is kept from a failed
    /// load: every name must resolve and every id must be unique.
    pub fn load(doc: SaveDocument, dictionaries: Dictionaries, config: SimulationConfig) -> Result<World> {
        config.validate()?;
        let seed = config.seed ^ doc.clock.current_tick();
        let mut world = World::new(config, doc.grid, dictionaries);
        world.clock = doc.clock;
        world.ledger = doc.ledger;
        world.ids = IdGenerator::starting_at(doc.next_id);

        let mut seen = BTreeSet::new();
        for record in doc.entities {
            let id = record.id;
            if !seen.insert(id) {
                return Err(SimError::CorruptSave(format!("duplicate entity id {id}")));
            }
            let mut entity = load_entity(record, &world.dictionaries)?;
            if let Some(behaviour) = entity.components.behaviour.as_mut() {
                behaviour.init(id);
                if let BehaviourState::WaitingOnPath { ticket } = behaviour.state() {
                    world.paths.resume_after(ticket);
                }
            }
            if let Some(item) = entity.item() {
                if !world.ledger.is_registered(ResourceRef::Item(id)) {
                    world.ledger.set_total(ResourceRef::Item(id), item.quantity);
                }
            }
            world.ids.observe(id);
            world.entities.insert(id, entity);
        }

        for slot in doc.stockpile {
            let item_type = slot
                .item_type
                .map(|t| world.dictionaries.resolve_item_type(&t))
                .transpose()?;
            let reserved_for = slot
                .reserved_for
                .map(|t| world.dictionaries.resolve_item_type(&t))
                .transpose()?;
            world.stockpile.restore_slot(StockpileSlot {
                tile: slot.tile,
                item_type,
                stored: slot.stored,
                capacity: slot.capacity,
                reserved_for,
            });
        }

        world.rng = ChaCha8Rng::seed_from_u64(seed);
        tracing::info!(
            entities = world.entities.len(),
            tick = world.clock.current_tick(),
            "world loaded"
        );
        Ok(world)
    }

    /// Save straight to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.save()?.write_file(path)
    }

    pub fn load_from_file(path: &Path, dictionaries: Dictionaries, config: SimulationConfig) -> Result<World> {
        World::load(SaveDocument::read_file(path)?, dictionaries, config)
    }
}
