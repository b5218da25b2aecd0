//! Read-only definition dictionaries
//!
//! Item types, materials, professions and body structures are looked up by
//! stable string name. Runtime components hold compact ids; save documents
//! hold names, which are resolved back to ids at load time.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfessionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTypeDef {
    pub name: String,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    /// Food restored per unit eaten
    #[serde(default)]
    pub food_value: Option<f32>,
    /// Drink restored per unit drunk
    #[serde(default)]
    pub drink_value: Option<f32>,
    #[serde(default)]
    pub alcoholic: bool,
    /// Eaten without preparation; leaves a worse memory
    #[serde(default)]
    pub raw: bool,
}

fn default_max_stack() -> u32 {
    1
}

impl ItemTypeDef {
    pub fn is_edible(&self) -> bool {
        self.food_value.is_some()
    }

    pub fn is_drinkable(&self) -> bool {
        self.drink_value.is_some()
    }

    pub fn is_consumable(&self) -> bool {
        self.is_edible() || self.is_drinkable()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionDef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub name: String,
    #[serde(default)]
    pub organs: Vec<String>,
}

/// Anything stored in a [`Dictionary`] is looked up by its name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for ItemTypeDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for MaterialDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ProfessionDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for BodyDef {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Name-indexed list of definitions; the index of an entry is its id
#[derive(Debug, Clone)]
pub struct Dictionary<T> {
    label: &'static str,
    entries: Vec<T>,
    by_name: AHashMap<String, u32>,
}

impl<T: Named> Dictionary<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Add a definition, replacing any existing entry with the same name
    pub fn insert(&mut self, def: T) -> u32 {
        if let Some(&index) = self.by_name.get(def.name()) {
            self.entries[index as usize] = def;
            return index;
        }
        let index = self.entries.len() as u32;
        self.by_name.insert(def.name().to_string(), index);
        self.entries.push(def);
        index
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.entries.get(index as usize)
    }

    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Resolve a name or fail the surrounding load
    pub fn resolve(&self, name: &str) -> Result<u32> {
        self.lookup(name).ok_or_else(|| SimError::UnresolvedReference {
            dictionary: self.label,
            name: name.to_string(),
        })
    }

    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.get(index).map(|d| d.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().enumerate().map(|(i, d)| (i as u32, d))
    }
}

#[derive(Debug, Clone)]
pub struct Dictionaries {
    pub item_types: Dictionary<ItemTypeDef>,
    pub materials: Dictionary<MaterialDef>,
    pub professions: Dictionary<ProfessionDef>,
    pub bodies: Dictionary<BodyDef>,
}

impl Dictionaries {
    pub fn empty() -> Self {
        Self {
            item_types: Dictionary::new("item type"),
            materials: Dictionary::new("material"),
            professions: Dictionary::new("profession"),
            bodies: Dictionary::new("body"),
        }
    }

    /// Built-in definitions used by the demo world and tests
    pub fn with_defaults() -> Self {
        let mut dicts = Self::empty();
        let item = |name: &str, max_stack: u32| ItemTypeDef {
            name: name.into(),
            max_stack,
            food_value: None,
            drink_value: None,
            alcoholic: false,
            raw: false,
        };
        dicts.item_types.insert(ItemTypeDef {
            food_value: Some(60.0),
            ..item("bread", 20)
        });
        dicts.item_types.insert(ItemTypeDef {
            food_value: Some(35.0),
            raw: true,
            ..item("raw_meat", 10)
        });
        dicts.item_types.insert(ItemTypeDef {
            drink_value: Some(60.0),
            ..item("water_barrel", 50)
        });
        dicts.item_types.insert(ItemTypeDef {
            drink_value: Some(50.0),
            alcoholic: true,
            ..item("ale", 50)
        });
        dicts.item_types.insert(item("log", 100));
        dicts.item_types.insert(item("stone_block", 100));

        for material in ["wheat", "beef", "water", "barley", "oak", "granite"] {
            dicts.materials.insert(MaterialDef { name: material.into() });
        }
        for profession in ["villager", "farmer", "hauler", "brewer"] {
            dicts.professions.insert(ProfessionDef { name: profession.into() });
        }
        dicts.bodies.insert(BodyDef {
            name: "dwarf".into(),
            organs: vec!["heart".into(), "lungs".into(), "stomach".into()],
        });
        dicts.bodies.insert(BodyDef {
            name: "goat".into(),
            organs: vec!["heart".into(), "stomach".into()],
        });
        dicts
    }

    /// Load dictionaries from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        let data: TomlDictionaries = toml::from_str(content)?;
        let mut dicts = Self::empty();
        for def in data.item_types {
            dicts.item_types.insert(def);
        }
        for def in data.materials {
            dicts.materials.insert(def);
        }
        for def in data.professions {
            dicts.professions.insert(def);
        }
        for def in data.bodies {
            dicts.bodies.insert(def);
        }
        Ok(dicts)
    }

    pub fn item_type(&self, id: ItemTypeId) -> Option<&ItemTypeDef> {
        self.item_types.get(id.0)
    }

    pub fn resolve_item_type(&self, name: &str) -> Result<ItemTypeId> {
        self.item_types.resolve(name).map(ItemTypeId)
    }

    pub fn resolve_material(&self, name: &str) -> Result<MaterialId> {
        self.materials.resolve(name).map(MaterialId)
    }

    pub fn resolve_profession(&self, name: &str) -> Result<ProfessionId> {
        self.professions.resolve(name).map(ProfessionId)
    }

    pub fn resolve_body(&self, name: &str) -> Result<BodyId> {
        self.bodies.resolve(name).map(BodyId)
    }

    pub fn item_type_name(&self, id: ItemTypeId) -> Result<String> {
        name_or_error(self.item_types.name_of(id.0), "item type", id.0)
    }

    pub fn material_name(&self, id: MaterialId) -> Result<String> {
        name_or_error(self.materials.name_of(id.0), "material", id.0)
    }

    pub fn profession_name(&self, id: ProfessionId) -> Result<String> {
        name_or_error(self.professions.name_of(id.0), "profession", id.0)
    }

    pub fn body_name(&self, id: BodyId) -> Result<String> {
        name_or_error(self.bodies.name_of(id.0), "body", id.0)
    }
}

impl Default for Dictionaries {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn name_or_error(name: Option<&str>, dictionary: &'static str, id: u32) -> Result<String> {
    name.map(str::to_string)
        .ok_or_else(|| SimError::UnresolvedReference {
            dictionary,
            name: format!("<id {id}>"),
        })
}

/// TOML representation of a dictionaries file
#[derive(Debug, Deserialize)]
struct TomlDictionaries {
    #[serde(default)]
    item_types: Vec<ItemTypeDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
    #[serde(default)]
    professions: Vec<ProfessionDef>,
    #[serde(default)]
    bodies: Vec<BodyDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve_by_name() {
        let dicts = Dictionaries::with_defaults();
        let bread = dicts.resolve_item_type("bread").unwrap();
        assert!(dicts.item_type(bread).unwrap().is_edible());
        assert_eq!(dicts.item_type_name(bread).unwrap(), "bread");
        assert!(dicts.resolve_material("oak").is_ok());
    }

    #[test]
    fn test_unknown_name_is_hard_error() {
        let dicts = Dictionaries::with_defaults();
        match dicts.resolve_material("unobtainium") {
            Err(SimError::UnresolvedReference { dictionary, name }) => {
                assert_eq!(dictionary, "material");
                assert_eq!(name, "unobtainium");
            }
            other => panic!("expected unresolved reference, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut dict: Dictionary<MaterialDef> = Dictionary::new("material");
        let a = dict.insert(MaterialDef { name: "oak".into() });
        let b = dict.insert(MaterialDef { name: "oak".into() });
        assert_eq!(a, b);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_parse_toml() {
        let dicts = Dictionaries::parse_toml(
            r#"
            [[item_types]]
            name = "mead"
            max_stack = 30
            drink_value = 40.0
            alcoholic = true

            [[materials]]
            name = "honey"
            "#,
        )
        .unwrap();
        let mead = dicts.resolve_item_type("mead").unwrap();
        let def = dicts.item_type(mead).unwrap();
        assert!(def.alcoholic && def.is_drinkable());
        assert_eq!(def.max_stack, 30);
        assert!(dicts.resolve_item_type("bread").is_err());
    }
}
