//! Short-term memory ledger
//!
//! Memories expire a fixed number of hours after they occur. Expired
//! entries are purged lazily whenever the ledger is read through
//! [`MemoryLedger::short_term_memories`]; there is no capacity cap.

use serde::{Deserialize, Serialize};

use crate::core::types::GameTime;
use crate::data::{ItemTypeId, MaterialId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    AteNiceMeal,
    AteRawFood,
    DrankAlcohol,
    SleptOnGround,
    SleptInBed,
    WitnessedDeath,
    FailedToFindFood,
    FailedToFindDrink,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 8] = [
        MemoryKind::AteNiceMeal,
        MemoryKind::AteRawFood,
        MemoryKind::DrankAlcohol,
        MemoryKind::SleptOnGround,
        MemoryKind::SleptInBed,
        MemoryKind::WitnessedDeath,
        MemoryKind::FailedToFindFood,
        MemoryKind::FailedToFindDrink,
    ];

    /// How long a memory of this kind stays in short-term memory, in hours
    pub fn duration_hours(&self) -> f64 {
        match self {
            MemoryKind::AteNiceMeal => 24.0,
            MemoryKind::AteRawFood => 12.0,
            MemoryKind::DrankAlcohol => 24.0,
            MemoryKind::SleptOnGround => 24.0,
            MemoryKind::SleptInBed => 24.0,
            MemoryKind::WitnessedDeath => 72.0,
            MemoryKind::FailedToFindFood => 12.0,
            MemoryKind::FailedToFindDrink => 12.0,
        }
    }

    /// Mood contribution while the memory is remembered
    pub fn mood_value(&self) -> i32 {
        match self {
            MemoryKind::AteNiceMeal => 10,
            MemoryKind::AteRawFood => -5,
            MemoryKind::DrankAlcohol => 5,
            MemoryKind::SleptOnGround => -10,
            MemoryKind::SleptInBed => 5,
            MemoryKind::WitnessedDeath => -25,
            MemoryKind::FailedToFindFood => -5,
            MemoryKind::FailedToFindDrink => -5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Memory {
    kind: MemoryKind,
    occurred_at: GameTime,
    expires_at: GameTime,
    related_item_type: Option<ItemTypeId>,
    related_material: Option<MaterialId>,
}

impl Memory {
    pub fn new(kind: MemoryKind, now: GameTime) -> Self {
        Self {
            kind,
            occurred_at: now,
            expires_at: now + kind.duration_hours(),
            related_item_type: None,
            related_material: None,
        }
    }

    /// Rebuild a memory from persisted times; expiry is never before occurrence
    pub fn restore(
        kind: MemoryKind,
        occurred_at: GameTime,
        expires_at: GameTime,
        related_item_type: Option<ItemTypeId>,
        related_material: Option<MaterialId>,
    ) -> Self {
        Self {
            kind,
            occurred_at,
            expires_at: expires_at.max(occurred_at),
            related_item_type,
            related_material,
        }
    }

    pub fn with_item_type(mut self, item_type: ItemTypeId) -> Self {
        self.related_item_type = Some(item_type);
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.related_material = Some(material);
        self
    }

    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    pub fn occurred_at(&self) -> GameTime {
        self.occurred_at
    }

    pub fn expires_at(&self) -> GameTime {
        self.expires_at
    }

    pub fn related_item_type(&self) -> Option<ItemTypeId> {
        self.related_item_type
    }

    pub fn related_material(&self) -> Option<MaterialId> {
        self.related_material
    }

    pub fn is_expired(&self, now: GameTime) -> bool {
        now >= self.expires_at
    }

    /// Same kind about the same things, regardless of when it happened
    pub fn same_subject(&self, other: &Memory) -> bool {
        self.kind == other.kind
            && self.related_item_type == other.related_item_type
            && self.related_material == other.related_material
    }
}

/// Equality ignores occurrence and expiry time
impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.same_subject(other)
    }
}

/// Per-entity memory history, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    memories: Vec<Memory>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a memory of `kind` occurring now
    pub fn record(&mut self, kind: MemoryKind, now: GameTime) -> Memory {
        let memory = Memory::new(kind, now);
        self.record_memory(memory);
        memory
    }

    /// Record a prepared memory. An existing memory about the same subject
    /// is replaced so the newest occurrence wins.
    pub fn record_memory(&mut self, memory: Memory) {
        self.memories.retain(|m| !m.same_subject(&memory));
        self.memories.push(memory);
    }

    /// Unexpired memories, most recent first. Purges expired entries.
    pub fn short_term_memories(&mut self, now: GameTime) -> Vec<Memory> {
        self.purge_expired(now);
        let mut out = self.memories.clone();
        out.sort_by(|a, b| b.occurred_at.total_cmp(&a.occurred_at));
        out
    }

    /// Drop expired memories, returning how many were removed
    pub fn purge_expired(&mut self, now: GameTime) -> usize {
        let before = self.memories.len();
        self.memories.retain(|m| !m.is_expired(now));
        before - self.memories.len()
    }

    /// Whether an unexpired memory of `kind` exists (read only, no purge)
    pub fn has_recent(&self, kind: MemoryKind, now: GameTime) -> bool {
        self.memories
            .iter()
            .any(|m| m.kind == kind && !m.is_expired(now))
    }

    /// Sum of mood values over unexpired memories
    pub fn mood_total(&self, now: GameTime) -> i32 {
        self.memories
            .iter()
            .filter(|m| !m.is_expired(now))
            .map(|m| m.kind.mood_value())
            .sum()
    }

    /// Every stored memory, including expired ones not yet purged
    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.memories.iter()
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }
}
