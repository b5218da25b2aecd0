//! Behaviour controllers
//!
//! Every agent kind has its own controller. They form a closed set of
//! variants ([`Behaviour`]) behind one interface ([`Controller`]). Goal
//! execution is shared through [`GoalDriver`].

pub mod broken;
pub mod creature;
pub mod driver;
pub mod idle;
pub mod plans;
pub mod settler;

pub use broken::BrokenController;
pub use creature::CreatureController;
pub use driver::{GoalDriver, Plan, Step, WorkEffect};
pub use idle::DoNothingController;
pub use settler::SettlerController;

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationLedger, Stockpile};
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{EntityId, GameTime, Tick, TilePos};
use crate::data::{Dictionaries, ItemTypeId, MaterialId};
use crate::entity::goals::Goal;
use crate::entity::Entity;
use crate::events::EventBus;
use crate::pathfinding::{PathService, PathTicket, TileGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Settler,
    Creature,
    DoNothing,
    Broken,
}

impl ControllerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerKind::Settler => "settler",
            ControllerKind::Creature => "creature",
            ControllerKind::DoNothing => "do_nothing",
            ControllerKind::Broken => "broken",
        }
    }
}

/// What the scheduler may call on a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub per_frame: bool,
    pub infrequent: bool,
    pub job_assignable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BehaviourState {
    #[default]
    Idle,
    SelectingGoal,
    ExecutingGoal,
    WaitingOnPath {
        ticket: PathTicket,
    },
    Destroyed,
}

/// Changes to entities other than the one being updated. Applied by the
/// world once the update returns.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCommand {
    /// Remove units from an item stack, deleting it when empty
    TakeFromItem { item: EntityId, amount: u32 },
    /// Spawn a loose item stack
    DropItem {
        item_type: ItemTypeId,
        material: Option<MaterialId>,
        quantity: u32,
        tile: TilePos,
    },
}

/// Everything a controller may touch during one update. The updated
/// entity is held apart from `others`.
pub struct BehaviourContext<'a> {
    pub me: &'a mut Entity,
    pub others: &'a BTreeMap<EntityId, Entity>,
    pub now: GameTime,
    pub tick: Tick,
    pub delta_seconds: f32,
    pub delta_hours: f64,
    pub config: &'a SimulationConfig,
    pub grid: &'a TileGrid,
    pub dictionaries: &'a Dictionaries,
    pub ledger: &'a mut AllocationLedger,
    pub stockpile: &'a mut Stockpile,
    pub paths: &'a mut PathService,
    pub bus: &'a mut EventBus,
    pub commands: &'a mut Vec<WorldCommand>,
    pub rng: &'a mut ChaCha8Rng,
}

/// Result of an infrequent update
#[derive(Debug)]
pub enum Transition {
    Stay,
    Become(Behaviour),
}

pub trait Controller {
    fn kind(&self) -> ControllerKind;

    fn capabilities(&self) -> Capabilities;

    fn init(&mut self, me: EntityId);

    fn update(&mut self, ctx: &mut BehaviourContext);

    fn infrequent_update(&mut self, ctx: &mut BehaviourContext) -> Transition;

    /// Tear down: release every claim and drop all goals
    fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService);

    /// Independent copy for templating. Fails while work is in progress.
    fn try_clone(&self) -> Result<Behaviour>;

    /// Offer a job. Returns whether it was accepted.
    fn assign_job(&mut self, goal: Goal) -> bool;

    fn state(&self) -> BehaviourState;

    /// Whether the entity is currently asleep (pauses sleep decay)
    fn is_sleeping(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "controller", rename_all = "snake_case")]
pub enum Behaviour {
    Settler(SettlerController),
    Creature(CreatureController),
    DoNothing(DoNothingController),
    Broken(BrokenController),
}

impl Behaviour {
    pub fn settler() -> Self {
        Behaviour::Settler(SettlerController::new())
    }

    pub fn creature() -> Self {
        Behaviour::Creature(CreatureController::new())
    }

    pub fn do_nothing() -> Self {
        Behaviour::DoNothing(DoNothingController::new())
    }

    pub fn broken() -> Self {
        Behaviour::Broken(BrokenController::new())
    }

    /// Goal driver of controllers that run goals
    pub fn driver(&self) -> Option<&GoalDriver> {
        match self {
            Behaviour::Settler(c) => Some(c.driver()),
            Behaviour::Creature(c) => Some(c.driver()),
            Behaviour::Broken(c) => Some(c.driver()),
            Behaviour::DoNothing(_) => None,
        }
    }

    fn controller(&self) -> &dyn Controller {
        match self {
            Behaviour::Settler(c) => c,
            Behaviour::Creature(c) => c,
            Behaviour::DoNothing(c) => c,
            Behaviour::Broken(c) => c,
        }
    }

    fn controller_mut(&mut self) -> &mut dyn Controller {
        match self {
            Behaviour::Settler(c) => c,
            Behaviour::Creature(c) => c,
            Behaviour::DoNothing(c) => c,
            Behaviour::Broken(c) => c,
        }
    }
}

impl Controller for Behaviour {
    fn kind(&self) -> ControllerKind {
        self.controller().kind()
    }

    fn capabilities(&self) -> Capabilities {
        self.controller().capabilities()
    }

    fn init(&mut self, me: EntityId) {
        self.controller_mut().init(me)
    }

    fn update(&mut self, ctx: &mut BehaviourContext) {
        self.controller_mut().update(ctx)
    }

    fn infrequent_update(&mut self, ctx: &mut BehaviourContext) -> Transition {
        self.controller_mut().infrequent_update(ctx)
    }

    fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService) {
        self.controller_mut().destroy(me, ledger, paths)
    }

    fn try_clone(&self) -> Result<Behaviour> {
        self.controller().try_clone()
    }

    fn assign_job(&mut self, goal: Goal) -> bool {
        self.controller_mut().assign_job(goal)
    }

    fn state(&self) -> BehaviourState {
        self.controller().state()
    }

    fn is_sleeping(&self) -> bool {
        self.controller().is_sleeping()
    }
}
