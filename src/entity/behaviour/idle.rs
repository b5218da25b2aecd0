//! Controller for things that never act: items, mechanisms, corpses

use serde::{Deserialize, Serialize};

use super::{Behaviour, BehaviourContext, BehaviourState, Capabilities, Controller, ControllerKind, Transition};
use crate::allocation::AllocationLedger;
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::entity::goals::Goal;
use crate::pathfinding::PathService;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoNothingController {
    state: BehaviourState,
}

impl DoNothingController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Controller for DoNothingController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::DoNothing
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_frame: false,
            infrequent: false,
            job_assignable: false,
        }
    }

    fn init(&mut self, _me: EntityId) {
        self.state = BehaviourState::Idle;
    }

    fn update(&mut self, _ctx: &mut BehaviourContext) {}

    fn infrequent_update(&mut self, _ctx: &mut BehaviourContext) -> Transition {
        Transition::Stay
    }

    fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService) {
        ledger.release_claimant(me);
        paths.cancel_entity(me);
        self.state = BehaviourState::Destroyed;
    }

    fn try_clone(&self) -> Result<Behaviour> {
        Ok(Behaviour::DoNothing(self.clone()))
    }

    fn assign_job(&mut self, _goal: Goal) -> bool {
        false
    }

    fn state(&self) -> BehaviourState {
        self.state
    }
}
