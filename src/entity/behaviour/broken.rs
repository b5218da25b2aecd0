//! Incapacitated settler
//!
//! Only ever idles and refuses all work until its mood recovers, then hands
//! control back to a fresh settler controller.

use serde::{Deserialize, Serialize};

use super::driver::GoalDriver;
use super::plans::plan_idle;
use super::{Behaviour, BehaviourContext, BehaviourState, Capabilities, Controller, ControllerKind, Transition};
use crate::allocation::AllocationLedger;
use crate::core::error::{Result, SimError};
use crate::core::types::EntityId;
use crate::entity::goals::Goal;
use crate::pathfinding::PathService;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokenController {
    driver: GoalDriver,
}

impl BrokenController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> &GoalDriver {
        &self.driver
    }
}

impl Controller for BrokenController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Broken
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_frame: true,
            infrequent: true,
            job_assignable: false,
        }
    }

    fn init(&mut self, me: EntityId) {
        self.driver.init();
        tracing::debug!(entity = %me, "broken controller attached");
    }

    fn update(&mut self, ctx: &mut BehaviourContext) {
        self.driver.update(ctx, plan_idle);
    }

    fn infrequent_update(&mut self, ctx: &mut BehaviourContext) -> Transition {
        let mood = ctx.me.mood_total();
        if mood > ctx.config.mood.mental_recovery_threshold {
            self.driver.interrupt(ctx);
            tracing::info!(entity = %ctx.me.id(), mood, "recovered from mental break");
            return Transition::Become(Behaviour::settler());
        }
        let idle = Goal::idle(ctx.me.id(), ctx.tick);
        self.driver.select(vec![idle], ctx, plan_idle);
        Transition::Stay
    }

    fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService) {
        self.driver.destroy(me, ledger, paths);
    }

    fn try_clone(&self) -> Result<Behaviour> {
        if self.driver.has_goal_in_flight() {
            return Err(SimError::Unsupported {
                operation: "clone",
                variant: "broken controller with a goal in flight",
            });
        }
        Ok(Behaviour::Broken(self.clone()))
    }

    fn assign_job(&mut self, _goal: Goal) -> bool {
        false
    }

    fn state(&self) -> BehaviourState {
        self.driver.state()
    }
}
