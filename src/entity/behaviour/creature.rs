//! Animal controller: eats when hungry, otherwise wanders about

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::driver::{GoalDriver, Plan};
use super::plans::{plan_eat, plan_idle, plan_wander};
use super::settler::urgency;
use super::{Behaviour, BehaviourContext, BehaviourState, Capabilities, Controller, ControllerKind, Transition};
use crate::allocation::AllocationLedger;
use crate::core::error::{Result, SimError};
use crate::core::types::EntityId;
use crate::entity::goals::{Goal, GoalAction, GoalPriority};
use crate::pathfinding::PathService;

/// Chance per infrequent update that an idle animal goes for a stroll
const WANDER_CHANCE: f64 = 0.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatureController {
    driver: GoalDriver,
}

impl CreatureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> &GoalDriver {
        &self.driver
    }
}

fn plan(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    match goal.action() {
        GoalAction::Eat => plan_eat(goal, ctx),
        GoalAction::Wander => plan_wander(goal, ctx),
        _ => plan_idle(goal, ctx),
    }
}

impl Controller for CreatureController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Creature
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_frame: true,
            infrequent: true,
            job_assignable: false,
        }
    }

    fn init(&mut self, _me: EntityId) {
        self.driver.init();
    }

    fn update(&mut self, ctx: &mut BehaviourContext) {
        self.driver.update(ctx, plan);
    }

    fn infrequent_update(&mut self, ctx: &mut BehaviourContext) -> Transition {
        if self.driver.has_goal_in_flight() {
            return Transition::Stay;
        }
        let me = ctx.me.id();
        let food = ctx.me.needs().map(|n| n.food).unwrap_or(100.0);
        let cfg = &ctx.config.needs;

        let mut goals = Vec::new();
        if food < cfg.seek_threshold {
            goals.push(Goal::new(
                GoalAction::Eat,
                me,
                urgency(food, cfg.hungry_threshold),
                ctx.tick,
            ));
        }
        if ctx.rng.gen_bool(WANDER_CHANCE) {
            goals.push(Goal::new(GoalAction::Wander, me, GoalPriority::Low, ctx.tick));
        }
        self.driver.select(goals, ctx, plan);
        Transition::Stay
    }

    fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService) {
        self.driver.destroy(me, ledger, paths);
    }

    fn try_clone(&self) -> Result<Behaviour> {
        if self.driver.has_goal_in_flight() {
            return Err(SimError::Unsupported {
                operation: "clone",
                variant: "creature with a goal in flight",
            });
        }
        Ok(Behaviour::Creature(self.clone()))
    }

    fn assign_job(&mut self, _goal: Goal) -> bool {
        false
    }

    fn state(&self) -> BehaviourState {
        self.driver.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creatures_refuse_jobs() {
        let mut creature = CreatureController::new();
        let job = Goal::new(GoalAction::Haul, EntityId(2), GoalPriority::High, 0);
        assert!(!creature.assign_job(job));
        assert!(creature.driver().queue().is_empty());
        assert!(!creature.capabilities().job_assignable);
    }
}
