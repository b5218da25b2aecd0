//! Settler controller
//!
//! Looks after its own needs first, then hauls loose stacks to the
//! stockpile. Accepts assigned jobs. Breaks down when mood gets too low.

use serde::{Deserialize, Serialize};

use super::driver::{GoalDriver, Plan};
use super::plans::{haul_available, plan_drink, plan_eat, plan_haul, plan_idle, plan_sleep, plan_wander};
use super::{Behaviour, BehaviourContext, BehaviourState, Capabilities, Controller, ControllerKind, Transition};
use crate::allocation::AllocationLedger;
use crate::core::error::{Result, SimError};
use crate::core::types::EntityId;
use crate::entity::goals::{Goal, GoalAction, GoalPriority};
use crate::events::SimEvent;
use crate::pathfinding::PathService;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlerController {
    driver: GoalDriver,
}

impl SettlerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self) -> &GoalDriver {
        &self.driver
    }
}

/// High once the need has crossed its status threshold
pub(crate) fn urgency(value: f32, threshold: f32) -> GoalPriority {
    if value < threshold {
        GoalPriority::High
    } else {
        GoalPriority::Normal
    }
}

fn candidates(ctx: &BehaviourContext) -> Vec<Goal> {
    let me = ctx.me.id();
    let tick = ctx.tick;
    let cfg = &ctx.config.needs;
    let needs = ctx.me.needs().cloned().unwrap_or_default();

    let mut goals = Vec::new();
    if needs.drink < cfg.seek_threshold {
        goals.push(Goal::new(
            GoalAction::Drink,
            me,
            urgency(needs.drink, cfg.thirsty_threshold),
            tick,
        ));
    }
    if needs.food < cfg.seek_threshold {
        goals.push(Goal::new(
            GoalAction::Eat,
            me,
            urgency(needs.food, cfg.hungry_threshold),
            tick,
        ));
    }
    if needs.sleep < cfg.tired_threshold {
        goals.push(Goal::new(GoalAction::Sleep, me, GoalPriority::High, tick));
    }
    if haul_available(ctx) {
        goals.push(Goal::new(GoalAction::Haul, me, GoalPriority::Low, tick));
    }
    goals
}

fn plan(goal: &Goal, ctx: &mut BehaviourContext) -> Option<Plan> {
    match goal.action() {
        GoalAction::Eat => plan_eat(goal, ctx),
        GoalAction::Drink => plan_drink(goal, ctx),
        GoalAction::Sleep => plan_sleep(goal, ctx),
        GoalAction::Haul => plan_haul(goal, ctx),
        GoalAction::Wander => plan_wander(goal, ctx),
        GoalAction::Idle => plan_idle(goal, ctx),
    }
}

impl Controller for SettlerController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Settler
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_frame: true,
            infrequent: true,
            job_assignable: true,
        }
    }

    fn init(&mut self, me: EntityId) {
        self.driver.init();
        tracing::debug!(entity = %me, "settler controller attached");
    }

    fn update(&mut self, ctx: &mut BehaviourContext) {
        self.driver.update(ctx, plan);
    }

    fn infrequent_update(&mut self, ctx: &mut BehaviourContext) -> Transition {
        let mood = ctx.me.mood_total();
        if mood < ctx.config.mood.mental_break_threshold {
            self.driver.interrupt(ctx);
            tracing::info!(entity = %ctx.me.id(), mood, "mental break");
            ctx.bus.publish(SimEvent::MentalBreak {
                entity: ctx.me.id(),
                mood,
            });
            return Transition::Become(Behaviour::broken());
        }

        let goals = candidates(ctx);
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
                variant: "settler with a goal in flight",
            });
        }
        Ok(Behaviour::Settler(self.clone()))
    }

    fn assign_job(&mut self, goal: Goal) -> bool {
        self.driver.enqueue(goal.as_job());
        true
    }

    fn state(&self) -> BehaviourState {
        self.driver.state()
    }

    fn is_sleeping(&self) -> bool {
        self.driver.is_sleeping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency() {
        assert_eq!(urgency(10.0, 30.0), GoalPriority::High);
        assert_eq!(urgency(45.0, 30.0), GoalPriority::Normal);
    }

    #[test]
    fn test_idle_settler_clones() {
        let settler = SettlerController::new();
        let copy = settler.try_clone().unwrap();
        assert_eq!(copy.kind(), ControllerKind::Settler);
        assert!(settler.capabilities().job_assignable);
    }

    #[test]
    fn test_queued_job_does_not_block_clone() {
        let mut settler = SettlerController::new();
        let job = Goal::new(GoalAction::Haul, EntityId(1), GoalPriority::Normal, 0);
        assert!(settler.assign_job(job));
        // queued only: nothing in flight yet
        assert!(settler.try_clone().is_ok());
    }
}
