//! Goal execution shared by the goal-running controllers
//!
//! A selected goal is turned into a [`Plan`]: a list of steps plus the
//! allocations it holds. `MoveTo` steps suspend the driver in
//! `WaitingOnPath` until the path service delivers a route; `Work` steps
//! count game hours and apply their effect when done.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{BehaviourContext, BehaviourState, WorldCommand};
use crate::allocation::AllocationId;
use crate::allocation::AllocationLedger;
use crate::core::types::{EntityId, TilePos};
use crate::entity::goals::{Goal, GoalAction, GoalQueue};
use crate::entity::memory::{Memory, MemoryKind};
use crate::entity::needs::{NeedType, SLEEP_RECOVERY_PER_HOUR};
use crate::entity::status::StatusKind;
use crate::entity::{Carried, Entity};
use crate::events::{AbandonReason, SimEvent};
use crate::pathfinding::{PathGoal, PathOutcome, PathPoll, PathService, PathTicket};

/// Length of the fallback idle goal, in game hours
pub const IDLE_HOURS: f64 = 0.5;

/// Drink restored by drinking straight from open water
pub const SOURCE_DRINK_VALUE: f32 = 40.0;

/// Builds the plan for a goal, or `None` if it cannot be carried out now
pub type Planner = fn(&Goal, &mut BehaviourContext) -> Option<Plan>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkEffect {
    /// Eat or drink one unit of an item stack
    Consume { item: EntityId, allocation: AllocationId },
    DrinkFromSource,
    PickUp { item: EntityId, allocation: AllocationId },
    Deposit { slot: TilePos, allocation: AllocationId },
    Sleep,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    MoveTo(PathGoal),
    Work { hours: f64, effect: WorkEffect },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub steps: VecDeque<Step>,
    pub allocations: Vec<AllocationId>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle() -> Self {
        Self::new().then_work(IDLE_HOURS, WorkEffect::Idle)
    }

    pub fn then_move(mut self, goal: PathGoal) -> Self {
        self.steps.push_back(Step::MoveTo(goal));
        self
    }

    pub fn then_work(mut self, hours: f64, effect: WorkEffect) -> Self {
        self.steps.push_back(Step::Work { hours, effect });
        self
    }

    pub fn holding(mut self, allocation: AllocationId) -> Self {
        self.allocations.push(allocation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GoalProgress {
    plan: VecDeque<Step>,
    /// Remaining tiles of the current move; `None` until a route arrives
    route: Option<VecDeque<TilePos>>,
    step_elapsed: f64,
    path_attempts: u32,
    allocations: Vec<AllocationId>,
}

impl GoalProgress {
    fn new(plan: Plan) -> Self {
        Self {
            plan: plan.steps,
            route: None,
            step_elapsed: 0.0,
            path_attempts: 0,
            allocations: plan.allocations,
        }
    }
}

enum Advance {
    Continue,
    NeedRoute,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalDriver {
    state: BehaviourState,
    queue: GoalQueue,
    progress: Option<GoalProgress>,
}

impl GoalDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BehaviourState {
        self.state
    }

    pub fn queue(&self) -> &GoalQueue {
        &self.queue
    }

    pub fn current_goal(&self) -> Option<&Goal> {
        self.queue.current()
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.progress.as_ref().and_then(|p| p.plan.front())
    }

    /// Allocations held by the goal in flight
    pub fn held_allocations(&self) -> &[AllocationId] {
        self.progress
            .as_ref()
            .map(|p| p.allocations.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_goal_in_flight(&self) -> bool {
        self.queue.current().is_some() || matches!(self.state, BehaviourState::WaitingOnPath { .. })
    }

    pub fn is_sleeping(&self) -> bool {
        matches!(
            self.current_step(),
            Some(Step::Work {
                effect: WorkEffect::Sleep,
                ..
            })
        )
    }

    pub fn init(&mut self) {
        if self.state == BehaviourState::Destroyed {
            self.state = BehaviourState::Idle;
        }
    }

    /// Queue a goal without selecting anything yet
    pub fn enqueue(&mut self, goal: Goal) {
        self.queue.push(goal);
    }

    /// Rank `candidates` and start the best one that can be planned,
    /// falling back to idling. Does nothing while a goal is in flight.
    pub fn select(&mut self, candidates: Vec<Goal>, ctx: &mut BehaviourContext, planner: Planner) {
        if self.state == BehaviourState::Destroyed || self.has_goal_in_flight() {
            return;
        }
        self.state = BehaviourState::SelectingGoal;
        self.queue.drop_autonomous();
        for goal in candidates {
            self.queue.push(goal);
        }
        self.start_queued(ctx, planner);
    }

    /// Per-frame step
    pub fn update(&mut self, ctx: &mut BehaviourContext, planner: Planner) {
        match self.state {
            BehaviourState::Idle => {
                if !self.queue.is_empty() {
                    self.state = BehaviourState::SelectingGoal;
                    self.start_queued(ctx, planner);
                }
            }
            BehaviourState::WaitingOnPath { ticket } => self.poll_route(ticket, ctx),
            BehaviourState::ExecutingGoal => self.advance(ctx),
            BehaviourState::SelectingGoal | BehaviourState::Destroyed => {}
        }
    }

    /// Give up the goal in flight and everything queued
    pub fn interrupt(&mut self, ctx: &mut BehaviourContext) {
        if self.queue.current().is_some() {
            self.abandon(AbandonReason::Interrupted, ctx);
        }
        self.queue.clear();
    }

    pub fn destroy(&mut self, me: EntityId, ledger: &mut AllocationLedger, paths: &mut PathService) {
        ledger.release_claimant(me);
        paths.cancel_entity(me);
        self.queue.clear();
        self.progress = None;
        self.state = BehaviourState::Destroyed;
    }

    fn start_queued(&mut self, ctx: &mut BehaviourContext, planner: Planner) {
        while let Some(goal) = self.queue.start_next().cloned() {
            if let Some(plan) = planner(&goal, ctx) {
                tracing::debug!(entity = %ctx.me.id(), action = ?goal.action(), "goal selected");
                self.begin(plan);
                return;
            }
            tracing::debug!(entity = %ctx.me.id(), action = ?goal.action(), "goal could not be planned");
            self.queue.finish_current();
        }

        self.queue.push(Goal::idle(ctx.me.id(), ctx.tick));
        self.queue.start_next();
        self.begin(Plan::idle());
    }

    fn begin(&mut self, plan: Plan) {
        self.progress = Some(GoalProgress::new(plan));
        self.state = BehaviourState::ExecutingGoal;
    }

    fn poll_route(&mut self, ticket: PathTicket, ctx: &mut BehaviourContext) {
        match ctx.paths.poll(ticket) {
            PathPoll::Pending => {}
            // lost, e.g. across a reload
            PathPoll::Unknown => self.request_route(ctx),
            PathPoll::Ready(PathOutcome::Found(path)) => {
                if let Some(progress) = self.progress.as_mut() {
                    progress.route = Some(path.tiles().skip(1).collect());
                    progress.path_attempts = 0;
                }
                tracing::debug!(entity = %ctx.me.id(), length = path.len(), "route delivered");
                self.state = BehaviourState::ExecutingGoal;
            }
            PathPoll::Ready(PathOutcome::NoPath) => self.abandon(AbandonReason::NoPath, ctx),
            PathPoll::Ready(PathOutcome::BudgetExceeded) => {
                let attempts = match self.progress.as_mut() {
                    Some(progress) => {
                        progress.path_attempts += 1;
                        progress.path_attempts
                    }
                    None => 0,
                };
                if attempts >= ctx.config.pathfinding.max_path_attempts {
                    tracing::warn!(entity = %ctx.me.id(), attempts, "giving up after repeated path failures");
                    self.abandon(AbandonReason::PathBudgetExhausted, ctx);
                } else {
                    self.request_route(ctx);
                }
            }
        }
    }

    fn request_route(&mut self, ctx: &mut BehaviourContext) {
        match self.current_step() {
            Some(Step::MoveTo(goal)) => {
                let ticket = ctx.paths.request(ctx.me.id(), ctx.me.tile(), goal.clone());
                self.state = BehaviourState::WaitingOnPath { ticket };
            }
            _ => self.state = BehaviourState::ExecutingGoal,
        }
    }

    fn advance(&mut self, ctx: &mut BehaviourContext) {
        let outcome = match self.progress.as_mut() {
            Some(progress) => step_progress(progress, ctx),
            None => Advance::Completed,
        };
        match outcome {
            Advance::Continue => {}
            Advance::NeedRoute => self.request_route(ctx),
            Advance::Completed => self.complete(ctx),
            Advance::Failed => self.abandon(AbandonReason::ResourceLost, ctx),
        }
    }

    fn complete(&mut self, ctx: &mut BehaviourContext) {
        self.release_progress(ctx);
        self.state = BehaviourState::Idle;
        if let Some(goal) = self.queue.finish_current() {
            tracing::debug!(entity = %ctx.me.id(), action = ?goal.action(), "goal completed");
            ctx.bus.publish(SimEvent::GoalCompleted {
                entity: ctx.me.id(),
                action: goal.action(),
            });
        }
    }

    fn abandon(&mut self, reason: AbandonReason, ctx: &mut BehaviourContext) {
        if let BehaviourState::WaitingOnPath { ticket } = self.state {
            ctx.paths.cancel(ticket);
        }
        self.release_progress(ctx);
        self.state = BehaviourState::Idle;

        let Some(goal) = self.queue.finish_current() else {
            return;
        };
        tracing::debug!(entity = %ctx.me.id(), action = ?goal.action(), ?reason, "goal abandoned");
        ctx.bus.publish(SimEvent::GoalAbandoned {
            entity: ctx.me.id(),
            action: goal.action(),
            reason,
        });

        let unreachable = matches!(reason, AbandonReason::NoPath | AbandonReason::PathBudgetExhausted);
        let failure = match goal.action() {
            GoalAction::Eat if unreachable => Some(MemoryKind::FailedToFindFood),
            GoalAction::Drink if unreachable => Some(MemoryKind::FailedToFindDrink),
            _ => None,
        };
        if let Some(kind) = failure {
            remember_now(ctx, kind);
        }
    }

    /// Cancel leftover claims and drop anything still carried
    fn release_progress(&mut self, ctx: &mut BehaviourContext) {
        if let Some(progress) = self.progress.take() {
            for id in progress.allocations {
                ctx.ledger.cancel(id);
            }
        }
        if let Some(carried) = ctx.me.components.carried.take() {
            ctx.commands.push(WorldCommand::DropItem {
                item_type: carried.item_type,
                material: carried.material,
                quantity: carried.quantity,
                tile: ctx.me.tile(),
            });
        }
    }
}

fn step_progress(progress: &mut GoalProgress, ctx: &mut BehaviourContext) -> Advance {
    let Some(step) = progress.plan.front().cloned() else {
        return Advance::Completed;
    };
    match step {
        Step::MoveTo(goal) => match progress.route.as_mut() {
            None if arrived(ctx.me.tile(), &goal) => {
                ctx.me.position = ctx.me.tile().center();
                progress.plan.pop_front();
            }
            None => return Advance::NeedRoute,
            Some(route) => {
                walk(ctx.me, route, ctx.config.movement.move_speed * ctx.delta_seconds);
                if route.is_empty() {
                    progress.route = None;
                    progress.plan.pop_front();
                }
            }
        },
        Step::Work { hours, effect } => {
            progress.step_elapsed += ctx.delta_hours;
            if progress.step_elapsed >= hours {
                progress.step_elapsed = 0.0;
                progress.plan.pop_front();
                if !apply_effect(&effect, hours, ctx) {
                    return Advance::Failed;
                }
            }
        }
    }
    if progress.plan.is_empty() {
        Advance::Completed
    } else {
        Advance::Continue
    }
}

fn arrived(tile: TilePos, goal: &PathGoal) -> bool {
    match goal {
        PathGoal::Tile(target) => *target == tile,
        PathGoal::NearestOf(candidates) => candidates.contains(&tile),
    }
}

fn walk(me: &mut Entity, route: &mut VecDeque<TilePos>, mut budget: f32) {
    while budget > 0.0 {
        let Some(next) = route.front().copied() else {
            break;
        };
        let target = next.center();
        let distance = me.position.distance(&target);
        if distance <= budget {
            me.position = target;
            budget -= distance;
            route.pop_front();
        } else {
            let direction = (target - me.position).normalize();
            me.position = me.position + direction * budget;
            budget = 0.0;
        }
    }
}

/// Record a memory of `kind` happening now
pub(crate) fn remember_now(ctx: &mut BehaviourContext, kind: MemoryKind) {
    let memory = Memory::new(kind, ctx.now);
    remember(ctx, memory);
}

/// Record a memory on the updated entity and announce it
pub(crate) fn remember(ctx: &mut BehaviourContext, memory: Memory) {
    ctx.me.memory_mut().record_memory(memory);
    ctx.bus.publish(SimEvent::MemoryRecorded {
        entity: ctx.me.id(),
        kind: memory.kind(),
    });
}

fn apply_effect(effect: &WorkEffect, hours: f64, ctx: &mut BehaviourContext) -> bool {
    let others = ctx.others;
    let dictionaries = ctx.dictionaries;
    match effect {
        WorkEffect::Idle => true,
        WorkEffect::Sleep => {
            ctx.me
                .needs_mut()
                .satisfy(NeedType::Sleep, SLEEP_RECOVERY_PER_HOUR * hours as f32);
            remember_now(ctx, MemoryKind::SleptOnGround);
            true
        }
        WorkEffect::DrinkFromSource => {
            ctx.me.needs_mut().satisfy(NeedType::Drink, SOURCE_DRINK_VALUE);
            true
        }
        WorkEffect::Consume { item, allocation } => {
            let Some(stack) = others.get(item).and_then(Entity::item) else {
                return false;
            };
            let Some(def) = dictionaries.item_type(stack.item_type) else {
                return false;
            };
            if ctx.ledger.consume(*allocation, 1) == 0 {
                return false;
            }
            ctx.commands.push(WorldCommand::TakeFromItem {
                item: *item,
                amount: 1,
            });

            let mut kind = None;
            if let Some(food) = def.food_value {
                ctx.me.needs_mut().satisfy(NeedType::Food, food);
                kind = Some(if def.raw {
                    MemoryKind::AteRawFood
                } else {
                    MemoryKind::AteNiceMeal
                });
            }
            if let Some(drink) = def.drink_value {
                ctx.me.needs_mut().satisfy(NeedType::Drink, drink);
                if def.alcoholic {
                    kind = Some(MemoryKind::DrankAlcohol);
                    ctx.me.status_mut().request_apply(StatusKind::Drunk);
                }
            }
            if let Some(kind) = kind {
                let mut memory = Memory::new(kind, ctx.now).with_item_type(stack.item_type);
                if let Some(material) = stack.material {
                    memory = memory.with_material(material);
                }
                remember(ctx, memory);
            }
            true
        }
        WorkEffect::PickUp { item, allocation } => {
            let Some(stack) = others.get(item).and_then(Entity::item) else {
                return false;
            };
            let claimed = ctx.ledger.get(*allocation).map(|a| a.quantity).unwrap_or(0);
            let taken = ctx.ledger.consume(*allocation, claimed);
            if taken == 0 {
                return false;
            }
            ctx.commands.push(WorldCommand::TakeFromItem {
                item: *item,
                amount: taken,
            });
            ctx.me.components.carried = Some(Carried {
                item_type: stack.item_type,
                material: stack.material,
                quantity: taken,
            });
            true
        }
        WorkEffect::Deposit { slot, allocation } => {
            let Some(carried) = ctx.me.components.carried.take() else {
                return false;
            };
            let stored = ctx.stockpile.deposit(
                *slot,
                carried.item_type,
                carried.quantity,
                *allocation,
                ctx.ledger,
            );
            if stored < carried.quantity {
                ctx.commands.push(WorldCommand::DropItem {
                    item_type: carried.item_type,
                    material: carried.material,
                    quantity: carried.quantity - stored,
                    tile: ctx.me.tile(),
                });
            }
            stored > 0
        }
    }
}
