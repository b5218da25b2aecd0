//! Goals and the per-entity goal queue

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{EntityId, Tick, TilePos};

/// Symbolic action a goal asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalAction {
    Idle,
    Wander,
    Eat,
    Drink,
    Sleep,
    Haul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalTarget {
    Entity(EntityId),
    Tile(TilePos),
}

/// How urgent a goal is. Variants are declared from least to most urgent
/// and the queue keeps more urgent goals ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum GoalPriority {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalSource {
    Autonomous,
    JobAssignment,
}

/// A unit of intent. Fixed once created; execution progress lives in the
/// controller that runs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    action: GoalAction,
    actor: EntityId,
    target: Option<GoalTarget>,
    priority: GoalPriority,
    source: GoalSource,
    created_tick: Tick,
}

impl Goal {
    pub fn new(action: GoalAction, actor: EntityId, priority: GoalPriority, tick: Tick) -> Self {
        Self {
            action,
            actor,
            target: None,
            priority,
            source: GoalSource::Autonomous,
            created_tick: tick,
        }
    }

    /// The fixed fallback goal
    pub fn idle(actor: EntityId, tick: Tick) -> Self {
        Self::new(GoalAction::Idle, actor, GoalPriority::Low, tick)
    }

    pub fn with_target(mut self, target: GoalTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn as_job(mut self) -> Self {
        self.source = GoalSource::JobAssignment;
        self
    }

    pub fn action(&self) -> GoalAction {
        self.action
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn target(&self) -> Option<GoalTarget> {
        self.target
    }

    pub fn priority(&self) -> GoalPriority {
        self.priority
    }

    pub fn source(&self) -> GoalSource {
        self.source
    }

    pub fn created_tick(&self) -> Tick {
        self.created_tick
    }
}

/// Ranked goals for one entity plus at most one goal in flight
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalQueue {
    current: Option<Goal>,
    queued: VecDeque<Goal>,
}

impl GoalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Goal> {
        self.current.as_ref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &Goal> {
        self.queued.iter()
    }

    /// Insert behind every goal of equal or higher priority
    pub fn push(&mut self, goal: Goal) {
        let pos = self
            .queued
            .iter()
            .position(|g| goal.priority > g.priority)
            .unwrap_or(self.queued.len());
        self.queued.insert(pos, goal);
    }

    /// Put the highest-ranked queued goal in flight. Does nothing while a
    /// goal is already in flight.
    pub fn start_next(&mut self) -> Option<&Goal> {
        if self.current.is_none() {
            self.current = self.queued.pop_front();
        }
        self.current.as_ref()
    }

    /// Take the in-flight goal out, whether it completed or was abandoned
    pub fn finish_current(&mut self) -> Option<Goal> {
        self.current.take()
    }

    /// Drop queued goals the controller chose itself; assigned jobs stay
    pub fn drop_autonomous(&mut self) {
        self.queued.retain(|g| g.source == GoalSource::JobAssignment);
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.queued.clear();
    }

    pub fn has_job(&self) -> bool {
        self.current
            .iter()
            .chain(self.queued.iter())
            .any(|g| g.source == GoalSource::JobAssignment)
    }

    pub fn len(&self) -> usize {
        self.queued.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(action: GoalAction, priority: GoalPriority) -> Goal {
        Goal::new(action, EntityId(1), priority, 0)
    }

    #[test]
    fn test_priority_ordering() {
        let mut queue = GoalQueue::new();
        queue.push(goal(GoalAction::Wander, GoalPriority::Low));
        queue.push(goal(GoalAction::Drink, GoalPriority::Critical));
        queue.push(goal(GoalAction::Eat, GoalPriority::High));
        queue.push(goal(GoalAction::Sleep, GoalPriority::High));

        let order: Vec<GoalAction> = queue.queued().map(|g| g.action()).collect();
        assert_eq!(
            order,
            vec![GoalAction::Drink, GoalAction::Eat, GoalAction::Sleep, GoalAction::Wander]
        );
    }

    #[test]
    fn test_single_goal_in_flight() {
        let mut queue = GoalQueue::new();
        queue.push(goal(GoalAction::Eat, GoalPriority::Normal));
        queue.push(goal(GoalAction::Drink, GoalPriority::High));

        assert_eq!(queue.start_next().map(|g| g.action()), Some(GoalAction::Drink));
        // already in flight, the queued Eat stays queued
        assert_eq!(queue.start_next().map(|g| g.action()), Some(GoalAction::Drink));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.finish_current().map(|g| g.action()), Some(GoalAction::Drink));
        assert_eq!(queue.start_next().map(|g| g.action()), Some(GoalAction::Eat));
    }

    #[test]
    fn test_job_tracking() {
        let mut queue = GoalQueue::new();
        assert!(!queue.has_job());
        queue.push(goal(GoalAction::Haul, GoalPriority::Normal).as_job());
        queue.push(goal(GoalAction::Wander, GoalPriority::Low));
        assert!(queue.has_job());

        queue.drop_autonomous();
        assert_eq!(queue.len(), 1);
        assert!(queue.has_job());
        queue.clear();
        assert!(queue.is_empty());
    }
}
