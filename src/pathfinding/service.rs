//! Deferred path resolution
//!
//! Controllers file requests during a tick and get a ticket back. After all
//! entities have updated, the tick loop resolves the whole batch in parallel
//! against the (now read-only) grid. Results are picked up by ticket on the
//! following tick; anything not collected by then is dropped.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, TilePos};
use crate::pathfinding::astar::{find_nearest, find_path, PathOutcome, SearchBudget};
use crate::pathfinding::grid::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathGoal {
    Tile(TilePos),
    /// Whichever of these tiles is cheapest to reach
    NearestOf(Vec<TilePos>),
}

#[derive(Debug, Clone)]
struct PathRequest {
    ticket: PathTicket,
    entity: EntityId,
    start: TilePos,
    goal: PathGoal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathPoll {
    /// Queued, resolves at the end of this tick
    Pending,
    Ready(PathOutcome),
    /// Never issued, already collected, or dropped (e.g. across a reload)
    Unknown,
}

#[derive(Debug, Default)]
pub struct PathService {
    next_ticket: u64,
    pending: Vec<PathRequest>,
    resolved: AHashMap<PathTicket, (EntityId, PathOutcome)>,
}

impl PathService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, entity: EntityId, start: TilePos, goal: PathGoal) -> PathTicket {
        self.next_ticket += 1;
        let ticket = PathTicket(self.next_ticket);
        self.pending.push(PathRequest {
            ticket,
            entity,
            start,
            goal,
        });
        ticket
    }

    /// Make sure tickets issued from now on are newer than `ticket`. Used
    /// after a load, when restored controllers still hold old tickets.
    pub fn resume_after(&mut self, ticket: PathTicket) {
        self.next_ticket = self.next_ticket.max(ticket.0);
    }

    pub fn poll(&mut self, ticket: PathTicket) -> PathPoll {
        if let Some((_, outcome)) = self.resolved.remove(&ticket) {
            return PathPoll::Ready(outcome);
        }
        if self.pending.iter().any(|r| r.ticket == ticket) {
            PathPoll::Pending
        } else {
            PathPoll::Unknown
        }
    }

    /// Forget a single request; its result will never be delivered
    pub fn cancel(&mut self, ticket: PathTicket) {
        self.pending.retain(|r| r.ticket != ticket);
        self.resolved.remove(&ticket);
    }

    /// Forget everything filed by `entity`
    pub fn cancel_entity(&mut self, entity: EntityId) {
        self.pending.retain(|r| r.entity != entity);
        self.resolved.retain(|_, (owner, _)| *owner != entity);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resolve every queued request. Uncollected results from the previous
    /// round are discarded first.
    pub fn resolve_pending(&mut self, grid: &TileGrid, budget: SearchBudget) -> usize {
        self.resolved.clear();
        let batch = std::mem::take(&mut self.pending);
        let count = batch.len();
        let results: Vec<(PathTicket, EntityId, PathOutcome)> = batch
            .into_par_iter()
            .map(|request| {
                let outcome = match &request.goal {
                    PathGoal::Tile(goal) => find_path(grid, request.start, *goal, budget),
                    PathGoal::NearestOf(candidates) => {
                        find_nearest(grid, request.start, candidates, budget)
                    }
                };
                (request.ticket, request.entity, outcome)
            })
            .collect();
        for (ticket, entity, outcome) in results {
            self.resolved.insert(ticket, (entity, outcome));
        }
        if count > 0 {
            tracing::debug!(count, "resolved path requests");
        }
        count
    }
}
