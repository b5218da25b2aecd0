//! A* pathfinding over the tile grid
//!
//! Respects terrain costs and an expansion budget. Failure to find a route
//! is an ordinary outcome, not an error.

use serde::{Deserialize, Serialize};

use crate::core::types::TilePos;
use crate::pathfinding::grid::TileGrid;
use crate::pathfinding::node::{NodeIndex, OpenSet, PathNode};

/// Limits for a single search
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    pub max_expansions: usize,
    pub allow_diagonal: bool,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: 20_000,
            allow_diagonal: true,
        }
    }
}

/// One position along a found path with the cost accumulated to reach it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub tile: TilePos,
    pub cost: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.steps.iter().map(|s| s.tile)
    }

    pub fn start(&self) -> Option<TilePos> {
        self.steps.first().map(|s| s.tile)
    }

    pub fn goal(&self) -> Option<TilePos> {
        self.steps.last().map(|s| s.tile)
    }

    pub fn total_cost(&self) -> f32 {
        self.steps.last().map(|s| s.cost).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found(Path),
    /// The open set was exhausted: the goal is unreachable
    NoPath,
    /// The expansion budget ran out before the goal was reached
    BudgetExceeded,
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }
}

/// Find a path from `start` to `goal`
pub fn find_path(grid: &TileGrid, start: TilePos, goal: TilePos, budget: SearchBudget) -> PathOutcome {
    search(grid, start, &[goal], budget)
}

/// Find a path to whichever of `candidates` is cheapest to reach
pub fn find_nearest(
    grid: &TileGrid,
    start: TilePos,
    candidates: &[TilePos],
    budget: SearchBudget,
) -> PathOutcome {
    search(grid, start, candidates, budget)
}

fn heuristic(from: TilePos, goals: &[TilePos], allow_diagonal: bool) -> f32 {
    goals
        .iter()
        .map(|g| {
            if allow_diagonal {
                from.octile_distance(g)
            } else {
                ((from.x - g.x).abs() + (from.y - g.y).abs()) as f32
            }
        })
        .fold(f32::INFINITY, f32::min)
}

fn search(grid: &TileGrid, start: TilePos, candidates: &[TilePos], budget: SearchBudget) -> PathOutcome {
    let goals: Vec<TilePos> = candidates
        .iter()
        .copied()
        .filter(|g| grid.is_passable(*g))
        .collect();
    let Some(start_index) = grid.index(start) else {
        return PathOutcome::NoPath;
    };
    if goals.is_empty() || !grid.is_passable(start) {
        return PathOutcome::NoPath;
    }
    let goal_nodes: Vec<PathNode> = goals
        .iter()
        .map(|g| PathNode::new(g.center(), 0.0, 0.0, None))
        .collect();

    let mut arena: Vec<PathNode> = Vec::new();
    let mut open = OpenSet::new();
    let mut best_cost = vec![f32::INFINITY; grid.len()];
    let mut closed = vec![false; grid.len()];

    arena.push(PathNode::new(
        start.center(),
        0.0,
        heuristic(start, &goals, budget.allow_diagonal),
        None,
    ));
    best_cost[start_index] = 0.0;
    open.push(0, &arena[0]);

    let mut expansions = 0usize;
    while let Some(current) = open.pop() {
        let tile = arena[current].position.tile();
        let Some(tile_index) = grid.index(tile) else {
            continue;
        };
        if closed[tile_index] {
            continue;
        }

        if goal_nodes.iter().any(|g| *g == arena[current]) {
            tracing::trace!(expansions, arena = arena.len(), "path found");
            return PathOutcome::Found(reconstruct(&arena, current));
        }

        if expansions >= budget.max_expansions {
            tracing::trace!(expansions, "path search budget exceeded");
            return PathOutcome::BudgetExceeded;
        }
        expansions += 1;
        closed[tile_index] = true;

        let current_cost = arena[current].cost;
        for (neighbor, step_cost) in grid.neighbors(tile, budget.allow_diagonal) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }
            let tentative = current_cost + step_cost;
            if tentative < best_cost[neighbor_index] {
                best_cost[neighbor_index] = tentative;
                let node = PathNode::new(
                    neighbor.center(),
                    tentative,
                    heuristic(neighbor, &goals, budget.allow_diagonal),
                    Some(current),
                );
                arena.push(node);
                let index = arena.len() - 1;
                open.push(index, &arena[index]);
            }
        }
    }

    tracing::trace!(expansions, "open set exhausted");
    PathOutcome::NoPath
}

/// Walk the back-links once and reverse into start-to-goal order
fn reconstruct(arena: &[PathNode], goal: NodeIndex) -> Path {
    let mut steps = Vec::new();
    let mut cursor = Some(goal);
    while let Some(index) = cursor {
        let node = &arena[index];
        steps.push(PathStep {
            tile: node.position.tile(),
            cost: node.cost,
        });
        cursor = node.previous;
    }
    steps.reverse();
    Path { steps }
}
