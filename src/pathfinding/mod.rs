//! Tile-grid pathfinding
//!
//! A* over a row-major tile grid, with arena-allocated search nodes and a
//! batching service that resolves requests between ticks.

pub mod astar;
pub mod grid;
pub mod node;
pub mod service;

pub use astar::{find_nearest, find_path, Path, PathOutcome, PathStep, SearchBudget};
pub use grid::{Terrain, TileGrid};
pub use node::{OpenSet, PathNode};
pub use service::{PathGoal, PathPoll, PathService, PathTicket};
