//! Colony Sim - per-entity colony simulation engine

pub mod allocation;
pub mod core;
pub mod data;
pub mod ecs;
pub mod entity;
pub mod events;
pub mod pathfinding;
pub mod persistence;
pub mod simulation;
