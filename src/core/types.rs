//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Stable entity identifier, issued by [`crate::core::ids::IdGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Game time in hours since the start of the world
pub type GameTime = f64;

/// Simulation tick counter
pub type Tick = u64;

/// Broad entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Creature,
    Item,
    Mechanism,
    Plant,
}

/// Integer tile coordinate on the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Centre of the tile in world coordinates
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Octile distance (diagonal steps cost sqrt 2)
    pub fn octile_distance(&self, other: &Self) -> f32 {
        let dx = (self.x - other.x).unsigned_abs() as f32;
        let dy = (self.y - other.y).unsigned_abs() as f32;
        let (min, max) = if dx < dy { (dx, dy) } else { (dy, dx) };
        max + (std::f32::consts::SQRT_2 - 1.0) * min
    }
}

/// Tolerance used when comparing floating world positions
pub const POSITION_EPSILON: f32 = 0.001;

/// 2D world position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Position equality within [`POSITION_EPSILON`]
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() <= POSITION_EPSILON && (self.y - other.y).abs() <= POSITION_EPSILON
    }

    /// Tile containing this position
    pub fn tile(&self) -> TilePos {
        TilePos::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_ordering() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7), EntityId(7));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn test_octile_distance() {
        let a = TilePos::new(0, 0);
        assert_eq!(a.octile_distance(&TilePos::new(3, 0)), 3.0);
        let diag = a.octile_distance(&TilePos::new(2, 2));
        assert!((diag - 2.0 * std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_approx_eq_tolerates_drift() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(3.0004, 3.9997);
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&Vec2::new(3.01, 4.0)));
    }

    #[test]
    fn test_vec2_tile_rounds() {
        assert_eq!(Vec2::new(2.6, -0.4).tile(), TilePos::new(3, 0));
    }
}
