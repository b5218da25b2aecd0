//! Row-major tile grid with terrain movement costs

use serde::{Deserialize, Serialize};

use crate::core::types::TilePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Floor,
    Rough,
    Wall,
    Water,
}

impl Terrain {
    /// Cost of entering a tile of this terrain, `None` if impassable
    pub fn movement_cost(&self) -> Option<f32> {
        match self {
            Terrain::Floor => Some(1.0),
            Terrain::Rough => Some(2.0),
            Terrain::Wall | Terrain::Water => None,
        }
    }

    pub fn is_passable(&self) -> bool {
        self.movement_cost().is_some()
    }
}

const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Terrain>,
}

impl TileGrid {
    /// All-floor grid
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Terrain::Floor; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Flat index `width * y + x`
    pub fn index(&self, pos: TilePos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(self.width as usize * pos.y as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn position_of(&self, index: usize) -> TilePos {
        let w = self.width as usize;
        TilePos::new((index % w) as i32, (index / w) as i32)
    }

    pub fn terrain(&self, pos: TilePos) -> Option<Terrain> {
        self.index(pos).map(|i| self.tiles[i])
    }

    pub fn set_terrain(&mut self, pos: TilePos, terrain: Terrain) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = terrain;
        }
    }

    pub fn is_passable(&self, pos: TilePos) -> bool {
        self.terrain(pos).map(|t| t.is_passable()).unwrap_or(false)
    }

    /// Passable neighbours and the cost of stepping onto each.
    ///
    /// Diagonal steps cost sqrt 2 times the terrain cost and are only
    /// offered when both adjacent orthogonal tiles are passable.
    pub fn neighbors(&self, pos: TilePos, allow_diagonal: bool) -> Vec<(TilePos, f32)> {
        let mut out = Vec::with_capacity(8);
        for (dx, dy) in ORTHOGONAL {
            let next = TilePos::new(pos.x + dx, pos.y + dy);
            if let Some(cost) = self.terrain(next).and_then(|t| t.movement_cost()) {
                out.push((next, cost));
            }
        }
        if allow_diagonal {
            for (dx, dy) in DIAGONAL {
                let next = TilePos::new(pos.x + dx, pos.y + dy);
                let side_a = TilePos::new(pos.x + dx, pos.y);
                let side_b = TilePos::new(pos.x, pos.y + dy);
                if !self.is_passable(side_a) || !self.is_passable(side_b) {
                    continue;
                }
                if let Some(cost) = self.terrain(next).and_then(|t| t.movement_cost()) {
                    out.push((next, cost * std::f32::consts::SQRT_2));
                }
            }
        }
        out
    }

    /// All passable tiles, row by row
    pub fn passable_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_passable())
            .map(|(i, _)| self.position_of(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major() {
        let grid = TileGrid::new(10, 5);
        assert_eq!(grid.index(TilePos::new(3, 2)), Some(23));
        assert_eq!(grid.position_of(23), TilePos::new(3, 2));
        assert_eq!(grid.index(TilePos::new(10, 0)), None);
        assert_eq!(grid.index(TilePos::new(-1, 0)), None);
    }

    #[test]
    fn test_walls_block_neighbours() {
        let mut grid = TileGrid::new(3, 3);
        grid.set_terrain(TilePos::new(1, 0), Terrain::Wall);
        let around: Vec<TilePos> = grid
            .neighbors(TilePos::new(0, 0), true)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert!(!around.contains(&TilePos::new(1, 0)));
        // diagonal (1,1) would cut the wall corner
        assert!(!around.contains(&TilePos::new(1, 1)));
        assert!(around.contains(&TilePos::new(0, 1)));
    }

    #[test]
    fn test_rough_terrain_costs_more() {
        let mut grid = TileGrid::new(3, 1);
        grid.set_terrain(TilePos::new(1, 0), Terrain::Rough);
        let steps = grid.neighbors(TilePos::new(0, 0), false);
        assert_eq!(steps, vec![(TilePos::new(1, 0), 2.0)]);
    }
}
