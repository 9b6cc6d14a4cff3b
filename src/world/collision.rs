//! Tile collision queries for actor movement
//!
//! The map is a rectangle of square tiles; a tile is either walkable or
//! blocked. Actors probe the tile under a prospective destination before
//! committing to a step.

use std::collections::HashSet;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct CollisionMap {
    /// World width in units
    width: f32,
    /// World height in units
    height: f32,
    /// Edge length of one tile in world units
    tile_size: f32,
    blocked: HashSet<(i32, i32)>,
}

impl CollisionMap {
    pub fn new(width: f32, height: f32, tile_size: f32) -> Self {
        assert!(tile_size > 0.0, "tile size must be positive");
        Self {
            width,
            height,
            tile_size,
            blocked: HashSet::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Tile coordinates under a world position.
    pub fn tile_at(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    pub fn block_tile(&mut self, tx: i32, ty: i32) {
        self.blocked.insert((tx, ty));
    }

    pub fn unblock_tile(&mut self, tx: i32, ty: i32) {
        self.blocked.remove(&(tx, ty));
    }

    /// A position is walkable when it is inside the world rectangle and
    /// its tile is not blocked.
    pub fn is_walkable(&self, pos: Vec2) -> bool {
        if pos.x < 0.0 || pos.y < 0.0 || pos.x >= self.width || pos.y >= self.height {
            return false;
        }
        !self.blocked.contains(&self.tile_at(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_is_not_walkable() {
        let map = CollisionMap::new(64.0, 64.0, 16.0);
        assert!(map.is_walkable(Vec2::new(0.0, 0.0)));
        assert!(map.is_walkable(Vec2::new(63.9, 63.9)));
        assert!(!map.is_walkable(Vec2::new(-0.1, 10.0)));
        assert!(!map.is_walkable(Vec2::new(64.0, 10.0)));
    }

    #[test]
    fn blocked_tiles_reject_positions_inside_them() {
        let mut map = CollisionMap::new(64.0, 64.0, 16.0);
        map.block_tile(1, 0);
        assert!(!map.is_walkable(Vec2::new(16.0, 0.0)));
        assert!(!map.is_walkable(Vec2::new(31.9, 15.9)));
        assert!(map.is_walkable(Vec2::new(32.0, 0.0)));
        map.unblock_tile(1, 0);
        assert!(map.is_walkable(Vec2::new(16.0, 0.0)));
    }
}
