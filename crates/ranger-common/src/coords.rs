//! Coordinate types for the world-chunk grid.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Half-extents of a chunk in world units.
///
/// A chunk centered at `c` covers `(c.x - width, c.x + width)` by
/// `(c.y - height, c.y + height)`, matching the extent test used when
/// resolving which chunk contains a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkExtents {
    /// Half-width in world units
    pub width: f32,
    /// Half-height in world units
    pub height: f32,
}

impl ChunkExtents {
    /// Creates new chunk extents.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Full span of a chunk along x (the grid step).
    #[must_use]
    pub fn step_x(self) -> f32 {
        self.width * 2.0
    }

    /// Full span of a chunk along y (the grid step).
    #[must_use]
    pub fn step_y(self) -> f32 {
        self.height * 2.0
    }
}

/// Chunk coordinate (identifies a cell in the world grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space center of this grid cell.
    #[must_use]
    pub fn to_world_center(self, extents: ChunkExtents) -> Vec3 {
        Vec3::new(
            self.x as f32 * extents.step_x(),
            self.y as f32 * extents.step_y(),
            0.0,
        )
    }

    /// Grid cell containing a world position.
    #[must_use]
    pub fn from_world(pos: Vec3, extents: ChunkExtents) -> Self {
        Self {
            x: (pos.x / extents.step_x()).round() as i32,
            y: (pos.y / extents.step_y()).round() as i32,
        }
    }

    /// Neighboring coordinate offset by whole grid cells.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_center_round_trips() {
        let extents = ChunkExtents::new(16.0, 12.0);
        for &(x, y) in &[(0, 0), (3, -2), (-7, 5)] {
            let coord = ChunkCoord::new(x, y);
            let center = coord.to_world_center(extents);
            assert_eq!(ChunkCoord::from_world(center, extents), coord);
        }
    }

    #[test]
    fn from_world_picks_nearest_cell() {
        let extents = ChunkExtents::new(10.0, 10.0);
        // Anywhere inside a cell maps to that cell.
        let inside = Vec3::new(24.0, -18.0, 0.0);
        assert_eq!(
            ChunkCoord::from_world(inside, extents),
            ChunkCoord::new(1, -1)
        );
    }

    #[test]
    fn offset_steps_grid_cells() {
        let coord = ChunkCoord::new(2, 3).offset(-1, 1);
        assert_eq!(coord, ChunkCoord::new(1, 4));
    }
}
