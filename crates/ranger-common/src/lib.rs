//! # Ranger Common
//!
//! Common types and shared abstractions for the Ranger Danger world core:
//! - Chunk-grid coordinate types
//! - ID types (PrefabId, InstanceId, ChunkKind)
//! - Configuration/validation error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn grid_neighbors_are_one_step_apart() {
        let extents = ChunkExtents::new(8.0, 8.0);
        let a = ChunkCoord::new(0, 0).to_world_center(extents);
        let b = ChunkCoord::new(1, 0).to_world_center(extents);
        assert!((b.x - a.x - extents.step_x()).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_error_names_the_field() {
        let err = ConfigError::out_of_range("octaves", "must be 1-8, got 12");
        assert_eq!(err.to_string(), "Invalid octaves: must be 1-8, got 12");
    }

    #[test]
    fn position_resolves_to_containing_cell() {
        let extents = ChunkExtents::new(5.0, 5.0);
        let pos = Vec3::new(11.0, -9.0, 0.0);
        assert_eq!(
            ChunkCoord::from_world(pos, extents),
            ChunkCoord::new(1, -1)
        );
    }
}
