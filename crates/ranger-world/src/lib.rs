//! # Ranger World
//!
//! Procedural world generation and chunk streaming for Ranger Danger.
//!
//! This crate handles:
//! - Seeded noise fields with analytic derivatives
//! - Terrain sampling: texture bands, tile blending, object scatter
//! - The chunk prefab catalog and selection policy
//! - Streaming chunks around the player as they explore

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod chunk;
pub mod config;
pub mod host;
pub mod noise;
pub mod streaming;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::chunk::*;
    pub use crate::config::*;
    pub use crate::host::*;
    pub use crate::noise::*;
    pub use crate::streaming::*;
    pub use crate::terrain::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use ranger_common::{ChunkExtents, PrefabId};

    #[test]
    fn streamer_and_sampler_share_a_world_config() {
        let config = config::WorldConfig::default();
        let catalog = ChunkCatalog::new(
            vec![PrefabId::new(1), PrefabId::new(2)],
            PrefabId::new(10),
            PrefabId::new(11),
        )
        .expect("valid catalog");
        let host = MemoryHost::new(config.streaming.chunk_extents);
        let mut streamer = ChunkStreamer::new(config.streaming.clone(), catalog, host)
            .expect("valid streamer config");
        let mut sampler = TerrainSampler::new(config.terrain.clone());

        streamer.spawn_first(Vec3::ZERO);
        streamer.tick(Vec3::ZERO, Vec3::ZERO, 0.016);

        let extents = config.streaming.chunk_extents;
        let corners = [
            Vec3::new(-extents.width, -extents.height, 0.0),
            Vec3::new(extents.width, -extents.height, 0.0),
            Vec3::new(-extents.width, extents.height, 0.0),
            Vec3::new(extents.width, extents.height, 0.0),
        ];
        let surface = sampler.generate_surface(corners, &config.textures, &[]);
        assert_eq!(
            surface.tiles.len(),
            (config.terrain.resolution * config.terrain.resolution) as usize
        );
    }

    #[test]
    fn chunk_extents_drive_the_streaming_grid() {
        let extents = ChunkExtents::new(16.0, 16.0);
        assert_eq!(extents.step_x(), 32.0);
        assert_eq!(extents.step_y(), 32.0);
    }
}
