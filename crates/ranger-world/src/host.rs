//! Host abstraction for engine-owned services.
//!
//! The streamer never talks to the engine directly; it consumes
//! "instantiate prefab at position", "query chunk under position", and
//! "destroy instance" as black-box services behind this trait.

use glam::Vec3;
use ranger_common::{ChunkExtents, InstanceId, PrefabId};

/// Engine services consumed by the chunk streamer.
pub trait ChunkHost {
    /// Creates an engine object from a prefab at a world position and
    /// returns its handle.
    fn instantiate(&mut self, prefab: PrefabId, position: Vec3) -> InstanceId;

    /// Point query against the ground layer: the chunk instance whose
    /// bounds contain `position`, if any. With overlapping results the
    /// first match wins.
    fn occupant_at(&self, position: Vec3) -> Option<InstanceId>;

    /// Tears down an engine object.
    fn destroy(&mut self, instance: InstanceId);
}

/// In-memory host used by tests and headless runs.
///
/// Instances occupy axis-aligned boxes of a fixed extent, mirroring the
/// ground-layer collision query the engine provides.
#[derive(Debug)]
pub struct MemoryHost {
    extents: ChunkExtents,
    next_id: u64,
    occupants: Vec<(InstanceId, PrefabId, Vec3)>,
}

impl MemoryHost {
    /// Creates a host whose instances all share the given extents.
    #[must_use]
    pub fn new(extents: ChunkExtents) -> Self {
        Self {
            extents,
            next_id: 1,
            occupants: Vec::new(),
        }
    }

    /// Number of live instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.occupants.len()
    }

    /// Prefab a live instance was created from.
    #[must_use]
    pub fn prefab_of(&self, instance: InstanceId) -> Option<PrefabId> {
        self.occupants
            .iter()
            .find(|(id, _, _)| *id == instance)
            .map(|(_, prefab, _)| *prefab)
    }

    /// Position a live instance was created at.
    #[must_use]
    pub fn position_of(&self, instance: InstanceId) -> Option<Vec3> {
        self.occupants
            .iter()
            .find(|(id, _, _)| *id == instance)
            .map(|(_, _, pos)| *pos)
    }
}

impl ChunkHost for MemoryHost {
    fn instantiate(&mut self, prefab: PrefabId, position: Vec3) -> InstanceId {
        let id = InstanceId::from_raw(self.next_id);
        self.next_id += 1;
        self.occupants.push((id, prefab, position));
        id
    }

    fn occupant_at(&self, position: Vec3) -> Option<InstanceId> {
        self.occupants
            .iter()
            .find(|(_, _, center)| {
                position.x > center.x - self.extents.width
                    && position.x < center.x + self.extents.width
                    && position.y > center.y - self.extents.height
                    && position.y < center.y + self.extents.height
            })
            .map(|(id, _, _)| *id)
    }

    fn destroy(&mut self, instance: InstanceId) {
        self.occupants.retain(|(id, _, _)| *id != instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_query_finds_first_match() {
        let mut host = MemoryHost::new(ChunkExtents::new(5.0, 5.0));
        let a = host.instantiate(PrefabId::new(1), Vec3::ZERO);
        // Overlapping instance; the earlier one wins.
        let _b = host.instantiate(PrefabId::new(2), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(host.occupant_at(Vec3::new(0.5, 0.5, 0.0)), Some(a));
    }

    #[test]
    fn destroy_frees_the_position() {
        let mut host = MemoryHost::new(ChunkExtents::new(5.0, 5.0));
        let a = host.instantiate(PrefabId::new(1), Vec3::ZERO);
        assert!(host.occupant_at(Vec3::ZERO).is_some());
        host.destroy(a);
        assert!(host.occupant_at(Vec3::ZERO).is_none());
        assert_eq!(host.instance_count(), 0);
    }
}
