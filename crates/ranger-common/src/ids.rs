//! ID types for prefabs, instances, and chunk variants.

use serde::{Deserialize, Serialize};

/// Identifier for a registered chunk/object prefab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefabId(u32);

impl PrefabId {
    /// Creates a prefab ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle for an instantiated engine object.
///
/// Issued by the host on instantiation; opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Creates an instance ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid instance handle.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) handle.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Identifier for a ground texture asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(u32);

impl TextureId {
    /// Creates a texture ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Which variant of chunk content an instance carries.
///
/// The rarer event chunk is a tagged variant rather than a subtype, so
/// the selection policy can dispatch on it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Regular chunk, identified by its catalog index.
    Normal(u32),
    /// The distinguished event chunk.
    Event,
}

impl ChunkKind {
    /// Catalog index for normal chunks, `None` for the event chunk.
    #[must_use]
    pub const fn catalog_index(self) -> Option<u32> {
        match self {
            Self::Normal(id) => Some(id),
            Self::Event => None,
        }
    }

    /// Whether this is the event chunk.
    #[must_use]
    pub const fn is_event(self) -> bool {
        matches!(self, Self::Event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_kind_dispatch() {
        assert_eq!(ChunkKind::Normal(4).catalog_index(), Some(4));
        assert_eq!(ChunkKind::Event.catalog_index(), None);
        assert!(ChunkKind::Event.is_event());
        assert!(!ChunkKind::Normal(0).is_event());
    }

    #[test]
    fn null_instance_is_invalid() {
        assert!(!InstanceId::NULL.is_valid());
        assert!(InstanceId::from_raw(7).is_valid());
    }
}
