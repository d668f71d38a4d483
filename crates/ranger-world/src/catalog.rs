//! Static registry of chunk prefab variants.

use ranger_common::{ChunkKind, ConfigError, ConfigResult, PrefabId};
use serde::{Deserialize, Serialize};

/// Registry of chunk prefabs: the regular variants plus the
/// distinguished event chunk and the origin ("first") chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkCatalog {
    variants: Vec<PrefabId>,
    event_prefab: PrefabId,
    first_prefab: PrefabId,
}

impl ChunkCatalog {
    /// Builds a catalog; at least one regular variant is required.
    pub fn new(
        variants: Vec<PrefabId>,
        event_prefab: PrefabId,
        first_prefab: PrefabId,
    ) -> ConfigResult<Self> {
        if variants.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self {
            variants,
            event_prefab,
            first_prefab,
        })
    }

    /// Number of regular variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// A validated catalog is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Resolves a chunk kind to its prefab.
    ///
    /// Normal indices wrap modulo the variant count so stale ids from a
    /// shrunken catalog still resolve.
    #[must_use]
    pub fn prefab(&self, kind: ChunkKind) -> PrefabId {
        match kind {
            ChunkKind::Normal(id) => self.variants[id as usize % self.variants.len()],
            ChunkKind::Event => self.event_prefab,
        }
    }

    /// The distinguished event-chunk prefab.
    #[must_use]
    pub const fn event_prefab(&self) -> PrefabId {
        self.event_prefab
    }

    /// The origin chunk's prefab.
    #[must_use]
    pub const fn first_prefab(&self) -> PrefabId {
        self.first_prefab
    }

    /// Regular variants in catalog order.
    #[must_use]
    pub fn variants(&self) -> &[PrefabId] {
        &self.variants
    }
}
