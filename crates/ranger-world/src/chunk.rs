//! Per-instance record of a streamed world chunk.

use glam::Vec3;
use ranger_common::{ChunkExtents, ChunkKind, InstanceId};

/// Initial grace before render-visibility reports are honored; debounces
/// spurious flicker right after instantiation.
pub const VISIBILITY_GRACE: f32 = 0.1;

/// Grace after going not-visible before the chunk may be destroyed.
pub const DESTROY_GRACE: f32 = 0.5;

/// Camera name whose render reports never count as player visibility.
pub const EXCLUDED_CAMERA: &str = "SceneCamera";

/// Visibility lifecycle of a chunk.
///
/// `Fresh -> Visible -> NotVisible`; `NotVisible` is terminal and is
/// driven by the streamer's centering logic, not by the chunk itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Instantiated but never seen by a gameplay camera.
    Fresh,
    /// Rendered by a gameplay camera at least once.
    Visible,
    /// Left behind; destroyed after a grace period.
    NotVisible,
}

/// Record of one streamed chunk instance.
#[derive(Debug, Clone)]
pub struct WorldChunk {
    kind: ChunkKind,
    instance: InstanceId,
    position: Vec3,
    extents: ChunkExtents,
    visibility: Visibility,
    is_current: bool,
    is_explored: bool,
    is_first: bool,
    since_visibility_event: f32,
    since_not_visible: f32,
    /// Spawn anchors for chunk content, in chunk-local space.
    ///
    /// Left empty by the streamer; the host fills it in from the
    /// instantiated prefab's spawn markers after `instantiate` returns.
    pub enemy_spawn_points: Vec<Vec3>,
}

/// Notification produced when a chunk instance is torn down, consumed by
/// the streamer to feed the explored-chunk stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyNotice {
    /// Variant the destroyed chunk carried
    pub kind: ChunkKind,
    /// Whether the player finished exploring it
    pub was_explored: bool,
}

impl WorldChunk {
    /// Creates a record for a freshly instantiated chunk.
    #[must_use]
    pub fn new(kind: ChunkKind, instance: InstanceId, position: Vec3, extents: ChunkExtents) -> Self {
        Self {
            kind,
            instance,
            position,
            extents,
            visibility: Visibility::Fresh,
            is_current: false,
            is_explored: false,
            is_first: false,
            since_visibility_event: 0.0,
            since_not_visible: 0.0,
            enemy_spawn_points: Vec::new(),
        }
    }

    /// Marks this as the origin chunk. The origin is never counted as
    /// explored and never re-tiled.
    pub fn mark_first(&mut self) {
        self.is_first = true;
    }

    /// Whether this is the origin chunk.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.is_first
    }

    /// The chunk's variant.
    #[must_use]
    pub const fn kind(&self) -> ChunkKind {
        self.kind
    }

    /// The host instance handle.
    #[must_use]
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    /// World-space center.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Chunk half-extents.
    #[must_use]
    pub const fn extents(&self) -> ChunkExtents {
        self.extents
    }

    /// Current visibility state.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the player currently stands on this chunk.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        self.is_current
    }

    /// Sets or clears the current flag.
    pub fn set_current(&mut self, current: bool) {
        self.is_current = current;
    }

    /// Whether the player finished exploring this chunk.
    #[must_use]
    pub const fn is_explored(&self) -> bool {
        self.is_explored
    }

    /// Marks the chunk as explored.
    pub fn mark_explored(&mut self) {
        self.is_explored = true;
    }

    /// Strict extent test: is `pos` inside this chunk's bounds?
    #[must_use]
    pub fn contains(&self, pos: Vec3) -> bool {
        pos.x > self.position.x - self.extents.width
            && pos.x < self.position.x + self.extents.width
            && pos.y > self.position.y - self.extents.height
            && pos.y < self.position.y + self.extents.height
    }

    /// Advances the chunk's timers by one tick.
    pub fn tick(&mut self, dt: f32) {
        self.since_visibility_event += dt;
        if self.visibility == Visibility::NotVisible {
            self.since_not_visible += dt;
        }
    }

    /// Reports that a camera rendered this chunk.
    ///
    /// Ignored until the initial grace has elapsed, for the excluded
    /// scene camera, and once the chunk is already left behind.
    pub fn note_rendered(&mut self, camera_name: &str) {
        if self.visibility == Visibility::NotVisible {
            return;
        }
        if self.since_visibility_event > VISIBILITY_GRACE && camera_name != EXCLUDED_CAMERA {
            self.since_visibility_event = 0.0;
            self.visibility = Visibility::Visible;
        }
    }

    /// Marks the chunk as left behind (terminal). Called by the streamer
    /// when the player re-centers on a new chunk.
    pub fn set_not_visible(&mut self) {
        if self.visibility != Visibility::NotVisible {
            self.visibility = Visibility::NotVisible;
            self.since_not_visible = 0.0;
        }
    }

    /// Whether the destroy grace period has elapsed.
    #[must_use]
    pub fn ready_for_destroy(&self) -> bool {
        self.visibility == Visibility::NotVisible && self.since_not_visible > DESTROY_GRACE
    }

    /// Consumes the record into its destroy notification.
    #[must_use]
    pub fn into_destroy_notice(self) -> DestroyNotice {
        DestroyNotice {
            kind: self.kind,
            was_explored: self.is_explored,
        }
    }
}
