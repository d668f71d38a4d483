//! Chunk streaming: tracks the player's chunk, generates neighbors as
//! the camera crosses chunk-relative thresholds, and recycles chunks the
//! player has left behind.
//!
//! ## Overview
//!
//! Every tick the streamer:
//! - resolves which chunk the player stands on (retrying while the
//!   ground query comes back empty),
//! - buckets the player and camera positions into `{-1, 0, 1}^2`
//!   relative to the current chunk's bounds,
//! - detects boundary crossings and return-to-center transitions,
//! - asks the selection policy for next-chunk variants and instantiates
//!   them at grid-aligned positions, skipping occupied cells,
//! - destroys left-behind chunks after their grace period and feeds
//!   explored ids back into the revisit stack.

use std::collections::VecDeque;

use glam::Vec3;
use ranger_common::{ChunkCoord, ChunkExtents, ChunkKind, ConfigError, ConfigResult, InstanceId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::ChunkCatalog;
use crate::chunk::{DestroyNotice, WorldChunk};
use crate::host::ChunkHost;

/// Default number of pre-drawn random picks kept in the upcoming queue.
pub const DEFAULT_QUEUE_LENGTH: usize = 20;

/// Bucketed direction of a position relative to the current chunk,
/// one of `{-1, 0, 1}` per axis.
///
/// The x axis keeps the source's asymmetric sign convention: `-1` means
/// the position is past the chunk's `+x` bound, `+1` past the `-x`
/// bound. The y axis is the mirror: `+1` past `+y`, `-1` past `-y`.
/// [`LocationBucket::world_step`] converts back to world-grid direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationBucket {
    /// Bucketed x component
    pub x: i8,
    /// Bucketed y component
    pub y: i8,
}

impl LocationBucket {
    /// The center bucket.
    pub const CENTER: Self = Self { x: 0, y: 0 };

    /// Buckets a position relative to a chunk center, with the chunk
    /// bounds shrunk by `margin` on every side.
    #[must_use]
    pub fn from_relative(rel: Vec3, extents: ChunkExtents, margin: f32) -> Self {
        let bound_x = extents.width - margin;
        let bound_y = extents.height - margin;
        let x = if rel.x > bound_x {
            -1
        } else if rel.x < -bound_x {
            1
        } else {
            0
        };
        let y = if rel.y > bound_y {
            1
        } else if rel.y < -bound_y {
            -1
        } else {
            0
        };
        Self { x, y }
    }

    /// Whether this is the center bucket.
    #[must_use]
    pub const fn is_center(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Whether both axes are off-center (a corner).
    #[must_use]
    pub const fn is_corner(self) -> bool {
        self.x != 0 && self.y != 0
    }

    /// Boundary crossing: a component flipped sign between consecutive
    /// ticks (both values nonzero and negated).
    #[must_use]
    pub const fn crossed_from(self, previous: Self) -> bool {
        (self.x != 0 && previous.x != 0 && self.x != previous.x)
            || (self.y != 0 && previous.y != 0 && self.y != previous.y)
    }

    /// World-grid direction this bucket points at, undoing the sign
    /// convention: `(dx, dy)` in whole chunk steps.
    #[must_use]
    pub const fn world_step(self) -> (i32, i32) {
        (-(self.x as i32), self.y as i32)
    }
}

/// Streamer state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No pending generation needed.
    Clean,
    /// New chunks were created this tick.
    HasGenerated,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Seed for the selection-policy generator
    pub seed: u64,
    /// Probability of revisiting a previously explored chunk
    pub prob_of_prev_chunk: f64,
    /// Probability of re-tiling the current chunk
    pub prob_of_repeat_chunk: f64,
    /// Slope of the event-chunk logistic curve
    pub event_chunk_slope: f32,
    /// Explored-count midpoint where the event-chunk odds reach 0.5
    pub event_chunk_mid_point: f32,
    /// Maximum retained explored-chunk ids (oldest dropped beyond this)
    pub stack_size: usize,
    /// Margin the chunk bounds are shrunk by when bucketing
    pub camera_margin: f32,
    /// Chunk half-extents defining the world grid
    pub chunk_extents: ChunkExtents,
    /// Length of the pre-drawn random pick queue
    pub queue_length: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            prob_of_prev_chunk: 0.15,
            prob_of_repeat_chunk: 0.1,
            event_chunk_slope: 0.75,
            event_chunk_mid_point: 10.0,
            stack_size: 16,
            camera_margin: 2.0,
            chunk_extents: ChunkExtents::new(16.0, 16.0),
            queue_length: DEFAULT_QUEUE_LENGTH,
        }
    }
}

impl StreamerConfig {
    /// Validates probabilities, margins, and sizes.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.prob_of_prev_chunk) {
            return Err(ConfigError::out_of_range(
                "prob_of_prev_chunk",
                format!("must be 0-1, got {}", self.prob_of_prev_chunk),
            ));
        }
        if !(0.0..=1.0).contains(&self.prob_of_repeat_chunk) {
            return Err(ConfigError::out_of_range(
                "prob_of_repeat_chunk",
                format!("must be 0-1, got {}", self.prob_of_repeat_chunk),
            ));
        }
        if self.camera_margin < 0.0
            || self.camera_margin >= self.chunk_extents.width
            || self.camera_margin >= self.chunk_extents.height
        {
            return Err(ConfigError::out_of_range(
                "camera_margin",
                format!(
                    "must be non-negative and smaller than the chunk extents, got {}",
                    self.camera_margin
                ),
            ));
        }
        if self.stack_size == 0 {
            return Err(ConfigError::out_of_range(
                "stack_size",
                "must be at least 1".to_string(),
            ));
        }
        if self.queue_length == 0 {
            return Err(ConfigError::out_of_range(
                "queue_length",
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stateful controller streaming chunks around the player.
pub struct ChunkStreamer<H: ChunkHost> {
    config: StreamerConfig,
    catalog: ChunkCatalog,
    host: H,
    rng: fastrand::Rng,
    chunks: Vec<WorldChunk>,
    current: Option<InstanceId>,
    previous_chunks: Vec<InstanceId>,
    explored_ids: Vec<u32>,
    upcoming: VecDeque<u32>,
    player_location: LocationBucket,
    camera_location: LocationBucket,
    state: StreamState,
}

impl<H: ChunkHost> ChunkStreamer<H> {
    /// Creates a streamer; the selection-policy generator and the
    /// upcoming pick queue both derive from `config.seed`.
    pub fn new(config: StreamerConfig, catalog: ChunkCatalog, host: H) -> ConfigResult<Self> {
        config.validate()?;
        let mut streamer = Self {
            rng: fastrand::Rng::with_seed(config.seed),
            config,
            catalog,
            host,
            chunks: Vec::new(),
            current: None,
            previous_chunks: Vec::new(),
            explored_ids: Vec::new(),
            upcoming: VecDeque::new(),
            player_location: LocationBucket::CENTER,
            camera_location: LocationBucket::CENTER,
            state: StreamState::Clean,
        };
        streamer.refill_upcoming();
        Ok(streamer)
    }

    /// Instantiates the origin chunk at a position and makes it current.
    pub fn spawn_first(&mut self, position: Vec3) -> InstanceId {
        let prefab = self.catalog.first_prefab();
        let instance = self.host.instantiate(prefab, position);
        let mut chunk = WorldChunk::new(
            ChunkKind::Normal(0),
            instance,
            position,
            self.config.chunk_extents,
        );
        chunk.mark_first();
        chunk.set_current(true);
        self.chunks.push(chunk);
        self.current = Some(instance);
        info!(?instance, "spawned first chunk");
        instance
    }

    /// Current streamer phase.
    #[must_use]
    pub const fn state(&self) -> StreamState {
        self.state
    }

    /// Last computed player bucket.
    #[must_use]
    pub const fn player_location(&self) -> LocationBucket {
        self.player_location
    }

    /// Last computed camera bucket.
    #[must_use]
    pub const fn camera_location(&self) -> LocationBucket {
        self.camera_location
    }

    /// Explored-chunk ids eligible for revisiting, oldest first.
    #[must_use]
    pub fn explored_ids(&self) -> &[u32] {
        &self.explored_ids
    }

    /// Instance handle of the chunk the player stands on, if resolved.
    #[must_use]
    pub const fn current(&self) -> Option<InstanceId> {
        self.current
    }

    /// Live chunk records.
    #[must_use]
    pub fn chunks(&self) -> &[WorldChunk] {
        &self.chunks
    }

    /// The host, for engine glue.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Forwards a camera render report to the chunk it concerns.
    pub fn report_rendered(&mut self, instance: InstanceId, camera_name: &str) {
        if let Some(chunk) = self.chunk_mut(instance) {
            chunk.note_rendered(camera_name);
        }
    }

    /// Advances the streamer by one tick.
    ///
    /// Returns the number of chunks created this tick.
    pub fn tick(&mut self, player_pos: Vec3, camera_pos: Vec3, dt: f32) -> usize {
        for chunk in &mut self.chunks {
            chunk.tick(dt);
        }
        self.destroy_expired();

        // Track the chunk under the player. An empty query keeps the
        // previous answer and retries next tick; a different answer
        // rehomes the player and archives the chunk left behind.
        match self.resolve_at(player_pos) {
            Some(resolved) if self.current != Some(resolved) => {
                if let Some(old) = self.current.take() {
                    if let Some(chunk) = self.chunk_mut(old) {
                        chunk.set_current(false);
                    }
                    if !self.previous_chunks.contains(&old) {
                        self.previous_chunks.push(old);
                    }
                }
                self.set_current(resolved);
            },
            Some(_) => {},
            None => {
                if self.current.is_none() {
                    debug!("current chunk unresolved, retrying next tick");
                    return 0;
                }
            },
        }
        let Some(current_pos) = self.current.and_then(|id| self.chunk(id)).map(WorldChunk::position)
        else {
            self.current = None;
            return 0;
        };

        let extents = self.config.chunk_extents;
        let margin = self.config.camera_margin;
        let player_bucket = LocationBucket::from_relative(player_pos - current_pos, extents, margin);
        let camera_bucket = LocationBucket::from_relative(camera_pos - current_pos, extents, margin);

        // Stepping over a boundary flips the bucket sign: the player
        // leaves past one chunk's far bound and enters inside the next
        // chunk's near margin band. Crossings suppress camera-driven
        // generation for the tick.
        let crossed = player_bucket.crossed_from(self.player_location);
        if crossed {
            debug!(?player_bucket, "player crossed a chunk boundary");
        }

        // Return-to-center: the player has committed to the new chunk.
        if player_bucket.is_center() && !self.player_location.is_center() {
            self.settle_on_current();
        }

        let mut created = 0;
        let camera_changed = camera_bucket != self.camera_location;
        if !camera_bucket.is_center() && camera_changed && !crossed {
            created = self.generate_toward(camera_bucket, current_pos);
        }
        self.state = if created > 0 {
            StreamState::HasGenerated
        } else {
            StreamState::Clean
        };

        self.player_location = player_bucket;
        self.camera_location = camera_bucket;
        created
    }

    /// Selection policy: picks the variant for one generation slot.
    ///
    /// Draws happen in a fixed order (event, repeat, previous, random);
    /// each draw consumes generator state, so every slot is an
    /// independent sequence of up to three draws.
    pub fn next_chunk_kind(&mut self) -> ChunkKind {
        if self.rng.f64() < self.probability_of_event_chunk() {
            return ChunkKind::Event;
        }

        let current_kind = self
            .current
            .and_then(|id| self.chunk(id))
            .filter(|c| !c.is_first())
            .map(WorldChunk::kind);
        if self.rng.f64() < self.config.prob_of_repeat_chunk {
            if let Some(kind) = current_kind {
                return kind;
            }
        }

        if self.rng.f64() < self.config.prob_of_prev_chunk {
            if let Some(id) = self.explored_ids.pop() {
                return ChunkKind::Normal(id);
            }
        }

        ChunkKind::Normal(self.next_upcoming())
    }

    /// Logistic odds of the event chunk given how many chunks have been
    /// explored so far.
    fn probability_of_event_chunk(&self) -> f64 {
        let n = self.explored_ids.len() as f64;
        let slope = f64::from(self.config.event_chunk_slope);
        let midpoint = f64::from(self.config.event_chunk_mid_point);
        1.0 / (1.0 + (-slope * (n - midpoint)).exp())
    }

    /// Creates a chunk at a world position unless the cell is occupied.
    ///
    /// Idempotent: a second call for the same position is a no-op.
    pub fn create_chunk_at(&mut self, position: Vec3, kind: ChunkKind) -> Option<InstanceId> {
        if self.host.occupant_at(position).is_some() {
            debug!(?position, "target cell occupied, skipping instantiation");
            return None;
        }
        let prefab = self.catalog.prefab(kind);
        let instance = self.host.instantiate(prefab, position);
        self.chunks.push(WorldChunk::new(
            kind,
            instance,
            position,
            self.config.chunk_extents,
        ));
        info!(?instance, ?kind, "created chunk");
        Some(instance)
    }

    fn generate_toward(&mut self, camera_bucket: LocationBucket, current_pos: Vec3) -> usize {
        let (dx, dy) = camera_bucket.world_step();
        let steps: &[(i32, i32)] = if camera_bucket.is_corner() {
            &[(1, 0), (0, 1), (1, 1)]
        } else {
            &[(1, 1)]
        };

        let extents = self.config.chunk_extents;
        let base = ChunkCoord::from_world(current_pos, extents);
        let mut created = 0;
        for &(use_x, use_y) in steps {
            let target = base.offset(dx * use_x, dy * use_y).to_world_center(extents);
            // Each slot draws its own policy outcome.
            let kind = self.next_chunk_kind();
            if self.create_chunk_at(target, kind).is_some() {
                created += 1;
            }
        }
        created
    }

    /// Marks the current chunk explored and retires everything the
    /// player left behind.
    fn settle_on_current(&mut self) {
        if let Some(current) = self.current {
            if let Some(chunk) = self.chunk_mut(current) {
                if !chunk.is_first() {
                    chunk.mark_explored();
                }
            }
        }
        // Collect first, then apply: no mutation while scanning.
        let to_retire: Vec<InstanceId> = self.previous_chunks.drain(..).collect();
        for instance in to_retire {
            if let Some(chunk) = self.chunk_mut(instance) {
                chunk.set_not_visible();
            }
        }
    }

    fn destroy_expired(&mut self) {
        let expired: Vec<InstanceId> = self
            .chunks
            .iter()
            .filter(|c| c.ready_for_destroy())
            .map(WorldChunk::instance)
            .collect();
        for instance in expired {
            self.host.destroy(instance);
            if let Some(idx) = self.chunks.iter().position(|c| c.instance() == instance) {
                let notice = self.chunks.swap_remove(idx).into_destroy_notice();
                self.handle_destroy_notice(notice);
            }
        }
    }

    /// Consumes a chunk's destroy notification: explored chunks feed the
    /// revisit stack, unexplored ones are dropped.
    pub fn handle_destroy_notice(&mut self, notice: DestroyNotice) {
        if !notice.was_explored {
            return;
        }
        if let Some(id) = notice.kind.catalog_index() {
            if self.explored_ids.len() == self.config.stack_size {
                self.explored_ids.remove(0);
            }
            self.explored_ids.push(id);
            debug!(id, depth = self.explored_ids.len(), "pushed explored chunk");
        }
    }

    fn resolve_at(&self, position: Vec3) -> Option<InstanceId> {
        let instance = self.host.occupant_at(position)?;
        // The query is restricted to the ground layer on the engine
        // side; here we only accept instances we know as chunks.
        self.chunk(instance).map(WorldChunk::instance)
    }

    fn set_current(&mut self, instance: InstanceId) {
        self.current = Some(instance);
        if let Some(chunk) = self.chunk_mut(instance) {
            chunk.set_current(true);
        }
    }

    fn chunk(&self, instance: InstanceId) -> Option<&WorldChunk> {
        self.chunks.iter().find(|c| c.instance() == instance)
    }

    fn chunk_mut(&mut self, instance: InstanceId) -> Option<&mut WorldChunk> {
        self.chunks.iter_mut().find(|c| c.instance() == instance)
    }

    fn next_upcoming(&mut self) -> u32 {
        if self.upcoming.is_empty() {
            self.refill_upcoming();
        }
        // Queue is never empty after a refill (queue_length >= 1).
        self.upcoming.pop_front().unwrap_or(0)
    }

    fn refill_upcoming(&mut self) {
        let len = self.catalog.len();
        for _ in 0..self.config.queue_length {
            self.upcoming.push_back(self.rng.usize(0..len) as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use ranger_common::PrefabId;

    const EXTENTS: ChunkExtents = ChunkExtents::new(16.0, 16.0);

    fn catalog(variants: u32) -> ChunkCatalog {
        ChunkCatalog::new(
            (0..variants).map(PrefabId::new).collect(),
            PrefabId::new(900),
            PrefabId::new(901),
        )
        .expect("valid catalog")
    }

    fn streamer(config: StreamerConfig) -> ChunkStreamer<MemoryHost> {
        let host = MemoryHost::new(config.chunk_extents);
        ChunkStreamer::new(config, catalog(8), host).expect("valid config")
    }

    fn default_config() -> StreamerConfig {
        StreamerConfig {
            seed: 42,
            chunk_extents: EXTENTS,
            ..Default::default()
        }
    }

    #[test]
    fn bucketing_uses_asymmetric_sign_convention() {
        let margin = 2.0;
        // Past +x bound: bucket x is -1.
        let b = LocationBucket::from_relative(Vec3::new(15.0, 0.0, 0.0), EXTENTS, margin);
        assert_eq!(b, LocationBucket { x: -1, y: 0 });
        // Past -x bound: bucket x is +1.
        let b = LocationBucket::from_relative(Vec3::new(-15.0, 0.0, 0.0), EXTENTS, margin);
        assert_eq!(b, LocationBucket { x: 1, y: 0 });
        // Past +y bound: bucket y is +1.
        let b = LocationBucket::from_relative(Vec3::new(0.0, 15.0, 0.0), EXTENTS, margin);
        assert_eq!(b, LocationBucket { x: 0, y: 1 });
        // Inside the shrunk bounds: center.
        let b = LocationBucket::from_relative(Vec3::new(10.0, -10.0, 0.0), EXTENTS, margin);
        assert!(b.is_center());
    }

    #[test]
    fn world_step_undoes_the_sign_convention() {
        assert_eq!(LocationBucket { x: -1, y: 0 }.world_step(), (1, 0));
        assert_eq!(LocationBucket { x: 1, y: -1 }.world_step(), (-1, -1));
    }

    #[test]
    fn sign_flip_is_a_crossing() {
        let prev = LocationBucket { x: 1, y: 0 };
        assert!(LocationBucket { x: -1, y: 0 }.crossed_from(prev));
        // Gaining a component is not a crossing.
        assert!(!LocationBucket { x: 1, y: 1 }.crossed_from(prev));
        // Returning to center is not a crossing.
        assert!(!LocationBucket::CENTER.crossed_from(prev));
    }

    #[test]
    fn selection_policy_is_deterministic_per_seed() {
        let mut a = streamer(default_config());
        let mut b = streamer(default_config());
        a.spawn_first(Vec3::ZERO);
        b.spawn_first(Vec3::ZERO);
        for _ in 0..50 {
            assert_eq!(a.next_chunk_kind(), b.next_chunk_kind());
        }
    }

    #[test]
    fn event_probability_is_half_at_midpoint() {
        let mut s = streamer(StreamerConfig {
            event_chunk_mid_point: 3.0,
            ..default_config()
        });
        s.explored_ids = vec![0, 1, 2];
        assert!((s.probability_of_event_chunk() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn suppressed_policy_rules_yield_uniform_catalog_picks() {
        // Event odds pushed to ~0, repeat and previous disabled: every
        // draw must be a uniformly distributed catalog index.
        let mut s = streamer(StreamerConfig {
            prob_of_repeat_chunk: 0.0,
            prob_of_prev_chunk: 0.0,
            event_chunk_mid_point: 1000.0,
            ..default_config()
        });
        s.spawn_first(Vec3::ZERO);

        let mut counts = [0u32; 8];
        let draws = 10_000;
        for _ in 0..draws {
            match s.next_chunk_kind() {
                ChunkKind::Normal(id) => counts[id as usize] += 1,
                ChunkKind::Event => panic!("event chunk selected with ~0 probability"),
            }
        }

        // Chi-square uniformity check, 7 degrees of freedom. The 0.999
        // quantile is 24.3; anything near that on a healthy generator is
        // rare, so give some headroom.
        let expected = f64::from(draws) / 8.0;
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let d = f64::from(c) - expected;
                d * d / expected
            })
            .sum();
        assert!(chi2 < 30.0, "chi-square statistic too large: {chi2}");
    }

    #[test]
    fn empty_explored_stack_falls_through_to_random() {
        let mut s = streamer(StreamerConfig {
            prob_of_prev_chunk: 1.0,
            prob_of_repeat_chunk: 0.0,
            event_chunk_mid_point: 1000.0,
            ..default_config()
        });
        s.spawn_first(Vec3::ZERO);
        // Stack empty: rule must fall through, never fail.
        assert!(matches!(s.next_chunk_kind(), ChunkKind::Normal(_)));

        s.explored_ids.push(5);
        assert_eq!(s.next_chunk_kind(), ChunkKind::Normal(5));
        assert!(s.explored_ids.is_empty());
    }

    #[test]
    fn repeat_rule_skips_the_first_chunk() {
        let mut s = streamer(StreamerConfig {
            prob_of_repeat_chunk: 1.0,
            prob_of_prev_chunk: 0.0,
            event_chunk_mid_point: 1000.0,
            ..default_config()
        });
        s.spawn_first(Vec3::ZERO);
        // Current chunk is the origin; repeat must not re-tile it.
        let kind = s.next_chunk_kind();
        assert!(matches!(kind, ChunkKind::Normal(_)));

        // A regular current chunk is repeated.
        let instance = s
            .create_chunk_at(Vec3::new(32.0, 0.0, 0.0), ChunkKind::Normal(6))
            .expect("cell free");
        s.set_current(instance);
        assert_eq!(s.next_chunk_kind(), ChunkKind::Normal(6));
    }

    #[test]
    fn chunk_creation_is_idempotent() {
        let mut s = streamer(default_config());
        let pos = Vec3::new(32.0, 0.0, 0.0);
        let first = s.create_chunk_at(pos, ChunkKind::Normal(1));
        assert!(first.is_some());
        let second = s.create_chunk_at(pos, ChunkKind::Normal(2));
        assert!(second.is_none());
        assert_eq!(s.host_mut().instance_count(), 1);
    }

    #[test]
    fn unresolved_chunk_retries_without_failing() {
        let mut s = streamer(default_config());
        // No chunks at all: the tick is a no-op, not an error.
        assert_eq!(s.tick(Vec3::ZERO, Vec3::ZERO, 0.016), 0);
        assert!(s.current().is_none());

        s.spawn_first(Vec3::ZERO);
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);
        assert!(s.current().is_some());
    }

    #[test]
    fn camera_edge_crossing_generates_one_chunk() {
        let mut s = streamer(default_config());
        s.spawn_first(Vec3::ZERO);
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);
        assert_eq!(s.state(), StreamState::Clean);

        // Camera drifts past the +x threshold; player stays centered.
        let created = s.tick(Vec3::ZERO, Vec3::new(15.0, 0.0, 0.0), 0.016);
        assert_eq!(created, 1);
        assert_eq!(s.state(), StreamState::HasGenerated);
        // The new chunk sits one grid step in +x.
        let new_chunk = &s.chunks()[1];
        assert_eq!(new_chunk.position(), Vec3::new(EXTENTS.step_x(), 0.0, 0.0));

        // Same bucket next tick: no further generation.
        let created = s.tick(Vec3::ZERO, Vec3::new(15.2, 0.0, 0.0), 0.016);
        assert_eq!(created, 0);
        assert_eq!(s.state(), StreamState::Clean);
    }

    #[test]
    fn camera_corner_crossing_generates_three_chunks() {
        let mut s = streamer(default_config());
        s.spawn_first(Vec3::ZERO);
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);

        let created = s.tick(Vec3::ZERO, Vec3::new(15.0, 15.0, 0.0), 0.016);
        assert_eq!(created, 3);
        let positions: Vec<Vec3> = s.chunks()[1..].iter().map(WorldChunk::position).collect();
        let step = EXTENTS.step_x();
        assert!(positions.contains(&Vec3::new(step, 0.0, 0.0)));
        assert!(positions.contains(&Vec3::new(0.0, step, 0.0)));
        assert!(positions.contains(&Vec3::new(step, step, 0.0)));
    }

    #[test]
    fn generation_snaps_targets_to_the_world_grid() {
        let mut s = streamer(default_config());
        s.spawn_first(Vec3::ZERO);
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);
        let step = EXTENTS.step_x();

        // Camera pushes +x, the player follows onto the new chunk, and
        // the camera crosses the next threshold from there.
        s.tick(Vec3::ZERO, Vec3::new(15.0, 0.0, 0.0), 0.016);
        s.tick(Vec3::new(17.0, 0.0, 0.0), Vec3::new(17.0, 0.0, 0.0), 0.016);
        s.tick(Vec3::new(step, 0.0, 0.0), Vec3::new(step, 0.0, 0.0), 0.016);
        let created = s.tick(
            Vec3::new(step, 0.0, 0.0),
            Vec3::new(step + 15.0, 0.0, 0.0),
            0.016,
        );
        assert_eq!(created, 1);

        // Every chunk sits on an exact grid-cell center.
        for chunk in s.chunks() {
            let coord = ChunkCoord::from_world(chunk.position(), EXTENTS);
            assert_eq!(coord.to_world_center(EXTENTS), chunk.position());
        }
        assert!(s
            .chunks()
            .iter()
            .any(|c| c.position() == Vec3::new(2.0 * step, 0.0, 0.0)));
    }

    #[test]
    fn boundary_crossing_rehomes_and_archives() {
        let mut s = streamer(default_config());
        s.spawn_first(Vec3::ZERO);
        let first = s.current().expect("first chunk current");
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);

        // Walk toward +x: camera crossing generates the neighbor.
        s.tick(Vec3::new(15.0, 0.0, 0.0), Vec3::new(15.0, 0.0, 0.0), 0.016);
        assert_eq!(s.player_location(), LocationBucket { x: -1, y: 0 });

        // Step just past the boundary: the player now sits inside the
        // neighbor's near margin band, so the bucket flips sign.
        let on_neighbor = Vec3::new(17.0, 0.0, 0.0);
        s.tick(on_neighbor, on_neighbor, 0.016);
        assert_eq!(s.player_location(), LocationBucket { x: 1, y: 0 });
        let current = s.current().expect("rehomed");
        assert_ne!(current, first);
        assert!(s.chunks().iter().any(|c| c.instance() == first && !c.is_current()));

        // Center on the new chunk: it becomes explored, the old one is
        // retired.
        let neighbor_center = Vec3::new(EXTENTS.step_x(), 0.0, 0.0);
        s.tick(neighbor_center, neighbor_center, 0.016);
        let current_chunk = s
            .chunks()
            .iter()
            .find(|c| c.instance() == current)
            .expect("current chunk record");
        assert!(current_chunk.is_explored());
        let first_chunk = s
            .chunks()
            .iter()
            .find(|c| c.instance() == first)
            .expect("first chunk record");
        assert_eq!(first_chunk.visibility(), crate::chunk::Visibility::NotVisible);
    }

    #[test]
    fn retired_chunks_are_destroyed_and_recycled() {
        let mut s = streamer(default_config());
        let instance = s
            .create_chunk_at(Vec3::ZERO, ChunkKind::Normal(4))
            .expect("cell free");
        if let Some(chunk) = s.chunk_mut(instance) {
            chunk.mark_explored();
            chunk.set_not_visible();
        }
        // Tick past the destroy grace period.
        s.tick(Vec3::ZERO, Vec3::ZERO, crate::chunk::DESTROY_GRACE + 0.1);
        s.tick(Vec3::ZERO, Vec3::ZERO, 0.016);
        assert!(s.chunks().iter().all(|c| c.instance() != instance));
        assert_eq!(s.explored_ids(), &[4]);
    }

    #[test]
    fn unexplored_chunks_are_dropped_on_destroy() {
        let mut s = streamer(default_config());
        s.handle_destroy_notice(DestroyNotice {
            kind: ChunkKind::Normal(3),
            was_explored: false,
        });
        assert!(s.explored_ids().is_empty());
    }

    #[test]
    fn explored_stack_drops_oldest_beyond_capacity() {
        let mut s = streamer(StreamerConfig {
            stack_size: 2,
            ..default_config()
        });
        for id in 0..3 {
            s.handle_destroy_notice(DestroyNotice {
                kind: ChunkKind::Normal(id),
                was_explored: true,
            });
        }
        assert_eq!(s.explored_ids(), &[1, 2]);
    }

    #[test]
    fn invalid_probability_is_rejected() {
        let config = StreamerConfig {
            prob_of_prev_chunk: 1.5,
            ..default_config()
        };
        assert!(config.validate().is_err());
    }
}
