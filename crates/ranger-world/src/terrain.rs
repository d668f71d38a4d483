//! Terrain sampling: noise grids, ground-texture selection, and
//! ground-cover placement.
//!
//! A chunk's generation step maps its normalized grid to world-space
//! sample points, evaluates the noise field per cell, and derives two
//! things from the result: which ground texture(s) each tile shows (with
//! blend factors across band gaps) and where trees/rocks/etc. are
//! scattered.

use glam::{Vec3, Vec4};
use ranger_common::{ConfigError, ConfigResult, PrefabId, TextureId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::noise::{NoiseField, NoiseMethod, NoiseSample};

/// How the generation step textures tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureMode {
    /// Band textures with blend factors across gaps.
    #[default]
    Blended,
    /// A color ramp evaluated at the sample value; band gaps blend the
    /// anchor colors of the adjacent bands.
    Coloured,
}

/// Noise and sampling parameters for terrain generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Seed for the noise permutation table and placement jitter
    pub seed: u64,
    /// Grid resolution per chunk side (2-512)
    pub resolution: u32,
    /// Base noise frequency
    pub frequency: f32,
    /// Noise method family
    pub method: NoiseMethod,
    /// Noise dimensionality (1-3)
    pub dimensions: u32,
    /// Whether to accumulate fractal octaves
    pub use_fractal: bool,
    /// Octave count for fractal sums (1-8)
    pub octaves: u32,
    /// Frequency multiplier per octave (1-4)
    pub lacunarity: f32,
    /// Amplitude multiplier per octave (0-1)
    pub persistence: f32,
    /// World-units-per-noise-unit scale applied to sample points
    pub scale: f32,
    /// Local scale of the chunk transform, used for placement offsets
    pub local_scale: f32,
    /// Tile texturing mode
    pub mode: TextureMode,
    /// Ramp for coloured mode; a grayscale ramp when unset
    pub color_ramp: Option<ColorRamp>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            resolution: 64,
            frequency: 1.0,
            method: NoiseMethod::Perlin,
            dimensions: 3,
            use_fractal: true,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            scale: 1.0,
            local_scale: 1.0,
            mode: TextureMode::Blended,
            color_ramp: None,
        }
    }
}

impl TerrainConfig {
    /// Validates the ranged parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(2..=512).contains(&self.resolution) {
            return Err(ConfigError::out_of_range(
                "resolution",
                format!("must be 2-512, got {}", self.resolution),
            ));
        }
        if !(1..=3).contains(&self.dimensions) {
            return Err(ConfigError::out_of_range(
                "dimensions",
                format!("must be 1-3, got {}", self.dimensions),
            ));
        }
        if !(1..=8).contains(&self.octaves) {
            return Err(ConfigError::out_of_range(
                "octaves",
                format!("must be 1-8, got {}", self.octaves),
            ));
        }
        if !(1.0..=4.0).contains(&self.lacunarity) {
            return Err(ConfigError::out_of_range(
                "lacunarity",
                format!("must be 1-4, got {}", self.lacunarity),
            ));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(ConfigError::out_of_range(
                "persistence",
                format!("must be 0-1, got {}", self.persistence),
            ));
        }
        if self.scale <= 0.0 {
            return Err(ConfigError::out_of_range(
                "scale",
                format!("must be positive, got {}", self.scale),
            ));
        }
        Ok(())
    }
}

/// One entry in the ordered ground-texture table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTexture {
    /// Display name
    pub name: String,
    /// Texture asset handle
    pub texture: TextureId,
    /// Lower edge of this texture's height band
    pub height_min: f32,
    /// Upper edge of this texture's height band
    pub height_max: f32,
}

/// Ordered ground-texture table.
///
/// Entries partition [0, 1] into bands, possibly with blend gaps between
/// `height_max[i]` and `height_min[i+1]`:
///
/// ```text
/// |--------,------------,-------,------------,-------|
/// 0             blend                blend           1
/// amin    amax          bmin   bmax         cmin    cmax
/// ```
///
/// The first entry's `height_min` is treated as 0 and the last entry's
/// `height_max` as 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<GroundTexture>", into = "Vec<GroundTexture>")]
pub struct TextureTable {
    entries: Vec<GroundTexture>,
}

impl TryFrom<Vec<GroundTexture>> for TextureTable {
    type Error = ConfigError;

    fn try_from(entries: Vec<GroundTexture>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<TextureTable> for Vec<GroundTexture> {
    fn from(table: TextureTable) -> Self {
        table.entries
    }
}

/// One or two textures a sample resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureBand<'a> {
    /// The sample sits inside a single texture's band.
    Single(&'a GroundTexture),
    /// The sample sits in the gap between two bands; blend them.
    Blend(&'a GroundTexture, &'a GroundTexture),
}

impl<'a> TextureBand<'a> {
    /// Number of textures in the band (1 or 2).
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Blend(..) => 2,
        }
    }

    /// A band always holds at least one texture.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The lower (or only) texture.
    #[must_use]
    pub const fn primary(&self) -> &'a GroundTexture {
        match self {
            Self::Single(t) | Self::Blend(t, _) => t,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BandIdx {
    Single(usize),
    Blend(usize, usize),
}

impl TextureTable {
    /// Builds a table, rejecting empty or out-of-order entries.
    pub fn new(entries: Vec<GroundTexture>) -> ConfigResult<Self> {
        if entries.is_empty() {
            return Err(ConfigError::TextureTable("no entries".into()));
        }
        for (i, tex) in entries.iter().enumerate() {
            if !(0.0..=1.0).contains(&tex.height_min) || !(0.0..=1.0).contains(&tex.height_max) {
                return Err(ConfigError::TextureTable(format!(
                    "'{}' has height band outside [0, 1]",
                    tex.name
                )));
            }
            if tex.height_max < tex.height_min {
                return Err(ConfigError::TextureTable(format!(
                    "'{}' has height_max below height_min",
                    tex.name
                )));
            }
            if let Some(next) = entries.get(i + 1) {
                if next.height_min < tex.height_min {
                    return Err(ConfigError::TextureTable(format!(
                        "'{}' is out of order after '{}'",
                        next.name, tex.name
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    /// Entries in band order.
    #[must_use]
    pub fn entries(&self) -> &[GroundTexture] {
        &self.entries
    }

    fn band_idx(&self, sample: f32) -> BandIdx {
        for i in 0..self.entries.len() {
            let tex_a = &self.entries[i];
            let Some(tex_b) = self.entries.get(i + 1) else {
                // Last entry's height_max is implicitly 1; anything that
                // fell through the earlier bands lands here, including
                // float edge cases below the first band.
                if sample < tex_a.height_min {
                    debug!(sample, "sample below texture table range, using last band");
                }
                return BandIdx::Single(i);
            };
            if sample > tex_a.height_max && sample < tex_b.height_min {
                return BandIdx::Blend(i, i + 1);
            }
            if sample >= tex_a.height_min && sample < tex_a.height_max {
                return BandIdx::Single(i);
            }
        }
        // Unreachable for a validated (non-empty) table.
        BandIdx::Single(self.entries.len() - 1)
    }

    /// Resolves a sample value to one or two textures.
    ///
    /// Total for any `sample`: out-of-range values fall back to the last
    /// entry rather than failing.
    #[must_use]
    pub fn band(&self, sample: f32) -> TextureBand<'_> {
        match self.band_idx(sample) {
            BandIdx::Single(i) => TextureBand::Single(&self.entries[i]),
            BandIdx::Blend(a, b) => TextureBand::Blend(&self.entries[a], &self.entries[b]),
        }
    }

    /// Resolves the band for an interior grid cell, widening a single
    /// band to a blend pair when an orthogonal neighbor has already
    /// crossed the band edge. Keeps tile seams smooth where the noise
    /// slope is steep.
    #[must_use]
    pub fn band_at(&self, grid: &NoiseGrid, x: u32, y: u32) -> TextureBand<'_> {
        let sample = grid.get(x, y).value;
        let idx = match self.band_idx(sample) {
            BandIdx::Blend(a, b) => return TextureBand::Blend(&self.entries[a], &self.entries[b]),
            BandIdx::Single(i) => i,
        };

        let current = &self.entries[idx];
        let neighbors = [
            grid.get(x - 1, y).value,
            grid.get(x + 1, y).value,
            grid.get(x, y - 1).value,
            grid.get(x, y + 1).value,
        ];

        if idx > 0 && neighbors.iter().any(|&n| n < current.height_min) {
            return TextureBand::Blend(&self.entries[idx - 1], current);
        }
        if idx + 1 < self.entries.len() && neighbors.iter().any(|&n| n > current.height_max) {
            return TextureBand::Blend(current, &self.entries[idx + 1]);
        }
        TextureBand::Single(current)
    }
}

/// Blend weight of a sample between two adjacent bands.
///
/// 0 at or below `a.height_max`, 1 at or above `b.height_min`.
#[must_use]
pub fn blend_weight(sample: f32, a: &GroundTexture, b: &GroundTexture) -> f32 {
    let gap = b.height_min - a.height_max;
    if gap <= 0.0 {
        // Adjacent bands with no gap: snap to whichever side the sample is on.
        return if sample < a.height_max { 0.0 } else { 1.0 };
    }
    ((sample - a.height_max) / gap).clamp(0.0, 1.0)
}

/// Linear interpolation of two texture channel values by a blend weight.
#[must_use]
pub fn blend_channels(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    a.lerp(b, t.clamp(0.0, 1.0))
}

/// Blend factors for a tile and its eight neighbors, fed to the blending
/// material so tile seams interpolate smoothly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBlend {
    /// Blend factor at the tile center
    pub center: f32,
    /// Left neighbor
    pub x0: f32,
    /// Right neighbor
    pub x1: f32,
    /// Bottom neighbor
    pub y0: f32,
    /// Top neighbor
    pub y1: f32,
    /// Bottom-left neighbor
    pub xy00: f32,
    /// Bottom-right neighbor
    pub xy10: f32,
    /// Top-left neighbor
    pub xy01: f32,
    /// Top-right neighbor
    pub xy11: f32,
}

impl TileBlend {
    /// Computes blend factors for an interior cell against a blend pair.
    #[must_use]
    pub fn at(grid: &NoiseGrid, x: u32, y: u32, a: &GroundTexture, b: &GroundTexture) -> Self {
        let w = |sx: u32, sy: u32| blend_weight(grid.get(sx, sy).value, a, b);
        Self {
            center: w(x, y),
            x0: w(x - 1, y),
            x1: w(x + 1, y),
            y0: w(x, y - 1),
            y1: w(x, y + 1),
            xy00: w(x - 1, y - 1),
            xy10: w(x + 1, y - 1),
            xy01: w(x - 1, y + 1),
            xy11: w(x + 1, y + 1),
        }
    }
}

/// A scatter rule before derivation (as configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterRuleConfig {
    /// Whether this rule is active
    pub enabled: bool,
    /// Prefabs to pick from, uniformly
    pub prefabs: Vec<PrefabId>,
    /// Minimum sample value for placement
    pub height_threshold: f32,
    /// Placement candidates per quadrant row/column (0-16)
    pub density: u32,
}

impl ScatterRuleConfig {
    /// Validates the ranged parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.density > 16 {
            return Err(ConfigError::out_of_range(
                "density",
                format!("must be 0-16, got {}", self.density),
            ));
        }
        if self.enabled && self.prefabs.is_empty() {
            return Err(ConfigError::out_of_range(
                "prefabs",
                "enabled scatter rule has no prefabs".to_string(),
            ));
        }
        Ok(())
    }
}

/// A scatter rule with its derived placement grid.
///
/// Derived fields are computed once at construction and stored, so they
/// survive iteration over rule slices.
#[derive(Debug, Clone)]
pub struct ScatterRule {
    /// Source configuration
    pub config: ScatterRuleConfig,
    /// Whether this rule can ever place anything
    pub can_generate: bool,
    /// Cells between placement candidates
    pub grid_spacing: u32,
    /// Modulus for candidate cells (half the spacing, rounded down)
    pub grid_offset: u32,
}

impl ScatterRule {
    /// Derives placement-grid fields for the given chunk resolution.
    #[must_use]
    pub fn derive(config: ScatterRuleConfig, resolution: u32) -> Self {
        let can_generate = config.enabled && config.density != 0;
        let grid_spacing = if config.density == 0 {
            0
        } else {
            resolution / config.density
        };
        let grid_offset = grid_spacing / 2;
        Self {
            config,
            can_generate,
            grid_spacing,
            grid_offset,
        }
    }

    fn applies_at(&self, x: u32, y: u32) -> bool {
        // grid_offset of 0 means density exceeds half the resolution;
        // nothing sensible can be placed on that grid.
        self.can_generate && self.grid_offset != 0 && x % self.grid_offset == 0 && y % self.grid_offset == 0
    }
}

/// A placement decision for one scattered object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    /// Prefab to instantiate
    pub prefab: PrefabId,
    /// World-space position
    pub position: Vec3,
}

/// Padded grid of noise samples for one chunk.
///
/// Sized `(resolution + 2)^2`: one cell of padding on each side so
/// neighbor differences are available at the chunk edges.
#[derive(Debug, Clone)]
pub struct NoiseGrid {
    resolution: u32,
    samples: Vec<NoiseSample>,
}

impl NoiseGrid {
    /// Interior resolution (excluding padding).
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Full padded side length.
    #[must_use]
    pub const fn padded(&self) -> u32 {
        self.resolution + 2
    }

    /// Sample at padded-grid coordinates.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> &NoiseSample {
        &self.samples[(y * self.padded() + x) as usize]
    }

    /// Iterates interior cells as `(x, y)` in padded coordinates.
    pub fn interior(&self) -> impl Iterator<Item = (u32, u32)> {
        let res = self.resolution;
        (1..=res).flat_map(move |y| (1..=res).map(move |x| (x, y)))
    }
}

/// Per-tile texturing decision produced by the generation step.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePaint {
    /// Padded-grid x
    pub x: u32,
    /// Padded-grid y
    pub y: u32,
    /// Lower (or only) texture
    pub primary: TextureId,
    /// Upper texture of a blend pair
    pub secondary: Option<TextureId>,
    /// Neighbor blend factors, present only for blend pairs
    pub blend: Option<TileBlend>,
    /// Ramp-evaluated tile color, present only in coloured mode
    pub color: Option<Vec4>,
}

/// Everything a chunk's generation step derives from the noise field.
#[derive(Debug, Clone)]
pub struct ChunkSurface {
    /// The sampled grid (padded)
    pub grid: NoiseGrid,
    /// Texturing decision per interior tile
    pub tiles: Vec<TilePaint>,
    /// Scattered object placements
    pub placements: Vec<PlacementCandidate>,
}

/// Evaluates the noise field over a chunk and derives tile texturing and
/// object placement.
#[derive(Debug)]
pub struct TerrainSampler {
    config: TerrainConfig,
    field: NoiseField,
    rng: fastrand::Rng,
}

impl TerrainSampler {
    /// Creates a sampler from terrain config; the noise permutation table
    /// and the placement-jitter generator both derive from `config.seed`.
    #[must_use]
    pub fn new(config: TerrainConfig) -> Self {
        let field = NoiseField::new(config.seed);
        let rng = fastrand::Rng::with_seed(config.seed);
        Self { config, field, rng }
    }

    /// Returns the sampler configuration.
    #[must_use]
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Builds the padded noise grid for a chunk.
    ///
    /// `corners` are the world-space corners of the chunk in the order
    /// `[p00, p10, p01, p11]`; each cell's sample point is the bilinear
    /// interpolation of the corners at `(i + 0.5) * step`, divided by the
    /// configured scale before sampling.
    #[must_use]
    pub fn build_grid(&self, corners: [Vec3; 4]) -> NoiseGrid {
        let n = self.config.resolution + 2;
        let step = 1.0 / n as f32;
        let [p00, p10, p01, p11] = corners.map(|c| c / self.config.scale);

        let mut samples = Vec::with_capacity((n * n) as usize);
        for yn in 0..n {
            let t_row = (yn as f32 + 0.5) * step;
            let point0 = p00.lerp(p01, t_row);
            let point1 = p10.lerp(p11, t_row);
            for xn in 0..n {
                let point = point0.lerp(point1, (xn as f32 + 0.5) * step);
                let mut sample = if self.config.use_fractal {
                    self.field.fractal_sum(
                        self.config.method,
                        self.config.dimensions,
                        point,
                        self.config.frequency,
                        self.config.octaves,
                        self.config.lacunarity,
                        self.config.persistence,
                    )
                } else {
                    self.field.sample(
                        self.config.method,
                        self.config.dimensions,
                        point,
                        self.config.frequency,
                    )
                };
                sample = self.config.method.remap(sample);
                sample.point = point;
                sample.point0 = point0;
                samples.push(sample);
            }
        }
        NoiseGrid {
            resolution: self.config.resolution,
            samples,
        }
    }

    /// Emits placement candidates for one cell against the scatter rules.
    ///
    /// A rule fires when the cell lies on its placement grid and the
    /// sample clears its height threshold. The candidate sits at
    /// `point0 * scale`, nudged by a fixed quadrant offset and a random
    /// jitter of up to `8 / density` per axis.
    pub fn classify(
        &mut self,
        sample: &NoiseSample,
        x: u32,
        y: u32,
        rules: &[ScatterRule],
    ) -> Vec<PlacementCandidate> {
        let mut candidates = Vec::new();
        for rule in rules {
            if !rule.applies_at(x, y) || sample.value <= rule.config.height_threshold {
                continue;
            }
            let density = rule.config.density as f32;
            let offset = self.config.scale * self.config.local_scale / (4.0 * density);
            let jitter = Vec3::new(
                (self.rng.f32() * 2.0 - 1.0) * (8.0 / density),
                (self.rng.f32() * 2.0 - 1.0) * (8.0 / density),
                0.0,
            );
            let position = sample.point0 * self.config.scale + Vec3::new(offset, offset, 0.0) + jitter;
            let prefab = rule.config.prefabs[self.rng.usize(0..rule.config.prefabs.len())];
            candidates.push(PlacementCandidate { prefab, position });
        }
        candidates
    }

    /// Runs the full generation step for a chunk: grid, tile texturing,
    /// and object placement.
    pub fn generate_surface(
        &mut self,
        corners: [Vec3; 4],
        textures: &TextureTable,
        rules: &[ScatterRule],
    ) -> ChunkSurface {
        let grid = self.build_grid(corners);
        let mut tiles = Vec::new();
        let mut placements = Vec::new();
        let ramp = match self.config.mode {
            TextureMode::Coloured => Some(self.config.color_ramp.clone().unwrap_or_default()),
            TextureMode::Blended => None,
        };

        for (x, y) in grid.interior() {
            let sample = *grid.get(x, y);
            let paint = if let Some(ramp) = &ramp {
                colored_tile(textures, ramp, sample.value, x, y)
            } else {
                match textures.band_at(&grid, x, y) {
                    TextureBand::Single(tex) => TilePaint {
                        x,
                        y,
                        primary: tex.texture,
                        secondary: None,
                        blend: None,
                        color: None,
                    },
                    TextureBand::Blend(a, b) => TilePaint {
                        x,
                        y,
                        primary: a.texture,
                        secondary: Some(b.texture),
                        blend: Some(TileBlend::at(&grid, x, y, a, b)),
                        color: None,
                    },
                }
            };
            tiles.push(paint);
            placements.extend(self.classify(&sample, x, y, rules));
        }

        ChunkSurface {
            grid,
            tiles,
            placements,
        }
    }
}

/// Texturing decision for one tile in coloured mode.
///
/// Inside a band the ramp is evaluated at the sample value directly;
/// in a band gap the two bands' anchor colors are blended by the gap
/// weight so tile colors track the texture seams.
fn colored_tile(
    textures: &TextureTable,
    ramp: &ColorRamp,
    value: f32,
    x: u32,
    y: u32,
) -> TilePaint {
    match textures.band(value) {
        TextureBand::Single(tex) => TilePaint {
            x,
            y,
            primary: tex.texture,
            secondary: None,
            blend: None,
            color: Some(ramp.evaluate(value)),
        },
        TextureBand::Blend(a, b) => {
            let t = blend_weight(value, a, b);
            TilePaint {
                x,
                y,
                primary: a.texture,
                secondary: Some(b.texture),
                blend: None,
                color: Some(blend_channels(
                    ramp.evaluate(a.height_max),
                    ramp.evaluate(b.height_min),
                    t,
                )),
            }
        },
    }
}

/// A color gradient evaluated at a sample value, for the coloured
/// texturing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f32, Vec4)>", into = "Vec<(f32, Vec4)>")]
pub struct ColorRamp {
    /// `(position, rgba)` stops in ascending position order.
    stops: Vec<(f32, Vec4)>,
}

impl Default for ColorRamp {
    /// Grayscale ramp from black at 0 to white at 1.
    fn default() -> Self {
        Self {
            stops: vec![
                (0.0, Vec4::new(0.0, 0.0, 0.0, 1.0)),
                (1.0, Vec4::ONE),
            ],
        }
    }
}

impl TryFrom<Vec<(f32, Vec4)>> for ColorRamp {
    type Error = ConfigError;

    fn try_from(stops: Vec<(f32, Vec4)>) -> Result<Self, Self::Error> {
        Self::new(stops)
    }
}

impl From<ColorRamp> for Vec<(f32, Vec4)> {
    fn from(ramp: ColorRamp) -> Self {
        ramp.stops
    }
}

impl ColorRamp {
    /// Builds a ramp, rejecting empty or unsorted stops.
    pub fn new(stops: Vec<(f32, Vec4)>) -> ConfigResult<Self> {
        if stops.is_empty() {
            return Err(ConfigError::TextureTable("color ramp has no stops".into()));
        }
        if stops.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(ConfigError::TextureTable(
                "color ramp stops out of order".into(),
            ));
        }
        Ok(Self { stops })
    }

    /// Evaluates the ramp at `t`, clamping outside the stop range.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> Vec4 {
        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for w in self.stops.windows(2) {
            let (t0, c0) = w[0];
            let (t1, c1) = w[1];
            if t < t1 {
                let span = t1 - t0;
                let f = if span <= 0.0 { 0.0 } else { (t - t0) / span };
                return c0.lerp(c1, f);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}
