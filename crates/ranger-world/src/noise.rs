//! Deterministic noise field with analytic derivatives.
//!
//! Provides value and Perlin (gradient) noise over 1-3 dimensions plus a
//! fractal octave sum. Every sample carries its analytic derivative so
//! octave sums preserve slope information for texture blending.
//!
//! All lattice hashing goes through a permutation table derived from an
//! explicit seed; there is no process-global noise state.

use glam::Vec3;
use std::ops::{Add, Mul, Sub};

/// A single noise evaluation.
///
/// Carries the scalar value, its analytic derivative, and the sample
/// points recorded by the grid builder (the exact point and the row
/// anchor it was interpolated from).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseSample {
    /// Noise value
    pub value: f32,
    /// Analytic derivative of the value with respect to the sample point
    pub derivative: Vec3,
    /// World-space point this sample was taken at
    pub point: Vec3,
    /// Row anchor point the sample row was interpolated from
    pub point0: Vec3,
}

impl Add<f32> for NoiseSample {
    type Output = Self;

    fn add(mut self, rhs: f32) -> Self {
        self.value += rhs;
        self
    }
}

impl Add<NoiseSample> for f32 {
    type Output = NoiseSample;

    fn add(self, mut rhs: NoiseSample) -> NoiseSample {
        rhs.value += self;
        rhs
    }
}

impl Add for NoiseSample {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.value += rhs.value;
        self.derivative += rhs.derivative;
        self
    }
}

impl Sub<f32> for NoiseSample {
    type Output = Self;

    fn sub(mut self, rhs: f32) -> Self {
        self.value -= rhs;
        self
    }
}

impl Sub<NoiseSample> for f32 {
    type Output = NoiseSample;

    fn sub(self, mut rhs: NoiseSample) -> NoiseSample {
        rhs.value = self - rhs.value;
        rhs.derivative = -rhs.derivative;
        rhs
    }
}

impl Sub for NoiseSample {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self.value -= rhs.value;
        self.derivative -= rhs.derivative;
        self
    }
}

impl Mul<f32> for NoiseSample {
    type Output = Self;

    fn mul(mut self, rhs: f32) -> Self {
        self.value *= rhs;
        self.derivative *= rhs;
        self
    }
}

impl Mul<NoiseSample> for f32 {
    type Output = NoiseSample;

    fn mul(self, rhs: NoiseSample) -> NoiseSample {
        rhs * self
    }
}

impl Mul for NoiseSample {
    type Output = Self;

    // Product rule: (fg)' = f'g + fg'.
    fn mul(mut self, rhs: Self) -> Self {
        self.derivative = self.derivative * rhs.value + rhs.derivative * self.value;
        self.value *= rhs.value;
        self
    }
}

/// Noise method family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NoiseMethod {
    /// Lattice value noise, naturally in [0, 1].
    Value,
    /// Gradient (Perlin) noise, zero-centered in roughly [-1, 1].
    Perlin,
}

impl NoiseMethod {
    /// Whether this method produces zero-centered output.
    #[must_use]
    pub const fn is_zero_centered(self) -> bool {
        matches!(self, Self::Perlin)
    }

    /// Remaps a sample into [0, 1].
    ///
    /// Value noise is already in [0, 1] and passes through untouched;
    /// zero-centered methods get the `v * 0.5 + 0.5` shift.
    #[must_use]
    pub fn remap(self, sample: NoiseSample) -> NoiseSample {
        if self.is_zero_centered() {
            sample * 0.5 + 0.5
        } else {
            sample
        }
    }
}

const HASH_MASK: usize = 255;

/// Smoothing curve 6t^5 - 15t^4 + 10t^3.
fn smooth(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Derivative of [`smooth`]: 30t^2 (t - 1)^2.
fn smooth_derivative(t: f32) -> f32 {
    30.0 * t * t * (t - 1.0) * (t - 1.0)
}

/// 2D gradient set for Perlin noise.
const GRADIENTS_2D: [[f32; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
    [-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
];

/// 3D gradient set: the twelve cube-edge midpoints, with four repeats.
const GRADIENTS_3D: [[f32; 3]; 16] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [0.0, -1.0, 1.0],
    [0.0, -1.0, -1.0],
];

/// Normalization factor so 2D Perlin output fills [-1, 1].
const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Deterministic scalar noise sampler.
///
/// Owns a seed-derived permutation table; two fields built from the same
/// seed produce identical samples at every point.
#[derive(Debug, Clone)]
pub struct NoiseField {
    /// Doubled permutation table for wrap-free lattice hashing.
    perm: [u8; 512],
}

impl NoiseField {
    /// Creates a noise field from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);

        // Fisher-Yates shuffle driven by a simple LCG.
        let mut rng_state = seed;
        for i in (1..256).rev() {
            rng_state = rng_state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1);
            let j = ((rng_state >> 32) as usize) % (i + 1);
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&p);
        perm[256..512].copy_from_slice(&p);

        Self { perm }
    }

    fn hash(&self, i: usize) -> usize {
        self.perm[i & 511] as usize
    }

    /// Samples the field with the given method and dimensionality.
    ///
    /// `dims` outside 1-3 is treated as 3.
    #[must_use]
    pub fn sample(&self, method: NoiseMethod, dims: u32, point: Vec3, frequency: f32) -> NoiseSample {
        match (method, dims) {
            (NoiseMethod::Value, 1) => self.value_1d(point, frequency),
            (NoiseMethod::Value, 2) => self.value_2d(point, frequency),
            (NoiseMethod::Value, _) => self.value_3d(point, frequency),
            (NoiseMethod::Perlin, 1) => self.perlin_1d(point, frequency),
            (NoiseMethod::Perlin, 2) => self.perlin_2d(point, frequency),
            (NoiseMethod::Perlin, _) => self.perlin_3d(point, frequency),
        }
    }

    /// Accumulates `octaves` samples, each at `lacunarity` times the
    /// previous frequency and `persistence` times the previous amplitude,
    /// then normalizes by the total amplitude so output stays in the
    /// method's natural range.
    #[must_use]
    pub fn fractal_sum(
        &self,
        method: NoiseMethod,
        dims: u32,
        point: Vec3,
        frequency: f32,
        octaves: u32,
        lacunarity: f32,
        persistence: f32,
    ) -> NoiseSample {
        let mut sum = self.sample(method, dims, point, frequency);
        let mut amplitude = 1.0;
        let mut range = 1.0;
        let mut freq = frequency;
        for _ in 1..octaves.max(1) {
            freq *= lacunarity;
            amplitude *= persistence;
            range += amplitude;
            sum = sum + self.sample(method, dims, point, freq) * amplitude;
        }
        sum * (1.0 / range)
    }

    fn value_1d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let px = point.x * frequency;
        let fx = px.floor();
        let t0 = px - fx;
        let ix = (fx as i64).rem_euclid(256) as usize;

        let h0 = self.hash(ix) as f32;
        let h1 = self.hash(ix + 1) as f32;

        let a = h0;
        let b = h1 - h0;
        let t = smooth(t0);
        let dt = smooth_derivative(t0);

        NoiseSample {
            value: (a + b * t) * (1.0 / HASH_MASK as f32),
            derivative: Vec3::new(b * dt * (1.0 / HASH_MASK as f32) * frequency, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn value_2d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let p = point * frequency;
        let (fx, fy) = (p.x.floor(), p.y.floor());
        let (tx0, ty0) = (p.x - fx, p.y - fy);
        let ix = (fx as i64).rem_euclid(256) as usize;
        let iy = (fy as i64).rem_euclid(256) as usize;

        let h0 = self.hash(ix);
        let h1 = self.hash(ix + 1);
        let h00 = self.hash(h0 + iy) as f32;
        let h10 = self.hash(h1 + iy) as f32;
        let h01 = self.hash(h0 + iy + 1) as f32;
        let h11 = self.hash(h1 + iy + 1) as f32;

        let a = h00;
        let b = h10 - h00;
        let c = h01 - h00;
        let d = h11 - h01 - h10 + h00;

        let tx = smooth(tx0);
        let ty = smooth(ty0);
        let dtx = smooth_derivative(tx0);
        let dty = smooth_derivative(ty0);

        let scale = 1.0 / HASH_MASK as f32;
        NoiseSample {
            value: (a + b * tx + (c + d * tx) * ty) * scale,
            derivative: Vec3::new(
                (b + d * ty) * dtx * scale * frequency,
                (c + d * tx) * dty * scale * frequency,
                0.0,
            ),
            ..Default::default()
        }
    }

    fn value_3d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let p = point * frequency;
        let (fx, fy, fz) = (p.x.floor(), p.y.floor(), p.z.floor());
        let (tx0, ty0, tz0) = (p.x - fx, p.y - fy, p.z - fz);
        let ix = (fx as i64).rem_euclid(256) as usize;
        let iy = (fy as i64).rem_euclid(256) as usize;
        let iz = (fz as i64).rem_euclid(256) as usize;

        let h0 = self.hash(ix);
        let h1 = self.hash(ix + 1);
        let h00 = self.hash(h0 + iy);
        let h10 = self.hash(h1 + iy);
        let h01 = self.hash(h0 + iy + 1);
        let h11 = self.hash(h1 + iy + 1);
        let h000 = self.hash(h00 + iz) as f32;
        let h100 = self.hash(h10 + iz) as f32;
        let h010 = self.hash(h01 + iz) as f32;
        let h110 = self.hash(h11 + iz) as f32;
        let h001 = self.hash(h00 + iz + 1) as f32;
        let h101 = self.hash(h10 + iz + 1) as f32;
        let h011 = self.hash(h01 + iz + 1) as f32;
        let h111 = self.hash(h11 + iz + 1) as f32;

        let a = h000;
        let b = h100 - h000;
        let c = h010 - h000;
        let d = h001 - h000;
        let e = h110 - h010 - h100 + h000;
        let f = h101 - h001 - h100 + h000;
        let g = h011 - h001 - h010 + h000;
        let h = h111 - h011 - h101 - h110 + h100 + h010 + h001 - h000;

        let tx = smooth(tx0);
        let ty = smooth(ty0);
        let tz = smooth(tz0);
        let dtx = smooth_derivative(tx0);
        let dty = smooth_derivative(ty0);
        let dtz = smooth_derivative(tz0);

        let scale = 1.0 / HASH_MASK as f32;
        NoiseSample {
            value: (a + b * tx + (c + e * tx) * ty + (d + f * tx + (g + h * tx) * ty) * tz)
                * scale,
            derivative: Vec3::new(
                (b + e * ty + (f + h * ty) * tz) * dtx,
                (c + e * tx + (g + h * tx) * tz) * dty,
                (d + f * tx + (g + h * tx) * ty) * dtz,
            ) * (scale * frequency),
            ..Default::default()
        }
    }

    fn perlin_1d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let px = point.x * frequency;
        let fx = px.floor();
        let t0 = px - fx;
        let t1 = t0 - 1.0;
        let ix = (fx as i64).rem_euclid(256) as usize;

        // 1D gradients are just +1/-1.
        let g0 = if self.hash(ix) & 1 == 0 { 1.0 } else { -1.0 };
        let g1 = if self.hash(ix + 1) & 1 == 0 { 1.0 } else { -1.0 };

        let v0 = g0 * t0;
        let v1 = g1 * t1;

        let a = v0;
        let b = v1 - v0;
        let da = g0;
        let db = g1 - g0;

        let t = smooth(t0);
        let dt = smooth_derivative(t0);

        // Peak amplitude of 1D gradient lerp is 0.5, so double the output.
        NoiseSample {
            value: (a + b * t) * 2.0,
            derivative: Vec3::new((da + db * t + b * dt) * 2.0 * frequency, 0.0, 0.0),
            ..Default::default()
        }
    }

    fn perlin_2d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let p = point * frequency;
        let (fx, fy) = (p.x.floor(), p.y.floor());
        let (tx0, ty0) = (p.x - fx, p.y - fy);
        let (tx1, ty1) = (tx0 - 1.0, ty0 - 1.0);
        let ix = (fx as i64).rem_euclid(256) as usize;
        let iy = (fy as i64).rem_euclid(256) as usize;

        let h0 = self.hash(ix);
        let h1 = self.hash(ix + 1);
        let g00 = GRADIENTS_2D[self.hash(h0 + iy) & 7];
        let g10 = GRADIENTS_2D[self.hash(h1 + iy) & 7];
        let g01 = GRADIENTS_2D[self.hash(h0 + iy + 1) & 7];
        let g11 = GRADIENTS_2D[self.hash(h1 + iy + 1) & 7];

        let dot2 = |g: [f32; 2], x: f32, y: f32| g[0] * x + g[1] * y;
        let v00 = dot2(g00, tx0, ty0);
        let v10 = dot2(g10, tx1, ty0);
        let v01 = dot2(g01, tx0, ty1);
        let v11 = dot2(g11, tx1, ty1);

        let a = v00;
        let b = v10 - v00;
        let c = v01 - v00;
        let d = v11 - v01 - v10 + v00;

        let ga = Vec3::new(g00[0], g00[1], 0.0);
        let gb = Vec3::new(g10[0] - g00[0], g10[1] - g00[1], 0.0);
        let gc = Vec3::new(g01[0] - g00[0], g01[1] - g00[1], 0.0);
        let gd = Vec3::new(
            g11[0] - g01[0] - g10[0] + g00[0],
            g11[1] - g01[1] - g10[1] + g00[1],
            0.0,
        );

        let tx = smooth(tx0);
        let ty = smooth(ty0);
        let dtx = smooth_derivative(tx0);
        let dty = smooth_derivative(ty0);

        let mut derivative = ga + gb * tx + (gc + gd * tx) * ty;
        derivative.x += (b + d * ty) * dtx;
        derivative.y += (c + d * tx) * dty;

        NoiseSample {
            value: (a + b * tx + (c + d * tx) * ty) * SQRT2,
            derivative: derivative * (SQRT2 * frequency),
            ..Default::default()
        }
    }

    fn perlin_3d(&self, point: Vec3, frequency: f32) -> NoiseSample {
        let p = point * frequency;
        let (fx, fy, fz) = (p.x.floor(), p.y.floor(), p.z.floor());
        let (tx0, ty0, tz0) = (p.x - fx, p.y - fy, p.z - fz);
        let (tx1, ty1, tz1) = (tx0 - 1.0, ty0 - 1.0, tz0 - 1.0);
        let ix = (fx as i64).rem_euclid(256) as usize;
        let iy = (fy as i64).rem_euclid(256) as usize;
        let iz = (fz as i64).rem_euclid(256) as usize;

        let h0 = self.hash(ix);
        let h1 = self.hash(ix + 1);
        let h00 = self.hash(h0 + iy);
        let h10 = self.hash(h1 + iy);
        let h01 = self.hash(h0 + iy + 1);
        let h11 = self.hash(h1 + iy + 1);
        let grad = |h: usize| {
            let g = GRADIENTS_3D[h & 15];
            Vec3::new(g[0], g[1], g[2])
        };
        let g000 = grad(self.hash(h00 + iz));
        let g100 = grad(self.hash(h10 + iz));
        let g010 = grad(self.hash(h01 + iz));
        let g110 = grad(self.hash(h11 + iz));
        let g001 = grad(self.hash(h00 + iz + 1));
        let g101 = grad(self.hash(h10 + iz + 1));
        let g011 = grad(self.hash(h01 + iz + 1));
        let g111 = grad(self.hash(h11 + iz + 1));

        let v000 = g000.dot(Vec3::new(tx0, ty0, tz0));
        let v100 = g100.dot(Vec3::new(tx1, ty0, tz0));
        let v010 = g010.dot(Vec3::new(tx0, ty1, tz0));
        let v110 = g110.dot(Vec3::new(tx1, ty1, tz0));
        let v001 = g001.dot(Vec3::new(tx0, ty0, tz1));
        let v101 = g101.dot(Vec3::new(tx1, ty0, tz1));
        let v011 = g011.dot(Vec3::new(tx0, ty1, tz1));
        let v111 = g111.dot(Vec3::new(tx1, ty1, tz1));

        let a = v000;
        let b = v100 - v000;
        let c = v010 - v000;
        let d = v001 - v000;
        let e = v110 - v010 - v100 + v000;
        let f = v101 - v001 - v100 + v000;
        let g = v011 - v001 - v010 + v000;
        let h = v111 - v011 - v101 - v110 + v100 + v010 + v001 - v000;

        let ga = g000;
        let gb = g100 - g000;
        let gc = g010 - g000;
        let gd = g001 - g000;
        let ge = g110 - g010 - g100 + g000;
        let gf = g101 - g001 - g100 + g000;
        let gg = g011 - g001 - g010 + g000;
        let gh = g111 - g011 - g101 - g110 + g100 + g010 + g001 - g000;

        let tx = smooth(tx0);
        let ty = smooth(ty0);
        let tz = smooth(tz0);
        let dtx = smooth_derivative(tx0);
        let dty = smooth_derivative(ty0);
        let dtz = smooth_derivative(tz0);

        let mut derivative =
            ga + gb * tx + (gc + ge * tx) * ty + (gd + gf * tx + (gg + gh * tx) * ty) * tz;
        derivative.x += (b + e * ty + (f + h * ty) * tz) * dtx;
        derivative.y += (c + e * tx + (g + h * tx) * tz) * dty;
        derivative.z += (d + f * tx + (g + h * tx) * ty) * dtz;

        NoiseSample {
            value: a + b * tx + (c + e * tx) * ty + (d + f * tx + (g + h * tx) * ty) * tz,
            derivative: derivative * frequency,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_samples() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(42);
        let p = Vec3::new(3.7, -1.2, 0.4);
        for method in [NoiseMethod::Value, NoiseMethod::Perlin] {
            for dims in 1..=3 {
                assert_eq!(
                    a.sample(method, dims, p, 4.0).value,
                    b.sample(method, dims, p, 4.0).value
                );
            }
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(999);
        let p = Vec3::new(3.7, -1.2, 0.4);
        assert_ne!(
            a.sample(NoiseMethod::Value, 2, p, 4.0).value,
            b.sample(NoiseMethod::Value, 2, p, 4.0).value
        );
    }

    #[test]
    fn single_octave_sum_equals_plain_sample() {
        let field = NoiseField::new(7);
        let p = Vec3::new(0.33, 0.71, 0.0);
        let single = field.sample(NoiseMethod::Perlin, 2, p, 2.0);
        let summed = field.fractal_sum(NoiseMethod::Perlin, 2, p, 2.0, 1, 2.0, 0.5);
        assert!((single.value - summed.value).abs() < 1e-6);
        assert!((single.derivative - summed.derivative).length() < 1e-5);
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        let field = NoiseField::new(1234);
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.173, i as f32 * -0.119, i as f32 * 0.051);
            for dims in 1..=3 {
                let v = field.sample(NoiseMethod::Value, dims, p, 3.0).value;
                assert!((0.0..=1.0).contains(&v), "value {v} out of range at {p:?}");
            }
        }
    }

    #[test]
    fn perlin_is_roughly_zero_centered() {
        let field = NoiseField::new(5);
        let mut sum = 0.0;
        let n = 1000;
        for i in 0..n {
            let p = Vec3::new(i as f32 * 0.137, i as f32 * 0.291, 0.0);
            let v = field.sample(NoiseMethod::Perlin, 2, p, 1.7).value;
            assert!((-1.5..=1.5).contains(&v));
            sum += v;
        }
        assert!((sum / n as f32).abs() < 0.2);
    }

    #[test]
    fn remap_shifts_only_zero_centered_methods() {
        let s = NoiseSample {
            value: -1.0,
            ..Default::default()
        };
        assert!((NoiseMethod::Perlin.remap(s).value - 0.0).abs() < f32::EPSILON);
        assert!((NoiseMethod::Value.remap(s).value - -1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn product_rule_on_sample_multiplication() {
        let a = NoiseSample {
            value: 2.0,
            derivative: Vec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let b = NoiseSample {
            value: 3.0,
            derivative: Vec3::new(0.0, 2.0, 0.0),
            ..Default::default()
        };
        let prod = a * b;
        assert!((prod.value - 6.0).abs() < f32::EPSILON);
        // f'g + fg' = (1,0,0)*3 + (0,2,0)*2
        assert_eq!(prod.derivative, Vec3::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let field = NoiseField::new(99);
        let p = Vec3::new(0.4, 0.6, 0.0);
        let eps = 1e-3;
        let s = field.sample(NoiseMethod::Perlin, 2, p, 1.0);
        let sx = field.sample(NoiseMethod::Perlin, 2, p + Vec3::X * eps, 1.0);
        let numeric = (sx.value - s.value) / eps;
        assert!(
            (numeric - s.derivative.x).abs() < 0.05,
            "numeric {numeric} vs analytic {}",
            s.derivative.x
        );
    }

    #[test]
    fn fractal_sum_stays_in_natural_range() {
        let field = NoiseField::new(21);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.21, i as f32 * 0.34, 0.0);
            let v = field
                .fractal_sum(NoiseMethod::Value, 2, p, 2.0, 6, 2.0, 0.5)
                .value;
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
