//! Fractal noise field generation

use glam::UVec3;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::config::{GenerationMode, NoiseParams, SurfaceJitter, MIN_NOISE_SCALE};
use super::field::NoiseField;
use crate::core::Result;

/// Heightmaps only ever fill this fraction of the vertical extent
pub const HEIGHT_EXTENT: f64 = 0.4;

/// Range of the per-octave random domain offset
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Generates a normalized [`NoiseField`] using one [`GenerationMode`]
pub struct FieldGenerator {
    params: NoiseParams,
    mode: GenerationMode,
    jitter: SurfaceJitter,
    perlin: Perlin,
}

impl FieldGenerator {
    /// Create a generator. `params.scale` is used as-is apart from clamping
    /// non-positive values; resolution scaling is the caller's concern.
    pub fn new(params: NoiseParams, mode: GenerationMode) -> Self {
        let perlin = Perlin::new(params.seed);
        Self { params, mode, jitter: SurfaceJitter::Seeded, perlin }
    }

    /// Choose how the heightmap surface cell is drawn
    pub fn with_jitter(mut self, jitter: SurfaceJitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Fill a field of the given shape
    pub fn generate(&self, dims: UVec3) -> Result<NoiseField> {
        self.params.validate()?;
        self.mode.validate()?;
        let mut field = NoiseField::filled(dims, 0.0)?;
        match self.mode {
            GenerationMode::Volumetric => self.fill_volumetric(&mut field),
            GenerationMode::Heightmap { open_middle } => match self.jitter {
                SurfaceJitter::Seeded => {
                    let mut rng = ChaCha8Rng::seed_from_u64(jitter_seed(self.params.seed));
                    self.fill_heightmap(&mut field, open_middle, &mut rng)
                }
                SurfaceJitter::Entropy => {
                    self.fill_heightmap(&mut field, open_middle, &mut rand::rng())
                }
            },
            GenerationMode::HalfFull => fill_half_full(&mut field),
        }
        Ok(field)
    }

    fn scale(&self) -> f64 {
        let scale = self.params.scale;
        if scale <= 0.0 { MIN_NOISE_SCALE as f64 } else { scale as f64 }
    }

    /// Deterministic per-octave domain offsets, minus the user offset
    fn octave_offsets(&self) -> Vec<[f64; 3]> {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(self.params.seed));
        let offset = self.params.offset;
        (0..self.params.octaves)
            .map(|_| {
                let mut o = [0.0; 3];
                for (axis, value) in o.iter_mut().enumerate() {
                    let r = rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
                    *value = r as f64 - offset[axis] as f64;
                }
                o
            })
            .collect()
    }

    /// 2D Perlin remapped to roughly [0, 1]
    #[inline]
    fn sample_2d(&self, a: f64, b: f64) -> f64 {
        self.perlin.get([a, b]) * 0.5 + 0.5
    }

    /// Isotropic-ish 3D noise from the six ordered pairs of 2D samples
    fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let ab = self.sample_2d(x, y);
        let bc = self.sample_2d(y, z);
        let ac = self.sample_2d(x, z);
        let ba = self.sample_2d(y, x);
        let cb = self.sample_2d(z, y);
        let ca = self.sample_2d(z, x);
        (ab + bc + ac + ba + cb + ca) / 6.0
    }

    fn fill_volumetric(&self, field: &mut NoiseField) {
        let dims = field.dims();
        let offsets = self.octave_offsets();
        let scale = self.scale();
        let slice = dims.x as usize * dims.y as usize;

        let mut raw = vec![0.0f64; field.len()];
        raw.par_chunks_mut(slice).enumerate().for_each(|(z, layer)| {
            for y in 0..dims.y as usize {
                for x in 0..dims.x as usize {
                    let mut amplitude = 1.0;
                    let mut frequency = 1.0;
                    let mut density = 0.0;
                    for o in &offsets {
                        let sx = (x as f64 + o[0]) / scale * frequency;
                        let sy = (y as f64 + o[1]) / scale * frequency;
                        let sz = (z as f64 + o[2]) / scale * frequency;
                        density += self.sample_3d(sx, sy, sz) * amplitude;
                        amplitude *= self.params.persistence as f64;
                        frequency *= self.params.lacunarity as f64;
                    }
                    layer[x + dims.x as usize * y] = density;
                }
            }
        });

        let (min, max) = min_max(&raw);
        for (dst, &v) in field.values_mut().iter_mut().zip(&raw) {
            *dst = inverse_lerp(min, max, v) as f32;
        }
    }

    /// Column heights in [0, HEIGHT_EXTENT], indexed `x + dims.x * z`
    fn heightmap(&self, dims: UVec3, open_middle: f32) -> Vec<f64> {
        let offsets = self.octave_offsets();
        let scale = self.scale();
        let (w, d) = (dims.x as usize, dims.z as usize);

        let mut heights = vec![0.0f64; w * d];
        for z in 0..d {
            for x in 0..w {
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut density = 0.0;
                for o in &offsets {
                    // The heightmap samples x against z; o[1] is unused here
                    let sx = (x as f64 + o[0]) / scale * frequency;
                    let sz = (z as f64 + o[2]) / scale * frequency;
                    density += (self.sample_2d(sx, sz) * 2.0 - 1.0) * amplitude;
                    amplitude *= self.params.persistence as f64;
                    frequency *= self.params.lacunarity as f64;
                }
                heights[x + w * z] = density;
            }
        }

        let (min, max) = min_max(&heights);
        let (cx, cz) = ((w / 2) as f64, (d / 2) as f64);
        for z in 0..d {
            for x in 0..w {
                let h = &mut heights[x + w * z];
                let dist = ((x as f64 - cx).powi(2) + (z as f64 - cz).powi(2)).sqrt();
                if dist < open_middle as f64 {
                    *h = min;
                }
                *h = inverse_lerp(min, max, *h) * HEIGHT_EXTENT;
            }
        }
        heights
    }

    fn fill_heightmap<R: Rng>(&self, field: &mut NoiseField, open_middle: f32, rng: &mut R) {
        let dims = field.dims();
        let heights = self.heightmap(dims, open_middle);
        let floor = dims.y / 8;

        for x in 0..dims.x {
            for z in 0..dims.z {
                let height = (heights[(x + dims.x * z) as usize] * dims.y as f64).round() as u32;
                for y in 0..dims.y {
                    let value = if y < height {
                        0.0
                    } else if y == height {
                        rng.random_range(0.25f32..1.0)
                    } else {
                        1.0
                    };
                    field.set(UVec3::new(x, y, z), value);
                }
                for y in 0..=floor.min(dims.y - 1) {
                    field.set(UVec3::new(x, y, z), 0.0);
                }
            }
        }
    }
}

/// Lower half 0, upper half 1
fn fill_half_full(field: &mut NoiseField) {
    let dims = field.dims();
    let half = dims.y / 2;
    for z in 0..dims.z {
        for y in 0..dims.y {
            let value = if y >= half { 1.0 } else { 0.0 };
            for x in 0..dims.x {
                field.set(UVec3::new(x, y, z), value);
            }
        }
    }
}

/// Separate stream from the octave offsets so the two never correlate
fn jitter_seed(seed: u32) -> u64 {
    (u64::from(seed) << 32) ^ 0x9E37_79B9
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Position of `v` between `a` and `b`, clamped to [0, 1]; 0 when `a == b`
fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    if a == b {
        0.0
    } else {
        ((v - a) / (b - a)).clamp(0.0, 1.0)
    }
}
