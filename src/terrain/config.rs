//! Construction-time configuration for a terrain session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Smallest usable noise scale; anything at or below zero is clamped to this.
pub const MIN_NOISE_SCALE: f32 = 1.0e-4;

/// Voxels per world unit along each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    Low,
    Med,
    High,
    Insane,
}

impl Resolution {
    /// Voxels per world unit
    pub fn multiplier(self) -> u32 {
        match self {
            Resolution::Low => 1,
            Resolution::Med => 2,
            Resolution::High => 4,
            Resolution::Insane => 8,
        }
    }

    /// World-space distance between neighbouring nodes
    pub fn voxel_pitch(self) -> f32 {
        1.0 / self.multiplier() as f32
    }
}

/// Fractal noise parameters shared by the noise-driven generation modes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub seed: u32,
    pub scale: f32,        // Sample spacing divisor (larger = smoother)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // Amplitude falloff per octave
    pub lacunarity: f32,   // Frequency growth per octave
    pub offset: [f32; 3],  // Shifts the sampled domain; heightmaps use x and z
}

impl NoiseParams {
    /// Reject parameters that would make fBm output non-finite or unbounded.
    /// Non-positive scales are allowed; generation clamps them.
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(Error::invalid("octave count must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(Error::invalid(format!(
                "persistence {} outside [0, 1]",
                self.persistence
            )));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(Error::invalid(format!("lacunarity {} must be positive", self.lacunarity)));
        }
        if !self.scale.is_finite() || self.offset.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid("noise scale and offset must be finite"));
        }
        Ok(())
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 0.15,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: [0.0; 3],
        }
    }
}

/// Strategy used to fill the noise field at startup
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationMode {
    /// Multi-octave 3D noise; produces caves and overhangs
    Volumetric,
    /// 2D fractal heightmap extruded into a column field
    Heightmap {
        /// Radius (before map-size scaling) of the flattened area at the centre
        open_middle: f32,
    },
    /// Lower half 0, upper half 1
    HalfFull,
}

impl GenerationMode {
    pub fn validate(&self) -> Result<()> {
        if let GenerationMode::Heightmap { open_middle } = *self {
            if !open_middle.is_finite() || open_middle < 0.0 {
                return Err(Error::invalid(format!("open_middle {} must be >= 0", open_middle)));
            }
        }
        Ok(())
    }
}

impl Default for GenerationMode {
    fn default() -> Self {
        GenerationMode::Heightmap { open_middle: 10.0 }
    }
}

/// How the heightmap picks the value of the cell the surface passes through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceJitter {
    /// Drawn from a generator seeded with the noise seed; fully reproducible
    #[default]
    Seeded,
    /// Drawn from the thread RNG; differs between runs
    Entropy,
}

/// Full configuration for [`crate::terrain::Terrain`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Number of chunks along x, y, z
    pub chunk_counts: [u32; 3],
    /// Voxels along each chunk edge
    pub chunk_voxels: u32,
    pub resolution: Resolution,
    /// Isovalue at which the surface is extracted
    pub surface_level: f32,
    pub noise: NoiseParams,
    pub mode: GenerationMode,
    /// Interpolate vertices along edges instead of snapping to the midpoint
    pub smoothing: bool,
    /// Field change per edit before resolution scaling
    pub edit_step: f32,
    /// Default brush radius in field-index units
    pub brush_radius: u32,
    pub surface_jitter: SurfaceJitter,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_counts: [3, 3, 3],
            chunk_voxels: 8,
            resolution: Resolution::Low,
            surface_level: 0.6,
            noise: NoiseParams::default(),
            mode: GenerationMode::default(),
            smoothing: true,
            edit_step: 0.25,
            brush_radius: 1,
            surface_jitter: SurfaceJitter::Seeded,
        }
    }
}

impl TerrainConfig {
    /// Reject anything that would make later index arithmetic invalid
    pub fn validate(&self) -> Result<()> {
        if self.chunk_counts.iter().any(|&c| c == 0) {
            return Err(Error::invalid(format!(
                "chunk counts must be positive, got {:?}",
                self.chunk_counts
            )));
        }
        if self.chunk_voxels == 0 {
            return Err(Error::invalid("chunk_voxels must be positive"));
        }
        if !(0.0..=1.0).contains(&self.surface_level) {
            return Err(Error::invalid(format!(
                "surface level {} outside [0, 1]",
                self.surface_level
            )));
        }

        self.noise.validate()?;
        self.mode.validate()?;
        if !self.edit_step.is_finite() || self.edit_step < 0.0 {
            return Err(Error::invalid(format!("edit_step {} must be >= 0", self.edit_step)));
        }

        // Every node index must fit both usize (storage) and u32 (backing indices)
        let mut total: u64 = 1;
        for &count in &self.chunk_counts {
            let edge = count as u64 * self.chunk_voxels as u64 + 2;
            if edge > u32::MAX as u64 {
                return Err(Error::invalid(format!("field edge {} too large", edge)));
            }
            total = total.saturating_mul(edge);
        }
        if total > usize::MAX as u64 / 2 {
            return Err(Error::invalid(format!("field of {} nodes is too large", total)));
        }

        Ok(())
    }

    /// Noise scale after resolution scaling, clamped away from zero
    pub fn effective_scale(&self) -> f32 {
        let scale = self.noise.scale * self.resolution.multiplier() as f32;
        if scale <= 0.0 { MIN_NOISE_SCALE } else { scale }
    }

    /// Open-middle radius in field-index units; grows with the map width
    pub fn effective_open_middle(&self) -> f32 {
        match self.mode {
            GenerationMode::Heightmap { open_middle } => {
                open_middle * self.chunk_counts[0] as f32 * 0.1
            }
            _ => 0.0,
        }
    }

    /// Field change applied by one edit; finer grids edit faster to keep the feel
    pub fn effective_edit_step(&self) -> f32 {
        self.edit_step * self.resolution.multiplier() as f32
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: TerrainConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TerrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.surface_level, 0.6);
        assert_eq!(config.chunk_voxels, 8);
        assert!(config.smoothing);
    }

    #[test]
    fn test_resolution_multiplier() {
        assert_eq!(Resolution::Low.multiplier(), 1);
        assert_eq!(Resolution::Med.multiplier(), 2);
        assert_eq!(Resolution::High.multiplier(), 4);
        assert_eq!(Resolution::Insane.multiplier(), 8);
        assert_eq!(Resolution::High.voxel_pitch(), 0.25);
    }

    #[test]
    fn test_rejects_zero_chunks() {
        let config = TerrainConfig { chunk_counts: [2, 0, 2], ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));

        let config = TerrainConfig { chunk_voxels: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_surface_level_out_of_range() {
        for level in [-0.1, 1.5, f32::NAN] {
            let config = TerrainConfig { surface_level: level, ..Default::default() };
            assert!(config.validate().is_err(), "level {} accepted", level);
        }
    }

    #[test]
    fn test_rejects_malformed_noise() {
        let bad = [
            NoiseParams { octaves: 0, ..Default::default() },
            NoiseParams { persistence: 1.5, ..Default::default() },
            NoiseParams { persistence: f32::NAN, ..Default::default() },
            NoiseParams { lacunarity: 0.0, ..Default::default() },
            NoiseParams { scale: f32::INFINITY, ..Default::default() },
            NoiseParams { offset: [0.0, f32::NAN, 0.0], ..Default::default() },
        ];
        for noise in bad {
            let config = TerrainConfig { noise: noise.clone(), ..Default::default() };
            assert!(config.validate().is_err(), "{:?} accepted", noise);
        }
    }

    #[test]
    fn test_rejects_negative_open_middle() {
        let config = TerrainConfig {
            mode: GenerationMode::Heightmap { open_middle: -1.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_values() {
        let config = TerrainConfig {
            chunk_counts: [5, 2, 5],
            resolution: Resolution::Med,
            noise: NoiseParams { scale: 0.15, ..Default::default() },
            mode: GenerationMode::Heightmap { open_middle: 10.0 },
            edit_step: 0.25,
            ..Default::default()
        };
        assert!((config.effective_scale() - 0.3).abs() < 1e-6);
        assert!((config.effective_open_middle() - 5.0).abs() < 1e-6);
        assert_eq!(config.effective_edit_step(), 0.5);

        let clamped = TerrainConfig {
            noise: NoiseParams { scale: -2.0, ..Default::default() },
            ..Default::default()
        };
        assert_eq!(clamped.effective_scale(), MIN_NOISE_SCALE);
    }

    #[test]
    fn test_json_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs").join("terrain.json");
        let config = TerrainConfig {
            chunk_counts: [4, 2, 4],
            mode: GenerationMode::Volumetric,
            surface_jitter: SurfaceJitter::Entropy,
            ..Default::default()
        };

        config.save(&path).unwrap();
        let loaded = TerrainConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "chunk_counts": [2, 2, 2], "mode": { "kind": "half_full" } }"#;
        let config: TerrainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chunk_counts, [2, 2, 2]);
        assert_eq!(config.mode, GenerationMode::HalfFull);
        assert_eq!(config.noise, NoiseParams::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "surface_level": 3.0 }"#).unwrap();
        assert!(matches!(TerrainConfig::load(&path), Err(Error::InvalidArgument(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(TerrainConfig::load(&path), Err(Error::Config(_))));
    }
}
