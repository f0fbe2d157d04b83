//! Procedural terrain: configuration, noise field generation and the
//! [`Terrain`] session that owns the field, the chunk grid and their meshes.
//!
//! ```no_run
//! use isoforge::terrain::{Terrain, TerrainConfig};
//! use glam::Vec3;
//!
//! let mut terrain = Terrain::initialize(TerrainConfig::default())?;
//! let rebuilt = terrain.edit(Vec3::splat(12.0), false, 2)?;
//! for coord in rebuilt {
//!     let chunk = terrain.chunk(coord).unwrap();
//!     println!("{:?}: {} triangles", coord, chunk.mesh.triangle_count());
//! }
//! # Ok::<(), isoforge::core::Error>(())
//! ```

pub mod config;
pub mod field;
pub mod generator;

pub use config::{GenerationMode, NoiseParams, Resolution, SurfaceJitter, TerrainConfig};
pub use field::NoiseField;
pub use generator::FieldGenerator;

use std::collections::HashSet;
use std::time::Instant;

use glam::Vec3;
use serde::Serialize;

use crate::core::{Error, Result};
use crate::edit::{Brush, ChunkInvalidator, TerrainEditor};
use crate::mesh::MarchingCubes;
use crate::voxel::chunk::{Chunk, ChunkCoord};
use crate::voxel::grid::ChunkGrid;
use crate::voxel::layout::GridLayout;

/// Aggregate mesh counts over all chunks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TerrainStats {
    pub chunks: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// A generated, meshed and editable terrain
pub struct Terrain {
    config: TerrainConfig,
    field: NoiseField,
    grid: ChunkGrid,
    editor: TerrainEditor,
    invalidator: ChunkInvalidator,
}

impl Terrain {
    /// Generate the field, populate every chunk and polygonize them all.
    ///
    /// Every chunk starts out dirty so a polling host uploads the initial meshes.
    pub fn initialize(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        let layout = GridLayout::from_config(&config)?;

        let start = Instant::now();
        let generator = FieldGenerator::new(effective_noise(&config), effective_mode(&config))
            .with_jitter(config.surface_jitter);
        let field = generator.generate(layout.field_dims())?;
        let generate_time = start.elapsed();

        let start = Instant::now();
        let mut grid = ChunkGrid::build(&field, layout)?;
        let populate_time = start.elapsed();

        let start = Instant::now();
        let mesher = MarchingCubes::from_config(&config);
        let triangles = mesher.polygonize_all(grid.chunks_mut());
        let mesh_time = start.elapsed();

        log::info!(
            "Terrain {:?} chunks x {} voxels, field {:?}: generate {:.1}ms, populate {:.1}ms, mesh {:.1}ms, {} triangles",
            layout.chunk_counts(),
            layout.chunk_voxels(),
            layout.field_dims(),
            generate_time.as_secs_f64() * 1000.0,
            populate_time.as_secs_f64() * 1000.0,
            mesh_time.as_secs_f64() * 1000.0,
            triangles
        );

        let mut invalidator = ChunkInvalidator::new();
        for coord in layout.coords() {
            invalidator.mark_chunk_dirty(coord);
        }

        Ok(Self {
            config,
            field,
            grid,
            editor: TerrainEditor::new(mesher),
            invalidator,
        })
    }

    /// Add (`add = true`) or remove one edit step around a world-space hit
    /// point and return the chunks whose meshes were rebuilt.
    ///
    /// Hits on the outermost chunk layer are logged and ignored, returning an
    /// empty set; hits outside the grid are errors.
    pub fn edit(&mut self, position: Vec3, add: bool, radius: u32) -> Result<HashSet<ChunkCoord>> {
        let brush = Brush::stroke(position, radius, self.config.effective_edit_step(), add);
        self.apply_brush(&brush)
    }

    /// [`Self::edit`] with the configured brush radius
    pub fn edit_with_default_brush(&mut self, position: Vec3, add: bool) -> Result<HashSet<ChunkCoord>> {
        self.edit(position, add, self.config.brush_radius)
    }

    /// Apply an arbitrary brush
    pub fn apply_brush(&mut self, brush: &Brush) -> Result<HashSet<ChunkCoord>> {
        match self.editor.apply_edit(&mut self.grid, &mut self.field, brush) {
            Ok(rebuilt) => {
                self.invalidator.mark_chunks(&rebuilt);
                Ok(rebuilt)
            }
            Err(Error::BoundaryEditRejected { coord }) => {
                log::warn!("Ignoring edit at {:?}: chunk {:?} is on the grid boundary", brush.center, coord);
                Ok(HashSet::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    pub fn layout(&self) -> &GridLayout {
        self.grid.layout()
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.grid.get(coord)
    }

    pub fn chunks(&self) -> &[Chunk] {
        self.grid.chunks()
    }

    /// Vertex positions and triangle indices of one chunk
    pub fn chunk_mesh(&self, coord: ChunkCoord) -> Option<(&[Vec3], &[u32])> {
        self.grid.get(coord).map(|c| (c.vertices(), c.indices()))
    }

    /// Chunks rebuilt since the last call, in coordinate order
    pub fn take_dirty_chunks(&mut self) -> Vec<ChunkCoord> {
        self.invalidator.take_dirty_chunks()
    }

    /// How many times a chunk's mesh has been built
    pub fn generation(&self, coord: ChunkCoord) -> u32 {
        self.invalidator.generation(&coord)
    }

    pub fn stats(&self) -> TerrainStats {
        self.grid.chunks().iter().fold(
            TerrainStats { chunks: self.grid.len(), ..Default::default() },
            |mut stats, chunk| {
                stats.vertices += chunk.mesh.vertices.len();
                stats.triangles += chunk.mesh.triangle_count();
                stats
            },
        )
    }
}

fn effective_noise(config: &TerrainConfig) -> NoiseParams {
    NoiseParams { scale: config.effective_scale(), ..config.noise.clone() }
}

fn effective_mode(config: &TerrainConfig) -> GenerationMode {
    match config.mode {
        GenerationMode::Heightmap { .. } => GenerationMode::Heightmap {
            open_middle: config.effective_open_middle(),
        },
        mode => mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_full(counts: [u32; 3]) -> TerrainConfig {
        TerrainConfig {
            chunk_counts: counts,
            resolution: Resolution::Low,
            mode: GenerationMode::HalfFull,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TerrainConfig { chunk_counts: [2, 0, 2], ..Default::default() };
        assert!(matches!(Terrain::initialize(config), Err(Error::InvalidArgument(_))));

        let config = TerrainConfig { surface_level: 1.5, ..Default::default() };
        assert!(matches!(Terrain::initialize(config), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_half_full_meshes_only_the_midplane() {
        let terrain = Terrain::initialize(half_full([2, 2, 2])).unwrap();

        // 18 nodes tall: rows 0..9 solid, so the surface crosses the top cube layer
        // of the lower chunks and never reaches the upper ones
        for chunk in terrain.chunks() {
            let triangles = chunk.mesh.triangle_count();
            if chunk.coord.y == 0 {
                assert_eq!(triangles, 8 * 8 * 2, "{:?}", chunk.coord);
            } else {
                assert_eq!(triangles, 0, "{:?}", chunk.coord);
            }
        }
        assert_eq!(
            terrain.stats(),
            TerrainStats { chunks: 8, vertices: 4 * 384, triangles: 4 * 128 }
        );

        // Smoothed surface at 0.6 of the way from row 8 to row 9
        let (vertices, _) = terrain.chunk_mesh(ChunkCoord::new(1, 0, 1)).unwrap();
        assert!(vertices.iter().all(|v| (v.y - 8.6).abs() < 1e-5));
    }

    #[test]
    fn test_initial_chunks_are_dirty() {
        let mut terrain = Terrain::initialize(half_full([2, 1, 2])).unwrap();
        let dirty = terrain.take_dirty_chunks();
        assert_eq!(dirty.len(), 4);
        assert!(terrain.take_dirty_chunks().is_empty());
        assert_eq!(terrain.generation(ChunkCoord::new(1, 0, 1)), 1);
    }

    #[test]
    fn test_boundary_edit_returns_empty_set() {
        let mut terrain = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        let before = terrain.field().clone();
        terrain.take_dirty_chunks();

        let rebuilt = terrain.edit(Vec3::new(1.0, 12.0, 12.0), true, 2).unwrap();
        assert!(rebuilt.is_empty());
        assert_eq!(terrain.field(), &before);
        assert!(terrain.take_dirty_chunks().is_empty());
    }

    #[test]
    fn test_edit_outside_grid_is_an_error() {
        let mut terrain = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        let err = terrain.edit(Vec3::new(100.0, 12.0, 12.0), true, 1).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_interior_edit_rebuilds_and_tracks_generations() {
        let mut terrain = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        terrain.take_dirty_chunks();
        let target = ChunkCoord::new(1, 1, 1);

        // Remove material just under the flat surface in the middle chunk column
        let rebuilt = terrain.edit(Vec3::new(12.0, 12.0, 12.0), false, 2).unwrap();
        assert_eq!(rebuilt.len(), 8);
        assert!(rebuilt.contains(&target));
        assert!(rebuilt.contains(&ChunkCoord::new(0, 0, 0)));

        let mut dirty = terrain.take_dirty_chunks();
        let mut expected: Vec<_> = rebuilt.into_iter().collect();
        dirty.sort();
        expected.sort();
        assert_eq!(dirty, expected);
        assert_eq!(terrain.generation(target), 2);
        assert_eq!(terrain.generation(ChunkCoord::new(2, 2, 2)), 1);
    }

    #[test]
    fn test_edit_near_chunk_face_keeps_neighbour_in_sync() {
        let mut terrain = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        terrain.take_dirty_chunks();
        let neighbour = ChunkCoord::new(2, 1, 1);

        let rebuilt = terrain.edit(Vec3::new(15.5, 13.0, 12.0), false, 2).unwrap();
        assert!(rebuilt.contains(&neighbour));
        assert!(terrain.take_dirty_chunks().contains(&neighbour));
        assert_eq!(terrain.generation(neighbour), 2);

        let fresh = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        let mut grid = ChunkGrid::build(terrain.field(), *terrain.layout()).unwrap();
        terrain.editor.mesher().polygonize_all(grid.chunks_mut());
        assert_ne!(fresh.chunk(neighbour).unwrap().mesh, grid.get(neighbour).unwrap().mesh);
        for chunk in grid.chunks() {
            assert_eq!(terrain.chunk(chunk.coord).unwrap().mesh, chunk.mesh, "{:?}", chunk.coord);
        }
    }

    #[test]
    fn test_edit_with_huge_radius_rebuilds_everything() {
        let mut terrain = Terrain::initialize(half_full([3, 3, 3])).unwrap();
        let rebuilt = terrain.edit(Vec3::splat(12.0), true, u32::MAX).unwrap();
        assert_eq!(rebuilt.len(), 27);
        assert!(terrain.field().values().iter().all(|&v| v >= 0.25));
    }

    #[test]
    fn test_edit_step_scales_with_resolution() {
        let config = TerrainConfig { resolution: Resolution::Med, ..half_full([3, 3, 3]) };
        let mut terrain = Terrain::initialize(config).unwrap();
        // Med: 2 nodes per unit, so (6.25, 7.0, 6.25) lands on field cell (12, 14, 12)
        let cell = glam::UVec3::new(12, 14, 12);
        assert_eq!(terrain.field().get(cell), 1.0);

        terrain.edit(Vec3::new(6.25, 7.0, 6.25), false, 0).unwrap();
        assert_eq!(terrain.field().get(cell), 0.5);
    }

    #[test]
    fn test_default_brush_uses_config_radius() {
        let config = TerrainConfig { brush_radius: 0, ..half_full([3, 3, 3]) };
        let mut terrain = Terrain::initialize(config).unwrap();
        let before = terrain.field().clone();

        terrain.edit_with_default_brush(Vec3::new(12.0, 14.0, 12.0), false).unwrap();
        let changed = before
            .values()
            .iter()
            .zip(terrain.field().values())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_heightmap_terrain_is_reproducible() {
        let config = TerrainConfig { noise: NoiseParams { seed: 9, ..Default::default() }, ..Default::default() };
        let a = Terrain::initialize(config.clone()).unwrap();
        let b = Terrain::initialize(config).unwrap();
        assert_eq!(a.field(), b.field());
        assert_eq!(a.stats(), b.stats());
        assert!(a.stats().triangles > 0);
    }
}
