//! Terrain editing: brush application to the noise field followed by a full
//! rebuild of every chunk that reads a changed cell.

use std::collections::HashSet;

use glam::{UVec3, Vec3};
use rayon::prelude::*;

use super::brush::Brush;
use crate::core::{Error, Result};
use crate::mesh::MarchingCubes;
use crate::terrain::field::NoiseField;
use crate::voxel::chunk::ChunkCoord;
use crate::voxel::grid::{ChunkGrid, populate_chunk};
use crate::voxel::layout::GridLayout;

/// Where a world-space hit lands in the chunk grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTarget {
    pub chunk: ChunkCoord,
    /// Owned voxel within the chunk
    pub local: UVec3,
    /// Field cell backing that voxel
    pub field_index: UVec3,
}

/// Single entry point for field mutation
#[derive(Debug, Clone, Copy)]
pub struct TerrainEditor {
    mesher: MarchingCubes,
}

impl TerrainEditor {
    pub fn new(mesher: MarchingCubes) -> Self {
        Self { mesher }
    }

    pub fn mesher(&self) -> &MarchingCubes {
        &self.mesher
    }

    /// Resolve a world position to its chunk, local voxel and backing field cell
    pub fn resolve(&self, grid: &ChunkGrid, position: Vec3) -> Result<EditTarget> {
        let layout = grid.layout();
        let coord = layout.chunk_at(position);
        let chunk = grid.get(coord).ok_or(Error::OutOfBounds { coord })?;
        let local = layout.voxel_in_chunk(position);
        let field_index = chunk.nodes.get(local.x, local.y, local.z).field_index;
        Ok(EditTarget { chunk: coord, local, field_index })
    }

    /// Apply `brush` to the field and rebuild the affected chunks.
    ///
    /// Only chunks with a neighbour on every side accept edits; anything else
    /// fails before the field is touched. The rebuilt set is the 2x2x2 block
    /// ending at the hit chunk plus any chunk whose nodes overlap the brush.
    pub fn apply_edit(&self, grid: &mut ChunkGrid, field: &mut NoiseField, brush: &Brush) -> Result<HashSet<ChunkCoord>> {
        if !brush.magnitude.is_finite() {
            return Err(Error::invalid(format!("edit magnitude {} is not finite", brush.magnitude)));
        }
        let target = self.resolve(grid, brush.center)?;
        if !grid.layout().is_interior(target.chunk) {
            return Err(Error::BoundaryEditRejected { coord: target.chunk });
        }

        let (lo, hi) = sphere_box(field.dims(), target.field_index, brush.radius);
        let touched = stamp_sphere(field, target.field_index, brush.radius, brush.magnitude)?;
        log::debug!(
            "Edit at {:?} (chunk {:?}, cell {:?}): {} nodes by {:+.3}, bounds {:?}",
            brush.center,
            target.chunk,
            target.field_index,
            touched,
            brush.magnitude,
            brush.bounds(grid.layout().voxel_pitch())
        );

        let rebuilt = rebuild_set(grid.layout(), target.chunk, lo, hi);
        self.rebuild(grid, field, &rebuilt);
        Ok(rebuilt)
    }

    /// Repopulate and re-polygonize `coords` in parallel
    pub fn rebuild(&self, grid: &mut ChunkGrid, field: &NoiseField, coords: &HashSet<ChunkCoord>) {
        let layout = *grid.layout();
        let mesher = self.mesher;
        grid.chunks_mut()
            .par_iter_mut()
            .filter(|chunk| coords.contains(&chunk.coord))
            .for_each(|chunk| {
                populate_chunk(chunk, field, &layout);
                mesher.polygonize_chunk(chunk);
            });
    }
}

/// The 2x2x2 block ending at `coord` plus every chunk whose nodes read a cell in `lo..=hi`
fn rebuild_set(layout: &GridLayout, coord: ChunkCoord, lo: UVec3, hi: UVec3) -> HashSet<ChunkCoord> {
    let mut set: HashSet<ChunkCoord> = layout.chunks_reading(lo, hi).collect();
    for dz in -1..=0 {
        for dy in -1..=0 {
            for dx in -1..=0 {
                set.insert(coord.offset(dx, dy, dz));
            }
        }
    }
    set
}

/// Inclusive cell box around `center` reaching `radius` cells, clipped to `dims`
fn sphere_box(dims: UVec3, center: UVec3, radius: u32) -> (UVec3, UVec3) {
    let r = UVec3::splat(radius);
    let lo = center.saturating_sub(r);
    let hi = center.saturating_add(r).min(dims - UVec3::ONE);
    (lo, hi)
}

/// Add `magnitude` to every cell within `radius` of `center`, clipped to the field.
/// Returns the number of cells visited.
fn stamp_sphere(field: &mut NoiseField, center: UVec3, radius: u32, magnitude: f32) -> Result<usize> {
    let (lo, hi) = sphere_box(field.dims(), center, radius);
    let r2 = radius as u64 * radius as u64;
    let sq = |a: u32, b: u32| {
        let d = a.abs_diff(b) as u64;
        d * d
    };

    let mut touched = 0;
    for z in lo.z..=hi.z {
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                let dist2 = sq(x, center.x)
                    .saturating_add(sq(y, center.y))
                    .saturating_add(sq(z, center.z));
                if dist2 > r2 {
                    continue;
                }
                field.add_clamped(UVec3::new(x, y, z), magnitude)?;
                touched += 1;
            }
        }
    }
    Ok(touched)
}
