//! Chunk and voxel geometry shared by the grid, the polygonizer and the editor.
//!
//! Every size derived from the configuration is computed and checked here once,
//! so per-voxel loops can index without further validation.

use glam::{UVec3, Vec3};

use super::chunk::ChunkCoord;
use crate::core::{Error, Result};
use crate::terrain::config::{Resolution, TerrainConfig};

/// Width of the overlap border around every chunk's owned voxels
pub const HALO: u32 = 1;

/// Validated chunk grid geometry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    chunk_counts: UVec3,
    chunk_voxels: u32,
    resolution: Resolution,
}

impl GridLayout {
    /// Create a layout; counts and voxels per chunk must be positive
    pub fn new(chunk_counts: UVec3, chunk_voxels: u32, resolution: Resolution) -> Result<Self> {
        if chunk_counts.min_element() == 0 || chunk_voxels == 0 {
            return Err(Error::invalid(format!(
                "grid of {:?} chunks with {} voxels per edge is empty",
                chunk_counts, chunk_voxels
            )));
        }
        for count in chunk_counts.to_array() {
            let field_edge = count as u64 * chunk_voxels as u64 + 2 * HALO as u64;
            if field_edge > u32::MAX as u64 {
                return Err(Error::invalid(format!("field edge {} too large", field_edge)));
            }
        }
        Ok(Self { chunk_counts, chunk_voxels, resolution })
    }

    /// Layout described by a terrain configuration
    pub fn from_config(config: &TerrainConfig) -> Result<Self> {
        Self::new(UVec3::from_array(config.chunk_counts), config.chunk_voxels, config.resolution)
    }

    pub fn chunk_counts(&self) -> UVec3 {
        self.chunk_counts
    }

    /// Owned voxels along each chunk edge
    pub fn chunk_voxels(&self) -> u32 {
        self.chunk_voxels
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Total number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunk_counts.x as usize * self.chunk_counts.y as usize * self.chunk_counts.z as usize
    }

    /// Nodes along each chunk edge, halo included
    pub fn node_edge(&self) -> u32 {
        self.chunk_voxels + 2 * HALO
    }

    /// Shape of the global noise field
    pub fn field_dims(&self) -> UVec3 {
        self.chunk_counts * self.chunk_voxels + UVec3::splat(2 * HALO)
    }

    /// World-space distance between neighbouring nodes
    pub fn voxel_pitch(&self) -> f32 {
        self.resolution.voxel_pitch()
    }

    /// World-space edge length of one chunk
    pub fn chunk_world_length(&self) -> f32 {
        self.chunk_voxels as f32 * self.voxel_pitch()
    }

    /// Whether `coord` names a chunk of this grid
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.z >= 0
            && (coord.x as u32) < self.chunk_counts.x
            && (coord.y as u32) < self.chunk_counts.y
            && (coord.z as u32) < self.chunk_counts.z
    }

    /// Whether `coord` has a neighbour on every side
    pub fn is_interior(&self, coord: ChunkCoord) -> bool {
        self.contains(coord)
            && coord.x > 0 && coord.y > 0 && coord.z > 0
            && (coord.x as u32) < self.chunk_counts.x - 1
            && (coord.y as u32) < self.chunk_counts.y - 1
            && (coord.z as u32) < self.chunk_counts.z - 1
    }

    /// Storage index of an in-bounds chunk (x fastest)
    pub fn chunk_index(&self, coord: ChunkCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let c = self.chunk_counts;
        Some(coord.x as usize + c.x as usize * (coord.y as usize + c.y as usize * coord.z as usize))
    }

    /// Inverse of [`Self::chunk_index`]
    pub fn chunk_coord(&self, index: usize) -> ChunkCoord {
        let c = self.chunk_counts;
        let x = index % c.x as usize;
        let y = (index / c.x as usize) % c.y as usize;
        let z = index / (c.x as usize * c.y as usize);
        ChunkCoord::new(x as i32, y as i32, z as i32)
    }

    /// Every chunk coordinate in storage order
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        (0..self.chunk_count()).map(move |i| self.chunk_coord(i))
    }

    /// World-space minimum corner of a chunk
    pub fn chunk_origin(&self, coord: ChunkCoord) -> Vec3 {
        coord.as_vec3() * self.chunk_world_length()
    }

    /// Field index of a chunk's local node (0, 0, 0); halo nodes of
    /// neighbouring chunks land on the same field cells
    pub fn chunk_field_origin(&self, coord: ChunkCoord) -> UVec3 {
        debug_assert!(self.contains(coord));
        UVec3::new(coord.x as u32, coord.y as u32, coord.z as u32) * self.chunk_voxels
    }

    /// Global voxel under a world position, `floor(pos * resolution)`
    fn global_voxel(&self, pos: Vec3) -> [i64; 3] {
        let scaled = (pos * self.resolution.multiplier() as f32).floor();
        [scaled.x as i64, scaled.y as i64, scaled.z as i64]
    }

    /// Chunk containing a world position (may lie outside the grid)
    pub fn chunk_at(&self, pos: Vec3) -> ChunkCoord {
        let n = self.chunk_voxels as i64;
        let [x, y, z] = self
            .global_voxel(pos)
            .map(|g| g.div_euclid(n).clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        ChunkCoord::new(x, y, z)
    }

    /// Local voxel within its chunk for a world position
    pub fn voxel_in_chunk(&self, pos: Vec3) -> UVec3 {
        let n = self.chunk_voxels as i64;
        UVec3::from_array(self.global_voxel(pos).map(|g| g.rem_euclid(n) as u32))
    }

    /// Chunks whose nodes mirror any field cell in the inclusive box `lo..=hi`
    pub fn chunks_reading(&self, lo: UVec3, hi: UVec3) -> impl Iterator<Item = ChunkCoord> + use<> {
        let n = self.chunk_voxels;
        // Chunk k reads cells k*N ..= k*N + N + 1
        let axis = |lo: u32, hi: u32, count: u32| {
            let first = lo.saturating_sub(n + 2 * HALO - 1).div_ceil(n);
            let last = (hi / n).min(count - 1);
            first as i32..=last as i32
        };
        let xs = axis(lo.x, hi.x, self.chunk_counts.x);
        let ys = axis(lo.y, hi.y, self.chunk_counts.y);
        let zs = axis(lo.z, hi.z, self.chunk_counts.z);
        zs.flat_map(move |z| {
            let xs = xs.clone();
            ys.clone().flat_map(move |y| xs.clone().map(move |x| ChunkCoord::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(counts: [u32; 3], res: Resolution) -> GridLayout {
        GridLayout::new(UVec3::from_array(counts), 8, res).unwrap()
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GridLayout::new(UVec3::new(1, 0, 1), 8, Resolution::Low).is_err());
        assert!(GridLayout::new(UVec3::ONE, 0, Resolution::Low).is_err());
    }

    #[test]
    fn test_derived_sizes() {
        let l = layout([3, 2, 4], Resolution::High);
        assert_eq!(l.node_edge(), 10);
        assert_eq!(l.field_dims(), UVec3::new(26, 18, 34));
        assert_eq!(l.voxel_pitch(), 0.25);
        assert_eq!(l.chunk_world_length(), 2.0);
        assert_eq!(l.chunk_count(), 24);
    }

    #[test]
    fn test_chunk_index_round_trip() {
        let l = layout([3, 2, 4], Resolution::Low);
        for (i, coord) in l.coords().enumerate() {
            assert_eq!(l.chunk_index(coord), Some(i));
        }
        assert_eq!(l.chunk_index(ChunkCoord::new(3, 0, 0)), None);
        assert_eq!(l.chunk_index(ChunkCoord::new(-1, 0, 0)), None);
    }

    #[test]
    fn test_interior() {
        let l = layout([3, 3, 3], Resolution::Low);
        assert!(l.is_interior(ChunkCoord::new(1, 1, 1)));
        assert!(!l.is_interior(ChunkCoord::new(0, 1, 1)));
        assert!(!l.is_interior(ChunkCoord::new(1, 2, 1)));
        assert!(!l.is_interior(ChunkCoord::new(1, 1, 3)));

        let flat = layout([3, 2, 3], Resolution::Low);
        assert!(!flat.is_interior(ChunkCoord::new(1, 1, 1)));
    }

    #[test]
    fn test_world_position_resolution() {
        let l = layout([4, 4, 4], Resolution::Med); // chunk length 4.0
        let pos = Vec3::new(5.3, 9.9, 0.2);
        assert_eq!(l.chunk_at(pos), ChunkCoord::new(1, 2, 0));
        // floor(pos * 2) = (10, 19, 0), modulo 8
        assert_eq!(l.voxel_in_chunk(pos), UVec3::new(2, 3, 0));
        assert_eq!(l.chunk_origin(ChunkCoord::new(1, 2, 0)), Vec3::new(4.0, 8.0, 0.0));
    }

    #[test]
    fn test_chunk_and_voxel_agree_across_faces() {
        for voxels in [3, 5, 7] {
            let l = GridLayout::new(UVec3::splat(4), voxels, Resolution::Med).unwrap();
            for step in -40..200 {
                // Quarter-voxel steps land on and either side of every chunk face
                let v = step as f32 * 0.125;
                let pos = Vec3::new(v, 1.0, -v);
                let chunk = l.chunk_at(pos);
                let voxel = l.voxel_in_chunk(pos);
                let g = (pos * 2.0).floor();
                assert_eq!(chunk.x * voxels as i32 + voxel.x as i32, g.x as i32, "{:?}", pos);
                assert_eq!(chunk.z * voxels as i32 + voxel.z as i32, g.z as i32, "{:?}", pos);
                assert!(voxel.x < voxels && voxel.z < voxels);
            }
        }
        let l = GridLayout::new(UVec3::splat(4), 3, Resolution::Low).unwrap();
        assert_eq!(l.chunk_at(Vec3::new(3.0, 2.999, -0.5)), ChunkCoord::new(1, 0, -1));
        assert_eq!(l.voxel_in_chunk(Vec3::new(3.0, 2.999, -0.5)), UVec3::new(0, 2, 2));
    }

    #[test]
    fn test_chunks_reading_includes_halo_readers() {
        let l = layout([3, 3, 3], Resolution::Low);
        let coords = |lo: [u32; 3], hi: [u32; 3]| {
            let mut v: Vec<_> = l.chunks_reading(UVec3::from_array(lo), UVec3::from_array(hi)).collect();
            v.sort();
            v
        };

        // Cell 8 is node 8 of chunk 0 and node 0 of chunk 1; cell 9 is also
        // chunk 0's far halo node
        assert_eq!(coords([9, 12, 12], [9, 12, 12]), vec![ChunkCoord::new(0, 1, 1), ChunkCoord::new(1, 1, 1)]);
        assert_eq!(coords([10, 12, 12], [10, 12, 12]), vec![ChunkCoord::new(1, 1, 1)]);
        assert_eq!(coords([13, 12, 12], [17, 12, 12]), vec![ChunkCoord::new(1, 1, 1), ChunkCoord::new(2, 1, 1)]);
        // The last field cell belongs to the last chunk only
        assert_eq!(coords([25, 0, 0], [25, 0, 0]), vec![ChunkCoord::new(2, 0, 0)]);
        assert_eq!(coords([0, 0, 0], [25, 25, 25]).len(), 27);
    }

    #[test]
    fn test_field_origin_overlap() {
        let l = layout([3, 3, 3], Resolution::Low);
        let a = l.chunk_field_origin(ChunkCoord::new(0, 1, 0));
        let b = l.chunk_field_origin(ChunkCoord::new(1, 1, 0));
        // b's first node is a's last owned node
        assert_eq!(b.x, a.x + l.chunk_voxels());
        assert!(b.x + 1 <= a.x + l.node_edge() - 1);
    }
}
