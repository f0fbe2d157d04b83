//! Marching Cubes polygonizer over a chunk's halo-padded node lattice.

use glam::Vec3;
use rayon::prelude::*;

use super::tables::{CORNER_OFFSETS, EDGE_CONNECTION, EDGE_DIRECTION, EDGE_TABLE, TRI_TABLE};
use crate::terrain::config::TerrainConfig;
use crate::voxel::chunk::{Chunk, ChunkMesh, NodeGrid};

/// Isosurface extraction settings shared by every chunk
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchingCubes {
    /// Isovalues below this are solid
    pub surface_level: f32,
    /// Interpolate vertices along edges instead of using midpoints
    pub smoothing: bool,
    /// World-space distance between neighbouring nodes
    pub pitch: f32,
}

impl MarchingCubes {
    pub fn new(surface_level: f32, smoothing: bool, pitch: f32) -> Self {
        Self { surface_level, smoothing, pitch }
    }

    pub fn from_config(config: &TerrainConfig) -> Self {
        Self::new(config.surface_level, config.smoothing, config.resolution.voxel_pitch())
    }

    /// 8-bit configuration code; bit i set when corner i is solid
    pub fn cube_index(&self, corners: &[f32; 8]) -> usize {
        corners
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v < self.surface_level)
            .fold(0, |index, (i, _)| index | (1 << i))
    }

    /// Fraction of the edge from corner `a` to corner `b` where the surface sits
    pub fn edge_factor(&self, a: f32, b: f32) -> f32 {
        if !self.smoothing || a == b {
            return 0.5;
        }
        ((self.surface_level - a) / (b - a)).clamp(0.0, 1.0)
    }

    /// Emit the triangles of the cube whose minimum corner is node (x, y, z).
    ///
    /// Returns the number of vertices and indices appended to `mesh`.
    pub fn polygonize_cube(&self, nodes: &NodeGrid, x: u32, y: u32, z: u32, mesh: &mut ChunkMesh) -> (usize, usize) {
        let mut corners = [0.0f32; 8];
        for (value, offset) in corners.iter_mut().zip(CORNER_OFFSETS.iter()) {
            *value = nodes.get(x + offset[0], y + offset[1], z + offset[2]).isovalue;
        }

        let index = self.cube_index(&corners);
        let flags = EDGE_TABLE[index];
        if flags == 0 {
            return (0, 0);
        }

        let base = nodes.get(x, y, z).position;
        let mut edge_vertices = [Vec3::ZERO; 12];
        for (edge, vertex) in edge_vertices.iter_mut().enumerate() {
            if flags & (1 << edge) == 0 {
                continue;
            }
            let [a, b] = EDGE_CONNECTION[edge];
            let start = base + Vec3::from(CORNER_OFFSETS[a].map(|o| o as f32)) * self.pitch;
            let t = self.edge_factor(corners[a], corners[b]);
            *vertex = start + Vec3::from(EDGE_DIRECTION[edge]) * (t * self.pitch);
        }

        let vertices_before = mesh.vertices.len();
        let indices_before = mesh.indices.len();
        for tri in TRI_TABLE[index].chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            let first = mesh.vertices.len() as u32;
            mesh.vertices.extend(tri.iter().map(|&e| edge_vertices[e as usize]));
            mesh.indices.extend([first + 2, first + 1, first]);
        }
        (mesh.vertices.len() - vertices_before, mesh.indices.len() - indices_before)
    }

    /// Rebuild a chunk's mesh from its current nodes; returns the triangle count.
    ///
    /// Cubes start at every owned node (local 1..=N); the halo supplies the
    /// upper corners of the last layer.
    pub fn polygonize_chunk(&self, chunk: &mut Chunk) -> usize {
        let Chunk { nodes, mesh, .. } = chunk;
        mesh.clear();
        let last = nodes.edge() - 2;
        for z in 1..=last {
            for y in 1..=last {
                for x in 1..=last {
                    self.polygonize_cube(nodes, x, y, z, mesh);
                }
            }
        }
        mesh.triangle_count()
    }

    /// Polygonize many chunks in parallel; returns the total triangle count
    pub fn polygonize_all(&self, chunks: &mut [Chunk]) -> usize {
        chunks.par_iter_mut().map(|chunk| self.polygonize_chunk(chunk)).sum()
    }
}
