//! Chunk grid: slices the global noise field into halo-padded chunks

use glam::UVec3;
use rayon::prelude::*;

use super::chunk::{Chunk, ChunkCoord};
use super::layout::GridLayout;
use crate::core::{Error, Result};
use crate::terrain::field::NoiseField;

/// Owns every chunk of the terrain, stored x-fastest
pub struct ChunkGrid {
    layout: GridLayout,
    chunks: Vec<Chunk>,
}

impl ChunkGrid {
    /// Allocate all chunks and populate them from `field`
    pub fn build(field: &NoiseField, layout: GridLayout) -> Result<Self> {
        if field.dims() != layout.field_dims() {
            return Err(Error::invalid(format!(
                "field shape {:?} does not match grid field shape {:?}",
                field.dims(),
                layout.field_dims()
            )));
        }

        let mut chunks: Vec<Chunk> = layout.coords().map(|coord| Chunk::new(coord, &layout)).collect();
        chunks
            .par_iter_mut()
            .for_each(|chunk| populate_chunk(chunk, field, &layout));

        Ok(Self { layout, chunks })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.layout.chunk_index(coord).map(|i| &self.chunks[i])
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.layout.chunk_index(coord).map(move |i| &mut self.chunks[i])
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut [Chunk] {
        &mut self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Fill positions, isovalues and backing indices of every node in `chunk`.
///
/// Node (x, y, z) mirrors field cell `chunk_field_origin + (x, y, z)`, so the
/// halo of one chunk reads exactly the cells its neighbour owns.
pub fn populate_chunk(chunk: &mut Chunk, field: &NoiseField, layout: &GridLayout) {
    let edge = layout.node_edge();
    let pitch = layout.voxel_pitch();
    let field_origin = layout.chunk_field_origin(chunk.coord);
    let origin = chunk.origin;

    for z in 0..edge {
        for y in 0..edge {
            for x in 0..edge {
                let local = UVec3::new(x, y, z);
                let field_index = field_origin + local;
                let node = chunk.nodes.get_mut(x, y, z);
                node.position = origin + local.as_vec3() * pitch;
                node.isovalue = field.get(field_index);
                node.field_index = field_index;
            }
        }
    }
}
