//! Chunks: a halo-padded block of nodes plus the mesh polygonized from them

use glam::{UVec3, Vec3};

use super::layout::GridLayout;
use crate::math::Aabb;

/// Integer coordinate identifying a chunk in the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Offset by whole chunks
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// A lattice point of a chunk
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Node {
    /// World-space position
    pub position: Vec3,
    /// Density copied from the noise field
    pub isovalue: f32,
    /// Index of the field cell this node mirrors
    pub field_index: UVec3,
}

/// Cubic block of nodes, `edge` per axis, x fastest
#[derive(Clone, Debug)]
pub struct NodeGrid {
    edge: u32,
    nodes: Vec<Node>,
}

impl NodeGrid {
    /// Allocate `edge³` default nodes
    pub fn new(edge: u32) -> Self {
        let e = edge as usize;
        Self { edge, nodes: vec![Node::default(); e * e * e] }
    }

    /// Nodes per axis
    pub fn edge(&self) -> u32 {
        self.edge
    }

    #[inline]
    fn linear(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.edge && y < self.edge && z < self.edge);
        let e = self.edge as usize;
        x as usize + e * (y as usize + e * z as usize)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> &Node {
        &self.nodes[self.linear(x, y, z)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: u32, y: u32, z: u32) -> &mut Node {
        let i = self.linear(x, y, z);
        &mut self.nodes[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

/// Triangle soup produced for one chunk
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertex positions; three per triangle, never shared
    pub vertices: Vec<Vec3>,
    /// Vertex indices, grouped in triples per triangle
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer bytes (`[f32; 3]` per vertex) for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer bytes (`u32` per index) for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// One cell of the chunk grid
pub struct Chunk {
    /// Coordinate of this chunk in the grid
    pub coord: ChunkCoord,
    /// World-space minimum corner
    pub origin: Vec3,
    /// Owned nodes plus one halo layer on every face
    pub nodes: NodeGrid,
    /// Mesh from the last polygonization
    pub mesh: ChunkMesh,
    world_length: f32,
}

impl Chunk {
    /// Allocate an unpopulated chunk at `coord`
    pub fn new(coord: ChunkCoord, layout: &GridLayout) -> Self {
        Self {
            coord,
            origin: layout.chunk_origin(coord),
            nodes: NodeGrid::new(layout.node_edge()),
            mesh: ChunkMesh::default(),
            world_length: layout.chunk_world_length(),
        }
    }

    /// Get the world-space bounding box of the owned volume
    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(self.origin, self.origin + Vec3::splat(self.world_length))
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.mesh.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::config::Resolution;

    #[test]
    fn test_chunk_coord_new() {
        let coord = ChunkCoord::new(1, 2, 3);
        assert_eq!(coord.x, 1);
        assert_eq!(coord.y, 2);
        assert_eq!(coord.z, 3);
        assert_eq!(coord.offset(-1, 0, 1), ChunkCoord::new(0, 2, 4));
    }

    #[test]
    fn test_node_grid_layout() {
        let mut grid = NodeGrid::new(4);
        assert_eq!(grid.iter().count(), 64);
        grid.get_mut(3, 1, 2).isovalue = 0.5;
        assert_eq!(grid.get(3, 1, 2).isovalue, 0.5);
        assert_eq!(grid.iter().filter(|n| n.isovalue == 0.5).count(), 1);
    }

    #[test]
    fn test_chunk_new() {
        let layout = GridLayout::new(UVec3::splat(3), 8, Resolution::Med).unwrap();
        let chunk = Chunk::new(ChunkCoord::new(1, 2, 0), &layout);

        assert_eq!(chunk.origin, Vec3::new(4.0, 8.0, 0.0));
        assert_eq!(chunk.nodes.edge(), 10);
        assert!(chunk.mesh.is_empty());
    }

    #[test]
    fn test_chunk_world_bounds() {
        let layout = GridLayout::new(UVec3::splat(3), 8, Resolution::Low).unwrap();
        let chunk = Chunk::new(ChunkCoord::new(1, 2, 0), &layout);
        let bounds = chunk.world_bounds();

        assert_eq!(bounds.min, Vec3::new(8.0, 16.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(16.0, 24.0, 8.0));
    }

    #[test]
    fn test_mesh_bytes() {
        let mesh = ChunkMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![2, 1, 0],
        };
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_bytes().len(), 3 * 12);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
    }
}
