//! Chunk geometry, node lattices and the chunk grid

pub mod chunk;
pub mod grid;
pub mod layout;

pub use chunk::{Chunk, ChunkCoord, ChunkMesh, Node, NodeGrid};
pub use grid::ChunkGrid;
pub use layout::{GridLayout, HALO};
