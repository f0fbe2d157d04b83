//! Isoforge - chunked marching-cubes voxel terrain

pub mod core;
pub mod math;
pub mod terrain;
pub mod voxel;
pub mod mesh;
pub mod edit;
