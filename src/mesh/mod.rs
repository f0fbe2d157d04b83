//! Isosurface extraction

pub mod marching_cubes;
pub mod tables;

pub use marching_cubes::MarchingCubes;
