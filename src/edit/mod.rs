//! Terrain editing.
//!
//! Edits add a signed amount to the noise field around a hit point and then
//! fully rebuild the chunks whose nodes may have changed.

pub mod brush;
pub mod editor;
pub mod invalidator;

pub use brush::Brush;
pub use editor::{EditTarget, TerrainEditor};
pub use invalidator::ChunkInvalidator;
