//! Dirty-chunk tracking so a host can poll for meshes to re-upload.

use std::collections::{HashMap, HashSet};

use crate::voxel::chunk::ChunkCoord;

/// Tracks which chunk meshes changed since the host last looked.
///
/// Every mark bumps the chunk's generation counter, so a host that caches
/// uploaded buffers can compare generations instead of draining the dirty set.
#[derive(Debug, Default)]
pub struct ChunkInvalidator {
    /// Chunks rebuilt since the last `take_dirty_chunks`
    dirty_chunks: HashSet<ChunkCoord>,
    /// Rebuild counters per chunk
    generations: HashMap<ChunkCoord, u32>,
}

impl ChunkInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a specific chunk as dirty and increment its generation.
    pub fn mark_chunk_dirty(&mut self, coord: ChunkCoord) {
        self.dirty_chunks.insert(coord);
        let generation = self.generations.entry(coord).or_insert(0);
        *generation = generation.wrapping_add(1);
    }

    pub fn mark_chunks<'a>(&mut self, coords: impl IntoIterator<Item = &'a ChunkCoord>) {
        for &coord in coords {
            self.mark_chunk_dirty(coord);
        }
    }

    /// Take all dirty chunks in coordinate order and clear the dirty list.
    pub fn take_dirty_chunks(&mut self) -> Vec<ChunkCoord> {
        let mut dirty: Vec<_> = self.dirty_chunks.drain().collect();
        dirty.sort_unstable();
        dirty
    }

    /// Number of times `coord` has been marked; 0 if never
    pub fn generation(&self, coord: &ChunkCoord) -> u32 {
        self.generations.get(coord).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let mut invalidator = ChunkInvalidator::new();
        assert!(invalidator.take_dirty_chunks().is_empty());
        assert_eq!(invalidator.generation(&ChunkCoord::new(0, 0, 0)), 0);
    }

    #[test]
    fn test_mark_chunk_dirty_multiple_times() {
        let mut invalidator = ChunkInvalidator::new();
        let coord = ChunkCoord::new(1, 2, 3);

        invalidator.mark_chunk_dirty(coord);
        assert_eq!(invalidator.generation(&coord), 1);

        invalidator.mark_chunk_dirty(coord);
        invalidator.mark_chunk_dirty(coord);
        assert_eq!(invalidator.generation(&coord), 3);
        assert_eq!(invalidator.take_dirty_chunks(), vec![coord]);
    }

    #[test]
    fn test_take_dirty_chunks_sorted() {
        let mut invalidator = ChunkInvalidator::new();
        let coords = [ChunkCoord::new(1, 1, 1), ChunkCoord::new(0, 0, 0), ChunkCoord::new(0, 1, 0)];
        invalidator.mark_chunks(&coords);

        let dirty = invalidator.take_dirty_chunks();
        assert_eq!(dirty, vec![coords[1], coords[2], coords[0]]);
        assert!(invalidator.take_dirty_chunks().is_empty());
        // Generations survive draining
        assert_eq!(invalidator.generation(&coords[0]), 1);
    }
}
