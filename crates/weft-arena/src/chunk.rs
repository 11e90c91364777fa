//! Contiguous windows into shared buffers.

use std::ops::Range;

/// A `(start, len)` window into a shared arena buffer.
///
/// Chunk starts shift when earlier chunks are removed and the arena
/// compacts; always re-query the owning [`ChunkArena`](crate::ChunkArena)
/// rather than caching a chunk across structural changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataChunk {
    pub start: usize,
    pub len: usize,
}

impl DataChunk {
    /// New chunk covering `[start, start + len)`.
    pub fn new(start: usize, len: usize) -> Self {
        DataChunk { start, len }
    }

    /// True if the chunk covers no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The index range covered by this chunk.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// True if `index` falls inside this chunk.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.len
    }

    /// Translate a local offset into a global buffer index.
    pub fn global(&self, local: usize) -> usize {
        debug_assert!(local < self.len);
        self.start + local
    }
}
