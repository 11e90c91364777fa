//! Growable buffers with chunk bookkeeping.

use tracing::debug;
use weft_types::{WeftError, WeftResult};

use crate::chunk::DataChunk;

/// Stable handle to a registered chunk.
///
/// Handles stay valid across compaction; the chunk's `start` may move, so
/// callers resolve the handle through [`ChunkArena::chunk`] each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHandle(pub(crate) u32);

impl ChunkHandle {
    /// Raw slot index, mainly for logging.
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ChunkEntry {
    chunk: DataChunk,
    alive: bool,
}

/// A shared buffer that hands out contiguous chunks.
///
/// Registration appends at the tail. Unregistration removes the chunk's
/// elements and shifts everything behind it down, so the buffer stays
/// dense; handles of surviving chunks remain valid and resolve to their
/// shifted windows.
#[derive(Debug, Default)]
pub struct ChunkArena<T> {
    data: Vec<T>,
    entries: Vec<ChunkEntry>,
}

impl<T: Clone + Default> ChunkArena<T> {
    /// Empty arena.
    pub fn new() -> Self {
        ChunkArena {
            data: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Register a chunk of `count` default-initialized elements.
    pub fn register(&mut self, count: usize) -> ChunkHandle {
        self.register_with(count, T::default())
    }

    /// Register a chunk of `count` copies of `fill`.
    pub fn register_with(&mut self, count: usize, fill: T) -> ChunkHandle {
        let start = self.data.len();
        self.data.resize(start + count, fill);
        self.push_entry(DataChunk::new(start, count))
    }

    /// Register a chunk initialized from `values`.
    pub fn register_from(&mut self, values: &[T]) -> ChunkHandle {
        let start = self.data.len();
        self.data.extend_from_slice(values);
        self.push_entry(DataChunk::new(start, values.len()))
    }

    fn push_entry(&mut self, chunk: DataChunk) -> ChunkHandle {
        // Reuse a dead slot when one exists.
        if let Some(slot) = self.entries.iter().position(|e| !e.alive) {
            self.entries[slot] = ChunkEntry { chunk, alive: true };
            return ChunkHandle(slot as u32);
        }
        self.entries.push(ChunkEntry { chunk, alive: true });
        ChunkHandle((self.entries.len() - 1) as u32)
    }

    /// Remove a chunk and compact the buffer behind it.
    pub fn unregister(&mut self, handle: ChunkHandle) -> WeftResult<()> {
        let slot = handle.0 as usize;
        let entry = self
            .entries
            .get(slot)
            .filter(|e| e.alive)
            .ok_or_else(|| {
                WeftError::InvalidChunk(format!("unregister of unknown chunk {}", handle.0))
            })?;
        let removed = entry.chunk;

        self.data.drain(removed.range());
        self.entries[slot].alive = false;

        for e in self.entries.iter_mut().filter(|e| e.alive) {
            if e.chunk.start > removed.start {
                e.chunk.start -= removed.len;
            }
        }
        debug!(
            start = removed.start,
            len = removed.len,
            remaining = self.data.len(),
            "chunk arena compacted"
        );
        Ok(())
    }

    /// Resolve a handle to its current window.
    pub fn chunk(&self, handle: ChunkHandle) -> WeftResult<DataChunk> {
        self.entries
            .get(handle.0 as usize)
            .filter(|e| e.alive)
            .map(|e| e.chunk)
            .ok_or_else(|| {
                WeftError::InvalidChunk(format!("lookup of unknown chunk {}", handle.0))
            })
    }

    /// Slice covering one chunk.
    pub fn slice(&self, handle: ChunkHandle) -> WeftResult<&[T]> {
        let c = self.chunk(handle)?;
        Ok(&self.data[c.range()])
    }

    /// Mutable slice covering one chunk.
    pub fn slice_mut(&mut self, handle: ChunkHandle) -> WeftResult<&mut [T]> {
        let c = self.chunk(handle)?;
        Ok(&mut self.data[c.range()])
    }

    /// The whole backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// The whole backing buffer, mutable.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Total element count across all live chunks.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of live chunks.
    pub fn chunk_count(&self) -> usize {
        self.entries.iter().filter(|e| e.alive).count()
    }
}
