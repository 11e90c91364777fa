//! # weft-arena
//!
//! Shared-buffer infrastructure for the Weft engine.
//!
//! All teams (cloth instances) live side by side in common arrays; each
//! team owns a contiguous chunk of every array. This crate provides:
//! - [`DataChunk`]: a `(start, len)` window into a shared buffer
//! - [`ChunkArena`]: a growable buffer with chunk registration and
//!   tail-compaction on removal
//! - [`AccumulateBuffer`] / [`AtomicMaxBuffer`]: lock-free fixed-point
//!   accumulation, the only sanctioned form of concurrent mutation in the
//!   solver pipeline

pub mod accumulate;
pub mod arena;
pub mod chunk;

pub use accumulate::{AccumulateBuffer, AtomicMaxBuffer};
pub use arena::{ChunkArena, ChunkHandle};
pub use chunk::DataChunk;
