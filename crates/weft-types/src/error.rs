//! Error types for the Weft engine.
//!
//! Fallibility is split into two regimes:
//! - **Construction time** (topology builds, team registration, parameter
//!   validation) returns [`WeftResult`] so hosts can reject bad assets.
//! - **Step time** is infallible: degenerate work items are skipped behind
//!   epsilon guards rather than aborting a frame.

use thiserror::Error;

/// Top-level error type for all Weft operations.
#[derive(Error, Debug)]
pub enum WeftError {
    /// Cloth topology failed validation (index out of bounds, degenerate
    /// triangle, inconsistent attribute counts, ...).
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Parameter struct failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chunk arena bookkeeping error (double free, unknown chunk, overflow).
    #[error("invalid chunk operation: {0}")]
    InvalidChunk(String),

    /// Team lifecycle error (unknown team, capacity exceeded, bad sync link).
    #[error("invalid team operation: {0}")]
    InvalidTeam(String),

    /// I/O error (parameter files, benchmark output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violated. Indicates a bug in the engine.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience result alias used throughout the workspace.
pub type WeftResult<T> = Result<T, WeftError>;
