//! Per-vertex simulation attributes.
//!
//! Each vertex carries one byte of flags deciding how the solvers treat it:
//! fixed vertices are animated from outside and never displaced, movable
//! vertices are simulated, and a vertex with neither bit is invalid and
//! skipped entirely.

use serde::{Deserialize, Serialize};

/// Bitflag attribute attached to every cloth vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VertexAttribute(u8);

impl VertexAttribute {
    const FLAG_FIXED: u8 = 0x01;
    const FLAG_MOVE: u8 = 0x02;
    const FLAG_DISABLE_MOTION: u8 = 0x08;

    /// A vertex excluded from simulation.
    pub const INVALID: VertexAttribute = VertexAttribute(0);
    /// An externally driven vertex; constraints read it but never write it.
    pub const FIXED: VertexAttribute = VertexAttribute(Self::FLAG_FIXED);
    /// A freely simulated vertex.
    pub const MOVE: VertexAttribute = VertexAttribute(Self::FLAG_MOVE);

    /// Raw flag byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from a raw flag byte.
    pub fn from_bits(bits: u8) -> Self {
        VertexAttribute(bits)
    }

    /// Neither fixed nor movable: excluded from simulation.
    pub fn is_invalid(self) -> bool {
        self.0 & (Self::FLAG_FIXED | Self::FLAG_MOVE) == 0
    }

    /// Vertex participates in simulation (fixed or movable).
    pub fn is_valid(self) -> bool {
        !self.is_invalid()
    }

    /// Externally driven vertex.
    pub fn is_fixed(self) -> bool {
        self.0 & Self::FLAG_FIXED != 0
    }

    /// Freely simulated vertex.
    pub fn is_movable(self) -> bool {
        self.0 & Self::FLAG_MOVE != 0
    }

    /// Vertex must not be displaced by constraints.
    pub fn is_pinned(self) -> bool {
        self.0 & Self::FLAG_MOVE == 0
    }

    /// Motion constraint applies to this vertex.
    pub fn uses_motion(self) -> bool {
        self.0 & Self::FLAG_DISABLE_MOTION == 0
    }

    /// Returns a copy with the motion constraint disabled.
    pub fn without_motion(self) -> Self {
        VertexAttribute(self.0 | Self::FLAG_DISABLE_MOTION)
    }

    /// Merge two attributes for vertices joined during topology reduction.
    ///
    /// The lower raw value wins, so invalid dominates fixed, and fixed
    /// dominates movable.
    pub fn join(self, other: VertexAttribute) -> VertexAttribute {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }
}
