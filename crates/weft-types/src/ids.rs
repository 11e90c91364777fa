//! Strongly-typed index newtypes.
//!
//! Particles, teams, and colliders all live in shared arenas indexed by
//! plain integers; the newtypes keep the index spaces from mixing.

use serde::{Deserialize, Serialize};

/// Index of a particle in the shared particle arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

/// Index of a registered team (one cloth instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u16);

/// Index of a collider in the shared collider arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

impl ParticleId {
    /// Returns the raw index as `usize` for buffer access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TeamId {
    /// Returns the raw index as `usize` for buffer access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ColliderId {
    /// Returns the raw index as `usize` for buffer access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for ParticleId {
    fn from(i: usize) -> Self {
        ParticleId(i as u32)
    }
}

impl From<usize> for TeamId {
    fn from(i: usize) -> Self {
        TeamId(i as u16)
    }
}

impl From<usize> for ColliderId {
    fn from(i: usize) -> Self {
        ColliderId(i as u32)
    }
}
