//! Scalar type used throughout the engine.
//!
//! Simulation runs in `f32`. The alias keeps a single switch point should a
//! double-precision build ever be needed.

/// Floating point type for all simulation math.
pub type Scalar = f32;
