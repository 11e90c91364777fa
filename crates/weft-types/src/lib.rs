//! # weft-types
//!
//! Shared foundation types for the Weft cloth simulation engine.
//!
//! Provides:
//! - Error type ([`WeftError`]) and result alias ([`WeftResult`])
//! - Strongly-typed index newtypes ([`ParticleId`], [`TeamId`], [`ColliderId`])
//! - Per-vertex simulation attributes ([`VertexAttribute`])
//! - Engine-wide tuning constants
//! - Scalar type alias

pub mod attribute;
pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use attribute::VertexAttribute;
pub use error::{WeftError, WeftResult};
pub use ids::{ColliderId, ParticleId, TeamId};
pub use scalar::Scalar;
