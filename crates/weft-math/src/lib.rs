//! # weft-math
//!
//! Math primitives for the Weft cloth simulation engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Quat`, etc.)
//! - Swept axis-aligned bounding box ([`Aabb`])
//! - Closest-point and intersection queries used by the collision solvers
//! - Depth-parameterized curves ([`CurveData`]) for per-particle tuning

pub mod aabb;
pub mod curve;
pub mod queries;

pub use aabb::Aabb;
pub use curve::CurveData;

// Re-export glam types as the canonical math types for Weft.
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
