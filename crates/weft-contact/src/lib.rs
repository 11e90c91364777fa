//! # weft-contact
//!
//! Collision handling for the simulation: environment colliders (sphere,
//! capsule, plane) resolved per particle or per edge, and full-mesh self
//! collision with a sweep-and-prune broad phase, a predictive contact
//! list, and frame-sliced entanglement detection.
//!
//! [`ContactPipeline`] implements the solver's [`ContactStage`] seam and
//! is handed to `Pipeline::update` by the caller.
//!
//! [`ContactStage`]: weft_solver::ContactStage

pub mod broad;
pub mod collider;
pub mod collision_pipeline;
pub mod edge_collision;
pub mod intersect;
pub mod narrow;
pub mod point_collision;
pub mod primitive;

pub use broad::{EdgeEdgeContact, PointTriangleContact};
pub use collider::{Collider, ColliderShape, ColliderStore, ColliderTransform};
pub use collision_pipeline::ContactPipeline;
pub use intersect::SliceScheduler;
pub use primitive::{Primitive, PrimitiveFlags, PrimitiveKind, PrimitiveSet};
