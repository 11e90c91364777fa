//! # weft-solver
//!
//! The constraint solver core of the Weft engine.
//!
//! A [`SimulationContext`] owns all state (particle arenas, team table,
//! wind, shared accumulation buffers); a [`Pipeline`] advances it at a
//! fixed internal frequency, running the full constraint chain per
//! sub-step:
//!
//! tether → distance → angle → bending → collider collision →
//! distance → motion → spring → self collision
//!
//! Collision stages plug in through the [`ContactStage`] trait so this
//! crate carries no collision geometry; see `weft-contact` for the real
//! implementation and [`NoContacts`] for the pass-through.
//!
//! ## Key Types
//!
//! - [`ClothParameters`]: per-cloth tuning, serde-serializable, with
//!   presets and range validation
//! - [`SimulationContext`]: explicit state bundle, no globals
//! - [`Pipeline`] / [`PipelineConfig`]: fixed-rate step driver
//! - [`ParticleStore`] / [`TeamStore`]: packed per-particle and
//!   per-team state
//!
//! With the `parallel` feature the scatter-based stages run on the
//! rayon pool.

pub mod angle;
pub mod bending;
pub mod context;
pub mod distance;
pub mod inertia;
pub mod integrate;
pub mod mass;
pub mod motion;
pub mod parameters;
pub mod particle;
pub mod pipeline;
pub mod spring;
pub mod team;
pub mod tether;

pub use context::SimulationContext;
pub use distance::DistanceGraph;
pub use integrate::WindField;
pub use parameters::{ClothParameters, TeleportMode, TeleportPolicy};
pub use particle::ParticleStore;
pub use pipeline::{ContactStage, FrameReport, NoContacts, Pipeline, PipelineConfig};
pub use team::{TeamData, TeamStore, TeleportRequest};
