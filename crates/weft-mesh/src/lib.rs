//! # weft-mesh
//!
//! Cloth topology for the Weft engine.
//!
//! A [`ClothTopology`] is the static description of one cloth: vertex
//! positions and attributes, triangles, derived edge/adjacency data, and
//! the vertex hierarchy (parents, roots, depths, baselines) the angle and
//! tether constraints solve against.
//!
//! ## Key Types
//!
//! - [`ClothTopology`]: validated topology with adjacency queries
//! - [`hierarchy`]: parent/root/depth/baseline derivation
//! - Procedural generators for test and benchmark cloths

pub mod generators;
pub mod hierarchy;
pub mod topology;

pub use hierarchy::{Baseline, VertexHierarchy};
pub use topology::{ClothTopology, InteriorEdge};
