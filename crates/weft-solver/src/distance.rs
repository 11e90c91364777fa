//! Distance constraint: the structural backbone of the cloth.
//!
//! The graph is built once per team: structural edges come straight from
//! the topology connectivity; shear edges connect the wing vertices of
//! near-coplanar triangle pairs so quads resist shearing without fighting
//! genuine folds. Shear rest lengths are stored negated and solved at
//! reduced stiffness.
//!
//! The solve runs twice per step (before and after collider collision) and
//! is a single-writer pass: each movable particle averages the corrections
//! against all its neighbors and applies them to itself only, which keeps
//! the stage safely data-parallel.

use weft_arena::DataChunk;
use weft_math::queries::triangle_normal;
use weft_mesh::ClothTopology;
use weft_types::constants::{
    DISTANCE_HORIZONTAL_STIFFNESS, DISTANCE_VELOCITY_ATTENUATION, DISTANCE_VERTICAL_STIFFNESS,
    EPSILON,
};
use weft_types::{WeftError, WeftResult};

use crate::mass::inverse_mass;
use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// Triangle pairs folded less than this count as the same surface and get
/// a shear edge (cos 20°).
const SAME_SURFACE_COS: f32 = 0.939_692_6;

/// Shear edges whose diagonal deviates more than this ratio from the quad
/// edge average are rejected as already-creased geometry.
const SHEAR_RATIO_TOLERANCE: f32 = 0.3;

/// Per-vertex packed distance graph.
///
/// `neighbors[starts[v] .. starts[v] + counts[v]]` are vertex `v`'s
/// constraint partners; `rest` holds the signed rest lengths in the same
/// order (negative marks a shear edge).
#[derive(Debug, Clone)]
pub struct DistanceGraph {
    pub counts: Vec<u32>,
    pub starts: Vec<u32>,
    pub neighbors: Vec<u32>,
    pub rest: Vec<f32>,
}

impl DistanceGraph {
    /// Build the graph for one topology.
    pub fn build(topology: &ClothTopology) -> WeftResult<Self> {
        let n = topology.vertex_count();
        let mut per_vertex: Vec<Vec<(u32, f32)>> = vec![Vec::new(); n];

        let mut connect = |a: u32, b: u32, rest: f32| {
            per_vertex[a as usize].push((b, rest));
            per_vertex[b as usize].push((a, rest));
        };

        // Structural edges from the connectivity graph.
        for v in 0..n {
            let attr_v = topology.attributes[v];
            if attr_v.is_invalid() {
                continue;
            }
            for &w in &topology.vertex_neighbors[v] {
                if (w as usize) <= v {
                    continue;
                }
                let attr_w = topology.attributes[w as usize];
                if attr_w.is_invalid() || (attr_v.is_fixed() && attr_w.is_fixed()) {
                    continue;
                }
                let rest = (topology.positions[v] - topology.positions[w as usize]).length();
                if rest <= EPSILON {
                    return Err(WeftError::InvalidTopology(format!(
                        "zero-length edge between vertices {} and {}",
                        v, w
                    )));
                }
                connect(v as u32, w, rest);
            }
        }

        // Shear edges across near-coplanar triangle pairs.
        for ie in &topology.interior_edges {
            let e0 = topology.positions[ie.v0 as usize];
            let e1 = topology.positions[ie.v1 as usize];
            let wa = topology.positions[ie.wing_a as usize];
            let wb = topology.positions[ie.wing_b as usize];

            let na = triangle_normal(wa, e0, e1);
            let nb = triangle_normal(e0, wb, e1);
            if na.dot(nb) < SAME_SURFACE_COS {
                continue;
            }

            let attr_a = topology.attributes[ie.wing_a as usize];
            let attr_b = topology.attributes[ie.wing_b as usize];
            if attr_a.is_invalid()
                || attr_b.is_invalid()
                || (attr_a.is_fixed() && attr_b.is_fixed())
            {
                continue;
            }

            // The wing diagonal of an uncreased quad is comparable to the
            // shared edge; reject outliers.
            let diagonal = (wa - wb).length();
            let edge = (e0 - e1).length();
            if edge <= EPSILON || diagonal <= EPSILON {
                continue;
            }
            let ratio = diagonal / edge;
            if !(1.0 - SHEAR_RATIO_TOLERANCE..=1.0 + 2.0 * SHEAR_RATIO_TOLERANCE)
                .contains(&ratio)
            {
                continue;
            }
            connect(ie.wing_a, ie.wing_b, -diagonal);
        }

        let mut counts = Vec::with_capacity(n);
        let mut starts = Vec::with_capacity(n);
        let mut neighbors = Vec::new();
        let mut rest = Vec::new();
        for list in &per_vertex {
            starts.push(neighbors.len() as u32);
            counts.push(list.len() as u32);
            for &(w, r) in list {
                neighbors.push(w);
                rest.push(r);
            }
        }

        Ok(DistanceGraph {
            counts,
            starts,
            neighbors,
            rest,
        })
    }

    /// Total directed neighbor entries.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbor entries of one vertex as `(neighbor, signed_rest)` pairs.
    pub fn neighbors_of(&self, v: usize) -> impl Iterator<Item = (u32, f32)> + '_ {
        let start = self.starts[v] as usize;
        let count = self.counts[v] as usize;
        (start..start + count).map(move |i| (self.neighbors[i], self.rest[i]))
    }
}

/// One distance relaxation pass over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    graph: &DistanceGraph,
    params: &ClothParameters,
    scale_ratio: f32,
) {
    let base = chunk.start;
    let next = particles.next_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();
    let friction = particles.friction.data();

    for li in 0..chunk.len {
        let i = base + li;
        if !attribute[i].is_movable() || graph.counts[li] == 0 {
            continue;
        }

        let stiffness = params
            .distance
            .stiffness
            .evaluate_clamped(depth[i], 0.0, 1.0);
        if stiffness <= 0.0 {
            continue;
        }
        let w_i = inverse_mass(depth[i], friction[i]);

        let mut sum = weft_math::Vec3::ZERO;
        let mut count = 0u32;
        for (nj, signed_rest) in graph.neighbors_of(li) {
            let j = base + nj as usize;
            let shear = signed_rest < 0.0;
            let rest = signed_rest.abs() * scale_ratio;

            let v = next[j] - next[i];
            let dist = v.length();
            if dist <= EPSILON {
                continue;
            }
            let n = v / dist;

            let w_j = if attribute[j].is_movable() {
                inverse_mass(depth[j], friction[j])
            } else {
                0.0
            };
            let axis_stiffness = if shear {
                DISTANCE_HORIZONTAL_STIFFNESS
            } else {
                DISTANCE_VERTICAL_STIFFNESS
            };

            let c = dist - rest;
            let w_sum = w_i + w_j;
            if w_sum <= EPSILON {
                continue;
            }
            sum += n * (c * stiffness * axis_stiffness * (w_i / w_sum));
            count += 1;
        }

        if count > 0 {
            let add = sum / count as f32;
            next[i] += add;
            velocity_pos[i] += add * DISTANCE_VELOCITY_ATTENUATION;
        }
    }
}
