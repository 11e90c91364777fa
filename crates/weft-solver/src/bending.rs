//! Triangle bending constraint.
//!
//! Every interior edge yields one bending pair: the two edge vertices and
//! the two wing vertices of the adjacent triangles. Gently folded rest
//! geometry solves a signed dihedral-angle constraint (the sign resolves
//! the fold-direction ambiguity of the unsigned angle); strongly folded
//! rest geometry keeps its signed tetrahedron volume instead, which stays
//! stable where the dihedral gradient degenerates. Rest folds sharper than
//! 120 degrees are left to the distance graph entirely.
//!
//! Pairs overlap at shared vertices, so corrections scatter through the
//! accumulate buffer and a drain pass averages them per particle. That is
//! what makes the stage safe to parallelize over pairs.

use weft_arena::{AccumulateBuffer, DataChunk};
use weft_math::queries::signed_dihedral_angle;
use weft_math::Vec3;
use weft_mesh::ClothTopology;
use weft_types::constants::{EPSILON, TRIANGLE_BENDING_MAX_ANGLE_DEG, VOLUME_MIN_ANGLE_DEG};

use crate::mass::inverse_mass;
use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// Inverse mass assigned to pinned vertices inside a pair solve. They
/// participate in the weighting but are never written.
const PINNED_INVERSE_MASS: f32 = 0.01;

/// How a bending pair is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendingKind {
    /// Signed dihedral angle across the shared edge.
    Dihedral,
    /// Signed tetrahedron volume of the four vertices.
    Volume,
}

/// One bending pair: shared edge `[e0, e1]` and wings `[w_a, w_b]`.
#[derive(Debug, Clone, Copy)]
pub struct BendingPair {
    /// Local vertex indices: `[e0, e1, wing_a, wing_b]`.
    pub indices: [u32; 4],
    /// Rest dihedral angle (radians) or rest signed volume (×6).
    pub rest: f32,
    pub kind: BendingKind,
}

/// Bending pair set for one team.
#[derive(Debug, Clone, Default)]
pub struct BendingPairs {
    pub pairs: Vec<BendingPair>,
}

impl BendingPairs {
    /// Derive pairs from a topology's interior edges.
    pub fn build(topology: &ClothTopology) -> Self {
        let mut pairs = Vec::with_capacity(topology.interior_edges.len());
        for ie in &topology.interior_edges {
            let e0 = topology.positions[ie.v0 as usize];
            let e1 = topology.positions[ie.v1 as usize];
            let wa = topology.positions[ie.wing_a as usize];
            let wb = topology.positions[ie.wing_b as usize];

            // All four pinned: nothing to solve.
            let attrs = [
                topology.attributes[ie.v0 as usize],
                topology.attributes[ie.v1 as usize],
                topology.attributes[ie.wing_a as usize],
                topology.attributes[ie.wing_b as usize],
            ];
            if attrs.iter().any(|a| a.is_invalid()) || attrs.iter().all(|a| a.is_pinned()) {
                continue;
            }

            let rest_angle = signed_dihedral_angle(wa, e0, e1, wb);
            let rest_deg = rest_angle.abs().to_degrees();
            if rest_deg > TRIANGLE_BENDING_MAX_ANGLE_DEG {
                continue;
            }

            let (kind, rest) = if rest_deg >= VOLUME_MIN_ANGLE_DEG {
                (BendingKind::Volume, six_volume(e0, e1, wa, wb))
            } else {
                (BendingKind::Dihedral, rest_angle)
            };
            pairs.push(BendingPair {
                indices: [ie.v0, ie.v1, ie.wing_a, ie.wing_b],
                rest,
                kind,
            });
        }
        BendingPairs { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Six times the signed tetrahedron volume of `(e0, e1, wa, wb)`.
fn six_volume(e0: Vec3, e1: Vec3, wa: Vec3, wb: Vec3) -> f32 {
    (e1 - e0).cross(wa - e0).dot(wb - e0)
}

/// Scatter one bending pass into the accumulate buffer.
///
/// With the `parallel` feature the pairs are split across the rayon
/// pool; the atomic scatter makes the result independent of pair order.
pub fn solve(
    particles: &ParticleStore,
    chunk: DataChunk,
    pairs: &BendingPairs,
    params: &ClothParameters,
    scale_ratio: f32,
    accumulate: &AccumulateBuffer,
) {
    let base = chunk.start;
    let next = particles.next_pos.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();
    let friction = particles.friction.data();

    let solve_pair = |pair: &BendingPair| {
        let idx = [
            base + pair.indices[0] as usize,
            base + pair.indices[1] as usize,
            base + pair.indices[2] as usize,
            base + pair.indices[3] as usize,
        ];
        let pinned = [
            attribute[idx[0]].is_pinned(),
            attribute[idx[1]].is_pinned(),
            attribute[idx[2]].is_pinned(),
            attribute[idx[3]].is_pinned(),
        ];
        let w: [f32; 4] = std::array::from_fn(|k| {
            if pinned[k] {
                PINNED_INVERSE_MASS
            } else {
                inverse_mass(depth[idx[k]], friction[idx[k]])
            }
        });

        let mid = idx.iter().map(|&i| depth[i]).sum::<f32>() / 4.0;
        let stiffness = params.bending.stiffness.evaluate_clamped(mid, 0.0, 1.0);
        if stiffness <= 0.0 {
            return;
        }

        let corr = match pair.kind {
            BendingKind::Dihedral => solve_dihedral(next, &idx, &w, pair.rest),
            BendingKind::Volume => {
                solve_volume(next, &idx, &w, pair.rest * scale_ratio.powi(3))
            }
        };
        let Some(corr) = corr else { return };

        for k in 0..4 {
            if !pinned[k] {
                accumulate.add(idx[k], corr[k] * stiffness);
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        pairs.pairs.par_iter().for_each(solve_pair);
    }
    #[cfg(not(feature = "parallel"))]
    pairs.pairs.iter().for_each(solve_pair);
}

/// Signed dihedral constraint corrections for one pair, or `None` on
/// degenerate geometry.
fn solve_dihedral(next: &[Vec3], idx: &[usize; 4], w: &[f32], rest: f32) -> Option<[Vec3; 4]> {
    let p1 = next[idx[0]];
    let p2 = next[idx[1]] - p1;
    let p3 = next[idx[2]] - p1;
    let p4 = next[idx[3]] - p1;

    let n1_raw = p2.cross(p3);
    let n2_raw = p2.cross(p4);
    let l1 = n1_raw.length();
    let l2 = n2_raw.length();
    if l1 <= EPSILON || l2 <= EPSILON {
        return None;
    }
    let n1 = n1_raw / l1;
    let n2 = n2_raw / l2;

    let d = n1.dot(n2).clamp(-1.0, 1.0);
    let sign = if n1.cross(n2).dot(p2) >= 0.0 { 1.0 } else { -1.0 };
    let angle = d.acos() * sign;
    let c = angle - rest;
    if c.abs() <= EPSILON {
        return None;
    }

    let q3 = (p2.cross(n2) + n1.cross(p2) * d) / l1;
    let q4 = (p2.cross(n1) + n2.cross(p2) * d) / l2;
    let q2 = -(p3.cross(n2) + n1.cross(p3) * d) / l1 - (p4.cross(n1) + n2.cross(p4) * d) / l2;
    let q1 = -q2 - q3 - q4;
    let grads = [q1, q2, q3, q4];

    let denom: f32 = (0..4).map(|k| w[k] * grads[k].length_squared()).sum();
    if denom <= EPSILON {
        return None;
    }
    let scale = (1.0 - d * d).max(0.0).sqrt() * c * sign / denom;

    let mut corr = [Vec3::ZERO; 4];
    for k in 0..4 {
        corr[k] = grads[k] * (-scale * w[k]);
    }
    Some(corr)
}

/// Signed volume constraint corrections for one pair.
fn solve_volume(next: &[Vec3], idx: &[usize; 4], w: &[f32], rest_six_volume: f32) -> Option<[Vec3; 4]> {
    let p1 = next[idx[0]];
    let p2 = next[idx[1]];
    let p3 = next[idx[2]];
    let p4 = next[idx[3]];

    let c = (p2 - p1).cross(p3 - p1).dot(p4 - p1) - rest_six_volume;
    if c.abs() <= EPSILON {
        return None;
    }

    let g2 = (p3 - p1).cross(p4 - p1);
    let g3 = (p4 - p1).cross(p2 - p1);
    let g4 = (p2 - p1).cross(p3 - p1);
    let g1 = -(g2 + g3 + g4);
    let grads = [g1, g2, g3, g4];

    let denom: f32 = (0..4).map(|k| w[k] * grads[k].length_squared()).sum();
    if denom <= EPSILON {
        return None;
    }
    let scale = c / denom;

    let mut corr = [Vec3::ZERO; 4];
    for k in 0..4 {
        corr[k] = grads[k] * (-scale * w[k]);
    }
    Some(corr)
}

/// Drain the accumulate buffer into particle positions.
pub fn aggregate(particles: &mut ParticleStore, chunk: DataChunk, accumulate: &AccumulateBuffer) {
    let next = particles.next_pos.data_mut();
    let attribute = particles.attribute.data();
    for i in chunk.range() {
        if accumulate.contribution_count(i) == 0 {
            continue;
        }
        let add = accumulate.take_average(i);
        if attribute[i].is_movable() {
            next[i] += add;
        }
    }
}
