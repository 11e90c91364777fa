//! Self-collision broad phase: sweep-and-prune over sorted primitives.
//!
//! Runs once per rendered frame, not per sub-step. Primitives are sorted
//! on one axis; each primitive binary-searches the companion array for the
//! first candidate and sweeps while the axis still overlaps, rejecting on
//! the remaining axes, shared or connected vertices, and all-fixed pairs.
//! Survivors become predictive contacts: admitted when either the previous
//! or the predicted positions are within thickness times the margin ratio,
//! so a pair about to collide this frame is already on the list.

use weft_arena::DataChunk;
use weft_math::queries::{
    closest_pt_point_triangle, closest_pt_segment_segment, triangle_normal,
};
use weft_mesh::ClothTopology;
use weft_solver::ParticleStore;
use weft_types::constants::{
    EPSILON, SELF_COLLISION_MARGIN_RATIO, SELF_COLLISION_POINT_TRIANGLE_ANGLE_COS,
};

use crate::primitive::{Primitive, PrimitiveSet};

/// One edge-vs-edge contact candidate.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEdgeContact {
    /// Primitive index in the first edge set.
    pub a: u32,
    /// Primitive index in the second edge set.
    pub b: u32,
    pub thickness: f32,
    pub enabled: bool,
}

/// One point-vs-triangle contact candidate.
#[derive(Debug, Clone, Copy)]
pub struct PointTriangleContact {
    pub point: u32,
    pub triangle: u32,
    /// Which side of the triangle the point approached from.
    pub sign: f32,
    pub thickness: f32,
    pub enabled: bool,
}

/// Contact thickness of a primitive pair.
pub fn pair_thickness(a: &Primitive, b: &Primitive) -> f32 {
    a.thickness.max(b.thickness)
}

/// Admission radius of a primitive pair.
pub fn pair_margin(a: &Primitive, b: &Primitive) -> f32 {
    pair_thickness(a, b) * SELF_COLLISION_MARGIN_RATIO
}

/// Emit each overlapping sorted-interval pair exactly once.
///
/// The pair is reported from the side whose interval starts later, which
/// is the side that finds the other inside its own sweep window.
fn sweep_pairs(
    a: &PrimitiveSet,
    b: &PrimitiveSet,
    same_set: bool,
    mut emit: impl FnMut(u32, u32),
) {
    if same_set {
        // One array: every entry sweeps only the entries sorted after it,
        // so each pair is seen from exactly one side no matter how the
        // primitive indices fall relative to the sort order.
        for (pos, ea) in a.sorted.iter().enumerate() {
            for eb in &a.sorted[pos + 1..] {
                if eb.min > ea.max {
                    break;
                }
                emit(ea.index, eb.index);
            }
        }
        return;
    }
    // Pass 1: b-entries starting at or after each a-entry.
    for ea in &a.sorted {
        let start = b
            .sorted
            .partition_point(|e| e.min < ea.min);
        for eb in &b.sorted[start..] {
            if eb.min > ea.max {
                break;
            }
            emit(ea.index, eb.index);
        }
    }
    // Pass 2: a-entries starting strictly after a b-entry.
    for eb in &b.sorted {
        let start = a
            .sorted
            .partition_point(|e| e.min <= eb.min);
        for ea in &a.sorted[start..] {
            if ea.min > eb.max {
                break;
            }
            emit(ea.index, eb.index);
        }
    }
}

fn rejected(a: &Primitive, b: &Primitive, arity_a: usize, arity_b: usize, same_team: bool) -> bool {
    if a.flags.ignored() || b.flags.ignored() {
        return true;
    }
    if a.flags.all_fixed() && b.flags.all_fixed() {
        return true;
    }
    if same_team && a.shares_vertex(arity_a, b, arity_b) {
        return true;
    }
    !a.aabb.overlaps(&b.aabb)
}

/// True if any vertex of `a` is edge-connected to any vertex of `b`.
fn connected(topology: &ClothTopology, a: &[u32], b: &[u32]) -> bool {
    a.iter()
        .any(|&va| b.iter().any(|&vb| topology.connected(va, vb)))
}

/// Collect edge-edge contacts between two edge sets.
///
/// For self collision both sets are the same team's edges and
/// `same_team` dedupes and applies connectivity rejection.
#[allow(clippy::too_many_arguments)]
pub fn collect_edge_edge(
    set_a: &PrimitiveSet,
    chunk_a: DataChunk,
    set_b: &PrimitiveSet,
    chunk_b: DataChunk,
    particles: &ParticleStore,
    topology: &ClothTopology,
    same_team: bool,
    out: &mut Vec<EdgeEdgeContact>,
) {
    let next = particles.next_pos.data();
    let old = particles.old_pos.data();
    let same_set = same_team && std::ptr::eq(set_a, set_b);

    sweep_pairs(set_a, set_b, same_set, |ia, ib| {
        let a = &set_a.primitives[ia as usize];
        let b = &set_b.primitives[ib as usize];
        if rejected(a, b, 2, 2, same_team) {
            return;
        }
        if same_team && connected(topology, &a.vertices[..2], &b.vertices[..2]) {
            return;
        }

        let (a0, a1) = (
            chunk_a.start + a.vertices[0] as usize,
            chunk_a.start + a.vertices[1] as usize,
        );
        let (b0, b1) = (
            chunk_b.start + b.vertices[0] as usize,
            chunk_b.start + b.vertices[1] as usize,
        );

        let margin = pair_margin(a, b);
        let (_, _, c1, c2) = closest_pt_segment_segment(old[a0], old[a1], old[b0], old[b1]);
        let dist_old = (c1 - c2).length();
        let (_, _, n1, n2) = closest_pt_segment_segment(next[a0], next[a1], next[b0], next[b1]);
        let dist_next = (n1 - n2).length();
        if dist_old.min(dist_next) >= margin {
            return;
        }

        out.push(EdgeEdgeContact {
            a: ia,
            b: ib,
            thickness: pair_thickness(a, b),
            enabled: dist_next < margin,
        });
    });
}

/// Collect point-triangle contacts between a point set and a triangle set.
#[allow(clippy::too_many_arguments)]
pub fn collect_point_triangle(
    points: &PrimitiveSet,
    chunk_p: DataChunk,
    triangles: &PrimitiveSet,
    chunk_t: DataChunk,
    particles: &ParticleStore,
    topology: &ClothTopology,
    same_team: bool,
    out: &mut Vec<PointTriangleContact>,
) {
    let next = particles.next_pos.data();
    let old = particles.old_pos.data();

    sweep_pairs(points, triangles, false, |ip, it| {
        let p = &points.primitives[ip as usize];
        let t = &triangles.primitives[it as usize];
        if rejected(p, t, 1, 3, same_team) {
            return;
        }
        if same_team && connected(topology, &p.vertices[..1], &t.vertices[..3]) {
            return;
        }

        let pi = chunk_p.start + p.vertices[0] as usize;
        let (t0, t1, t2) = (
            chunk_t.start + t.vertices[0] as usize,
            chunk_t.start + t.vertices[1] as usize,
            chunk_t.start + t.vertices[2] as usize,
        );

        // Side and approach-angle gate from the previous positions.
        let n = triangle_normal(old[t0], old[t1], old[t2]);
        if n == weft_math::Vec3::ZERO {
            return;
        }
        let (cp_old, _) = closest_pt_point_triangle(old[pi], old[t0], old[t1], old[t2]);
        let dir = old[pi] - cp_old;
        let dist_old = dir.length();
        let sign = if n.dot(dir) >= 0.0 { 1.0 } else { -1.0 };
        if dist_old > EPSILON {
            // Grazing approaches are left to edge-edge contacts.
            let cos = n.dot(dir / dist_old).abs();
            if cos < SELF_COLLISION_POINT_TRIANGLE_ANGLE_COS {
                return;
            }
        }

        let margin = pair_margin(p, t);
        let (cp_next, _) = closest_pt_point_triangle(next[pi], next[t0], next[t1], next[t2]);
        let dist_next = (next[pi] - cp_next).length();
        if dist_old.min(dist_next) >= margin {
            return;
        }

        out.push(PointTriangleContact {
            point: ip,
            triangle: it,
            sign,
            thickness: pair_thickness(p, t),
            enabled: dist_next < margin,
        });
    });
}
