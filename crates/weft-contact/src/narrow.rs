//! Self-collision narrow phase: fast refresh and the XPBD-style solve.
//!
//! Sub-steps between broad-phase rebuilds do not re-pair; they revalidate
//! the existing contact list against current positions and flip the
//! enabled flag. The solve iterates a fixed number of separation passes
//! over enabled contacts, scattering corrections through the accumulate
//! buffer because one particle may sit in many simultaneous contacts.

use weft_arena::{AccumulateBuffer, DataChunk};
use weft_math::queries::{
    closest_pt_point_triangle, closest_pt_segment_segment, triangle_normal,
};
use weft_math::Vec3;
use weft_solver::mass::self_collision_inverse_mass;
use weft_solver::ParticleStore;
use weft_types::constants::{EPSILON, SELF_COLLISION_MARGIN_RATIO, SELF_COLLISION_SOLVER_ITERATIONS};

use crate::broad::{EdgeEdgeContact, PointTriangleContact};
use crate::primitive::PrimitiveSet;

/// Revalidate edge-edge contacts against current positions.
pub fn refresh_edge_edge(
    contacts: &mut [EdgeEdgeContact],
    set_a: &PrimitiveSet,
    chunk_a: DataChunk,
    set_b: &PrimitiveSet,
    chunk_b: DataChunk,
    particles: &ParticleStore,
) {
    let next = particles.next_pos.data();
    for contact in contacts {
        let a = &set_a.primitives[contact.a as usize];
        let b = &set_b.primitives[contact.b as usize];
        let (a0, a1) = (
            chunk_a.start + a.vertices[0] as usize,
            chunk_a.start + a.vertices[1] as usize,
        );
        let (b0, b1) = (
            chunk_b.start + b.vertices[0] as usize,
            chunk_b.start + b.vertices[1] as usize,
        );
        let (_, _, c1, c2) = closest_pt_segment_segment(next[a0], next[a1], next[b0], next[b1]);
        contact.enabled =
            (c1 - c2).length() < contact.thickness * SELF_COLLISION_MARGIN_RATIO;
    }
}

/// Revalidate point-triangle contacts against current positions.
pub fn refresh_point_triangle(
    contacts: &mut [PointTriangleContact],
    points: &PrimitiveSet,
    chunk_p: DataChunk,
    triangles: &PrimitiveSet,
    chunk_t: DataChunk,
    particles: &ParticleStore,
) {
    let next = particles.next_pos.data();
    for contact in contacts {
        let p = &points.primitives[contact.point as usize];
        let t = &triangles.primitives[contact.triangle as usize];
        let pi = chunk_p.start + p.vertices[0] as usize;
        let (t0, t1, t2) = (
            chunk_t.start + t.vertices[0] as usize,
            chunk_t.start + t.vertices[1] as usize,
            chunk_t.start + t.vertices[2] as usize,
        );
        let (cp, _) = closest_pt_point_triangle(next[pi], next[t0], next[t1], next[t2]);
        contact.enabled =
            (next[pi] - cp).length() < contact.thickness * SELF_COLLISION_MARGIN_RATIO;
    }
}

/// Context for one team's side of a contact.
#[derive(Debug, Clone, Copy)]
pub struct SolveSide<'a> {
    pub set: &'a PrimitiveSet,
    pub chunk: DataChunk,
    /// The team's `cloth_mass` parameter.
    pub cloth_mass: f32,
}

fn side_inverse_mass(particles: &ParticleStore, side: &SolveSide, global: usize, slot_fixed: bool) -> f32 {
    let friction = particles.friction.data()[global];
    self_collision_inverse_mass(friction, slot_fixed, side.cloth_mass)
}

/// One full separation solve over enabled contacts.
///
/// Scatters into `accumulate` and drains after every iteration, so later
/// iterations see the previous iteration's corrections.
pub fn solve(
    particles: &mut ParticleStore,
    edge_edge: &[EdgeEdgeContact],
    ee_sides: (&SolveSide, &SolveSide),
    point_triangle: &[PointTriangleContact],
    pt_sides: (&SolveSide, &SolveSide),
    accumulate: &AccumulateBuffer,
) {
    for _ in 0..SELF_COLLISION_SOLVER_ITERATIONS {
        let mut touched: Vec<usize> = Vec::new();
        {
            let next = particles.next_pos.data();
            for contact in edge_edge.iter().filter(|c| c.enabled) {
                solve_edge_edge(next, particles, contact, ee_sides, accumulate, &mut touched);
            }
            for contact in point_triangle.iter().filter(|c| c.enabled) {
                solve_point_triangle(next, particles, contact, pt_sides, accumulate, &mut touched);
            }
        }
        if touched.is_empty() {
            break;
        }
        drain(particles, &touched, accumulate);
    }
}

fn drain(particles: &mut ParticleStore, touched: &[usize], accumulate: &AccumulateBuffer) {
    let next = particles.next_pos.data_mut();
    let attribute = particles.attribute.data();
    for &i in touched {
        if accumulate.contribution_count(i) == 0 {
            continue;
        }
        let add = accumulate.take_average(i);
        if attribute[i].is_movable() {
            next[i] += add;
        }
    }
}

fn solve_edge_edge(
    next: &[Vec3],
    particles: &ParticleStore,
    contact: &EdgeEdgeContact,
    sides: (&SolveSide, &SolveSide),
    accumulate: &AccumulateBuffer,
    touched: &mut Vec<usize>,
) {
    let (side_a, side_b) = sides;
    let a = &side_a.set.primitives[contact.a as usize];
    let b = &side_b.set.primitives[contact.b as usize];
    let (a0, a1) = (
        side_a.chunk.start + a.vertices[0] as usize,
        side_a.chunk.start + a.vertices[1] as usize,
    );
    let (b0, b1) = (
        side_b.chunk.start + b.vertices[0] as usize,
        side_b.chunk.start + b.vertices[1] as usize,
    );

    let (s, t, c1, c2) = closest_pt_segment_segment(next[a0], next[a1], next[b0], next[b1]);
    let v = c1 - c2;
    let dist = v.length();
    if dist <= EPSILON || dist >= contact.thickness {
        return;
    }
    let n = v / dist;
    let c = contact.thickness - dist;

    let w = [
        side_inverse_mass(particles, side_a, a0, a.flags.fixed(0)),
        side_inverse_mass(particles, side_a, a1, a.flags.fixed(1)),
        side_inverse_mass(particles, side_b, b0, b.flags.fixed(0)),
        side_inverse_mass(particles, side_b, b1, b.flags.fixed(1)),
    ];
    let bary = [1.0 - s, s, 1.0 - t, t];
    let denom: f32 = (0..4).map(|k| w[k] * bary[k] * bary[k]).sum();
    if denom <= EPSILON {
        return;
    }
    let lambda = c / denom;

    accumulate.add(a0, n * (lambda * w[0] * bary[0]));
    accumulate.add(a1, n * (lambda * w[1] * bary[1]));
    accumulate.add(b0, n * (-lambda * w[2] * bary[2]));
    accumulate.add(b1, n * (-lambda * w[3] * bary[3]));
    touched.extend_from_slice(&[a0, a1, b0, b1]);
}

fn solve_point_triangle(
    next: &[Vec3],
    particles: &ParticleStore,
    contact: &PointTriangleContact,
    sides: (&SolveSide, &SolveSide),
    accumulate: &AccumulateBuffer,
    touched: &mut Vec<usize>,
) {
    let (side_p, side_t) = sides;
    let p = &side_p.set.primitives[contact.point as usize];
    let t = &side_t.set.primitives[contact.triangle as usize];
    let pi = side_p.chunk.start + p.vertices[0] as usize;
    let (t0, t1, t2) = (
        side_t.chunk.start + t.vertices[0] as usize,
        side_t.chunk.start + t.vertices[1] as usize,
        side_t.chunk.start + t.vertices[2] as usize,
    );

    let n = triangle_normal(next[t0], next[t1], next[t2]) * contact.sign;
    if n == Vec3::ZERO {
        return;
    }
    let (cp, uvw) = closest_pt_point_triangle(next[pi], next[t0], next[t1], next[t2]);
    // Signed separation along the admitted side; a point that crossed
    // over gets pushed back through.
    let signed = n.dot(next[pi] - cp);
    if signed >= contact.thickness {
        return;
    }
    let c = contact.thickness - signed;

    let w_p = side_inverse_mass(particles, side_p, pi, p.flags.fixed(0));
    let w_t = [
        side_inverse_mass(particles, side_t, t0, t.flags.fixed(0)),
        side_inverse_mass(particles, side_t, t1, t.flags.fixed(1)),
        side_inverse_mass(particles, side_t, t2, t.flags.fixed(2)),
    ];
    let denom = w_p
        + w_t[0] * uvw.x * uvw.x
        + w_t[1] * uvw.y * uvw.y
        + w_t[2] * uvw.z * uvw.z;
    if denom <= EPSILON {
        return;
    }
    let lambda = c / denom;

    accumulate.add(pi, n * (lambda * w_p));
    accumulate.add(t0, n * (-lambda * w_t[0] * uvw.x));
    accumulate.add(t1, n * (-lambda * w_t[1] * uvw.y));
    accumulate.add(t2, n * (-lambda * w_t[2] * uvw.z));
    touched.extend_from_slice(&[pi, t0, t1, t2]);
}
