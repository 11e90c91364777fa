//! Edge-mode collider collision.
//!
//! Topology edges are tested as capsules against the team's colliders.
//! Two overlapping edges may correct the same particle, so corrections,
//! contact normals, and friction all route through the atomic buffers and
//! a single-writer drain applies them per particle.

use weft_arena::{AccumulateBuffer, AtomicMaxBuffer, DataChunk};
use weft_math::Vec3;
use weft_mesh::ClothTopology;
use weft_solver::parameters::ClothParameters;
use weft_solver::ParticleStore;

use crate::collider::Collider;

/// Scatter one edge-collision pass into the shared buffers.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    particles: &ParticleStore,
    chunk: DataChunk,
    topology: &ClothTopology,
    params: &ClothParameters,
    scale_ratio: f32,
    colliders: &[&Collider],
    accumulate: &AccumulateBuffer,
    friction_max: &AtomicMaxBuffer,
    normal_sum: &AccumulateBuffer,
) {
    let base = chunk.start;
    let next = particles.next_pos.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();

    let base_friction = params.collider_collision.friction;

    for edge in &topology.edges {
        let ia = base + edge[0] as usize;
        let ib = base + edge[1] as usize;
        let movable_a = attribute[ia].is_movable();
        let movable_b = attribute[ib].is_movable();
        if !movable_a && !movable_b {
            continue;
        }

        let radius = {
            let ra = params
                .collider_collision
                .radius
                .evaluate_clamped(depth[ia], 0.0, 1.0);
            let rb = params
                .collider_collision
                .radius
                .evaluate_clamped(depth[ib], 0.0, 1.0);
            (ra + rb) * 0.5 * scale_ratio
        };
        if radius <= 0.0 {
            continue;
        }

        for collider in colliders {
            let (dist, normal, s) = collider.segment_distance(next[ia], next[ib], radius);
            if dist < 0.0 {
                let push = normal * -dist;
                accumulate.add(ia, push * (1.0 - s));
                accumulate.add(ib, push * s);
                normal_sum.add_sum(ia, normal * (1.0 - s));
                normal_sum.add_sum(ib, normal * s);
            }
            if dist < radius {
                let falloff = 1.0 - (dist / radius).clamp(0.0, 1.0);
                let f = base_friction * falloff;
                friction_max.merge_max(ia, f);
                friction_max.merge_max(ib, f);
            }
        }
    }
}

/// Drain the shared buffers into particle state.
pub fn aggregate(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    accumulate: &AccumulateBuffer,
    friction_max: &AtomicMaxBuffer,
    normal_sum: &AccumulateBuffer,
) {
    let next = particles.next_pos.data_mut();
    let friction = particles.friction.data_mut();
    let collision_normal = particles.collision_normal.data_mut();
    let attribute = particles.attribute.data();

    for i in chunk.range() {
        collision_normal[i] = Vec3::ZERO;
        let touched = accumulate.contribution_count(i) > 0;
        if touched {
            let add = accumulate.take_average(i);
            if attribute[i].is_movable() {
                next[i] += add;
            }
            collision_normal[i] = normal_sum.take_sum(i).normalize_or_zero();
        }
        let f = friction_max.take(i);
        if f > 0.0 {
            friction[i] = friction[i].max(f);
        }
    }
}
