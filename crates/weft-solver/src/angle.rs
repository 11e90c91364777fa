//! Angle constraint: limits and restores the bend between parent-child
//! links along baseline chains.
//!
//! Works on the hierarchy, not the surface: each baseline is one root's
//! subtree in parent-before-child order, so corrections propagate from
//! the anchor outward within a single pass. The solve runs a fixed small
//! number of iterations; the restoration stiffness is deliberately weak
//! in the first iteration and strengthens across iterations, which keeps
//! fast motion from visibly snapping back.
//!
//! Baselines are disjoint vertex sets, so the stage parallelizes over
//! baselines without write conflicts.

use weft_arena::DataChunk;
use weft_math::queries::from_to_rotation;
use weft_mesh::VertexHierarchy;
use weft_types::constants::{ANGLE_LIMIT_ATTENUATION, ANGLE_LIMIT_ITERATIONS, EPSILON};

use crate::mass::inverse_mass;
use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// Rotation pivot bias toward the parent when clamping.
const LIMIT_ROTATION_RATIO: f32 = 0.4;

/// Restoration stiffness ramp across iterations.
const RESTORATION_STIFFNESS_RANGE: (f32, f32) = (0.1, 0.5);

/// Full angle solve (all iterations) over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    hierarchy: &VertexHierarchy,
    params: &ClothParameters,
) {
    if !params.angle.use_limit && !params.angle.use_restoration {
        return;
    }

    let iterations = ANGLE_LIMIT_ITERATIONS;
    for iteration in 0..iterations {
        let ramp = if iterations > 1 {
            iteration as f32 / (iterations - 1) as f32
        } else {
            1.0
        };
        let restoration_base = RESTORATION_STIFFNESS_RANGE.0
            + (RESTORATION_STIFFNESS_RANGE.1 - RESTORATION_STIFFNESS_RANGE.0) * ramp;

        for baseline in &hierarchy.baselines {
            solve_baseline(
                particles,
                chunk,
                hierarchy,
                params,
                &baseline.vertices,
                restoration_base,
            );
        }
    }
}

fn solve_baseline(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    hierarchy: &VertexHierarchy,
    params: &ClothParameters,
    vertices: &[u32],
    restoration_base: f32,
) {
    let base = chunk.start;
    let next = particles.next_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let base_pos = particles.base_pos.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();
    let friction = particles.friction.data();
    let gravity_dir = params.gravity.direction.normalize_or_zero();

    for &lv in vertices {
        let c = base + lv as usize;
        let Some(parent) = hierarchy.parents[lv as usize] else {
            continue;
        };
        let p = base + parent as usize;
        if !attribute[c].is_movable() {
            continue;
        }

        let base_vec = base_pos[c] - base_pos[p];
        let base_len = base_vec.length();
        if base_len <= EPSILON {
            continue;
        }
        let base_dir = base_vec / base_len;

        let w_c = inverse_mass(depth[c], friction[c]);
        let w_p = if attribute[p].is_movable() {
            inverse_mass(depth[p], friction[p])
        } else {
            0.0
        };
        let w_sum = w_c + w_p;
        if w_sum <= EPSILON {
            continue;
        }

        // Soft restoration toward the base direction.
        if params.angle.use_restoration {
            let cur = next[c] - next[p];
            let len = cur.length();
            if len > EPSILON {
                let dir = cur / len;
                let stiffness = restoration_base
                    * params
                        .angle
                        .restoration_stiffness
                        .evaluate_clamped(depth[c], 0.0, 1.0);
                // Restoration weakens when the base direction already
                // points down gravity; hanging cloth should not fight it.
                let falloff = 1.0
                    - params.angle.gravity_falloff * base_dir.dot(gravity_dir).clamp(0.0, 1.0);
                let t = (stiffness * falloff).clamp(0.0, 1.0);
                if t > 0.0 {
                    let rotated = from_to_rotation(dir, base_dir, t) * dir;
                    let corr = (next[p] + rotated * len) - next[c];
                    apply_pair(
                        next,
                        velocity_pos,
                        c,
                        p,
                        corr,
                        w_c / w_sum,
                        w_p / w_sum,
                    );
                }
            }
        }

        // Hard clamp on the deviation angle.
        if params.angle.use_limit {
            let cur = next[c] - next[p];
            let len = cur.length();
            if len <= EPSILON {
                continue;
            }
            let dir = cur / len;
            let limit = params
                .angle
                .limit_angle
                .evaluate_clamped(depth[c], 0.0, 179.0)
                .to_radians();
            let angle = dir.dot(base_dir).clamp(-1.0, 1.0).acos();
            if angle > limit {
                let t = ((angle - limit) / angle) * params.angle.limit_stiffness;
                let rotated = from_to_rotation(dir, base_dir, t.clamp(0.0, 1.0)) * dir;
                let corr = (next[p] + rotated * len) - next[c];
                // The parent takes a reduced share of the clamp so the
                // chain bends back instead of whipping at the child.
                let share_p = (w_p / w_sum) * LIMIT_ROTATION_RATIO;
                apply_pair(next, velocity_pos, c, p, corr, w_c / w_sum, share_p);
            }
        }
    }
}

fn apply_pair(
    next: &mut [weft_math::Vec3],
    velocity_pos: &mut [weft_math::Vec3],
    c: usize,
    p: usize,
    corr: weft_math::Vec3,
    share_c: f32,
    share_p: f32,
) {
    let add_c = corr * share_c;
    next[c] += add_c;
    velocity_pos[c] += add_c * ANGLE_LIMIT_ATTENUATION;
    if share_p > 0.0 {
        let add_p = -corr * share_p;
        next[p] += add_p;
        velocity_pos[p] += add_p * ANGLE_LIMIT_ATTENUATION;
    }
}
