//! Motion constraint: movement range around the animated base pose.
//!
//! Two independent limits. The max-distance clamp keeps each particle
//! inside a depth-tuned sphere around its base position. The backstop is
//! a large sphere placed behind the surface along the inverted base
//! normal; particles cannot sink into it, which approximates the body the
//! cloth is dressed on without any collider setup.

use weft_arena::DataChunk;
use weft_types::constants::EPSILON;

use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

const MOTION_VELOCITY_ATTENUATION: f32 = 0.95;

/// One motion pass over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    params: &ClothParameters,
    scale_ratio: f32,
) {
    if !params.motion.use_max_distance && !params.motion.use_backstop {
        return;
    }

    let next = particles.next_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let base_pos = particles.base_pos.data();
    let base_rot = particles.base_rot.data();
    let local_normal = particles.local_normal.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();

    let stiffness = params.motion.stiffness.clamp(0.0, 1.0);

    for i in chunk.range() {
        if !attribute[i].is_movable() || !attribute[i].uses_motion() {
            continue;
        }
        let mut corr = weft_math::Vec3::ZERO;

        if params.motion.use_max_distance {
            let radius = params
                .motion
                .max_distance
                .evaluate_clamped(depth[i], 0.0, f32::MAX)
                * scale_ratio;
            let v = next[i] - base_pos[i];
            let dist = v.length();
            if dist > radius && dist > EPSILON {
                corr += v * (radius / dist) - v;
            }
        }

        if params.motion.use_backstop {
            let normal = base_rot[i] * local_normal[i];
            if normal.length_squared() > EPSILON {
                let radius = params.motion.backstop_radius * scale_ratio;
                let center = base_pos[i]
                    - normal * (params.motion.backstop_distance * scale_ratio + radius);
                let v = (next[i] + corr) - center;
                let dist = v.length();
                if dist < radius && dist > EPSILON {
                    corr += v * (radius / dist) - v;
                }
            }
        }

        if corr.length_squared() > EPSILON {
            let add = corr * stiffness;
            next[i] += add;
            velocity_pos[i] += add * MOTION_VELOCITY_ATTENUATION;
        }
    }
}
