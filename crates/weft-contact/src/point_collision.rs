//! Point-mode collider collision.
//!
//! Every movable particle is tested as a sphere against every collider of
//! its team. Push-outs from simultaneous colliders are averaged and damped
//! by the combined normal length, so a particle pinched between opposing
//! surfaces settles instead of oscillating. Friction ramps up inside one
//! particle radius of a surface and is max-merged.
//!
//! Each item writes only its own particle, so the pass is index-parallel
//! without aggregation.

use weft_arena::DataChunk;
use weft_math::Vec3;
use weft_solver::parameters::ClothParameters;
use weft_solver::ParticleStore;

use crate::collider::Collider;

/// One point-collision pass over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    params: &ClothParameters,
    scale_ratio: f32,
    colliders: &[&Collider],
) {
    let next = particles.next_pos.data_mut();
    let friction = particles.friction.data_mut();
    let collision_normal = particles.collision_normal.data_mut();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();

    let base_friction = params.collider_collision.friction;

    for i in chunk.range() {
        collision_normal[i] = Vec3::ZERO;
        if !attribute[i].is_movable() {
            continue;
        }
        let radius = params
            .collider_collision
            .radius
            .evaluate_clamped(depth[i], 0.0, 1.0)
            * scale_ratio;
        if radius <= 0.0 {
            continue;
        }

        let mut offset_sum = Vec3::ZERO;
        let mut normal_sum = Vec3::ZERO;
        let mut count = 0u32;
        let mut friction_peak = 0.0f32;

        for collider in colliders {
            let (dist, normal) = collider.point_distance(next[i], radius);
            if dist < 0.0 {
                offset_sum += normal * -dist;
                normal_sum += normal;
                count += 1;
            }
            // Friction range is one particle radius beyond the surface.
            if dist < radius {
                let falloff = 1.0 - (dist / radius).clamp(0.0, 1.0);
                friction_peak = friction_peak.max(base_friction * falloff);
            }
        }

        if count > 0 {
            // Opposing normals cancel and damp the push-out.
            let damp = (normal_sum.length() / count as f32).clamp(0.0, 1.0);
            next[i] += offset_sum / count as f32 * damp;
            collision_normal[i] = normal_sum.normalize_or_zero();
        }
        friction[i] = friction[i].max(friction_peak);
    }
}
