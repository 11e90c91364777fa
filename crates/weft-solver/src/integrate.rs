//! Step integration: the begin and end phases around the constraint chain.
//!
//! Begin: refresh the base pose from the interpolated team transform,
//! carry world movement into particle state through the inertia deltas,
//! damp and accelerate velocities (gravity, wind), and predict `next_pos`.
//!
//! End: resolve static friction against the accumulated collision normal,
//! derive the new velocity from the solved positions, apply dynamic
//! friction, speed limits and the centrifugal boost, and commit.

use weft_arena::DataChunk;
use weft_math::queries::project_on_plane;
use weft_math::Vec3;
use weft_types::constants::{
    COLLIDER_DYNAMIC_FRICTION_RATIO, COLLIDER_STATIC_FRICTION_RATIO, EPSILON,
    FRICTION_DAMPING_RATE, GRAVITY, MAX_REAL_STEP_DISPLACEMENT,
};

use crate::parameters::{ClothParameters, WindParams};
use crate::particle::ParticleStore;
use crate::team::TeamData;

/// Global wind field sampled by every team.
#[derive(Debug, Clone, Copy)]
pub struct WindField {
    /// Blowing direction (need not be normalized).
    pub direction: Vec3,
    /// Base speed (m/s). Zero disables wind.
    pub speed: f32,
}

impl Default for WindField {
    fn default() -> Self {
        WindField {
            direction: Vec3::X,
            speed: 0.0,
        }
    }
}

/// Gusty wind acceleration for one particle.
fn wind_force(
    field: &WindField,
    params: &WindParams,
    depth: f32,
    friction: f32,
    time: f32,
) -> Vec3 {
    if field.speed <= 0.0 || params.influence <= 0.0 {
        return Vec3::ZERO;
    }
    let Some(dir) = field.direction.try_normalize() else {
        return Vec3::ZERO;
    };
    // Two offset sines approximate gusting without a noise table.
    let w = time * params.frequency * std::f32::consts::TAU;
    let gust = 1.0 + 0.3 * w.sin() + 0.15 * (w * 2.3 + 1.7).sin();
    let depth_gain = 1.0 + (depth * depth - 1.0) * params.depth_weight;
    let influence = params.influence * (1.0 - friction.clamp(0.0, 1.0)) * depth_gain;
    dir * (field.speed * gust * influence)
}

/// Begin-of-step phase for one team.
#[allow(clippy::too_many_arguments)]
pub fn begin_step(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    team: &TeamData,
    params: &ClothParameters,
    wind: &WindField,
    dt: f32,
    sim_time: f32,
) {
    let base = chunk.start;
    let center = &team.center;
    let scale = team.frame_scale;
    let scale_ratio = team.scale_ratio();
    let gravity_dir = params.gravity.direction.normalize_or_zero();

    let next = particles.next_pos.data_mut();
    let old = particles.old_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let velocity = particles.velocity.data_mut();
    let base_pos = particles.base_pos.data_mut();
    let base_rot = particles.base_rot.data_mut();
    let local_pos = particles.local_pos.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();
    let friction = particles.friction.data();

    for li in 0..chunk.len {
        let i = base + li;
        let attr = attribute[i];
        if attr.is_invalid() {
            continue;
        }

        // Animated base pose from the interpolated step transform.
        base_pos[i] = center.now_position + center.now_rotation * (local_pos[i] * scale);
        base_rot[i] = center.now_rotation;

        if attr.is_fixed() {
            next[i] = base_pos[i];
            old[i] = base_pos[i];
            velocity_pos[i] = base_pos[i];
            velocity[i] = Vec3::ZERO;
            continue;
        }

        // Carry world movement through the reduced inertia deltas.
        let (offset, rotation) = center.particle_inertia(&params.inertia, depth[i]);
        let lpos = old[i] - center.old_position;
        let wpos = center.old_position + rotation * lpos + offset;
        old[i] = wpos;
        velocity_pos[i] = wpos;
        velocity[i] = rotation * velocity[i];

        // Damping, then external forces.
        let damp = params.damping.damping.evaluate_clamped(depth[i], 0.0, 1.0);
        velocity[i] *= 1.0 - damp;

        let mut force = gravity_dir * (GRAVITY * params.gravity.ratio);
        force += wind_force(wind, &params.wind, depth[i], friction[i], sim_time);
        force *= scale_ratio;

        velocity[i] += force * dt;
        next[i] = wpos + velocity[i] * dt;
    }
}

/// End-of-step phase for one team.
pub fn end_step(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    team: &TeamData,
    params: &ClothParameters,
    dt: f32,
) {
    if dt <= EPSILON {
        return;
    }
    let center = &team.center;
    let scale_ratio = team.scale_ratio();

    let next = particles.next_pos.data_mut();
    let old = particles.old_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let velocity = particles.velocity.data_mut();
    let real_velocity = particles.real_velocity.data_mut();
    let friction = particles.friction.data_mut();
    let static_friction = particles.static_friction.data_mut();
    let collision_normal = particles.collision_normal.data();
    let attribute = particles.attribute.data();
    let depth = particles.depth.data();

    let static_threshold = params.collider_collision.friction * COLLIDER_STATIC_FRICTION_RATIO;

    for i in chunk.range() {
        let attr = attribute[i];
        if attr.is_invalid() {
            continue;
        }
        if attr.is_fixed() {
            real_velocity[i] = Vec3::ZERO;
            old[i] = next[i];
            continue;
        }

        let cn = collision_normal[i];
        let in_contact = cn.length_squared() > EPSILON;

        // Static friction: bleed off tangential creep while in contact.
        if in_contact && friction[i] > 0.0 && static_threshold > 0.0 {
            let disp = next[i] - velocity_pos[i];
            let tangential = project_on_plane(disp, cn);
            let tangent_speed = tangential.length() / dt;
            if tangent_speed < static_threshold {
                static_friction[i] = (static_friction[i] + 0.04).min(1.0);
            } else {
                let drop = ((tangent_speed - static_threshold) / 0.2).max(0.05);
                static_friction[i] = (static_friction[i] - drop).max(0.0);
            }
            let hold = tangential * static_friction[i];
            next[i] -= hold;
            velocity_pos[i] -= hold;
        } else {
            static_friction[i] = (static_friction[i] - 0.05).max(0.0);
        }

        // Velocity from the solved displacement.
        velocity[i] = (next[i] - velocity_pos[i]) / dt;

        // Dynamic friction scaled by how head-on the contact is.
        if in_contact && velocity[i].length_squared() > EPSILON {
            let align = cn.dot(velocity[i].normalize());
            let t = 0.5 + 0.5 * align;
            let grip = 1.0 - t * t;
            let strength =
                (friction[i] * COLLIDER_DYNAMIC_FRICTION_RATIO).clamp(0.0, 1.0);
            velocity[i] -= velocity[i] * (grip * strength);
        }
        friction[i] *= FRICTION_DAMPING_RATE;

        // Particle speed limit.
        if let Some(limit) = params.inertia.particle_speed_limit.value() {
            let max = limit * scale_ratio;
            if velocity[i].length() > max {
                velocity[i] = velocity[i].normalize() * max;
            }
        }

        // Centrifugal boost while the team spins.
        if params.inertia.centrifugal_acceleration > 0.0 && center.angular_velocity > EPSILON {
            let arm = project_on_plane(next[i] - center.now_position, center.rotation_axis);
            let radius = arm.length();
            if radius > EPSILON {
                let n = arm / radius;
                let mass = 1.0 + (1.0 - depth[i]);
                let mut f = mass * center.angular_velocity * center.angular_velocity * radius;
                if velocity[i].length_squared() > EPSILON {
                    let tangent = center.rotation_axis.cross(n).normalize_or_zero();
                    f *= velocity[i].normalize().dot(tangent).clamp(0.0, 1.0);
                }
                velocity[i] += n * (f * params.inertia.centrifugal_acceleration * 0.02);
            }
        }

        // Commit the solved prediction unchanged. Only the reported
        // velocity sees a clamped displacement, so one bad step cannot
        // inject a huge inertia carry into the next.
        let mut disp = next[i] - old[i];
        let max_disp = MAX_REAL_STEP_DISPLACEMENT * scale_ratio;
        if disp.length() > max_disp {
            disp = disp.normalize() * max_disp;
        }
        real_velocity[i] = disp / dt;
        old[i] = next[i];
    }
}
