//! Inertia constraint: how world movement of the team transform carries
//! into the simulation.
//!
//! The team center tracks the interpolated step transform. Each step it
//! derives the pure movement/rotation delta, applies the configured speed
//! limits (a fast-moving character should not slingshot its cloth), and
//! reduces the delta by the inertia parameters. The reduced delta shifts
//! particle state at the start of the step; the angular velocity feeds
//! the centrifugal term at the end of it.

use weft_math::{Quat, Vec3};
use weft_mesh::ClothTopology;
use weft_types::constants::EPSILON;

use crate::parameters::InertiaParams;

/// Per-team center state for the inertia constraint.
#[derive(Debug, Clone)]
pub struct CenterData {
    /// Interpolated step transform of this step.
    pub now_position: Vec3,
    pub now_rotation: Quat,
    /// Interpolated step transform of the previous step.
    pub old_position: Vec3,
    pub old_rotation: Quat,
    /// Pure (unreduced) movement of this step.
    pub step_vector: Vec3,
    /// Pure (unreduced) rotation of this step.
    pub step_rotation: Quat,
    /// Movement shift applied to particles after inertia reduction.
    pub inertia_offset: Vec3,
    /// Rotation applied to particles after inertia reduction.
    pub inertia_rotation: Quat,
    /// Team angular velocity this step (rad/s).
    pub angular_velocity: f32,
    /// Axis of the team rotation this step.
    pub rotation_axis: Vec3,
    /// Gravity direction in team-local space at registration.
    pub init_local_gravity: Vec3,
}

impl CenterData {
    /// Center state at registration.
    pub fn new(_topology: &ClothTopology, position: Vec3, rotation: Quat) -> Self {
        CenterData {
            now_position: position,
            now_rotation: rotation,
            old_position: position,
            old_rotation: rotation,
            step_vector: Vec3::ZERO,
            step_rotation: Quat::IDENTITY,
            inertia_offset: Vec3::ZERO,
            inertia_rotation: Quat::IDENTITY,
            angular_velocity: 0.0,
            rotation_axis: Vec3::Y,
            init_local_gravity: rotation.inverse() * Vec3::NEG_Y,
        }
    }

    /// Snap the center to a new transform without generating movement.
    pub fn teleport(&mut self, position: Vec3, rotation: Quat) {
        self.now_position = position;
        self.now_rotation = rotation;
        self.old_position = position;
        self.old_rotation = rotation;
        self.step_vector = Vec3::ZERO;
        self.step_rotation = Quat::IDENTITY;
        self.inertia_offset = Vec3::ZERO;
        self.inertia_rotation = Quat::IDENTITY;
        self.angular_velocity = 0.0;
    }

    /// Advance the center toward the interpolated frame target and derive
    /// the reduced inertia deltas for this step.
    pub fn update_step(
        &mut self,
        target_position: Vec3,
        target_rotation: Quat,
        params: &InertiaParams,
        dt: f32,
    ) {
        self.old_position = self.now_position;
        self.old_rotation = self.now_rotation;

        // Movement, speed limited.
        let mut diff = target_position - self.old_position;
        if let Some(limit) = params.movement_speed_limit.value() {
            let max = limit * dt;
            if diff.length() > max {
                diff = diff.normalize() * max;
            }
        }
        self.now_position = self.old_position + diff;

        // Rotation, speed limited.
        let mut delta = (target_rotation * self.old_rotation.inverse()).normalize();
        let (axis, mut angle) = delta.to_axis_angle();
        // to_axis_angle can return angles above pi; keep the short way.
        if angle > std::f32::consts::PI {
            angle -= std::f32::consts::TAU;
        }
        if let Some(limit) = params.rotation_speed_limit.value() {
            let max = limit.to_radians() * dt;
            if angle.abs() > max {
                angle = angle.signum() * max;
                delta = Quat::from_axis_angle(axis, angle);
            }
        }
        self.now_rotation = (delta * self.old_rotation).normalize();

        self.step_vector = self.now_position - self.old_position;
        self.step_rotation = delta;
        self.angular_velocity = if dt > EPSILON { angle.abs() / dt } else { 0.0 };
        self.rotation_axis = if axis.length_squared() > EPSILON {
            axis.normalize()
        } else {
            Vec3::Y
        };

        // Inertia reduction: 1.0 means the cloth follows the transform
        // perfectly, 0.0 means the world movement is fully felt.
        self.inertia_offset = self.step_vector * params.movement_inertia;
        self.inertia_rotation =
            Quat::IDENTITY.slerp(self.step_rotation, params.rotation_inertia).normalize();
    }

    /// Per-particle inertia deltas, blended toward the pure step deltas by
    /// the depth-inertia parameter.
    pub fn particle_inertia(&self, params: &InertiaParams, depth: f32) -> (Vec3, Quat) {
        let blend = params.depth_inertia * (1.0 - depth * depth);
        let offset = self.inertia_offset.lerp(self.step_vector, blend);
        let rotation = self.inertia_rotation.slerp(self.step_rotation, blend).normalize();
        (offset, rotation)
    }
}
