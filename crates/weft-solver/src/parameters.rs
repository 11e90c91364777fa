//! Per-cloth simulation parameters.
//!
//! One sub-struct per constraint type, all serde-serializable so hosts can
//! keep cloth tuning in data files. Defaults are the calibrated values the
//! pipeline ships with; [`ClothParameters::validate`] catches out-of-range
//! input at registration time.

use serde::{Deserialize, Serialize};

use weft_math::{CurveData, Vec3};
use weft_types::constants::{
    MAX_ANGLE_LIMIT_DEG, MAX_MOVEMENT_SPEED_LIMIT, MAX_PARTICLE_SPEED_LIMIT,
    MAX_ROTATION_SPEED_LIMIT, SELF_COLLISION_THICKNESS_RANGE,
};
use weft_types::{WeftError, WeftResult};

/// Distance constraint tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceParams {
    /// Stiffness over depth, `[0, 1]`.
    pub stiffness: CurveData,
}

impl Default for DistanceParams {
    fn default() -> Self {
        DistanceParams {
            stiffness: CurveData::constant(1.0),
        }
    }
}

/// Tether constraint tuning. A limit of zero disables the corresponding
/// direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetherParams {
    /// Allowed compression below the rest root distance, as a ratio.
    pub compression: f32,
    /// Allowed stretch above the rest root distance, as a ratio.
    pub stretch: f32,
}

impl Default for TetherParams {
    fn default() -> Self {
        TetherParams {
            compression: 1.0,
            stretch: 0.03,
        }
    }
}

/// Angle limit / restoration tuning for baseline chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngleParams {
    /// Enable the hard angle limit.
    pub use_limit: bool,
    /// Maximum deviation from the base direction over depth (degrees).
    pub limit_angle: CurveData,
    /// Limit stiffness, `[0, 1]`.
    pub limit_stiffness: f32,
    /// Enable the soft restoration toward the base pose.
    pub use_restoration: bool,
    /// Restoration stiffness over depth, `[0, 1]`.
    pub restoration_stiffness: CurveData,
    /// How strongly gravity alignment weakens restoration, `[0, 1]`.
    pub gravity_falloff: f32,
}

impl Default for AngleParams {
    fn default() -> Self {
        AngleParams {
            use_limit: false,
            limit_angle: CurveData::constant(60.0),
            limit_stiffness: 1.0,
            use_restoration: true,
            restoration_stiffness: CurveData::constant(0.1),
            gravity_falloff: 0.0,
        }
    }
}

/// Triangle bending tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendingParams {
    /// Stiffness over depth, `[0, 1]`.
    pub stiffness: CurveData,
}

impl Default for BendingParams {
    fn default() -> Self {
        BendingParams {
            stiffness: CurveData::constant(0.5),
        }
    }
}

/// Movement-range limits around the animated base pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionParams {
    /// Enable the max-distance sphere clamp.
    pub use_max_distance: bool,
    /// Clamp radius over depth (m).
    pub max_distance: CurveData,
    /// Enable the backstop sphere behind the surface.
    pub use_backstop: bool,
    /// Backstop sphere radius (m).
    pub backstop_radius: f32,
    /// Backstop sphere center distance behind the surface (m).
    pub backstop_distance: f32,
    /// Final correction stiffness, `[0, 1]`.
    pub stiffness: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        MotionParams {
            use_max_distance: false,
            max_distance: CurveData::constant(0.3),
            use_backstop: false,
            backstop_radius: 1.0,
            backstop_distance: 0.0,
            stiffness: 1.0,
        }
    }
}

/// An optional speed cap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpeedLimit {
    pub enabled: bool,
    pub limit: f32,
}

impl SpeedLimit {
    pub fn new(enabled: bool, limit: f32) -> Self {
        SpeedLimit { enabled, limit }
    }

    /// The effective cap, or `None` when disabled.
    pub fn value(&self) -> Option<f32> {
        self.enabled.then_some(self.limit)
    }
}

/// World-movement response tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InertiaParams {
    /// How much world translation carries into the simulation, `[0, 1]`.
    /// 1 means the cloth keeps up with the transform perfectly.
    pub movement_inertia: f32,
    /// How much world rotation carries into the simulation, `[0, 1]`.
    pub rotation_inertia: f32,
    /// Blends inertia shift back in toward the free end, `[0, 1]`.
    pub depth_inertia: f32,
    /// Centrifugal force scale during team rotation, `[0, 1]`.
    pub centrifugal_acceleration: f32,
    /// Cap on perceived team movement speed (m/s).
    pub movement_speed_limit: SpeedLimit,
    /// Cap on perceived team rotation speed (deg/s).
    pub rotation_speed_limit: SpeedLimit,
    /// Cap on individual particle speed (m/s).
    pub particle_speed_limit: SpeedLimit,
}

impl Default for InertiaParams {
    fn default() -> Self {
        InertiaParams {
            movement_inertia: 1.0,
            rotation_inertia: 1.0,
            depth_inertia: 0.0,
            centrifugal_acceleration: 0.0,
            movement_speed_limit: SpeedLimit::new(true, 5.0),
            rotation_speed_limit: SpeedLimit::new(true, 720.0),
            particle_speed_limit: SpeedLimit::new(true, 4.0),
        }
    }
}

/// Soft offset-limit for rigidly driven points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringParams {
    pub use_spring: bool,
    /// Pull-back strength toward the base position, `[0, 1]`.
    pub strength: f32,
    /// Allowed displacement radius from the base position (m).
    pub distance: f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        SpringParams {
            use_spring: false,
            strength: 0.1,
            distance: 0.05,
        }
    }
}

/// Collider collision mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderMode {
    /// No collider collision.
    None,
    /// Particles collide as spheres.
    Point,
    /// Topology edges collide as capsules.
    Edge,
}

/// Collider collision tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderCollisionParams {
    pub mode: ColliderMode,
    /// Particle collision radius over depth (m).
    pub radius: CurveData,
    /// Contact friction, `[0, 0.3]`.
    pub friction: f32,
}

impl Default for ColliderCollisionParams {
    fn default() -> Self {
        ColliderCollisionParams {
            mode: ColliderMode::Point,
            radius: CurveData::constant(0.02),
            friction: 0.05,
        }
    }
}

/// Self-collision mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfCollisionMode {
    /// No self collision.
    None,
    /// Full point/edge/triangle self collision.
    FullMesh,
}

/// Self-collision tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfCollisionParams {
    /// Collision within this cloth.
    pub self_mode: SelfCollisionMode,
    /// Collision against the sync partner cloth.
    pub sync_mode: SelfCollisionMode,
    /// Surface thickness over depth (m).
    pub surface_thickness: CurveData,
    /// Relative particle weight for mutual collision, `[0, 1]`.
    pub cloth_mass: f32,
}

impl Default for SelfCollisionParams {
    fn default() -> Self {
        SelfCollisionParams {
            self_mode: SelfCollisionMode::None,
            sync_mode: SelfCollisionMode::None,
            surface_thickness: CurveData::constant(0.005),
            cloth_mass: 0.0,
        }
    }
}

/// Wind response tuning. The wind field itself lives on the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindParams {
    /// Wind influence, `[0, 2]`. Zero disables wind for this cloth.
    pub influence: f32,
    /// Oscillation frequency (Hz).
    pub frequency: f32,
    /// How much depth amplifies wind toward the free end, `[0, 1]`.
    pub depth_weight: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        WindParams {
            influence: 0.0,
            frequency: 1.0,
            depth_weight: 0.0,
        }
    }
}

/// What happens to particle state when a team transform jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeleportMode {
    /// Snap every particle back to its base pose.
    Reset,
    /// Re-express particle state in the new frame, keeping the drape.
    Keep,
}

/// Teleport handling policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleportPolicy {
    pub mode: TeleportMode,
    /// Blend toward the carried-over state, `[0, 1]`. Only used by `Keep`.
    pub blend: f32,
}

impl Default for TeleportPolicy {
    fn default() -> Self {
        TeleportPolicy {
            mode: TeleportMode::Keep,
            blend: 1.0,
        }
    }
}

/// Full tuning set for one cloth instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClothParameters {
    pub gravity: GravityParams,
    /// Velocity damping over depth, `[0, 1]`.
    pub damping: DampingParams,
    pub distance: DistanceParams,
    pub tether: TetherParams,
    pub angle: AngleParams,
    pub bending: BendingParams,
    pub motion: MotionParams,
    pub inertia: InertiaParams,
    pub spring: SpringParams,
    pub collider_collision: ColliderCollisionParams,
    pub self_collision: SelfCollisionParams,
    pub wind: WindParams,
    pub teleport: TeleportPolicy,
}

/// Gravity tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityParams {
    /// World gravity direction (normalized).
    pub direction: Vec3,
    /// Gravity scale, `[0, 1]`.
    pub ratio: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        GravityParams {
            direction: Vec3::NEG_Y,
            ratio: 1.0,
        }
    }
}

/// Damping tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DampingParams {
    /// Velocity attenuation per step over depth, `[0, 1]`.
    pub damping: CurveData,
}

impl Default for DampingParams {
    fn default() -> Self {
        DampingParams {
            damping: CurveData::constant(0.05),
        }
    }
}

impl ClothParameters {
    /// Validate parameter ranges.
    pub fn validate(&self) -> WeftResult<()> {
        fn check(name: &str, v: f32, min: f32, max: f32) -> WeftResult<()> {
            if !(min..=max).contains(&v) || !v.is_finite() {
                return Err(WeftError::InvalidConfig(format!(
                    "{} = {} outside [{}, {}]",
                    name, v, min, max
                )));
            }
            Ok(())
        }

        check("gravity.ratio", self.gravity.ratio, 0.0, 1.0)?;
        if self.gravity.direction.length_squared() < f32::EPSILON {
            return Err(WeftError::InvalidConfig(
                "gravity.direction must be non-zero".into(),
            ));
        }
        check("tether.compression", self.tether.compression, 0.0, 1.0)?;
        check("tether.stretch", self.tether.stretch, 0.0, 1.0)?;
        check(
            "angle.limit_angle",
            self.angle.limit_angle.evaluate(1.0),
            0.0,
            MAX_ANGLE_LIMIT_DEG,
        )?;
        check("angle.limit_stiffness", self.angle.limit_stiffness, 0.0, 1.0)?;
        check("motion.stiffness", self.motion.stiffness, 0.0, 1.0)?;
        check(
            "inertia.movement_inertia",
            self.inertia.movement_inertia,
            0.0,
            1.0,
        )?;
        check(
            "inertia.rotation_inertia",
            self.inertia.rotation_inertia,
            0.0,
            1.0,
        )?;
        check("inertia.depth_inertia", self.inertia.depth_inertia, 0.0, 1.0)?;
        check(
            "inertia.movement_speed_limit",
            self.inertia.movement_speed_limit.limit,
            0.0,
            MAX_MOVEMENT_SPEED_LIMIT,
        )?;
        check(
            "inertia.rotation_speed_limit",
            self.inertia.rotation_speed_limit.limit,
            0.0,
            MAX_ROTATION_SPEED_LIMIT,
        )?;
        check(
            "inertia.particle_speed_limit",
            self.inertia.particle_speed_limit.limit,
            0.0,
            MAX_PARTICLE_SPEED_LIMIT,
        )?;
        check(
            "collider_collision.friction",
            self.collider_collision.friction,
            0.0,
            0.3,
        )?;
        check("self_collision.cloth_mass", self.self_collision.cloth_mass, 0.0, 1.0)?;
        let (t_min, t_max) = SELF_COLLISION_THICKNESS_RANGE;
        for t in [
            self.self_collision.surface_thickness.evaluate(0.0),
            self.self_collision.surface_thickness.evaluate(1.0),
        ] {
            check("self_collision.surface_thickness", t, t_min, t_max)?;
        }
        check("wind.influence", self.wind.influence, 0.0, 2.0)?;
        check("teleport.blend", self.teleport.blend, 0.0, 1.0)?;
        Ok(())
    }

    /// Preset for a dense draping cloth: stiff structure, soft bending,
    /// full self collision.
    pub fn draping_cloth() -> Self {
        ClothParameters {
            self_collision: SelfCollisionParams {
                self_mode: SelfCollisionMode::FullMesh,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Preset for hair-like chains: angle limits on, no self collision.
    pub fn swaying_chain() -> Self {
        ClothParameters {
            angle: AngleParams {
                use_limit: true,
                limit_angle: CurveData::linear(30.0, 90.0),
                ..Default::default()
            },
            collider_collision: ColliderCollisionParams {
                mode: ColliderMode::None,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
