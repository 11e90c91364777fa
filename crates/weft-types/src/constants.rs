//! Engine-wide tuning constants.
//!
//! Values here are the calibrated defaults of the simulation pipeline.
//! Per-cloth knobs live in `ClothParameters`; these are the fixed numbers
//! the solvers themselves are tuned around.

use crate::scalar::Scalar;

/// General epsilon for degenerate-geometry guards.
pub const EPSILON: Scalar = 1e-8;

/// Standard gravity magnitude (m/s²).
pub const GRAVITY: Scalar = 9.81;

/// Default simulation frequency (Hz).
pub const DEFAULT_SIMULATION_FREQUENCY: u32 = 90;

/// Valid simulation frequency range (Hz).
pub const SIMULATION_FREQUENCY_RANGE: (u32, u32) = (30, 150);

/// Default maximum sub-steps executed per rendered frame.
pub const DEFAULT_MAX_STEPS_PER_FRAME: u32 = 3;

/// Hard cap on registered teams.
pub const MAX_TEAM_COUNT: usize = 4096;

/// Hard cap on vertices per team topology.
pub const MAX_TOPOLOGY_VERTEX_COUNT: usize = 32767;

/// Particle mass scaling applied with friction (heavier under contact).
pub const FRICTION_MASS: Scalar = 3.0;

/// Particle mass scaling applied with depth (heavier near the roots).
pub const DEPTH_MASS: Scalar = 5.0;

/// Per-step decay applied to the accumulated friction value.
pub const FRICTION_DAMPING_RATE: Scalar = 0.6;

/// Hard limit on per-step real velocity, as displacement per step (m).
pub const MAX_REAL_STEP_DISPLACEMENT: Scalar = 0.5;

// -- distance / tether ------------------------------------------------------

/// Stiffness applied to structural (vertical) distance edges.
pub const DISTANCE_VERTICAL_STIFFNESS: Scalar = 1.0;

/// Stiffness applied to shear (horizontal) distance edges.
pub const DISTANCE_HORIZONTAL_STIFFNESS: Scalar = 0.5;

/// Fraction of a distance correction fed back into the velocity reference.
pub const DISTANCE_VELOCITY_ATTENUATION: Scalar = 0.3;

/// Width of the stiffness ramp approaching a tether limit.
pub const TETHER_STIFFNESS_WIDTH: Scalar = 0.3;

/// Velocity feedback for tether compression corrections.
pub const TETHER_COMPRESSION_VELOCITY_ATTENUATION: Scalar = 0.7;

/// Velocity feedback for tether stretch corrections.
pub const TETHER_STRETCH_VELOCITY_ATTENUATION: Scalar = 0.7;

// -- angle / bending --------------------------------------------------------

/// Maximum configurable angle limit (degrees).
pub const MAX_ANGLE_LIMIT_DEG: Scalar = 179.0;

/// Iterations of the angle limit/restoration solve per step.
pub const ANGLE_LIMIT_ITERATIONS: u32 = 3;

/// Velocity feedback for angle limit corrections.
pub const ANGLE_LIMIT_ATTENUATION: Scalar = 0.9;

/// Rest dihedral angles above this solve as volume preservation instead
/// (degrees).
pub const VOLUME_MIN_ANGLE_DEG: Scalar = 90.0;

/// Bending pairs with rest dihedral beyond this are not constrained
/// (degrees).
pub const TRIANGLE_BENDING_MAX_ANGLE_DEG: Scalar = 120.0;

// -- speed limits -----------------------------------------------------------

/// Cap on the team movement speed limit parameter (m/s).
pub const MAX_MOVEMENT_SPEED_LIMIT: Scalar = 10.0;

/// Cap on the team rotation speed limit parameter (deg/s).
pub const MAX_ROTATION_SPEED_LIMIT: Scalar = 1440.0;

/// Cap on the particle speed limit parameter (m/s).
pub const MAX_PARTICLE_SPEED_LIMIT: Scalar = 10.0;

// -- collider collision -----------------------------------------------------

/// Dynamic friction multiplier applied to the team friction parameter.
pub const COLLIDER_DYNAMIC_FRICTION_RATIO: Scalar = 1.0;

/// Static friction multiplier applied to the team friction parameter.
pub const COLLIDER_STATIC_FRICTION_RATIO: Scalar = 1.0;

// -- self collision ---------------------------------------------------------

/// Narrow-phase iterations per self-collision solve.
pub const SELF_COLLISION_SOLVER_ITERATIONS: u32 = 4;

/// Inverse-mass weighting: mass assigned to fixed primitive vertices.
pub const SELF_COLLISION_FIXED_MASS: Scalar = 100.0;

/// Inverse-mass weighting: extra mass per unit friction.
pub const SELF_COLLISION_FRICTION_MASS: Scalar = 10.0;

/// Inverse-mass weighting: extra mass per unit cloth-mass parameter.
pub const SELF_COLLISION_CLOTH_MASS: Scalar = 50.0;

/// Broad-phase admission margin as a multiple of contact thickness.
pub const SELF_COLLISION_MARGIN_RATIO: Scalar = 2.0;

/// Cosine gate for point-triangle contact admission (cos 60°).
pub const SELF_COLLISION_POINT_TRIANGLE_ANGLE_COS: Scalar = 0.5;

/// Entanglement detection is sliced over this many frames.
pub const SELF_COLLISION_INTERSECT_PERIOD: u32 = 8;

/// Valid surface thickness range (m).
pub const SELF_COLLISION_THICKNESS_RANGE: (Scalar, Scalar) = (0.001, 0.05);

/// Maximum recursion depth when propagating flags across sync-linked teams.
pub const MAX_SYNC_DEPTH: u32 = 8;

/// Fixed-point scale used by the atomic accumulation buffers.
pub const ACCUMULATE_FIXED_SCALE: Scalar = 100_000.0;
