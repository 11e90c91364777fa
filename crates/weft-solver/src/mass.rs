//! Particle mass weighting.
//!
//! Weft particles have no real mass parameter; constraints weight their
//! corrections with a synthetic mass that grows toward the hierarchy
//! roots and under contact friction. Heavier particles move less, which
//! keeps the anchored side of a cloth steady without extra iterations.

use weft_types::constants::{
    DEPTH_MASS, FRICTION_MASS, SELF_COLLISION_CLOTH_MASS, SELF_COLLISION_FIXED_MASS,
    SELF_COLLISION_FRICTION_MASS,
};

/// Inverse constraint mass from normalized depth and contact friction.
///
/// Full friction pins the particle: constraints see an infinite mass and
/// leave its position alone.
pub fn inverse_mass(depth: f32, friction: f32) -> f32 {
    let friction = friction.clamp(0.0, 1.0);
    if friction >= 1.0 {
        return 0.0;
    }
    let mass = 1.0 + (1.0 - depth) * DEPTH_MASS + friction * FRICTION_MASS;
    1.0 / mass
}

/// Inverse mass used by the self-collision solver.
///
/// Pinned vertices stay nearly immovable, friction and the per-cloth
/// `cloth_mass` parameter bias who yields in a mutual contact.
pub fn self_collision_inverse_mass(friction: f32, pinned: bool, cloth_mass: f32) -> f32 {
    let mut mass = 1.0
        + friction.clamp(0.0, 1.0) * SELF_COLLISION_FRICTION_MASS
        + cloth_mass.clamp(0.0, 1.0) * SELF_COLLISION_CLOTH_MASS;
    if pinned {
        mass += SELF_COLLISION_FIXED_MASS;
    }
    1.0 / mass
}
