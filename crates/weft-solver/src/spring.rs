//! Spring constraint: soft offset limit for rigidly driven points.
//!
//! Intended for accessory-style cloths whose anchor should give a little:
//! the driven particle may drift inside a small radius around its base
//! position and is pulled back with a soft spring. Kept deliberately
//! minimal; surface cloth uses the motion constraint instead.

use weft_arena::DataChunk;
use weft_types::constants::EPSILON;

use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// One spring pass over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    params: &ClothParameters,
    scale_ratio: f32,
) {
    if !params.spring.use_spring {
        return;
    }
    let radius = params.spring.distance * scale_ratio;
    let strength = params.spring.strength.clamp(0.0, 1.0);

    let next = particles.next_pos.data_mut();
    let base_pos = particles.base_pos.data();
    let attribute = particles.attribute.data();

    for i in chunk.range() {
        if !attribute[i].is_movable() {
            continue;
        }
        let v = next[i] - base_pos[i];
        let dist = v.length();
        if dist <= EPSILON {
            continue;
        }
        // Hard clamp at the radius, soft pull inside it.
        if dist > radius {
            next[i] = base_pos[i] + v * (radius / dist);
        }
        next[i] -= (next[i] - base_pos[i]) * strength;
    }
}
