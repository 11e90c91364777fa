//! Tether constraint: bounds each particle's distance to its hierarchy
//! root.
//!
//! Distance relaxation alone lets chains of edges stretch a few percent
//! per link, which adds up over a long cloth. The tether clamps the
//! straight-line distance to the root within a compression/stretch band
//! around the rest distance, with a smooth stiffness ramp near the limits
//! so the clamp never snaps.

use weft_arena::DataChunk;
use weft_types::constants::{
    EPSILON, TETHER_COMPRESSION_VELOCITY_ATTENUATION, TETHER_STIFFNESS_WIDTH,
    TETHER_STRETCH_VELOCITY_ATTENUATION,
};

use weft_mesh::VertexHierarchy;

use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// One tether pass over a team's particles.
pub fn solve(
    particles: &mut ParticleStore,
    chunk: DataChunk,
    hierarchy: &VertexHierarchy,
    params: &ClothParameters,
    scale_ratio: f32,
) {
    let base = chunk.start;
    let next = particles.next_pos.data_mut();
    let velocity_pos = particles.velocity_pos.data_mut();
    let attribute = particles.attribute.data();

    let stretch_limit = 1.0 + params.tether.stretch;
    let compression_limit = 1.0 - params.tether.compression;

    for li in 0..chunk.len {
        let i = base + li;
        if !attribute[i].is_movable() || !hierarchy.has_root(li) {
            continue;
        }
        let Some(root) = hierarchy.roots[li] else {
            continue;
        };
        let rest = hierarchy.root_distances[li] * scale_ratio;
        if rest <= EPSILON {
            continue;
        }

        let root_pos = next[base + root as usize];
        let v = next[i] - root_pos;
        let dist = v.length();
        if dist <= EPSILON {
            continue;
        }
        let ratio = dist / rest;
        let n = v / dist;

        if ratio > stretch_limit {
            let stiffness = ((ratio - stretch_limit) / TETHER_STIFFNESS_WIDTH).clamp(0.0, 1.0);
            let add = n * (-(dist - rest * stretch_limit) * stiffness);
            next[i] += add;
            velocity_pos[i] += add * TETHER_STRETCH_VELOCITY_ATTENUATION;
        } else if ratio < compression_limit {
            let stiffness =
                ((compression_limit - ratio) / TETHER_STIFFNESS_WIDTH).clamp(0.0, 1.0);
            let add = n * ((rest * compression_limit - dist) * stiffness);
            next[i] += add;
            velocity_pos[i] += add * TETHER_COMPRESSION_VELOCITY_ATTENUATION;
        }
    }
}
