//! Entanglement detection: frame-sliced edge/triangle intersection.
//!
//! A true crossing means the separation solve is already fighting the
//! wrong side; pushing harder makes it worse. Instead, particles involved
//! in a crossing are flagged and excluded from the next detection round so
//! constraint restoration pulls them back through. Approximate and cheap
//! by design: the pass runs only on its scheduled frames.

use weft_arena::DataChunk;
use weft_math::queries::intersect_segment_triangle;
use weft_solver::ParticleStore;

use crate::primitive::PrimitiveSet;

/// Runs a pass every `period` ticks, staggered by `offset`.
///
/// A period of 0 or 1 runs every tick.
#[derive(Debug, Clone, Copy)]
pub struct SliceScheduler {
    pub period: u32,
    pub offset: u32,
}

impl SliceScheduler {
    pub fn new(period: u32, offset: u32) -> Self {
        SliceScheduler { period, offset }
    }

    /// True when the pass is due at `tick`.
    pub fn due(&self, tick: u32) -> bool {
        if self.period <= 1 {
            return true;
        }
        tick % self.period == self.offset % self.period
    }
}

/// Flag every particle on a genuinely crossing edge/triangle pair.
///
/// `tangled` is chunk-local and fully rewritten. Returns the number of
/// flagged particles.
pub fn detect(
    edges: &PrimitiveSet,
    triangles: &PrimitiveSet,
    chunk: DataChunk,
    particles: &ParticleStore,
    tangled: &mut [bool],
) -> u32 {
    let next = particles.next_pos.data();
    tangled.fill(false);

    // The sweep windows are already thickness-padded; a crossing segment
    // is necessarily inside them.
    for ee in &edges.sorted {
        let edge = &edges.primitives[ee.index as usize];
        for te in &triangles.sorted {
            if te.min > ee.max {
                break;
            }
            if te.max < ee.min {
                continue;
            }
            let tri = &triangles.primitives[te.index as usize];
            if edge.shares_vertex(2, tri, 3) {
                continue;
            }
            let (e0, e1) = (
                chunk.start + edge.vertices[0] as usize,
                chunk.start + edge.vertices[1] as usize,
            );
            let (t0, t1, t2) = (
                chunk.start + tri.vertices[0] as usize,
                chunk.start + tri.vertices[1] as usize,
                chunk.start + tri.vertices[2] as usize,
            );
            if intersect_segment_triangle(next[e0], next[e1], next[t0], next[t1], next[t2]) {
                for &v in &edge.vertices[..2] {
                    tangled[v as usize] = true;
                }
                for &v in &tri.vertices[..3] {
                    tangled[v as usize] = true;
                }
            }
        }
    }

    tangled.iter().filter(|&&t| t).count() as u32
}
