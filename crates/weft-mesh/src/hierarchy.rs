//! Vertex hierarchy: parents, roots, depths, baselines.
//!
//! The tether and angle constraints do not work on the surface graph but
//! on a tree hanging off the fixed vertices: every movable vertex has a
//! parent link leading back to a root. Depth is the normalized distance
//! from the root along that tree, and a baseline is one root's subtree
//! flattened in parent-before-child order.

use weft_math::Vec3;
use weft_types::{WeftError, WeftResult};

/// One root's subtree, flattened so parents precede children.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// The root vertex.
    pub root: u32,
    /// Subtree vertices in traversal order, root excluded.
    pub vertices: Vec<u32>,
}

/// Parent/root/depth data derived from parent links.
#[derive(Debug, Clone)]
pub struct VertexHierarchy {
    /// Hierarchy parent per vertex.
    pub parents: Vec<Option<u32>>,
    /// Root vertex per vertex (`None` for vertices outside any tree).
    pub roots: Vec<Option<u32>>,
    /// Normalized depth per vertex: 0 at the roots, 1 at the deepest leaf.
    pub depths: Vec<f32>,
    /// Rest-pose distance from each vertex to its root, along the tree.
    pub root_distances: Vec<f32>,
    /// Rest-pose distance to the parent.
    pub parent_distances: Vec<f32>,
    /// One baseline per root that has children.
    pub baselines: Vec<Baseline>,
}

impl VertexHierarchy {
    /// Derive hierarchy data from parent links.
    ///
    /// Fails on parent cycles; a valid hierarchy is a forest.
    pub fn build(positions: &[Vec3], parents: &[Option<u32>]) -> WeftResult<Self> {
        let n = positions.len();
        let mut roots = vec![None; n];
        let mut root_distances = vec![0.0f32; n];
        let mut parent_distances = vec![0.0f32; n];
        let mut hops = vec![0u32; n];

        for v in 0..n {
            let mut cur = v;
            let mut dist = 0.0f32;
            let mut steps = 0u32;
            while let Some(p) = parents[cur] {
                dist += (positions[cur] - positions[p as usize]).length();
                cur = p as usize;
                steps += 1;
                if steps as usize > n {
                    return Err(WeftError::InvalidTopology(format!(
                        "parent cycle reached from vertex {}",
                        v
                    )));
                }
            }
            if let Some(p) = parents[v] {
                parent_distances[v] = (positions[v] - positions[p as usize]).length();
            }
            if steps > 0 {
                roots[v] = Some(cur as u32);
            } else if parents.iter().any(|q| *q == Some(v as u32)) {
                // A root counts as belonging to its own tree.
                roots[v] = Some(v as u32);
            }
            root_distances[v] = dist;
            hops[v] = steps;
        }

        // Normalize depth against the deepest vertex of each tree.
        let mut max_dist_per_root = vec![0.0f32; n];
        for v in 0..n {
            if let Some(r) = roots[v] {
                let m = &mut max_dist_per_root[r as usize];
                *m = m.max(root_distances[v]);
            }
        }
        let mut depths = vec![0.0f32; n];
        for v in 0..n {
            if let Some(r) = roots[v] {
                let max = max_dist_per_root[r as usize];
                depths[v] = if max > f32::EPSILON {
                    root_distances[v] / max
                } else {
                    0.0
                };
            }
        }

        // Children sorted by index give a deterministic traversal.
        let mut children: Vec<Vec<u32>> = vec![Vec::new(); n];
        for v in 0..n {
            if let Some(p) = parents[v] {
                children[p as usize].push(v as u32);
            }
        }

        let mut baselines = Vec::new();
        for root in 0..n {
            if roots[root] != Some(root as u32) || children[root].is_empty() {
                continue;
            }
            let mut vertices = Vec::new();
            let mut stack: Vec<u32> = children[root].iter().rev().copied().collect();
            while let Some(v) = stack.pop() {
                vertices.push(v);
                for &c in children[v as usize].iter().rev() {
                    stack.push(c);
                }
            }
            baselines.push(Baseline {
                root: root as u32,
                vertices,
            });
        }

        Ok(VertexHierarchy {
            parents: parents.to_vec(),
            roots,
            depths,
            root_distances,
            parent_distances,
            baselines,
        })
    }

    /// True if `v` hangs from a root (directly or transitively).
    pub fn has_root(&self, v: usize) -> bool {
        self.roots[v].is_some() && self.roots[v] != Some(v as u32)
    }
}
