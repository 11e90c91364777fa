//! Cloth topology representation and adjacency queries.

use std::collections::HashMap;

use weft_math::{queries::triangle_normal, Vec3};
use weft_types::constants::MAX_TOPOLOGY_VERTEX_COUNT;
use weft_types::{VertexAttribute, WeftError, WeftResult};

use crate::hierarchy::VertexHierarchy;

/// An interior (non-boundary) edge with its two adjacent triangles.
///
/// These are the sites of bending constraints: the dihedral angle across
/// `v0v1` between the wing vertices defines the bending energy.
#[derive(Debug, Clone, Copy)]
pub struct InteriorEdge {
    /// Index of vertex A of the shared edge.
    pub v0: u32,
    /// Index of vertex B of the shared edge.
    pub v1: u32,
    /// The "wing" vertex of triangle A (not on the edge).
    pub wing_a: u32,
    /// The "wing" vertex of triangle B (not on the edge).
    pub wing_b: u32,
}

/// Validated static description of one cloth instance.
///
/// Built once at registration. Vertex count is capped at
/// [`MAX_TOPOLOGY_VERTEX_COUNT`]; all derived adjacency is precomputed so
/// the per-step solvers only index.
#[derive(Debug, Clone)]
pub struct ClothTopology {
    /// Rest-pose vertex positions.
    pub positions: Vec<Vec3>,
    /// Rest-pose vertex normals (area-weighted average of incident faces).
    pub normals: Vec<Vec3>,
    /// Per-vertex simulation attributes.
    pub attributes: Vec<VertexAttribute>,
    /// Triangle index buffer.
    pub triangles: Vec<[u32; 3]>,
    /// Unique edges as `(v_min, v_max)` pairs.
    pub edges: Vec<[u32; 2]>,
    /// Interior edges with wing vertices, for bending constraints.
    pub interior_edges: Vec<InteriorEdge>,
    /// For each vertex, its edge-connected neighbors.
    pub vertex_neighbors: Vec<Vec<u32>>,
    /// Parent/root/depth/baseline data derived from the parent links.
    pub hierarchy: VertexHierarchy,
}

impl ClothTopology {
    /// Build and validate a topology.
    ///
    /// `parents[i]` is the hierarchy parent of vertex `i` (`None` for
    /// roots and free vertices). Fixed vertices typically act as roots.
    pub fn new(
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        attributes: Vec<VertexAttribute>,
        parents: Vec<Option<u32>>,
    ) -> WeftResult<Self> {
        let vertex_count = positions.len();
        if vertex_count == 0 {
            return Err(WeftError::InvalidTopology("no vertices".into()));
        }
        if vertex_count > MAX_TOPOLOGY_VERTEX_COUNT {
            return Err(WeftError::InvalidTopology(format!(
                "{} vertices exceeds the per-cloth cap of {}",
                vertex_count, MAX_TOPOLOGY_VERTEX_COUNT
            )));
        }
        if attributes.len() != vertex_count {
            return Err(WeftError::InvalidTopology(format!(
                "attribute count {} does not match vertex count {}",
                attributes.len(),
                vertex_count
            )));
        }
        if parents.len() != vertex_count {
            return Err(WeftError::InvalidTopology(format!(
                "parent count {} does not match vertex count {}",
                parents.len(),
                vertex_count
            )));
        }

        for (t, tri) in triangles.iter().enumerate() {
            for &v in tri {
                if v as usize >= vertex_count {
                    return Err(WeftError::InvalidTopology(format!(
                        "triangle {} references vertex {} out of {}",
                        t, v, vertex_count
                    )));
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(WeftError::InvalidTopology(format!(
                    "triangle {} is degenerate: {:?}",
                    t, tri
                )));
            }
        }
        for (v, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                if *p as usize >= vertex_count {
                    return Err(WeftError::InvalidTopology(format!(
                        "vertex {} has parent {} out of {}",
                        v, p, vertex_count
                    )));
                }
                if *p as usize == v {
                    return Err(WeftError::InvalidTopology(format!(
                        "vertex {} is its own parent",
                        v
                    )));
                }
            }
        }

        // Canonical unique edges and edge-triangle adjacency.
        let mut edge_map: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (t, tri) in triangles.iter().enumerate() {
            let [a, b, c] = *tri;
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                edge_map.entry(key).or_default().push(t as u32);
            }
        }

        let mut edges: Vec<[u32; 2]> = Vec::with_capacity(edge_map.len());
        let mut interior_edges: Vec<InteriorEdge> = Vec::new();
        for (&(v0, v1), tris) in &edge_map {
            edges.push([v0, v1]);
            if tris.len() == 2 {
                interior_edges.push(InteriorEdge {
                    v0,
                    v1,
                    wing_a: wing_vertex(&triangles, tris[0], v0, v1),
                    wing_b: wing_vertex(&triangles, tris[1], v0, v1),
                });
            }
        }
        // Hash iteration order is unstable; sort for reproducible builds.
        edges.sort_unstable();
        interior_edges.sort_unstable_by_key(|e| (e.v0, e.v1));

        // Parent links count as connectivity even without triangles
        // (chain cloths have no surface).
        let mut vertex_neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        for &[v0, v1] in &edges {
            vertex_neighbors[v0 as usize].push(v1);
            vertex_neighbors[v1 as usize].push(v0);
        }
        for (v, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                if !vertex_neighbors[v].contains(p) {
                    vertex_neighbors[v].push(*p);
                    vertex_neighbors[*p as usize].push(v as u32);
                }
            }
        }
        for n in &mut vertex_neighbors {
            n.sort_unstable();
        }

        let normals = vertex_normals(&positions, &triangles);
        let hierarchy = VertexHierarchy::build(&positions, &parents)?;

        Ok(ClothTopology {
            positions,
            normals,
            attributes,
            triangles,
            edges,
            interior_edges,
            vertex_neighbors,
            hierarchy,
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of unique edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True if `a` and `b` share an edge or a parent link.
    pub fn connected(&self, a: u32, b: u32) -> bool {
        self.vertex_neighbors[a as usize].binary_search(&b).is_ok()
    }

    /// Count of movable vertices.
    pub fn movable_count(&self) -> usize {
        self.attributes.iter().filter(|a| a.is_movable()).count()
    }
}

/// The vertex of triangle `tri` that is not `v0` or `v1`.
fn wing_vertex(triangles: &[[u32; 3]], tri: u32, v0: u32, v1: u32) -> u32 {
    let [a, b, c] = triangles[tri as usize];
    if a != v0 && a != v1 {
        a
    } else if b != v0 && b != v1 {
        b
    } else {
        c
    }
}

/// Area-weighted vertex normals. Vertices with no incident faces get the
/// zero normal.
fn vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in triangles {
        let [a, b, c] = *tri;
        let pa = positions[a as usize];
        let pb = positions[b as usize];
        let pc = positions[c as usize];
        // Cross product magnitude carries the area weighting.
        let n = (pb - pa).cross(pc - pa);
        normals[a as usize] += n;
        normals[b as usize] += n;
        normals[c as usize] += n;
    }
    for n in &mut normals {
        if n.length_squared() > f32::EPSILON {
            *n = n.normalize();
        } else if let Some(tri) = triangles.first() {
            // Degenerate fan; borrow the first face normal so downstream
            // math has something unit-length to work with.
            *n = triangle_normal(
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            );
        }
    }
    normals
}
