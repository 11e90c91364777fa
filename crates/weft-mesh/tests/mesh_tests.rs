//! Integration tests for weft-mesh.

use weft_math::Vec3;
use weft_mesh::generators::{chain_topology, quad_grid_topology};
use weft_mesh::ClothTopology;
use weft_types::VertexAttribute;

// ─── Construction / Validation ─────────────────────────────────

#[test]
fn rejects_out_of_bounds_triangle() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    let result = ClothTopology::new(
        positions,
        vec![[0, 1, 9]],
        vec![VertexAttribute::MOVE; 3],
        vec![None; 3],
    );
    assert!(result.is_err());
}

#[test]
fn rejects_degenerate_triangle() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    let result = ClothTopology::new(
        positions,
        vec![[0, 1, 1]],
        vec![VertexAttribute::MOVE; 3],
        vec![None; 3],
    );
    assert!(result.is_err());
}

#[test]
fn rejects_attribute_count_mismatch() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    let result = ClothTopology::new(
        positions,
        vec![[0, 1, 2]],
        vec![VertexAttribute::MOVE; 2],
        vec![None; 3],
    );
    assert!(result.is_err());
}

#[test]
fn rejects_parent_cycle() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    let result = ClothTopology::new(
        positions,
        vec![],
        vec![VertexAttribute::MOVE; 3],
        vec![Some(1), Some(2), Some(0)],
    );
    assert!(result.is_err());
}

// ─── Adjacency ─────────────────────────────────────────────────

#[test]
fn single_quad_edges_and_interior() {
    // Two triangles sharing one diagonal.
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
    ];
    let topo = ClothTopology::new(
        positions,
        vec![[0, 2, 1], [1, 2, 3]],
        vec![VertexAttribute::MOVE; 4],
        vec![None; 4],
    )
    .unwrap();

    assert_eq!(topo.edge_count(), 5);
    assert_eq!(topo.interior_edges.len(), 1);
    let ie = topo.interior_edges[0];
    assert_eq!((ie.v0, ie.v1), (1, 2));
    let wings = [ie.wing_a.min(ie.wing_b), ie.wing_a.max(ie.wing_b)];
    assert_eq!(wings, [0, 3]);

    assert!(topo.connected(0, 1));
    assert!(topo.connected(1, 2));
    assert!(!topo.connected(0, 3));
}

#[test]
fn grid_counts() {
    let topo = quad_grid_topology(4, 3, 1.0, 0.75).unwrap();
    assert_eq!(topo.vertex_count(), 5 * 4);
    assert_eq!(topo.triangle_count(), 4 * 3 * 2);
    // Top row is fixed, rest movable.
    assert_eq!(topo.movable_count(), 5 * 3);
    for x in 0..5 {
        assert!(topo.attributes[x].is_fixed());
    }
}

#[test]
fn grid_normals_are_unit_and_planar() {
    let topo = quad_grid_topology(3, 3, 1.0, 1.0).unwrap();
    for n in &topo.normals {
        assert!((n.length() - 1.0).abs() < 1e-4);
        // Planar grid: all normals along ±Z.
        assert!(n.x.abs() < 1e-4 && n.y.abs() < 1e-4);
    }
}

// ─── Hierarchy ─────────────────────────────────────────────────

#[test]
fn grid_hierarchy_runs_down_columns() {
    let topo = quad_grid_topology(2, 3, 1.0, 1.0).unwrap();
    let h = &topo.hierarchy;
    let verts_x = 3;

    // Vertex (x=1, y=2) parents to (x=1, y=1) and roots at (x=1, y=0).
    let v = 2 * verts_x + 1;
    assert_eq!(h.parents[v], Some((verts_x + 1) as u32));
    assert_eq!(h.roots[v], Some(1));

    // Depth grows monotonically down a column and hits 1 at the bottom.
    let col = 1;
    let mut last = -1.0f32;
    for y in 0..4 {
        let d = h.depths[y * verts_x + col];
        assert!(d > last);
        last = d;
    }
    assert!((last - 1.0).abs() < 1e-5);
}

#[test]
fn chain_hierarchy_and_distances() {
    let topo = chain_topology(5, 0.1).unwrap();
    let h = &topo.hierarchy;

    assert_eq!(h.roots[4], Some(0));
    assert!((h.root_distances[4] - 0.4).abs() < 1e-5);
    assert!((h.parent_distances[3] - 0.1).abs() < 1e-5);
    assert!(h.has_root(4));
    assert!(!h.has_root(0));

    // One baseline from the single root, parent-before-child.
    assert_eq!(h.baselines.len(), 1);
    assert_eq!(h.baselines[0].root, 0);
    assert_eq!(h.baselines[0].vertices, vec![1, 2, 3, 4]);
}

#[test]
fn chain_is_connected_through_parent_links() {
    let topo = chain_topology(3, 0.1).unwrap();
    assert!(topo.connected(0, 1));
    assert!(topo.connected(1, 2));
    assert!(!topo.connected(0, 2));
}
