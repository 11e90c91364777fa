//! Procedural cloth topologies for tests and benchmarks.

use weft_math::Vec3;
use weft_types::{VertexAttribute, WeftResult};

use crate::topology::ClothTopology;

/// Regular cloth grid hanging from its top row.
///
/// `cols × rows` quads, `(cols+1) × (rows+1)` vertices laid out in the XY
/// plane: X spans `[0, width]`, Y runs from 0 at the top row down to
/// `-height`. The top row is fixed and acts as hierarchy roots; every
/// other vertex parents to the vertex directly above it. Two triangles
/// per quad.
pub fn quad_grid_topology(
    cols: usize,
    rows: usize,
    width: f32,
    height: f32,
) -> WeftResult<ClothTopology> {
    let verts_x = cols + 1;
    let verts_y = rows + 1;
    let n = verts_x * verts_y;
    let dx = width / cols as f32;
    let dy = height / rows as f32;

    let mut positions = Vec::with_capacity(n);
    let mut attributes = Vec::with_capacity(n);
    let mut parents = Vec::with_capacity(n);
    for y in 0..verts_y {
        for x in 0..verts_x {
            positions.push(Vec3::new(x as f32 * dx, -(y as f32) * dy, 0.0));
            if y == 0 {
                attributes.push(VertexAttribute::FIXED);
                parents.push(None);
            } else {
                attributes.push(VertexAttribute::MOVE);
                parents.push(Some(((y - 1) * verts_x + x) as u32));
            }
        }
    }

    let mut triangles = Vec::with_capacity(cols * rows * 2);
    for y in 0..rows {
        for x in 0..cols {
            let i0 = (y * verts_x + x) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + verts_x as u32;
            let i3 = i2 + 1;
            triangles.push([i0, i2, i1]);
            triangles.push([i1, i2, i3]);
        }
    }

    ClothTopology::new(positions, triangles, attributes, parents)
}

/// Straight chain of `count` particles spaced `spacing` apart, hanging
/// down Y from a fixed root at the origin.
///
/// No triangles; connectivity comes entirely from the parent links. Used
/// for angle-constraint and tether tests where a surface would get in the
/// way.
pub fn chain_topology(count: usize, spacing: f32) -> WeftResult<ClothTopology> {
    let mut positions = Vec::with_capacity(count);
    let mut attributes = Vec::with_capacity(count);
    let mut parents = Vec::with_capacity(count);
    for i in 0..count {
        positions.push(Vec3::new(0.0, -(i as f32) * spacing, 0.0));
        if i == 0 {
            attributes.push(VertexAttribute::FIXED);
            parents.push(None);
        } else {
            attributes.push(VertexAttribute::MOVE);
            parents.push(Some((i - 1) as u32));
        }
    }
    ClothTopology::new(positions, Vec::new(), attributes, parents)
}
