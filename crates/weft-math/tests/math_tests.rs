//! Integration tests for weft-math.

use weft_math::queries::{
    closest_pt_point_segment_ratio, closest_pt_point_triangle, closest_pt_segment_segment,
    from_to_rotation, intersect_segment_triangle, point_plane_dist, signed_dihedral_angle,
    triangle_normal,
};
use weft_math::{Aabb, CurveData, Vec3};

const EPS: f32 = 1e-5;

// ─── AABB Tests ────────────────────────────────────────────────

#[test]
fn aabb_swept_union_contains_both_endpoints() {
    let mut aabb = Aabb::from_point(Vec3::new(0.0, 0.0, 0.0));
    aabb.encapsulate(Vec3::new(1.0, -2.0, 3.0));
    aabb.expand(0.5);
    assert_eq!(aabb.min, Vec3::new(-0.5, -2.5, -0.5));
    assert_eq!(aabb.max, Vec3::new(1.5, 0.5, 3.5));
}

#[test]
fn aabb_overlap_is_symmetric() {
    let a = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
    let b = Aabb::from_points(Vec3::splat(0.9), Vec3::splat(2.0));
    let c = Aabb::from_points(Vec3::splat(1.1), Vec3::splat(2.0));
    assert!(a.overlaps(&b) && b.overlaps(&a));
    assert!(!a.overlaps(&c) && !c.overlaps(&a));
}

// ─── Closest Point Tests ───────────────────────────────────────

#[test]
fn point_segment_ratio_clamps() {
    let a = Vec3::ZERO;
    let b = Vec3::new(2.0, 0.0, 0.0);
    assert!((closest_pt_point_segment_ratio(Vec3::new(1.0, 5.0, 0.0), a, b) - 0.5).abs() < EPS);
    assert_eq!(closest_pt_point_segment_ratio(Vec3::new(-3.0, 0.0, 0.0), a, b), 0.0);
    assert_eq!(closest_pt_point_segment_ratio(Vec3::new(9.0, 0.0, 0.0), a, b), 1.0);
}

#[test]
fn point_segment_ratio_degenerate_segment() {
    let a = Vec3::splat(1.0);
    assert_eq!(closest_pt_point_segment_ratio(Vec3::ZERO, a, a), 0.0);
}

#[test]
fn segment_segment_crossing() {
    // Perpendicular segments crossing at unit distance.
    let (s, t, c1, c2) = closest_pt_segment_segment(
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, -1.0),
        Vec3::new(0.0, 1.0, 1.0),
    );
    assert!((s - 0.5).abs() < EPS);
    assert!((t - 0.5).abs() < EPS);
    assert!((c1 - c2).length() - 1.0 < EPS);
}

#[test]
fn point_triangle_interior_and_vertex_regions() {
    let a = Vec3::ZERO;
    let b = Vec3::new(1.0, 0.0, 0.0);
    let c = Vec3::new(0.0, 1.0, 0.0);

    let (cp, uvw) = closest_pt_point_triangle(Vec3::new(0.25, 0.25, 1.0), a, b, c);
    assert!((cp - Vec3::new(0.25, 0.25, 0.0)).length() < EPS);
    assert!((uvw.x + uvw.y + uvw.z - 1.0).abs() < EPS);

    let (cp, uvw) = closest_pt_point_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c);
    assert!((cp - a).length() < EPS);
    assert!((uvw - Vec3::new(1.0, 0.0, 0.0)).length() < EPS);
}

#[test]
fn plane_distance_is_signed() {
    let (d, proj) = point_plane_dist(Vec3::ZERO, Vec3::Y, Vec3::new(1.0, 2.0, 3.0));
    assert!((d - 2.0).abs() < EPS);
    assert!((proj - Vec3::new(1.0, 0.0, 3.0)).length() < EPS);

    let (d, _) = point_plane_dist(Vec3::ZERO, Vec3::Y, Vec3::new(0.0, -0.5, 0.0));
    assert!((d + 0.5).abs() < EPS);
}

// ─── Rotation / Angle Tests ────────────────────────────────────

#[test]
fn from_to_rotation_full_arc() {
    let q = from_to_rotation(Vec3::X, Vec3::Y, 1.0);
    assert!((q * Vec3::X - Vec3::Y).length() < 1e-4);
}

#[test]
fn from_to_rotation_half_arc() {
    let q = from_to_rotation(Vec3::X, Vec3::Y, 0.5);
    let rotated = q * Vec3::X;
    let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
    assert!((rotated - expected).length() < 1e-4);
}

#[test]
fn dihedral_angle_flat_is_zero() {
    // Two coplanar triangles sharing the edge (0,0,0)-(0,0,1).
    let angle = signed_dihedral_angle(
        Vec3::new(-1.0, 0.0, 0.5),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.5),
    );
    assert!(angle.abs() < 1e-4);
}

#[test]
fn dihedral_angle_fold_changes_sign() {
    let e0 = Vec3::new(0.0, 0.0, 0.0);
    let e1 = Vec3::new(0.0, 0.0, 1.0);
    let v2 = Vec3::new(-1.0, 0.0, 0.5);
    let up = signed_dihedral_angle(v2, e0, e1, Vec3::new(1.0, 0.5, 0.5));
    let down = signed_dihedral_angle(v2, e0, e1, Vec3::new(1.0, -0.5, 0.5));
    assert!(up.abs() > 1e-3);
    assert!((up + down).abs() < 1e-4, "folds should be mirror images");
}

#[test]
fn triangle_normal_degenerate_is_zero() {
    let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
    assert_eq!(n, Vec3::ZERO);
}

// ─── Segment/Triangle Intersection ─────────────────────────────

#[test]
fn segment_pierces_triangle() {
    let a = Vec3::new(-1.0, 0.0, -1.0);
    let b = Vec3::new(1.0, 0.0, -1.0);
    let c = Vec3::new(0.0, 0.0, 1.0);
    assert!(intersect_segment_triangle(
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        a,
        b,
        c
    ));
    // Same segment from the other side.
    assert!(intersect_segment_triangle(
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        a,
        b,
        c
    ));
    // Misses to the side.
    assert!(!intersect_segment_triangle(
        Vec3::new(5.0, 1.0, 0.0),
        Vec3::new(5.0, -1.0, 0.0),
        a,
        b,
        c
    ));
    // Stops short of the plane.
    assert!(!intersect_segment_triangle(
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.5, 0.0),
        a,
        b,
        c
    ));
}

// ─── Curve Tests ───────────────────────────────────────────────

#[test]
fn curve_constant_and_linear() {
    let c = CurveData::constant(0.5);
    assert_eq!(c.evaluate(0.0), 0.5);
    assert_eq!(c.evaluate(1.0), 0.5);

    let l = CurveData::linear(0.0, 3.0);
    assert!((l.evaluate(0.0) - 0.0).abs() < EPS);
    assert!((l.evaluate(0.5) - 1.5).abs() < EPS);
    assert!((l.evaluate(1.0) - 3.0).abs() < EPS);
}

#[test]
fn curve_evaluate_clamps_input_and_output() {
    let l = CurveData::linear(0.0, 1.0);
    assert_eq!(l.evaluate(-5.0), 0.0);
    assert_eq!(l.evaluate(5.0), 1.0);
    assert_eq!(l.evaluate_clamped(1.0, 0.0, 0.25), 0.25);
}

#[test]
fn curve_serde_round_trip() {
    let c = CurveData::from_keys([0.1, 0.4, 0.7, 1.0]);
    let json = serde_json::to_string(&c).unwrap();
    let back: CurveData = serde_json::from_str(&json).unwrap();
    assert_eq!(c, back);
}
