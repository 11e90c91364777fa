//! Closest-point and intersection queries.
//!
//! These are the standard real-time collision queries, written to stay
//! finite on degenerate input (zero-length segments, sliver triangles):
//! every division is guarded and parametric results are clamped to the
//! valid range.

use glam::{Quat, Vec3};

/// Parametric coordinate of the closest point on segment `ab` to `p`,
/// clamped to `[0, 1]`.
pub fn closest_pt_point_segment_ratio(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let denom = ab.dot(ab);
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (ab.dot(p - a) / denom).clamp(0.0, 1.0)
}

/// Closest points between segments `p1q1` and `p2q2`.
///
/// Returns `(s, t, c1, c2)`: parametric coordinates on each segment and
/// the closest points themselves.
pub fn closest_pt_segment_segment(
    p1: Vec3,
    q1: Vec3,
    p2: Vec3,
    q2: Vec3,
) -> (f32, f32, Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let (mut s, mut t);
    if a <= f32::EPSILON && e <= f32::EPSILON {
        // Both segments degenerate to points.
        s = 0.0;
        t = 0.0;
    } else if a <= f32::EPSILON {
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(r);
        if e <= f32::EPSILON {
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            s = if denom > f32::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
        }
    }

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (s, t, c1, c2)
}

/// Closest point on triangle `abc` to `p`.
///
/// Returns the closest point and its barycentric coordinates `(u, v, w)`
/// with respect to `a`, `b`, `c`.
pub fn closest_pt_point_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Vec3) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, Vec3::new(1.0, 0.0, 0.0));
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, Vec3::new(0.0, 1.0, 0.0));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = if (d1 - d3).abs() <= f32::EPSILON {
            0.0
        } else {
            d1 / (d1 - d3)
        };
        return (a + ab * v, Vec3::new(1.0 - v, v, 0.0));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, Vec3::new(0.0, 0.0, 1.0));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = if (d2 - d6).abs() <= f32::EPSILON {
            0.0
        } else {
            d2 / (d2 - d6)
        };
        return (a + ac * w, Vec3::new(1.0 - w, 0.0, w));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let denom = (d4 - d3) + (d5 - d6);
        let w = if denom.abs() <= f32::EPSILON {
            0.0
        } else {
            (d4 - d3) / denom
        };
        return (b + (c - b) * w, Vec3::new(0.0, 1.0 - w, w));
    }

    let denom = va + vb + vc;
    if denom.abs() <= f32::EPSILON {
        return (a, Vec3::new(1.0, 0.0, 0.0));
    }
    let v = vb / denom;
    let w = vc / denom;
    (
        a + ab * v + ac * w,
        Vec3::new(1.0 - v - w, v, w),
    )
}

/// Signed distance of `p` from the plane through `plane_pos` with normal
/// `n`, plus the projection of `p` onto that plane.
pub fn point_plane_dist(plane_pos: Vec3, n: Vec3, p: Vec3) -> (f32, Vec3) {
    let d = n.dot(p - plane_pos);
    (d, p - n * d)
}

/// Component of `v` perpendicular to the (normalized) plane normal `n`.
pub fn project_on_plane(v: Vec3, n: Vec3) -> Vec3 {
    v - n * v.dot(n)
}

/// Normalized triangle normal, or `Vec3::ZERO` for a degenerate triangle.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let n = (b - a).cross(c - a);
    if n.length_squared() <= f32::EPSILON {
        Vec3::ZERO
    } else {
        n.normalize()
    }
}

/// Rotation taking direction `from` to direction `to`, scaled by `t`.
///
/// `t = 1` is the full arc. Inputs need not be normalized; zero-length
/// inputs yield the identity.
pub fn from_to_rotation(from: Vec3, to: Vec3, t: f32) -> Quat {
    let (Some(a), Some(b)) = (from.try_normalize(), to.try_normalize()) else {
        return Quat::IDENTITY;
    };
    let full = Quat::from_rotation_arc(a, b);
    Quat::IDENTITY.slerp(full, t.clamp(0.0, 1.0))
}

/// Signed dihedral angle (radians) across the shared edge `e0e1` between
/// apex vertices `v2` and `v3`.
///
/// Positive when the surfaces fold toward each other, negative when they
/// fold apart. Returns `0.0` for degenerate triangles.
pub fn signed_dihedral_angle(v2: Vec3, e0: Vec3, e1: Vec3, v3: Vec3) -> f32 {
    let n1 = (e0 - v2).cross(e1 - v2);
    let n2 = (e1 - v3).cross(e0 - v3);
    if n1.length_squared() <= f32::EPSILON || n2.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    let n1 = n1.normalize();
    let n2 = n2.normalize();
    let cos = n1.dot(n2).clamp(-1.0, 1.0);
    let sign = if n1.cross(n2).dot(e1 - e0) >= 0.0 {
        1.0
    } else {
        -1.0
    };
    cos.acos() * sign
}

/// True if segment `pq` passes through triangle `abc`.
///
/// Scalar-triple-product formulation; the triangle is treated as
/// double-sided.
pub fn intersect_segment_triangle(p: Vec3, q: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(ac);

    let (p, q) = if (p - q).dot(n) < 0.0 { (q, p) } else { (p, q) };
    let qp = p - q;
    let d = qp.dot(n);
    if d <= f32::EPSILON {
        // Segment parallel to the triangle plane.
        return false;
    }

    let ap = p - a;
    let t = ap.dot(n);
    if t < 0.0 || t > d {
        return false;
    }

    let e = qp.cross(ap);
    let v = ac.dot(e);
    if v < 0.0 || v > d {
        return false;
    }
    let w = -ab.dot(e);
    if w < 0.0 || v + w > d {
        return false;
    }
    true
}
