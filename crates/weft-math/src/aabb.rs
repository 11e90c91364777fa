//! Axis-aligned bounding boxes.
//!
//! The collision broad phases work on swept boxes: the union of a
//! primitive's previous and predicted positions, expanded by its contact
//! thickness.

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box containing a single point.
    pub fn from_point(p: Vec3) -> Self {
        Aabb { min: p, max: p }
    }

    /// Box containing two points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Aabb {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Grow to contain `p`.
    pub fn encapsulate(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow to contain another box.
    pub fn union(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Expand symmetrically by `margin` on every axis.
    pub fn expand(&mut self, margin: f32) {
        self.min -= Vec3::splat(margin);
        self.max += Vec3::splat(margin);
    }

    /// Interval on one axis (0 = x, 1 = y, 2 = z) as `(min, max)`.
    pub fn interval(&self, axis: usize) -> (f32, f32) {
        match axis {
            0 => (self.min.x, self.max.x),
            1 => (self.min.y, self.max.y),
            _ => (self.min.z, self.max.z),
        }
    }

    /// True if the boxes overlap on all three axes.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Box center.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
