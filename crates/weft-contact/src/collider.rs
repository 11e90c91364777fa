//! Analytic collider shapes and the collider store.
//!
//! Colliders are world-space obstacles assigned to one team. Every query
//! returns a signed distance and a contact normal even when separated,
//! because the friction falloff needs the distance inside one particle
//! radius of the surface, not just the overlap.

use serde::{Deserialize, Serialize};
use tracing::debug;

use weft_math::queries::{closest_pt_point_segment_ratio, closest_pt_segment_segment};
use weft_math::{Quat, Vec3};
use weft_types::constants::EPSILON;
use weft_types::{ColliderId, TeamId, WeftError, WeftResult};

/// Shape of one collider, in collider-local space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere centered at the collider origin.
    Sphere { radius: f32 },
    /// Capsule between two local endpoints with per-end radii. The axis
    /// and pivot variants of authoring tools all reduce to this form.
    Capsule {
        p0: Vec3,
        p1: Vec3,
        radius0: f32,
        radius1: f32,
    },
    /// Infinite plane through the collider origin, local +Y normal.
    Plane,
}

impl ColliderShape {
    fn validate(&self) -> WeftResult<()> {
        let ok = match *self {
            ColliderShape::Sphere { radius } => radius > 0.0,
            ColliderShape::Capsule {
                radius0, radius1, ..
            } => radius0 > 0.0 && radius1 > 0.0,
            ColliderShape::Plane => true,
        };
        if ok {
            Ok(())
        } else {
            Err(WeftError::InvalidConfig(
                "collider radius must be positive".into(),
            ))
        }
    }
}

/// World transform of a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for ColliderTransform {
    fn default() -> Self {
        ColliderTransform {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

/// One collider instance.
#[derive(Debug, Clone)]
pub struct Collider {
    pub id: ColliderId,
    pub team: TeamId,
    pub shape: ColliderShape,
    pub transform: ColliderTransform,
    /// Transform at the previous frame.
    pub old_transform: ColliderTransform,
}

impl Collider {
    /// Signed surface distance and outward normal for a point of radius
    /// `cfr`. Negative distance means penetration.
    pub fn point_distance(&self, p: Vec3, cfr: f32) -> (f32, Vec3) {
        let t = &self.transform;
        match self.shape {
            ColliderShape::Sphere { radius } => {
                let v = p - t.position;
                let len = v.length();
                let n = if len > EPSILON { v / len } else { Vec3::Y };
                (len - (radius * t.scale + cfr), n)
            }
            ColliderShape::Capsule {
                p0,
                p1,
                radius0,
                radius1,
            } => {
                let a = t.position + t.rotation * (p0 * t.scale);
                let b = t.position + t.rotation * (p1 * t.scale);
                let s = closest_pt_point_segment_ratio(p, a, b);
                let c = a.lerp(b, s);
                let r = (radius0 + (radius1 - radius0) * s) * t.scale;
                let v = p - c;
                let len = v.length();
                let n = if len > EPSILON { v / len } else { Vec3::Y };
                (len - (r + cfr), n)
            }
            ColliderShape::Plane => {
                let n = t.rotation * Vec3::Y;
                (n.dot(p - t.position) - cfr, n)
            }
        }
    }

    /// Signed surface distance for segment `ab` of radius `cfr`.
    ///
    /// Returns `(distance, normal, ratio)` where `ratio` locates the
    /// closest point on the segment.
    pub fn segment_distance(&self, a: Vec3, b: Vec3, cfr: f32) -> (f32, Vec3, f32) {
        let t = &self.transform;
        match self.shape {
            ColliderShape::Sphere { .. } => {
                let s = closest_pt_point_segment_ratio(t.position, a, b);
                let (d, n) = self.point_distance(a.lerp(b, s), cfr);
                (d, n, s)
            }
            ColliderShape::Capsule { p0, p1, .. } => {
                let ca = t.position + t.rotation * (p0 * t.scale);
                let cb = t.position + t.rotation * (p1 * t.scale);
                let (s, _, c1, _) = closest_pt_segment_segment(a, b, ca, cb);
                let (d, n) = self.point_distance(c1, cfr);
                (d, n, s)
            }
            ColliderShape::Plane => {
                let n = t.rotation * Vec3::Y;
                let da = n.dot(a - t.position);
                let db = n.dot(b - t.position);
                if da <= db {
                    (da - cfr, n, 0.0)
                } else {
                    (db - cfr, n, 1.0)
                }
            }
        }
    }
}

/// Slot table of registered colliders.
#[derive(Debug, Default)]
pub struct ColliderStore {
    colliders: Vec<Option<Collider>>,
}

impl ColliderStore {
    pub fn new() -> Self {
        ColliderStore::default()
    }

    /// Register a collider for one team.
    pub fn register(
        &mut self,
        team: TeamId,
        shape: ColliderShape,
        transform: ColliderTransform,
    ) -> WeftResult<ColliderId> {
        shape.validate()?;
        let slot = match self.colliders.iter().position(|c| c.is_none()) {
            Some(s) => s,
            None => {
                self.colliders.push(None);
                self.colliders.len() - 1
            }
        };
        let id = ColliderId(slot as u32);
        self.colliders[slot] = Some(Collider {
            id,
            team,
            shape,
            transform,
            old_transform: transform,
        });
        debug!(collider = id.0, team = team.0, "collider registered");
        Ok(id)
    }

    /// Supply the new frame transform; the previous one is kept for swept
    /// queries.
    pub fn set_transform(
        &mut self,
        id: ColliderId,
        transform: ColliderTransform,
    ) -> WeftResult<()> {
        let collider = self.get_mut(id)?;
        collider.old_transform = collider.transform;
        collider.transform = transform;
        Ok(())
    }

    pub fn get(&self, id: ColliderId) -> WeftResult<&Collider> {
        self.colliders
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| WeftError::InvalidConfig(format!("unknown collider {}", id.0)))
    }

    pub fn get_mut(&mut self, id: ColliderId) -> WeftResult<&mut Collider> {
        self.colliders
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| WeftError::InvalidConfig(format!("unknown collider {}", id.0)))
    }

    /// Remove one collider.
    pub fn remove(&mut self, id: ColliderId) -> WeftResult<()> {
        self.get(id)?;
        self.colliders[id.index()] = None;
        Ok(())
    }

    /// Remove every collider assigned to `team`.
    pub fn remove_team(&mut self, team: TeamId) {
        for slot in self.colliders.iter_mut() {
            if slot.as_ref().is_some_and(|c| c.team == team) {
                *slot = None;
            }
        }
    }

    /// Colliders assigned to one team.
    pub fn team_colliders(&self, team: TeamId) -> impl Iterator<Item = &Collider> {
        self.colliders
            .iter()
            .flatten()
            .filter(move |c| c.team == team)
    }

    pub fn len(&self) -> usize {
        self.colliders.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
