//! Integration tests for weft-types.

use weft_types::{ColliderId, ParticleId, TeamId, VertexAttribute, WeftError, WeftResult};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn particle_id_index() {
    let id = ParticleId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn ids_are_not_interchangeable() {
    // Compile-time guarantee: these types are distinct.
    let _p = ParticleId(0);
    let _t = TeamId(0);
    let _c = ColliderId(0);
}

#[test]
fn ids_are_serializable() {
    let id = ParticleId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: ParticleId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

#[test]
fn ids_round_trip_usize() {
    assert_eq!(ParticleId::from(42usize).index(), 42);
    assert_eq!(TeamId::from(7usize).index(), 7);
}

// ─── Attribute Tests ───────────────────────────────────────────

#[test]
fn attribute_predicates() {
    assert!(VertexAttribute::INVALID.is_invalid());
    assert!(VertexAttribute::FIXED.is_fixed());
    assert!(VertexAttribute::FIXED.is_pinned());
    assert!(VertexAttribute::MOVE.is_movable());
    assert!(!VertexAttribute::MOVE.is_pinned());
    assert!(VertexAttribute::MOVE.is_valid());
}

#[test]
fn attribute_join_prefers_more_restrictive() {
    let fixed = VertexAttribute::FIXED;
    let movable = VertexAttribute::MOVE;
    assert_eq!(fixed.join(movable), fixed);
    assert_eq!(movable.join(VertexAttribute::INVALID), VertexAttribute::INVALID);
}

#[test]
fn attribute_motion_flag_is_orthogonal() {
    let a = VertexAttribute::MOVE.without_motion();
    assert!(a.is_movable());
    assert!(!a.uses_motion());
    assert!(VertexAttribute::MOVE.uses_motion());
}

#[test]
fn attribute_bits_round_trip() {
    let a = VertexAttribute::FIXED.without_motion();
    assert_eq!(VertexAttribute::from_bits(a.bits()), a);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = WeftError::InvalidTopology("triangle index 12 out of bounds".into());
    assert!(err.to_string().contains("triangle index 12"));
}

#[test]
fn io_error_converts() {
    fn read() -> WeftResult<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))?;
        Ok(())
    }
    assert!(matches!(read(), Err(WeftError::Io(_))));
}
