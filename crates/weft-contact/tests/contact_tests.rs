//! Integration tests for weft-contact.

use std::sync::Arc;

use weft_arena::DataChunk;
use weft_contact::{
    broad, edge_collision, intersect, narrow, point_collision, Collider, ColliderShape,
    ColliderStore, ColliderTransform, ContactPipeline, PrimitiveKind, PrimitiveSet,
    SliceScheduler,
};
use weft_math::queries::closest_pt_point_triangle;
use weft_math::{Quat, Vec3};
use weft_mesh::generators::{chain_topology, quad_grid_topology};
use weft_mesh::ClothTopology;
use weft_solver::parameters::ColliderMode;
use weft_solver::{ClothParameters, Pipeline, PipelineConfig, SimulationContext};
use weft_types::{TeamId, VertexAttribute};

fn chain_ctx(count: usize, params: ClothParameters) -> (SimulationContext, TeamId) {
    let topo = Arc::new(chain_topology(count, 0.1).unwrap());
    let mut ctx = SimulationContext::new();
    let id = ctx
        .register_cloth(topo, params, Vec3::ZERO, Quat::IDENTITY, 1.0)
        .unwrap();
    (ctx, id)
}

/// Two congruent triangles stacked `gap` apart along Z, all movable.
fn stacked_triangles(gap: f32) -> (SimulationContext, TeamId) {
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.1, 0.0, 0.0),
        Vec3::new(0.05, 0.1, 0.0),
        Vec3::new(0.0, 0.0, gap),
        Vec3::new(0.1, 0.0, gap),
        Vec3::new(0.05, 0.1, gap),
    ];
    let triangles = vec![[0, 1, 2], [3, 4, 5]];
    let topo = Arc::new(
        ClothTopology::new(positions, triangles, vec![VertexAttribute::MOVE; 6], vec![None; 6])
            .unwrap(),
    );
    let mut ctx = SimulationContext::new();
    let id = ctx
        .register_cloth(
            topo,
            ClothParameters::draping_cloth(),
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
        )
        .unwrap();
    (ctx, id)
}

/// Build and refresh the three primitive sets of one team.
fn team_sets(
    ctx: &SimulationContext,
    id: TeamId,
) -> (PrimitiveSet, PrimitiveSet, PrimitiveSet, DataChunk) {
    let team = ctx.teams.get(id).unwrap();
    let chunk = ctx.particles.chunk(team.particle_handle).unwrap();
    let tangled = vec![false; team.topology.vertex_count()];
    let mut points = PrimitiveSet::build(PrimitiveKind::Point, &team.topology);
    let mut edges = PrimitiveSet::build(PrimitiveKind::Edge, &team.topology);
    let mut triangles = PrimitiveSet::build(PrimitiveKind::Triangle, &team.topology);
    for set in [&mut points, &mut edges, &mut triangles] {
        set.refresh(&ctx.particles, chunk, &team.parameters, 1.0, &tangled);
    }
    (points, edges, triangles, chunk)
}

fn sphere(center: Vec3, radius: f32) -> (ColliderShape, ColliderTransform) {
    (
        ColliderShape::Sphere { radius },
        ColliderTransform {
            position: center,
            ..Default::default()
        },
    )
}

// ─── Collider shapes ───────────────────────────────────────────

#[test]
fn sphere_point_distance_signs() {
    let mut store = ColliderStore::new();
    let (shape, transform) = sphere(Vec3::ZERO, 0.5);
    let id = store.register(TeamId(0), shape, transform).unwrap();
    let collider = store.get(id).unwrap();

    let (outside, n) = collider.point_distance(Vec3::new(1.0, 0.0, 0.0), 0.1);
    assert!((outside - 0.4).abs() < 1e-6);
    assert!((n - Vec3::X).length() < 1e-6);

    let (inside, _) = collider.point_distance(Vec3::new(0.2, 0.0, 0.0), 0.1);
    assert!((inside + 0.4).abs() < 1e-6);
}

#[test]
fn capsule_distance_interpolates_radii() {
    let mut store = ColliderStore::new();
    let id = store
        .register(
            TeamId(0),
            ColliderShape::Capsule {
                p0: Vec3::new(-1.0, 0.0, 0.0),
                p1: Vec3::new(1.0, 0.0, 0.0),
                radius0: 0.2,
                radius1: 0.4,
            },
            ColliderTransform::default(),
        )
        .unwrap();
    let collider = store.get(id).unwrap();

    let (mid, _) = collider.point_distance(Vec3::new(0.0, 1.0, 0.0), 0.0);
    assert!((mid - 0.7).abs() < 1e-5);
    let (end, _) = collider.point_distance(Vec3::new(1.0, 1.0, 0.0), 0.0);
    assert!((end - 0.6).abs() < 1e-5);
}

#[test]
fn plane_segment_picks_deeper_endpoint() {
    let mut store = ColliderStore::new();
    let id = store
        .register(TeamId(0), ColliderShape::Plane, ColliderTransform::default())
        .unwrap();
    let collider = store.get(id).unwrap();

    let a = Vec3::new(0.0, 0.5, 0.0);
    let b = Vec3::new(1.0, 0.2, 0.0);
    let (dist, n, ratio) = collider.segment_distance(a, b, 0.1);
    assert!((dist - 0.1).abs() < 1e-6);
    assert!((n - Vec3::Y).length() < 1e-6);
    assert_eq!(ratio, 1.0);
}

#[test]
fn collider_store_lifecycle() {
    let mut store = ColliderStore::new();
    let (shape, transform) = sphere(Vec3::ZERO, 0.1);
    let a = store.register(TeamId(1), shape, transform).unwrap();
    store.register(TeamId(1), shape, transform).unwrap();
    store.register(TeamId(2), shape, transform).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.team_colliders(TeamId(1)).count(), 2);

    let moved = ColliderTransform {
        position: Vec3::new(0.0, 1.0, 0.0),
        ..Default::default()
    };
    store.set_transform(a, moved).unwrap();
    let collider = store.get(a).unwrap();
    assert_eq!(collider.old_transform.position, Vec3::ZERO);
    assert_eq!(collider.transform.position, moved.position);

    store.remove_team(TeamId(1));
    assert_eq!(store.len(), 1);
    assert!(store.get(a).is_err());
}

#[test]
fn non_positive_radius_rejected() {
    let mut store = ColliderStore::new();
    let (shape, transform) = sphere(Vec3::ZERO, 0.0);
    assert!(store.register(TeamId(0), shape, transform).is_err());
}

// ─── Collider collision passes ─────────────────────────────────

#[test]
fn point_collision_pushes_particle_to_surface() {
    let (mut ctx, id) = chain_ctx(2, ClothParameters::default());
    let mut store = ColliderStore::new();
    let (shape, transform) = sphere(Vec3::new(0.0, -0.25, 0.0), 0.2);
    let cid = store.register(id, shape, transform).unwrap();

    let team = ctx.teams.get(id).unwrap();
    let chunk = ctx.particles.chunk(team.particle_handle).unwrap();
    let params = team.parameters.clone();
    let colliders: Vec<&Collider> = store.team_colliders(id).collect();
    point_collision::solve(&mut ctx.particles, chunk, &params, 1.0, &colliders);

    // The chain tip started 0.07 inside the inflated sphere.
    let tip = chunk.start + 1;
    let next = ctx.particles.next_pos.data();
    let (dist, _) = store.get(cid).unwrap().point_distance(next[tip], 0.02);
    assert!(dist.abs() < 1e-5, "tip still {dist} from the surface");
    assert!(
        (ctx.particles.collision_normal.data()[tip] - Vec3::Y).length() < 1e-5
    );
    assert!(ctx.particles.friction.data()[tip] > 0.0);

    // The fixed root is untouched.
    assert_eq!(ctx.particles.next_pos.data()[chunk.start], Vec3::ZERO);
}

#[test]
fn edge_collision_lifts_edge_out_of_plane() {
    let mut params = ClothParameters::default();
    params.collider_collision.mode = ColliderMode::Edge;
    let (mut ctx, id) = chain_ctx(3, params);
    let mut store = ColliderStore::new();
    store
        .register(
            id,
            ColliderShape::Plane,
            ColliderTransform {
                position: Vec3::new(0.0, -0.15, 0.0),
                ..Default::default()
            },
        )
        .unwrap();

    let team = ctx.teams.get(id).unwrap();
    let chunk = ctx.particles.chunk(team.particle_handle).unwrap();
    let params = team.parameters.clone();
    let topology = team.topology.clone();
    let colliders: Vec<&Collider> = store.team_colliders(id).collect();
    edge_collision::solve(
        &ctx.particles,
        chunk,
        &topology,
        &params,
        1.0,
        &colliders,
        &ctx.accumulate,
        &ctx.friction_max,
        &ctx.normal_sum,
    );
    edge_collision::aggregate(
        &mut ctx.particles,
        chunk,
        &ctx.accumulate,
        &ctx.friction_max,
        &ctx.normal_sum,
    );

    let tip = chunk.start + 2;
    let next = ctx.particles.next_pos.data();
    assert!(next[tip].y > -0.16, "tip at {} was not lifted", next[tip].y);
    assert!(ctx.particles.friction.data()[tip] > 0.0);
}

// ─── Scheduler ─────────────────────────────────────────────────

#[test]
fn scheduler_due_frames() {
    assert!(SliceScheduler::new(0, 0).due(7));
    assert!(SliceScheduler::new(1, 5).due(7));

    let s = SliceScheduler::new(8, 3);
    assert!(s.due(3));
    assert!(s.due(11));
    assert!(!s.due(4));
    assert!(!s.due(10));

    // Offsets beyond the period wrap.
    assert!(SliceScheduler::new(8, 11).due(3));
}

// ─── Primitives ────────────────────────────────────────────────

#[test]
fn primitive_sets_from_grid() {
    let topo = quad_grid_topology(2, 2, 0.2, 0.2).unwrap();
    let points = PrimitiveSet::build(PrimitiveKind::Point, &topo);
    let edges = PrimitiveSet::build(PrimitiveKind::Edge, &topo);
    let triangles = PrimitiveSet::build(PrimitiveKind::Triangle, &topo);

    assert_eq!(points.len(), 9);
    assert_eq!(edges.len(), topo.edges.len());
    assert_eq!(triangles.len(), 8);

    // Top-row edges are fully fixed, anything reaching row one is not.
    for (i, prim) in edges.primitives.iter().enumerate() {
        let fixed = prim.vertices[..2]
            .iter()
            .all(|&v| topo.attributes[v as usize].is_fixed());
        assert_eq!(prim.flags.all_fixed(), fixed, "edge {i}");
    }
    assert!(edges.primitives.iter().any(|p| p.flags.all_fixed()));
    assert!(edges.primitives.iter().any(|p| !p.flags.all_fixed()));
}

#[test]
fn refresh_sorts_and_inflates() {
    let (ctx, id) = stacked_triangles(0.004);
    let (_, edges, _, _) = team_sets(&ctx, id);

    for prim in &edges.primitives {
        assert!((prim.thickness - 0.005).abs() < 1e-6);
    }
    for w in edges.sorted.windows(2) {
        assert!(w[0].min <= w[1].min);
    }
    for entry in &edges.sorted {
        let prim = &edges.primitives[entry.index as usize];
        let (min, max) = prim.aabb.interval(1);
        assert_eq!(entry.min, min);
        assert_eq!(entry.max, max);
    }
}

// ─── Broad phase ───────────────────────────────────────────────

#[test]
fn broad_phase_pairs_stacked_triangles() {
    let (ctx, id) = stacked_triangles(0.004);
    let (points, edges, triangles, chunk) = team_sets(&ctx, id);
    let team = ctx.teams.get(id).unwrap();

    let mut edge_edge = Vec::new();
    broad::collect_edge_edge(
        &edges,
        chunk,
        &edges,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut edge_edge,
    );
    // Every edge of one triangle against every edge of the other, once.
    // Edges sharing a vertex never pair.
    assert_eq!(edge_edge.len(), 9);
    assert!(edge_edge.iter().all(|c| c.enabled));
    for c in &edge_edge {
        let a = &edges.primitives[c.a as usize];
        let b = &edges.primitives[c.b as usize];
        assert!(!a.shares_vertex(2, b, 2));
        assert!((c.thickness - 0.005).abs() < 1e-6);
    }

    let mut point_triangle = Vec::new();
    broad::collect_point_triangle(
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut point_triangle,
    );
    // Three vertices of each triangle against the opposite face.
    assert_eq!(point_triangle.len(), 6);
    assert!(point_triangle.iter().all(|c| c.enabled));
}

#[test]
fn broad_phase_pairs_survive_reversed_sort_order() {
    // Shifting the second triangle down on the sort axis makes its
    // intervals start before the lower-indexed ones; the pair counts
    // must not depend on that ordering.
    let pair_counts = |shift: f32| {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(0.05, 0.1, 0.0),
            Vec3::new(0.0, shift, 0.004),
            Vec3::new(0.1, shift, 0.004),
            Vec3::new(0.05, 0.1 + shift, 0.004),
        ];
        let tris = vec![[0, 1, 2], [3, 4, 5]];
        let topo = Arc::new(
            ClothTopology::new(positions, tris, vec![VertexAttribute::MOVE; 6], vec![None; 6])
                .unwrap(),
        );
        let mut ctx = SimulationContext::new();
        let id = ctx
            .register_cloth(
                topo,
                ClothParameters::draping_cloth(),
                Vec3::ZERO,
                Quat::IDENTITY,
                1.0,
            )
            .unwrap();
        let (points, edges, triangles, chunk) = team_sets(&ctx, id);
        let team = ctx.teams.get(id).unwrap();

        let mut edge_edge = Vec::new();
        broad::collect_edge_edge(
            &edges,
            chunk,
            &edges,
            chunk,
            &ctx.particles,
            &team.topology,
            true,
            &mut edge_edge,
        );
        let mut point_triangle = Vec::new();
        broad::collect_point_triangle(
            &points,
            chunk,
            &triangles,
            chunk,
            &ctx.particles,
            &team.topology,
            true,
            &mut point_triangle,
        );
        (edge_edge.len(), point_triangle.len())
    };

    assert_eq!(pair_counts(0.002), (9, 6));
    assert_eq!(pair_counts(-0.002), (9, 6));
}

#[test]
fn broad_phase_ignores_separated_triangles() {
    let (ctx, id) = stacked_triangles(0.05);
    let (points, edges, triangles, chunk) = team_sets(&ctx, id);
    let team = ctx.teams.get(id).unwrap();

    let mut edge_edge = Vec::new();
    broad::collect_edge_edge(
        &edges,
        chunk,
        &edges,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut edge_edge,
    );
    let mut point_triangle = Vec::new();
    broad::collect_point_triangle(
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut point_triangle,
    );
    assert!(edge_edge.is_empty());
    assert!(point_triangle.is_empty());
}

#[test]
fn fast_refresh_is_idempotent_on_still_positions() {
    let (ctx, id) = stacked_triangles(0.004);
    let (points, edges, triangles, chunk) = team_sets(&ctx, id);
    let team = ctx.teams.get(id).unwrap();

    let mut edge_edge = Vec::new();
    broad::collect_edge_edge(
        &edges,
        chunk,
        &edges,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut edge_edge,
    );
    let mut point_triangle = Vec::new();
    broad::collect_point_triangle(
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut point_triangle,
    );

    let ee_before: Vec<bool> = edge_edge.iter().map(|c| c.enabled).collect();
    let pt_before: Vec<bool> = point_triangle.iter().map(|c| c.enabled).collect();

    narrow::refresh_edge_edge(&mut edge_edge, &edges, chunk, &edges, chunk, &ctx.particles);
    narrow::refresh_point_triangle(
        &mut point_triangle,
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
    );

    let ee_after: Vec<bool> = edge_edge.iter().map(|c| c.enabled).collect();
    let pt_after: Vec<bool> = point_triangle.iter().map(|c| c.enabled).collect();
    assert_eq!(ee_before, ee_after);
    assert_eq!(pt_before, pt_after);
}

// ─── Narrow phase ──────────────────────────────────────────────

#[test]
fn self_collision_restores_separation() {
    let (mut ctx, id) = stacked_triangles(0.002);
    let (points, edges, triangles, chunk) = team_sets(&ctx, id);
    let team = ctx.teams.get(id).unwrap();
    let cloth_mass = team.parameters.self_collision.cloth_mass;

    let mut edge_edge = Vec::new();
    broad::collect_edge_edge(
        &edges,
        chunk,
        &edges,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut edge_edge,
    );
    let mut point_triangle = Vec::new();
    broad::collect_point_triangle(
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut point_triangle,
    );
    assert!(!point_triangle.is_empty());

    let side_e = narrow::SolveSide {
        set: &edges,
        chunk,
        cloth_mass,
    };
    let side_p = narrow::SolveSide {
        set: &points,
        chunk,
        cloth_mass,
    };
    let side_t = narrow::SolveSide {
        set: &triangles,
        chunk,
        cloth_mass,
    };
    for _ in 0..3 {
        narrow::solve(
            &mut ctx.particles,
            &edge_edge,
            (&side_e, &side_e),
            &point_triangle,
            (&side_p, &side_t),
            &ctx.accumulate,
        );
    }

    // Every admitted point/triangle pair ends at least surface thickness
    // apart, within solver tolerance.
    let next = ctx.particles.next_pos.data();
    for c in &point_triangle {
        let p = &points.primitives[c.point as usize];
        let t = &triangles.primitives[c.triangle as usize];
        let pi = chunk.start + p.vertices[0] as usize;
        let (t0, t1, t2) = (
            chunk.start + t.vertices[0] as usize,
            chunk.start + t.vertices[1] as usize,
            chunk.start + t.vertices[2] as usize,
        );
        let (cp, _) = closest_pt_point_triangle(next[pi], next[t0], next[t1], next[t2]);
        let dist = (next[pi] - cp).length();
        assert!(
            dist >= c.thickness - 5e-4,
            "pair left at {dist}, thickness {}",
            c.thickness
        );
    }
}

// ─── Entanglement ──────────────────────────────────────────────

#[test]
fn intersect_flags_crossing_and_mutes_primitives() {
    // A horizontal triangle pierced by an edge of a vertical one.
    let positions = vec![
        Vec3::new(-0.2, 0.0, -0.2),
        Vec3::new(0.2, 0.0, -0.2),
        Vec3::new(0.0, 0.0, 0.2),
        Vec3::new(0.0, -0.1, 0.0),
        Vec3::new(0.0, 0.1, 0.0),
        Vec3::new(0.15, 0.1, 0.0),
    ];
    let triangles = vec![[0, 1, 2], [3, 4, 5]];
    let topo = Arc::new(
        ClothTopology::new(positions, triangles, vec![VertexAttribute::MOVE; 6], vec![None; 6])
            .unwrap(),
    );
    let mut ctx = SimulationContext::new();
    let id = ctx
        .register_cloth(
            topo,
            ClothParameters::draping_cloth(),
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
        )
        .unwrap();
    let (points, mut edges, mut triangles, chunk) = team_sets(&ctx, id);
    let team = ctx.teams.get(id).unwrap();

    // An interpenetrating triangle pair always produces two edge-face
    // crossings, so every participant ends up flagged.
    let mut tangled = vec![false; 6];
    let count = intersect::detect(&edges, &triangles, chunk, &ctx.particles, &mut tangled);
    assert_eq!(count, 6);
    assert!(tangled.iter().all(|&t| t));

    // Entangled primitives drop out of the next broad phase.
    edges.refresh(&ctx.particles, chunk, &team.parameters, 1.0, &tangled);
    triangles.refresh(&ctx.particles, chunk, &team.parameters, 1.0, &tangled);
    let mut point_triangle = Vec::new();
    broad::collect_point_triangle(
        &points,
        chunk,
        &triangles,
        chunk,
        &ctx.particles,
        &team.topology,
        true,
        &mut point_triangle,
    );
    assert!(point_triangle.is_empty());
}

// ─── Contact pipeline ──────────────────────────────────────────

#[test]
fn state_allocated_per_flags_and_freed_on_removal() {
    let topo = Arc::new(quad_grid_topology(2, 2, 0.2, 0.2).unwrap());
    let mut ctx = SimulationContext::new();
    let mut contacts = ContactPipeline::new();
    let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();

    let plain = ctx
        .register_cloth(
            topo.clone(),
            ClothParameters::default(),
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
        )
        .unwrap();
    let draping = ctx
        .register_cloth(
            topo,
            ClothParameters::draping_cloth(),
            Vec3::new(1.0, 0.0, 0.0),
            Quat::IDENTITY,
            1.0,
        )
        .unwrap();
    let (shape, transform) = sphere(Vec3::new(1.0, -0.3, 0.0), 0.1);
    contacts.colliders.register(draping, shape, transform).unwrap();

    pipeline.update(&mut ctx, &mut contacts, 1.0 / 60.0).unwrap();
    assert_eq!(contacts.state_count(), 1);
    assert_eq!(contacts.colliders.len(), 1);

    ctx.remove_cloth(draping).unwrap();
    pipeline.update(&mut ctx, &mut contacts, 1.0 / 60.0).unwrap();
    assert_eq!(contacts.state_count(), 0);
    assert_eq!(contacts.colliders.len(), 0);
    assert!(ctx.teams.get(plain).is_ok());
}

#[test]
fn cloth_drapes_over_sphere_without_sinking() {
    let topo = Arc::new(quad_grid_topology(4, 4, 0.4, 0.4).unwrap());
    let mut ctx = SimulationContext::new();
    let id = ctx
        .register_cloth(
            topo,
            ClothParameters::default(),
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
        )
        .unwrap();

    let mut contacts = ContactPipeline::new();
    let (shape, transform) = sphere(Vec3::new(0.2, -0.45, 0.0), 0.1);
    let cid = contacts.colliders.register(id, shape, transform).unwrap();

    let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    for _ in 0..120 {
        let report = pipeline.update(&mut ctx, &mut contacts, 1.0 / 60.0).unwrap();
        assert!(report.steps >= 1);
    }

    // The bottom rows rest on the sphere instead of passing through.
    let team = ctx.teams.get(id).unwrap();
    let chunk = ctx.particles.chunk(team.particle_handle).unwrap();
    let next = ctx.particles.next_pos.data();
    let collider = contacts.colliders.get(cid).unwrap();
    for i in chunk.range() {
        let (dist, _) = collider.point_distance(next[i], 0.02);
        assert!(dist > -0.01, "particle {i} sank {dist} into the sphere");
    }
    assert_eq!(team.intersect_count, 0);
}
