//! Integration tests for weft-bench.

use std::sync::Arc;

use weft_bench::{BenchMetrics, BenchRunner, Scenario, ScenarioKind};
use weft_mesh::generators::quad_grid_topology;
use weft_solver::parameters::SelfCollisionMode;
use weft_solver::{ClothParameters, PipelineConfig};
use weft_telemetry::{EventBus, EventKind, EventSink, SimulationEvent};

/// Small, fast variant of the hanging sheet for runner tests.
fn small_sheet(frames: u32) -> Scenario {
    Scenario {
        kind: ScenarioKind::HangingSheet,
        topology: Arc::new(quad_grid_topology(4, 4, 0.4, 0.4).unwrap()),
        parameters: ClothParameters::default(),
        config: PipelineConfig::default(),
        colliders: Vec::new(),
        frames,
        frame_dt: 1.0 / 60.0,
    }
}

struct Tally {
    counts: std::sync::Arc<std::sync::Mutex<(u32, u32)>>,
}

impl EventSink for Tally {
    fn handle(&mut self, event: &SimulationEvent) {
        let mut counts = self.counts.lock().unwrap();
        match event.kind {
            EventKind::FrameBegin { .. } => counts.0 += 1,
            EventKind::FrameEnd { .. } => counts.1 += 1,
            _ => {}
        }
    }

    fn name(&self) -> &str {
        "tally"
    }
}

// ─── Scenarios ─────────────────────────────────────────────────

#[test]
fn canonical_scenarios_build() {
    assert_eq!(ScenarioKind::all().len(), 3);
    for &kind in ScenarioKind::all() {
        let scenario = Scenario::from_kind(kind).unwrap();
        assert_eq!(scenario.kind, kind);
        assert!(scenario.frames > 0);
        assert!(scenario.topology.vertex_count() > 0);
        assert!(scenario.parameters.validate().is_ok());
    }

    assert_eq!(ScenarioKind::HangingSheet.name(), "hanging_sheet");
    let drape = Scenario::collider_drape().unwrap();
    assert_eq!(drape.colliders.len(), 1);
    let fold = Scenario::self_fold().unwrap();
    assert_eq!(
        fold.parameters.self_collision.self_mode,
        SelfCollisionMode::FullMesh
    );
}

// ─── Metrics ───────────────────────────────────────────────────

#[test]
fn csv_shape_matches_header() {
    let metrics = BenchMetrics {
        scenario: "hanging_sheet".into(),
        particle_count: 441,
        triangle_count: 800,
        frames: 120,
        steps: 180,
        total_wall_time: 0.5,
        avg_frame_time: 0.004,
        min_frame_time: 0.003,
        max_frame_time: 0.009,
        final_max_speed: 0.01,
        max_displacement: 0.4,
    };
    let header_cols = BenchMetrics::csv_header().split(',').count();
    let row_cols = metrics.to_csv_row().split(',').count();
    assert_eq!(header_cols, row_cols);

    let csv = BenchMetrics::to_csv(&[metrics.clone(), metrics]);
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("scenario,"));
}

// ─── Runner ────────────────────────────────────────────────────

#[test]
fn runner_collects_metrics_and_events() {
    let scenario = small_sheet(30);
    let mut bus = EventBus::new();
    let counts = std::sync::Arc::new(std::sync::Mutex::new((0u32, 0u32)));
    bus.add_sink(Box::new(Tally {
        counts: counts.clone(),
    }));

    let metrics = BenchRunner::run(&scenario, &mut bus).unwrap();
    assert_eq!(*counts.lock().unwrap(), (30, 30));
    assert_eq!(metrics.scenario, "hanging_sheet");
    assert_eq!(metrics.frames, 30);
    assert_eq!(metrics.particle_count, 25);
    assert!(metrics.steps > 0);
    assert!(metrics.total_wall_time > 0.0);
    assert!(metrics.avg_frame_time > 0.0);
    assert!(metrics.min_frame_time <= metrics.max_frame_time);

    // The sheet starts at rest in its hanging pose, so it barely moves.
    assert!(metrics.max_displacement < 0.2);
    assert!(metrics.final_max_speed.is_finite());
}
