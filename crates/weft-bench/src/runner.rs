//! Executes scenarios through the full pipeline and collects metrics.

use std::time::Instant;

use weft_contact::ContactPipeline;
use weft_math::{Quat, Vec3};
use weft_solver::{Pipeline, SimulationContext};
use weft_telemetry::{EventBus, EventKind, SimulationEvent};
use weft_types::WeftResult;

use crate::metrics::BenchMetrics;
use crate::scenarios::Scenario;

/// Runs benchmark scenarios.
pub struct BenchRunner;

impl BenchRunner {
    /// Run one scenario, emitting frame events to `bus`.
    pub fn run(scenario: &Scenario, bus: &mut EventBus) -> WeftResult<BenchMetrics> {
        let mut ctx = SimulationContext::new();
        let id = ctx.register_cloth(
            scenario.topology.clone(),
            scenario.parameters.clone(),
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
        )?;

        let mut contacts = ContactPipeline::new();
        for &(shape, transform) in &scenario.colliders {
            contacts.colliders.register(id, shape, transform)?;
        }
        let mut pipeline = Pipeline::new(scenario.config.clone())?;

        let rest: Vec<Vec3> = {
            let team = ctx.teams.get(id)?;
            let chunk = ctx.particles.chunk(team.particle_handle)?;
            ctx.particles.next_pos.data()[chunk.range()].to_vec()
        };

        let mut frame_times: Vec<f64> = Vec::with_capacity(scenario.frames as usize);
        let total_start = Instant::now();

        for _ in 0..scenario.frames {
            let sim_time = pipeline.sim_time();
            let frame_start = Instant::now();
            let report = pipeline.update(&mut ctx, &mut contacts, scenario.frame_dt)?;
            let wall_time = frame_start.elapsed().as_secs_f64();
            bus.emit(SimulationEvent::new(
                pipeline.step_count(),
                EventKind::FrameBegin {
                    steps: report.steps,
                    sim_time,
                },
            ));
            bus.emit(SimulationEvent::new(
                pipeline.step_count(),
                EventKind::FrameEnd { wall_time },
            ));
            frame_times.push(wall_time);
        }

        let total_wall_time = total_start.elapsed().as_secs_f64();
        bus.flush();

        let team = ctx.teams.get(id)?;
        let chunk = ctx.particles.chunk(team.particle_handle)?;
        let next = ctx.particles.next_pos.data();
        let velocity = ctx.particles.velocity.data();

        let final_max_speed = chunk
            .range()
            .map(|i| velocity[i].length())
            .fold(0.0f32, f32::max);
        let max_displacement = chunk
            .range()
            .map(|i| (next[i] - rest[i - chunk.start]).length())
            .fold(0.0f32, f32::max);

        let avg = if frame_times.is_empty() {
            0.0
        } else {
            frame_times.iter().sum::<f64>() / frame_times.len() as f64
        };
        let min = frame_times.iter().copied().fold(f64::MAX, f64::min);
        let max = frame_times.iter().copied().fold(0.0, f64::max);

        Ok(BenchMetrics {
            scenario: scenario.kind.name().to_string(),
            particle_count: scenario.topology.vertex_count(),
            triangle_count: scenario.topology.triangles.len(),
            frames: scenario.frames,
            steps: pipeline.step_count(),
            total_wall_time,
            avg_frame_time: avg,
            min_frame_time: min,
            max_frame_time: max,
            final_max_speed,
            max_displacement,
        })
    }

    /// Run every scenario in order.
    pub fn run_all(bus: &mut EventBus) -> WeftResult<Vec<BenchMetrics>> {
        use crate::scenarios::ScenarioKind;
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let scenario = Scenario::from_kind(kind)?;
            results.push(Self::run(&scenario, bus)?);
        }
        Ok(results)
    }
}
