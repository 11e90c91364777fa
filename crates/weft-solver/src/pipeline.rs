//! The step pipeline.
//!
//! Runs the simulation at a fixed internal frequency: each host frame is
//! sliced into up to `max_steps_per_frame` sub-steps, team transforms are
//! interpolated per sub-step, and every sub-step runs the same total
//! stage order:
//!
//! begin → tether → distance → angle → bending → collider collision →
//! distance (second pass) → motion → spring → self collision → end
//!
//! The second distance pass re-tightens edges the collision push-outs
//! stretched. Collision stages are behind the [`ContactStage`] seam so
//! the solver crate stays free of collision geometry; [`NoContacts`] is
//! the pass-through used by solver-only tests.

use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_types::constants::{
    DEFAULT_MAX_STEPS_PER_FRAME, DEFAULT_SIMULATION_FREQUENCY, SIMULATION_FREQUENCY_RANGE,
};
use weft_types::{TeamId, WeftError, WeftResult};

use crate::context::SimulationContext;
use crate::parameters::TeleportMode;
use crate::{angle, bending, distance, integrate, motion, spring, tether};

/// Collision stages plugged into the pipeline.
///
/// All methods default to no-ops so a contact-free solver run needs no
/// stub code beyond [`NoContacts`].
pub trait ContactStage {
    /// Called once per host frame, before any sub-step. Broad-phase work
    /// that must not repeat per sub-step belongs here.
    fn frame_begin(&mut self, _ctx: &mut SimulationContext) {}

    /// Collider collision for every running team.
    fn collider_collision(&mut self, _ctx: &mut SimulationContext, _dt: f32) {}

    /// Self collision for every running team. `update_index` is the
    /// sub-step number within the frame (0 = fresh broad phase).
    fn self_collision(
        &mut self,
        _ctx: &mut SimulationContext,
        _update_index: u32,
        _step_count: u32,
        _dt: f32,
    ) {
    }

    /// A team was freed; drop any per-team collision state.
    fn team_removed(&mut self, _id: TeamId) {}
}

/// Contact seam pass-through.
pub struct NoContacts;

impl ContactStage for NoContacts {}

/// Fixed-rate stepping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Internal simulation frequency (Hz).
    pub frequency: u32,
    /// Sub-step cap per host frame.
    pub max_steps_per_frame: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            frequency: DEFAULT_SIMULATION_FREQUENCY,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
        }
    }
}

impl PipelineConfig {
    /// Validate ranges.
    pub fn validate(&self) -> WeftResult<()> {
        let (lo, hi) = SIMULATION_FREQUENCY_RANGE;
        if !(lo..=hi).contains(&self.frequency) {
            return Err(WeftError::InvalidConfig(format!(
                "frequency {} outside [{}, {}]",
                self.frequency, lo, hi
            )));
        }
        if !(1..=5).contains(&self.max_steps_per_frame) {
            return Err(WeftError::InvalidConfig(format!(
                "max_steps_per_frame {} outside [1, 5]",
                self.max_steps_per_frame
            )));
        }
        Ok(())
    }

    /// High-rate preset for slow-motion captures.
    pub fn high_quality() -> Self {
        PipelineConfig {
            frequency: 150,
            max_steps_per_frame: 5,
        }
    }
}

/// Report of one host-frame update.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameReport {
    /// Sub-steps executed this frame.
    pub steps: u32,
    /// Simulation time after the frame (s).
    pub sim_time: f32,
}

/// Fixed-rate step driver.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    time_accumulator: f32,
    sim_time: f32,
    step_count: u32,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> WeftResult<Self> {
        config.validate()?;
        Ok(Pipeline {
            config,
            time_accumulator: 0.0,
            sim_time: 0.0,
            step_count: 0,
        })
    }

    /// Internal step length (s).
    pub fn step_dt(&self) -> f32 {
        1.0 / self.config.frequency as f32
    }

    /// Total sub-steps executed so far.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Simulation time advanced so far (s).
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Advance one host frame of `frame_dt` seconds.
    pub fn update(
        &mut self,
        ctx: &mut SimulationContext,
        contacts: &mut dyn ContactStage,
        frame_dt: f32,
    ) -> WeftResult<FrameReport> {
        // Free teams that finished exiting during the previous frame.
        for id in ctx.teams.exiting_ids() {
            ctx.teams.unregister(&mut ctx.particles, id)?;
            contacts.team_removed(id);
        }

        self.apply_teleports(ctx)?;

        let dt = self.step_dt();
        self.time_accumulator += frame_dt.max(0.0);
        let mut steps = (self.time_accumulator / dt) as u32;
        if steps > self.config.max_steps_per_frame {
            debug!(
                requested = steps,
                cap = self.config.max_steps_per_frame,
                "sub-step cap hit, dropping simulation time"
            );
            // Time beyond the cap is dropped, not deferred; otherwise a
            // slow frame snowballs.
            self.time_accumulator = 0.0;
            steps = self.config.max_steps_per_frame;
        } else {
            self.time_accumulator -= steps as f32 * dt;
        }
        if steps == 0 {
            return Ok(FrameReport {
                steps: 0,
                sim_time: self.sim_time,
            });
        }

        contacts.frame_begin(ctx);

        for update_index in 0..steps {
            let interpolation = (update_index + 1) as f32 / steps as f32;
            self.run_step(ctx, contacts, update_index, interpolation, dt);
            self.sim_time += dt;
            self.step_count += 1;
        }

        Ok(FrameReport {
            steps,
            sim_time: self.sim_time,
        })
    }

    fn run_step(
        &mut self,
        ctx: &mut SimulationContext,
        contacts: &mut dyn ContactStage,
        update_index: u32,
        interpolation: f32,
        dt: f32,
    ) {
        let ids = ctx.teams.running_ids();

        // Begin phase: center update + integration.
        for &id in &ids {
            let Ok(team) = ctx.teams.get_mut(id) else { continue };
            let target_pos = team
                .old_frame_position
                .lerp(team.frame_position, interpolation);
            let target_rot = team
                .old_frame_rotation
                .slerp(team.frame_rotation, interpolation)
                .normalize();
            let inertia = team.parameters.inertia.clone();
            team.center.update_step(target_pos, target_rot, &inertia, dt);
        }
        for &id in &ids {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
                continue;
            };
            integrate::begin_step(
                &mut ctx.particles,
                chunk,
                team,
                &team.parameters,
                &ctx.wind,
                dt,
                self.sim_time,
            );
        }

        // Constraint chain.
        for_each_team(ctx, &ids, |particles, chunk, team| {
            tether::solve(
                particles,
                chunk,
                &team.topology.hierarchy,
                &team.parameters,
                team.scale_ratio(),
            );
        });
        for_each_team(ctx, &ids, |particles, chunk, team| {
            distance::solve(particles, chunk, &team.distance, &team.parameters, team.scale_ratio());
        });
        for_each_team(ctx, &ids, |particles, chunk, team| {
            angle::solve(particles, chunk, &team.topology.hierarchy, &team.parameters);
        });
        for &id in &ids {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
                continue;
            };
            bending::solve(
                &ctx.particles,
                chunk,
                &team.bending,
                &team.parameters,
                team.scale_ratio(),
                &ctx.accumulate,
            );
        }
        for &id in &ids {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
                continue;
            };
            bending::aggregate(&mut ctx.particles, chunk, &ctx.accumulate);
        }

        contacts.collider_collision(ctx, dt);

        for_each_team(ctx, &ids, |particles, chunk, team| {
            distance::solve(particles, chunk, &team.distance, &team.parameters, team.scale_ratio());
        });
        for_each_team(ctx, &ids, |particles, chunk, team| {
            motion::solve(particles, chunk, &team.parameters, team.scale_ratio());
        });
        for_each_team(ctx, &ids, |particles, chunk, team| {
            spring::solve(particles, chunk, &team.parameters, team.scale_ratio());
        });

        contacts.self_collision(ctx, update_index, self.step_count, dt);

        for &id in &ids {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
                continue;
            };
            integrate::end_step(&mut ctx.particles, chunk, team, &team.parameters, dt);
        }
    }

    fn apply_teleports(&mut self, ctx: &mut SimulationContext) -> WeftResult<()> {
        let ids = ctx.teams.running_ids();
        for id in ids {
            let team = ctx.teams.get_mut(id)?;
            let Some(request) = team.pending_teleport.take() else {
                continue;
            };
            let policy = team.parameters.teleport.clone();
            let old_position = team.frame_position;
            let old_rotation = team.frame_rotation;
            let scale = team.frame_scale;

            team.frame_position = request.position;
            team.frame_rotation = request.rotation;
            team.old_frame_position = request.position;
            team.old_frame_rotation = request.rotation;
            team.old_frame_scale = scale;
            team.center.teleport(request.position, request.rotation);
            let handle = team.particle_handle;

            let chunk = ctx.particles.chunk(handle)?;
            let delta_rot = (request.rotation * old_rotation.inverse()).normalize();

            let next = ctx.particles.next_pos.data_mut();
            let old = ctx.particles.old_pos.data_mut();
            let velocity_pos = ctx.particles.velocity_pos.data_mut();
            let velocity = ctx.particles.velocity.data_mut();
            let local_pos = ctx.particles.local_pos.data();

            for li in 0..chunk.len {
                let i = chunk.start + li;
                let snap =
                    request.position + request.rotation * (local_pos[i] * scale);
                match policy.mode {
                    TeleportMode::Reset => {
                        next[i] = snap;
                        old[i] = snap;
                        velocity_pos[i] = snap;
                        velocity[i] = weft_math::Vec3::ZERO;
                    }
                    TeleportMode::Keep => {
                        let carry = |p: weft_math::Vec3| {
                            request.position + delta_rot * (p - old_position)
                        };
                        let blend = policy.blend.clamp(0.0, 1.0);
                        next[i] = snap.lerp(carry(next[i]), blend);
                        old[i] = snap.lerp(carry(old[i]), blend);
                        velocity_pos[i] = snap.lerp(carry(velocity_pos[i]), blend);
                        velocity[i] = (delta_rot * velocity[i]) * blend;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Run one closure per running team with its particle window.
fn for_each_team<F>(ctx: &mut SimulationContext, ids: &[TeamId], mut f: F)
where
    F: FnMut(&mut crate::particle::ParticleStore, weft_arena::DataChunk, &crate::team::TeamData),
{
    for &id in ids {
        let Ok(team) = ctx.teams.get(id) else { continue };
        let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
            continue;
        };
        f(&mut ctx.particles, chunk, team);
    }
}
