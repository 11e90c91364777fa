//! The contact pipeline: collider collision plus self collision, plugged
//! into the solver through its [`ContactStage`] seam.
//!
//! Per-team self-collision state (primitive sets, contact lists, tangle
//! flags) is allocated lazily when a team's flags first ask for it and
//! freed when they stop. The broad phase runs once per rendered frame;
//! sub-steps only fast-refresh the existing contact lists.

use std::collections::HashMap;

use tracing::debug;
use weft_arena::DataChunk;
use weft_math::Vec3;
use weft_solver::parameters::{ColliderMode, SelfCollisionMode};
use weft_solver::{ContactStage, SimulationContext, TeamData};
use weft_types::constants::{MAX_SYNC_DEPTH, SELF_COLLISION_INTERSECT_PERIOD};
use weft_types::TeamId;

use crate::broad::{self, EdgeEdgeContact, PointTriangleContact};
use crate::collider::{Collider, ColliderStore};
use crate::edge_collision;
use crate::intersect::{self, SliceScheduler};
use crate::narrow::{self, SolveSide};
use crate::point_collision;
use crate::primitive::{PrimitiveKind, PrimitiveSet};

/// Per-team self-collision working state.
#[derive(Debug)]
struct SelfState {
    points: PrimitiveSet,
    edges: PrimitiveSet,
    triangles: PrimitiveSet,
    edge_edge: Vec<EdgeEdgeContact>,
    point_triangle: Vec<PointTriangleContact>,
    /// Own edges vs partner edges.
    sync_edge_edge: Vec<EdgeEdgeContact>,
    /// Own points vs partner triangles.
    sync_point_triangle: Vec<PointTriangleContact>,
    /// Partner points vs own triangles.
    sync_triangle_point: Vec<PointTriangleContact>,
    /// Chunk-local entangled-particle flags from the last intersect pass.
    tangled: Vec<bool>,
}

impl SelfState {
    fn new(team: &TeamData) -> Self {
        SelfState {
            points: PrimitiveSet::build(PrimitiveKind::Point, &team.topology),
            edges: PrimitiveSet::build(PrimitiveKind::Edge, &team.topology),
            triangles: PrimitiveSet::build(PrimitiveKind::Triangle, &team.topology),
            edge_edge: Vec::new(),
            point_triangle: Vec::new(),
            sync_edge_edge: Vec::new(),
            sync_point_triangle: Vec::new(),
            sync_triangle_point: Vec::new(),
            tangled: vec![false; team.topology.vertex_count()],
        }
    }
}

/// One frame's freshly collected contact lists for one team.
#[derive(Debug, Default)]
struct ContactLists {
    edge_edge: Vec<EdgeEdgeContact>,
    point_triangle: Vec<PointTriangleContact>,
    sync_edge_edge: Vec<EdgeEdgeContact>,
    sync_point_triangle: Vec<PointTriangleContact>,
    sync_triangle_point: Vec<PointTriangleContact>,
}

/// Collider and self collision behind the solver's contact seam.
#[derive(Debug, Default)]
pub struct ContactPipeline {
    pub colliders: ColliderStore,
    states: HashMap<TeamId, SelfState>,
    frame_index: u32,
}

impl ContactPipeline {
    pub fn new() -> Self {
        ContactPipeline::default()
    }

    /// Teams with a self-collision state allocated.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Recompute every running team's collision flags from its parameters
    /// and propagate sync requirements along partner chains.
    fn update_flags(&mut self, ctx: &mut SimulationContext) {
        let ids = ctx.teams.running_ids();
        let mut sync_roots: Vec<TeamId> = Vec::new();

        for &id in &ids {
            let Ok(team) = ctx.teams.get_mut(id) else { continue };
            let self_on = team.parameters.self_collision.self_mode == SelfCollisionMode::FullMesh;
            team.flags.set_self_edge_edge(self_on);
            team.flags.set_self_point_triangle(self_on);
            team.flags.set_self_triangle_point(self_on);
            team.flags.set_self_intersect(self_on);

            let sync_on = team.parameters.self_collision.sync_mode == SelfCollisionMode::FullMesh
                && team.sync_partner.is_some();
            team.flags.set_sync_edge_edge(sync_on);
            team.flags.set_sync_point_triangle(sync_on);
            team.flags.set_sync_triangle_point(sync_on);
            team.flags.set_sync_intersect(sync_on);
            if sync_on {
                sync_roots.push(id);
            }
        }

        // A sync partner must carry primitives even when it has no self
        // collision of its own. Chains are walked with a hard depth cap,
        // so a partner cycle terminates instead of recursing.
        for root in sync_roots {
            let mut cur = root;
            for _ in 0..MAX_SYNC_DEPTH {
                let Some(partner) = ctx.teams.get(cur).ok().and_then(|t| t.sync_partner) else {
                    break;
                };
                let Ok(team) = ctx.teams.get_mut(partner) else { break };
                if !team.flags.is_running() {
                    break;
                }
                team.flags.set_sync_edge_edge(true);
                team.flags.set_sync_point_triangle(true);
                team.flags.set_sync_triangle_point(true);
                cur = partner;
            }
        }
    }

    /// Allocate or free per-team state to match the flags.
    fn sync_states(&mut self, ctx: &SimulationContext) {
        for id in ctx.teams.running_ids() {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let needed = team.flags.any_self_collision();
            let allocated = self.states.contains_key(&id);
            if needed && !allocated {
                debug!(team = id.0, "self-collision state allocated");
                self.states.insert(id, SelfState::new(team));
            } else if !needed && allocated {
                debug!(team = id.0, "self-collision state freed");
                self.states.remove(&id);
            }
        }
    }

    fn team_chunk(ctx: &SimulationContext, id: TeamId) -> Option<(DataChunk, f32)> {
        let team = ctx.teams.get(id).ok()?;
        let chunk = ctx.particles.chunk(team.particle_handle).ok()?;
        Some((chunk, team.scale_ratio()))
    }

    /// Refresh primitives, run due intersect passes, rebuild contacts.
    fn broad_phase(&mut self, ctx: &mut SimulationContext) {
        let ids: Vec<TeamId> = self.states.keys().copied().collect();

        // Entanglement detection and primitive refresh per team.
        for &id in &ids {
            let Some((chunk, scale_ratio)) = Self::team_chunk(ctx, id) else {
                continue;
            };
            let intersect_due = match ctx.teams.get(id) {
                Ok(team) => {
                    team.flags.self_intersect()
                        && SliceScheduler::new(SELF_COLLISION_INTERSECT_PERIOD, id.0 as u32)
                            .due(self.frame_index)
                }
                Err(_) => continue,
            };

            if intersect_due {
                let Some(state) = self.states.get_mut(&id) else { continue };
                let count = intersect::detect(
                    &state.edges,
                    &state.triangles,
                    chunk,
                    &ctx.particles,
                    &mut state.tangled,
                );
                if count > 0 {
                    debug!(team = id.0, particles = count, "entangled particles flagged");
                }
                if let Ok(team) = ctx.teams.get_mut(id) {
                    team.intersect_count = count;
                }
            }

            let Ok(team) = ctx.teams.get(id) else { continue };
            let params = &team.parameters;
            let Some(state) = self.states.get_mut(&id) else { continue };
            state
                .points
                .refresh(&ctx.particles, chunk, params, scale_ratio, &state.tangled);
            state
                .edges
                .refresh(&ctx.particles, chunk, params, scale_ratio, &state.tangled);
            state
                .triangles
                .refresh(&ctx.particles, chunk, params, scale_ratio, &state.tangled);
        }

        // Contact generation. Cross-team lists need two states at once, so
        // they are computed with shared borrows and written back after.
        let mut rebuilt: Vec<(TeamId, ContactLists)> = Vec::new();
        for &id in &ids {
            let Some((chunk, _)) = Self::team_chunk(ctx, id) else {
                continue;
            };
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Some(state) = self.states.get(&id) else { continue };
            let mut lists = ContactLists::default();

            if team.flags.self_edge_edge() {
                broad::collect_edge_edge(
                    &state.edges,
                    chunk,
                    &state.edges,
                    chunk,
                    &ctx.particles,
                    &team.topology,
                    true,
                    &mut lists.edge_edge,
                );
            }
            if team.flags.self_point_triangle() {
                broad::collect_point_triangle(
                    &state.points,
                    chunk,
                    &state.triangles,
                    chunk,
                    &ctx.particles,
                    &team.topology,
                    true,
                    &mut lists.point_triangle,
                );
            }

            if team.flags.sync_edge_edge() {
                if let Some(partner) = team.sync_partner {
                    if let (Some(pstate), Some((pchunk, _))) =
                        (self.states.get(&partner), Self::team_chunk(ctx, partner))
                    {
                        broad::collect_edge_edge(
                            &state.edges,
                            chunk,
                            &pstate.edges,
                            pchunk,
                            &ctx.particles,
                            &team.topology,
                            false,
                            &mut lists.sync_edge_edge,
                        );
                        broad::collect_point_triangle(
                            &state.points,
                            chunk,
                            &pstate.triangles,
                            pchunk,
                            &ctx.particles,
                            &team.topology,
                            false,
                            &mut lists.sync_point_triangle,
                        );
                        broad::collect_point_triangle(
                            &pstate.points,
                            pchunk,
                            &state.triangles,
                            chunk,
                            &ctx.particles,
                            &team.topology,
                            false,
                            &mut lists.sync_triangle_point,
                        );
                    }
                }
            }

            rebuilt.push((id, lists));
        }
        for (id, lists) in rebuilt {
            if let Some(state) = self.states.get_mut(&id) {
                state.edge_edge = lists.edge_edge;
                state.point_triangle = lists.point_triangle;
                state.sync_edge_edge = lists.sync_edge_edge;
                state.sync_point_triangle = lists.sync_point_triangle;
                state.sync_triangle_point = lists.sync_triangle_point;
            }
        }
    }

    /// Revalidate one team's contact lists against current positions.
    fn fast_refresh(&mut self, ctx: &SimulationContext, id: TeamId) {
        let Some((chunk, _)) = Self::team_chunk(ctx, id) else {
            return;
        };
        let partner = ctx.teams.get(id).ok().and_then(|t| t.sync_partner);
        let pinfo = partner.and_then(|p| Self::team_chunk(ctx, p));

        // The partner's sets must stay borrowed shared while the lists are
        // rewritten, so the lists are split out of the state first.
        let mut lists = match self.states.get_mut(&id) {
            Some(state) => ContactLists {
                edge_edge: std::mem::take(&mut state.edge_edge),
                point_triangle: std::mem::take(&mut state.point_triangle),
                sync_edge_edge: std::mem::take(&mut state.sync_edge_edge),
                sync_point_triangle: std::mem::take(&mut state.sync_point_triangle),
                sync_triangle_point: std::mem::take(&mut state.sync_triangle_point),
            },
            None => return,
        };
        if let Some(state) = self.states.get(&id) {
            narrow::refresh_edge_edge(
                &mut lists.edge_edge,
                &state.edges,
                chunk,
                &state.edges,
                chunk,
                &ctx.particles,
            );
            narrow::refresh_point_triangle(
                &mut lists.point_triangle,
                &state.points,
                chunk,
                &state.triangles,
                chunk,
                &ctx.particles,
            );
            if let (Some(p), Some((pchunk, _))) = (partner, pinfo) {
                if let Some(pstate) = self.states.get(&p) {
                    narrow::refresh_edge_edge(
                        &mut lists.sync_edge_edge,
                        &state.edges,
                        chunk,
                        &pstate.edges,
                        pchunk,
                        &ctx.particles,
                    );
                    narrow::refresh_point_triangle(
                        &mut lists.sync_point_triangle,
                        &state.points,
                        chunk,
                        &pstate.triangles,
                        pchunk,
                        &ctx.particles,
                    );
                    narrow::refresh_point_triangle(
                        &mut lists.sync_triangle_point,
                        &pstate.points,
                        pchunk,
                        &state.triangles,
                        chunk,
                        &ctx.particles,
                    );
                }
            }
        }
        if let Some(state) = self.states.get_mut(&id) {
            state.edge_edge = lists.edge_edge;
            state.point_triangle = lists.point_triangle;
            state.sync_edge_edge = lists.sync_edge_edge;
            state.sync_point_triangle = lists.sync_point_triangle;
            state.sync_triangle_point = lists.sync_triangle_point;
        }
    }
}

impl ContactStage for ContactPipeline {
    fn frame_begin(&mut self, ctx: &mut SimulationContext) {
        self.frame_index = self.frame_index.wrapping_add(1);
        self.update_flags(ctx);
        self.sync_states(ctx);
        self.broad_phase(ctx);
    }

    fn collider_collision(&mut self, ctx: &mut SimulationContext, _dt: f32) {
        for id in ctx.teams.running_ids() {
            let Ok(team) = ctx.teams.get(id) else { continue };
            let Ok(chunk) = ctx.particles.chunk(team.particle_handle) else {
                continue;
            };
            let mode = team.parameters.collider_collision.mode;
            let colliders: Vec<&Collider> = self.colliders.team_colliders(id).collect();

            if mode == ColliderMode::None || colliders.is_empty() {
                let collision_normal = ctx.particles.collision_normal.data_mut();
                for i in chunk.range() {
                    collision_normal[i] = Vec3::ZERO;
                }
                continue;
            }

            match mode {
                ColliderMode::Point => point_collision::solve(
                    &mut ctx.particles,
                    chunk,
                    &team.parameters,
                    team.scale_ratio(),
                    &colliders,
                ),
                ColliderMode::Edge => {
                    edge_collision::solve(
                        &ctx.particles,
                        chunk,
                        &team.topology,
                        &team.parameters,
                        team.scale_ratio(),
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
                }
                ColliderMode::None => {}
            }
        }
    }

    fn self_collision(
        &mut self,
        ctx: &mut SimulationContext,
        update_index: u32,
        _step_count: u32,
        _dt: f32,
    ) {
        let ids: Vec<TeamId> = self.states.keys().copied().collect();

        // Sub-steps after the first revalidate the frame's contact lists.
        if update_index > 0 {
            for &id in &ids {
                self.fast_refresh(ctx, id);
            }
        }

        for &id in &ids {
            let Some((chunk, _)) = Self::team_chunk(ctx, id) else {
                continue;
            };
            let Ok(team) = ctx.teams.get(id) else { continue };
            let cloth_mass = team.parameters.self_collision.cloth_mass;
            let partner = team.sync_partner;
            let Some(state) = self.states.get(&id) else { continue };

            let own_edges = SolveSide {
                set: &state.edges,
                chunk,
                cloth_mass,
            };
            let own_points = SolveSide {
                set: &state.points,
                chunk,
                cloth_mass,
            };
            let own_triangles = SolveSide {
                set: &state.triangles,
                chunk,
                cloth_mass,
            };
            narrow::solve(
                &mut ctx.particles,
                &state.edge_edge,
                (&own_edges, &own_edges),
                &state.point_triangle,
                (&own_points, &own_triangles),
                &ctx.accumulate,
            );

            if let Some(p) = partner {
                if let (Some(pstate), Some((pchunk, _)), Ok(pteam)) = (
                    self.states.get(&p),
                    Self::team_chunk(ctx, p),
                    ctx.teams.get(p),
                ) {
                    let pmass = pteam.parameters.self_collision.cloth_mass;
                    let partner_edges = SolveSide {
                        set: &pstate.edges,
                        chunk: pchunk,
                        cloth_mass: pmass,
                    };
                    let partner_points = SolveSide {
                        set: &pstate.points,
                        chunk: pchunk,
                        cloth_mass: pmass,
                    };
                    let partner_triangles = SolveSide {
                        set: &pstate.triangles,
                        chunk: pchunk,
                        cloth_mass: pmass,
                    };
                    narrow::solve(
                        &mut ctx.particles,
                        &state.sync_edge_edge,
                        (&own_edges, &partner_edges),
                        &state.sync_point_triangle,
                        (&own_points, &partner_triangles),
                        &ctx.accumulate,
                    );
                    narrow::solve(
                        &mut ctx.particles,
                        &[],
                        (&own_edges, &own_edges),
                        &state.sync_triangle_point,
                        (&partner_points, &own_triangles),
                        &ctx.accumulate,
                    );
                }
            }
        }
    }

    fn team_removed(&mut self, id: TeamId) {
        if self.states.remove(&id).is_some() {
            debug!(team = id.0, "self-collision state freed");
        }
        self.colliders.remove_team(id);
    }
}
