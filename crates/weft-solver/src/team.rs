//! Team registration and lifecycle.
//!
//! A team is one cloth instance: a topology, a parameter set, a window of
//! the shared particle arenas, and per-team solver state. Teams are
//! registered into a slot table; removal goes through an exiting phase so
//! in-flight collision state drains before the chunks are freed.

use std::sync::Arc;

use tracing::{debug, warn};
use weft_arena::ChunkHandle;
use weft_math::{Quat, Vec3};
use weft_mesh::ClothTopology;
use weft_types::constants::MAX_TEAM_COUNT;
use weft_types::{TeamId, WeftError, WeftResult};

use crate::bending::BendingPairs;
use crate::distance::DistanceGraph;
use crate::inertia::CenterData;
use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;

/// Per-team status flags with named accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamFlags(u32);

impl TeamFlags {
    const ACTIVE: u32 = 1 << 0;
    const EXITING: u32 = 1 << 1;
    const SELF_EDGE_EDGE: u32 = 1 << 2;
    const SELF_POINT_TRIANGLE: u32 = 1 << 3;
    const SELF_TRIANGLE_POINT: u32 = 1 << 4;
    const SELF_INTERSECT: u32 = 1 << 5;
    const SYNC_EDGE_EDGE: u32 = 1 << 6;
    const SYNC_POINT_TRIANGLE: u32 = 1 << 7;
    const SYNC_TRIANGLE_POINT: u32 = 1 << 8;
    const SYNC_INTERSECT: u32 = 1 << 9;

    fn get(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn is_active(self) -> bool {
        self.get(Self::ACTIVE)
    }
    pub fn set_active(&mut self, on: bool) {
        self.set(Self::ACTIVE, on)
    }

    pub fn is_exiting(self) -> bool {
        self.get(Self::EXITING)
    }
    pub fn set_exiting(&mut self, on: bool) {
        self.set(Self::EXITING, on)
    }

    /// Team runs in the simulation this step.
    pub fn is_running(self) -> bool {
        self.is_active() && !self.is_exiting()
    }

    pub fn self_edge_edge(self) -> bool {
        self.get(Self::SELF_EDGE_EDGE)
    }
    pub fn set_self_edge_edge(&mut self, on: bool) {
        self.set(Self::SELF_EDGE_EDGE, on)
    }

    pub fn self_point_triangle(self) -> bool {
        self.get(Self::SELF_POINT_TRIANGLE)
    }
    pub fn set_self_point_triangle(&mut self, on: bool) {
        self.set(Self::SELF_POINT_TRIANGLE, on)
    }

    pub fn self_triangle_point(self) -> bool {
        self.get(Self::SELF_TRIANGLE_POINT)
    }
    pub fn set_self_triangle_point(&mut self, on: bool) {
        self.set(Self::SELF_TRIANGLE_POINT, on)
    }

    pub fn self_intersect(self) -> bool {
        self.get(Self::SELF_INTERSECT)
    }
    pub fn set_self_intersect(&mut self, on: bool) {
        self.set(Self::SELF_INTERSECT, on)
    }

    pub fn sync_edge_edge(self) -> bool {
        self.get(Self::SYNC_EDGE_EDGE)
    }
    pub fn set_sync_edge_edge(&mut self, on: bool) {
        self.set(Self::SYNC_EDGE_EDGE, on)
    }

    pub fn sync_point_triangle(self) -> bool {
        self.get(Self::SYNC_POINT_TRIANGLE)
    }
    pub fn set_sync_point_triangle(&mut self, on: bool) {
        self.set(Self::SYNC_POINT_TRIANGLE, on)
    }

    pub fn sync_triangle_point(self) -> bool {
        self.get(Self::SYNC_TRIANGLE_POINT)
    }
    pub fn set_sync_triangle_point(&mut self, on: bool) {
        self.set(Self::SYNC_TRIANGLE_POINT, on)
    }

    pub fn sync_intersect(self) -> bool {
        self.get(Self::SYNC_INTERSECT)
    }
    pub fn set_sync_intersect(&mut self, on: bool) {
        self.set(Self::SYNC_INTERSECT, on)
    }

    /// Any self-collision work scheduled for this team.
    pub fn any_self_collision(self) -> bool {
        self.0
            & (Self::SELF_EDGE_EDGE
                | Self::SELF_POINT_TRIANGLE
                | Self::SELF_TRIANGLE_POINT
                | Self::SYNC_EDGE_EDGE
                | Self::SYNC_POINT_TRIANGLE
                | Self::SYNC_TRIANGLE_POINT)
            != 0
    }
}

/// A pending teleport request, applied at the next step boundary.
#[derive(Debug, Clone, Copy)]
pub struct TeleportRequest {
    pub position: Vec3,
    pub rotation: Quat,
}

/// One registered cloth instance.
#[derive(Debug)]
pub struct TeamData {
    pub id: TeamId,
    pub topology: Arc<ClothTopology>,
    pub parameters: ClothParameters,
    pub flags: TeamFlags,
    /// Window of the shared particle arenas.
    pub particle_handle: ChunkHandle,
    /// Distance constraint graph.
    pub distance: DistanceGraph,
    /// Bending pair set.
    pub bending: BendingPairs,
    /// Inertia center state.
    pub center: CenterData,
    /// Partner team for mutual collision, if any.
    pub sync_partner: Option<TeamId>,
    /// Scale the team was registered at.
    pub init_scale: f32,
    /// Current frame world transform.
    pub frame_position: Vec3,
    pub frame_rotation: Quat,
    pub frame_scale: f32,
    /// Previous frame world transform (interpolation source).
    pub old_frame_position: Vec3,
    pub old_frame_rotation: Quat,
    pub old_frame_scale: f32,
    /// Teleport requested by the host, handled at the next step.
    pub pending_teleport: Option<TeleportRequest>,
    /// Entangled-particle count from the last intersection pass.
    pub intersect_count: u32,
}

impl TeamData {
    /// Current scale relative to registration scale.
    pub fn scale_ratio(&self) -> f32 {
        if self.init_scale.abs() > f32::EPSILON {
            self.frame_scale / self.init_scale
        } else {
            1.0
        }
    }
}

/// Slot table of registered teams.
#[derive(Debug, Default)]
pub struct TeamStore {
    teams: Vec<Option<TeamData>>,
}

impl TeamStore {
    pub fn new() -> Self {
        TeamStore::default()
    }

    /// Register a cloth and allocate its particles.
    pub fn register(
        &mut self,
        particles: &mut ParticleStore,
        topology: Arc<ClothTopology>,
        parameters: ClothParameters,
        position: Vec3,
        rotation: Quat,
        scale: f32,
    ) -> WeftResult<TeamId> {
        parameters.validate()?;
        if scale <= 0.0 {
            return Err(WeftError::InvalidTeam(format!(
                "non-positive team scale {}",
                scale
            )));
        }

        let slot = match self.teams.iter().position(|t| t.is_none()) {
            Some(s) => s,
            None => {
                if self.teams.len() >= MAX_TEAM_COUNT {
                    return Err(WeftError::InvalidTeam(format!(
                        "team count cap {} reached",
                        MAX_TEAM_COUNT
                    )));
                }
                self.teams.push(None);
                self.teams.len() - 1
            }
        };
        let id = TeamId(slot as u16);

        // Fallible setup first; the particle chunk is only allocated once
        // nothing can fail, so an error here leaves no orphaned chunk.
        let distance = DistanceGraph::build(&topology)?;
        let bending = BendingPairs::build(&topology);
        let center = CenterData::new(&topology, position, rotation);
        let handle = particles.register(id, &topology, position, rotation, scale);

        let mut flags = TeamFlags::default();
        flags.set_active(true);

        debug!(
            team = id.0,
            vertices = topology.vertex_count(),
            distance_edges = distance.neighbor_count(),
            bending_pairs = bending.len(),
            "team registered"
        );

        self.teams[slot] = Some(TeamData {
            id,
            topology,
            parameters,
            flags,
            particle_handle: handle,
            distance,
            bending,
            center,
            sync_partner: None,
            init_scale: scale,
            frame_position: position,
            frame_rotation: rotation,
            frame_scale: scale,
            old_frame_position: position,
            old_frame_rotation: rotation,
            old_frame_scale: scale,
            pending_teleport: None,
            intersect_count: 0,
        });
        Ok(id)
    }

    /// Mark a team as exiting. It is skipped by every solver from the next
    /// step until [`TeamStore::unregister`] frees it.
    pub fn begin_exit(&mut self, id: TeamId) -> WeftResult<()> {
        self.get_mut(id)?.flags.set_exiting(true);
        Ok(())
    }

    /// Free a team's particles and its slot.
    pub fn unregister(&mut self, particles: &mut ParticleStore, id: TeamId) -> WeftResult<()> {
        let team = self.teams.get_mut(id.index()).and_then(Option::take).ok_or_else(|| {
            WeftError::InvalidTeam(format!("unregister of unknown team {}", id.0))
        })?;
        particles.unregister(team.particle_handle)?;

        // Drop dangling sync links pointing at the removed team.
        for other in self.teams.iter_mut().flatten() {
            if other.sync_partner == Some(id) {
                warn!(team = other.id.0, partner = id.0, "sync partner removed");
                other.sync_partner = None;
            }
        }
        debug!(team = id.0, "team unregistered");
        Ok(())
    }

    /// Link two teams for mutual collision.
    pub fn set_sync_partner(&mut self, id: TeamId, partner: Option<TeamId>) -> WeftResult<()> {
        if let Some(p) = partner {
            if p == id {
                return Err(WeftError::InvalidTeam(format!(
                    "team {} cannot sync with itself",
                    id.0
                )));
            }
            self.get(p)?;
        }
        self.get_mut(id)?.sync_partner = partner;
        Ok(())
    }

    /// Supply the new frame world transform. The previous transform
    /// becomes the interpolation source for the coming sub-steps.
    pub fn set_world_transform(
        &mut self,
        id: TeamId,
        position: Vec3,
        rotation: Quat,
        scale: f32,
    ) -> WeftResult<()> {
        let team = self.get_mut(id)?;
        team.old_frame_position = team.frame_position;
        team.old_frame_rotation = team.frame_rotation;
        team.old_frame_scale = team.frame_scale;
        team.frame_position = position;
        team.frame_rotation = rotation;
        team.frame_scale = scale;
        Ok(())
    }

    /// Request a teleport, applied at the next step boundary per the
    /// team's [`TeleportPolicy`](crate::parameters::TeleportPolicy).
    pub fn teleport(&mut self, id: TeamId, position: Vec3, rotation: Quat) -> WeftResult<()> {
        self.get_mut(id)?.pending_teleport = Some(TeleportRequest { position, rotation });
        Ok(())
    }

    /// Look up a team.
    pub fn get(&self, id: TeamId) -> WeftResult<&TeamData> {
        self.teams
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| WeftError::InvalidTeam(format!("unknown team {}", id.0)))
    }

    /// Look up a team mutably.
    pub fn get_mut(&mut self, id: TeamId) -> WeftResult<&mut TeamData> {
        self.teams
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| WeftError::InvalidTeam(format!("unknown team {}", id.0)))
    }

    /// Iterate teams that run this step (active and not exiting).
    pub fn iter_running(&self) -> impl Iterator<Item = &TeamData> {
        self.teams
            .iter()
            .flatten()
            .filter(|t| t.flags.is_running())
    }

    /// Iterate running teams mutably.
    pub fn iter_running_mut(&mut self) -> impl Iterator<Item = &mut TeamData> {
        self.teams
            .iter_mut()
            .flatten()
            .filter(|t| t.flags.is_running())
    }

    /// Ids of teams that run this step.
    pub fn running_ids(&self) -> Vec<TeamId> {
        self.iter_running().map(|t| t.id).collect()
    }

    /// Ids of teams marked exiting.
    pub fn exiting_ids(&self) -> Vec<TeamId> {
        self.teams
            .iter()
            .flatten()
            .filter(|t| t.flags.is_exiting())
            .map(|t| t.id)
            .collect()
    }

    /// Number of registered teams (including exiting ones).
    pub fn len(&self) -> usize {
        self.teams.iter().flatten().count()
    }

    /// True if no teams are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
