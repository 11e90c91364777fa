//! Shared particle arenas.
//!
//! All teams' particles live side by side in common buffers. Each buffer
//! is a [`ChunkArena`] and every arena sees the same register/unregister
//! sequence, so one handle resolves the same window in all of them.

use weft_arena::{ChunkArena, ChunkHandle, DataChunk};
use weft_math::{Quat, Vec3};
use weft_mesh::ClothTopology;
use weft_types::{TeamId, VertexAttribute, WeftResult};

/// SoA particle state shared by every registered team.
#[derive(Debug, Default)]
pub struct ParticleStore {
    /// Predicted position being solved this step.
    pub next_pos: ChunkArena<Vec3>,
    /// Committed position from the previous step.
    pub old_pos: ChunkArena<Vec3>,
    /// Pre-solve reference position; velocity derives from the distance
    /// to it at the end of the step.
    pub velocity_pos: ChunkArena<Vec3>,
    /// Current velocity.
    pub velocity: ChunkArena<Vec3>,
    /// Actual displacement velocity of the previous step.
    pub real_velocity: ChunkArena<Vec3>,
    /// Animated base position (the pose the cloth relaxes toward).
    pub base_pos: ChunkArena<Vec3>,
    /// Animated base rotation.
    pub base_rot: ChunkArena<Quat>,
    /// Rest-pose local position.
    pub local_pos: ChunkArena<Vec3>,
    /// Rest-pose normal (local space).
    pub local_normal: ChunkArena<Vec3>,
    /// Contact friction accumulated by the collision solvers.
    pub friction: ChunkArena<f32>,
    /// Static friction state carried across steps.
    pub static_friction: ChunkArena<f32>,
    /// Averaged collision normal of the last collision solve.
    pub collision_normal: ChunkArena<Vec3>,
    /// Per-particle simulation attribute.
    pub attribute: ChunkArena<VertexAttribute>,
    /// Normalized depth from the hierarchy root.
    pub depth: ChunkArena<f32>,
    /// Owning team per particle.
    pub team_id: ChunkArena<u16>,
}

impl ParticleStore {
    pub fn new() -> Self {
        ParticleStore::default()
    }

    /// Total particle count across all teams.
    pub fn len(&self) -> usize {
        self.next_pos.len()
    }

    /// True if no particles are registered.
    pub fn is_empty(&self) -> bool {
        self.next_pos.is_empty()
    }

    /// Register one team's particles from its topology.
    ///
    /// Positions are initialized to the rest pose transformed by
    /// `(position, rotation, scale)`.
    pub fn register(
        &mut self,
        team: TeamId,
        topology: &ClothTopology,
        position: Vec3,
        rotation: Quat,
        scale: f32,
    ) -> ChunkHandle {
        let world: Vec<Vec3> = topology
            .positions
            .iter()
            .map(|&p| position + rotation * (p * scale))
            .collect();
        let rotations: Vec<Quat> = vec![rotation; topology.vertex_count()];

        let handle = self.next_pos.register_from(&world);
        self.old_pos.register_from(&world);
        self.velocity_pos.register_from(&world);
        self.velocity.register(world.len());
        self.real_velocity.register(world.len());
        self.base_pos.register_from(&world);
        self.base_rot.register_from(&rotations);
        self.local_pos.register_from(&topology.positions);
        self.local_normal.register_from(&topology.normals);
        self.friction.register(world.len());
        self.static_friction.register(world.len());
        self.collision_normal.register(world.len());
        self.attribute.register_from(&topology.attributes);
        self.depth.register_from(&topology.hierarchy.depths);
        self.team_id.register_with(world.len(), team.0);
        handle
    }

    /// Free one team's particles and compact every arena.
    pub fn unregister(&mut self, handle: ChunkHandle) -> WeftResult<()> {
        self.next_pos.unregister(handle)?;
        self.old_pos.unregister(handle)?;
        self.velocity_pos.unregister(handle)?;
        self.velocity.unregister(handle)?;
        self.real_velocity.unregister(handle)?;
        self.base_pos.unregister(handle)?;
        self.base_rot.unregister(handle)?;
        self.local_pos.unregister(handle)?;
        self.local_normal.unregister(handle)?;
        self.friction.unregister(handle)?;
        self.static_friction.unregister(handle)?;
        self.collision_normal.unregister(handle)?;
        self.attribute.unregister(handle)?;
        self.depth.unregister(handle)?;
        self.team_id.unregister(handle)?;
        Ok(())
    }

    /// Current window of one team's particles.
    pub fn chunk(&self, handle: ChunkHandle) -> WeftResult<DataChunk> {
        self.next_pos.chunk(handle)
    }
}
