//! The explicit simulation context.
//!
//! Everything the pipeline touches lives here: particle arenas, the team
//! table, the wind field, and the shared accumulation buffers. There are
//! no globals; hosts own a context and pass it by reference.

use std::sync::Arc;

use weft_arena::{AccumulateBuffer, AtomicMaxBuffer};
use weft_math::{Quat, Vec3};
use weft_mesh::ClothTopology;
use weft_types::{TeamId, WeftResult};

use crate::integrate::WindField;
use crate::parameters::ClothParameters;
use crate::particle::ParticleStore;
use crate::team::TeamStore;

/// Owns all simulation state.
#[derive(Debug, Default)]
pub struct SimulationContext {
    pub particles: ParticleStore,
    pub teams: TeamStore,
    pub wind: WindField,
    /// Shared scatter buffer (bending aggregation, collision corrections).
    pub accumulate: AccumulateBuffer,
    /// Collision friction, max-merged per particle.
    pub friction_max: AtomicMaxBuffer,
    /// Collision normal sums per particle.
    pub normal_sum: AccumulateBuffer,
}

impl SimulationContext {
    pub fn new() -> Self {
        SimulationContext::default()
    }

    /// Register a cloth instance at a world transform.
    pub fn register_cloth(
        &mut self,
        topology: Arc<ClothTopology>,
        parameters: ClothParameters,
        position: Vec3,
        rotation: Quat,
        scale: f32,
    ) -> WeftResult<TeamId> {
        let id = self.teams.register(
            &mut self.particles,
            topology,
            parameters,
            position,
            rotation,
            scale,
        )?;
        let slots = self.particles.len();
        self.accumulate.ensure_slots(slots);
        self.friction_max.ensure_slots(slots);
        self.normal_sum.ensure_slots(slots);
        Ok(id)
    }

    /// Mark a cloth for removal. Its chunks are freed at the next frame
    /// boundary, once in-flight collision state has drained.
    pub fn remove_cloth(&mut self, id: TeamId) -> WeftResult<()> {
        self.teams.begin_exit(id)
    }

}
