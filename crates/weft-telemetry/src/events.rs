//! Simulation event types.
//!
//! Structured events emitted around the stepping pipeline. Events are
//! small value types carrying just enough to monitor a running cloth
//! simulation without touching its internals.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use weft_types::TeamId;

/// One telemetry event, tagged with the sub-step that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Global sub-step index (0-indexed, monotonic).
    pub step: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// A host frame began stepping.
    FrameBegin {
        /// Sub-steps scheduled for this frame.
        steps: u32,
        /// Simulation time at the frame start (s).
        sim_time: f32,
    },

    /// A host frame finished stepping.
    FrameEnd {
        /// Wall-clock time spent in the frame (s).
        wall_time: f64,
    },

    /// One constraint pass of a sub-step finished.
    ConstraintPass {
        /// Name of the pass (`"distance"`, `"bending"`, ...).
        pass: Cow<'static, str>,
        /// Wall-clock time spent in the pass (s).
        wall_time: f64,
    },

    /// The self-collision broad phase rebuilt its contact lists.
    ContactDetection {
        /// Edge-edge contacts admitted.
        edge_edge: u32,
        /// Point-triangle contacts admitted.
        point_triangle: u32,
    },

    /// An entanglement detection pass ran for one team.
    Entanglement {
        /// Team the pass ran for.
        team: TeamId,
        /// Particles flagged as tangled.
        flagged: u32,
    },

    /// A team was registered or removed.
    TeamLifecycle {
        team: TeamId,
        /// `true` on registration, `false` on removal.
        registered: bool,
        /// Particle count of the team.
        particles: u32,
    },

    /// Freeform event for callers with their own instrumentation.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(step: u32, kind: EventKind) -> Self {
        SimulationEvent { step, kind }
    }
}
