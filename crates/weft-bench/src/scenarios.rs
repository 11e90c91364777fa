//! Benchmark scenarios: procedural topology, tuning, and colliders for
//! each canonical test case.
//!
//! Three scenarios for regression tracking:
//! 1. **Hanging sheet**: a grid pinned along its top row settles under
//!    gravity with no contacts at all.
//! 2. **Collider drape**: the same grid falls onto a sphere collider.
//! 3. **Self fold**: a tall narrow sheet with full self collision folds
//!    against itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use weft_contact::{ColliderShape, ColliderTransform};
use weft_math::Vec3;
use weft_mesh::generators::quad_grid_topology;
use weft_mesh::ClothTopology;
use weft_solver::{ClothParameters, PipelineConfig};
use weft_types::WeftResult;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    HangingSheet,
    ColliderDrape,
    SelfFold,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::HangingSheet,
            ScenarioKind::ColliderDrape,
            ScenarioKind::SelfFold,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::HangingSheet => "hanging_sheet",
            ScenarioKind::ColliderDrape => "collider_drape",
            ScenarioKind::SelfFold => "self_fold",
        }
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    pub kind: ScenarioKind,
    pub topology: Arc<ClothTopology>,
    pub parameters: ClothParameters,
    pub config: PipelineConfig,
    /// Colliders registered for the cloth's team.
    pub colliders: Vec<(ColliderShape, ColliderTransform)>,
    /// Host frames to simulate.
    pub frames: u32,
    /// Host frame length (s).
    pub frame_dt: f32,
}

impl Scenario {
    /// A 1m x 1m sheet at 20x20 quads hanging from its top row for two
    /// seconds at 60 fps. The contact-free baseline.
    pub fn hanging_sheet() -> WeftResult<Self> {
        Ok(Scenario {
            kind: ScenarioKind::HangingSheet,
            topology: Arc::new(quad_grid_topology(20, 20, 1.0, 1.0)?),
            parameters: ClothParameters::default(),
            config: PipelineConfig::default(),
            colliders: Vec::new(),
            frames: 120,
            frame_dt: 1.0 / 60.0,
        })
    }

    /// The hanging sheet with a sphere collider in its fall path.
    pub fn collider_drape() -> WeftResult<Self> {
        let collider = (
            ColliderShape::Sphere { radius: 0.25 },
            ColliderTransform {
                position: Vec3::new(0.5, -1.1, 0.0),
                ..Default::default()
            },
        );
        Ok(Scenario {
            kind: ScenarioKind::ColliderDrape,
            topology: Arc::new(quad_grid_topology(20, 20, 1.0, 1.0)?),
            parameters: ClothParameters::default(),
            config: PipelineConfig::default(),
            colliders: vec![collider],
            frames: 180,
            frame_dt: 1.0 / 60.0,
        })
    }

    /// A narrow 0.4m x 1.2m sheet with full self collision, long enough
    /// to fold back onto itself. The self-collision stress case.
    pub fn self_fold() -> WeftResult<Self> {
        Ok(Scenario {
            kind: ScenarioKind::SelfFold,
            topology: Arc::new(quad_grid_topology(8, 24, 0.4, 1.2)?),
            parameters: ClothParameters::draping_cloth(),
            config: PipelineConfig::default(),
            colliders: Vec::new(),
            frames: 120,
            frame_dt: 1.0 / 60.0,
        })
    }

    pub fn from_kind(kind: ScenarioKind) -> WeftResult<Self> {
        match kind {
            ScenarioKind::HangingSheet => Scenario::hanging_sheet(),
            ScenarioKind::ColliderDrape => Scenario::collider_drape(),
            ScenarioKind::SelfFold => Scenario::self_fold(),
        }
    }
}
