//! Metrics collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchMetrics {
    pub scenario: String,
    pub particle_count: usize,
    pub triangle_count: usize,
    /// Host frames executed.
    pub frames: u32,
    /// Sub-steps executed across all frames.
    pub steps: u32,
    /// Total wall-clock time (s).
    pub total_wall_time: f64,
    /// Average wall-clock time per frame (s).
    pub avg_frame_time: f64,
    pub min_frame_time: f64,
    pub max_frame_time: f64,
    /// Fastest particle at the end of the run (m/s). A settled drape
    /// approaches zero.
    pub final_max_speed: f32,
    /// Largest particle displacement from the rest pose (m).
    pub max_displacement: f32,
}

impl BenchMetrics {
    pub fn csv_header() -> String {
        "scenario,particles,triangles,frames,steps,total_wall_time_s,avg_frame_ms,min_frame_ms,max_frame_ms,final_max_speed,max_displacement".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.6},{:.6}",
            self.scenario,
            self.particle_count,
            self.triangle_count,
            self.frames,
            self.steps,
            self.total_wall_time,
            self.avg_frame_time * 1000.0,
            self.min_frame_time * 1000.0,
            self.max_frame_time * 1000.0,
            self.final_max_speed,
            self.max_displacement,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[BenchMetrics]) -> String {
        let mut csv = Self::csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
