//! Depth-parameterized tuning curves.
//!
//! Most per-cloth parameters vary along the surface: stiffness, collision
//! radius, movement limits and damping are all evaluated against a
//! particle's normalized depth (0 at the roots, 1 at the free end). A
//! curve is stored as four keys sampled uniformly over `[0, 1]` and
//! evaluated with piecewise-linear interpolation, which is cheap enough to
//! run per particle per step.

use serde::{Deserialize, Serialize};

/// A tuning value that varies over normalized depth `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveData {
    /// Keys sampled at t = 0, 1/3, 2/3, 1.
    pub keys: [f32; 4],
}

impl CurveData {
    /// Curve that evaluates to `v` everywhere.
    pub fn constant(v: f32) -> Self {
        CurveData { keys: [v; 4] }
    }

    /// Straight ramp from `start` at depth 0 to `end` at depth 1.
    pub fn linear(start: f32, end: f32) -> Self {
        let third = (end - start) / 3.0;
        CurveData {
            keys: [start, start + third, start + third * 2.0, end],
        }
    }

    /// Curve from explicit keys.
    pub fn from_keys(keys: [f32; 4]) -> Self {
        CurveData { keys }
    }

    /// Evaluate at depth `t` (clamped to `[0, 1]`).
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0) * 3.0;
        let i = (t as usize).min(2);
        let frac = t - i as f32;
        self.keys[i] + (self.keys[i + 1] - self.keys[i]) * frac
    }

    /// Evaluate and clamp the result to `[min, max]`.
    pub fn evaluate_clamped(&self, t: f32, min: f32, max: f32) -> f32 {
        self.evaluate(t).clamp(min, max)
    }

    /// Returns a copy with every key scaled by `s`.
    pub fn scaled(&self, s: f32) -> Self {
        CurveData {
            keys: [
                self.keys[0] * s,
                self.keys[1] * s,
                self.keys[2] * s,
                self.keys[3] * s,
            ],
        }
    }
}

impl Default for CurveData {
    fn default() -> Self {
        CurveData::constant(1.0)
    }
}
