//! # weft-bench
//!
//! Benchmark suite for the weft simulation engine: three procedural
//! scenarios, a runner wired through the full solver and contact
//! pipelines, and CSV export for regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchMetrics;
pub use runner::BenchRunner;
pub use scenarios::{Scenario, ScenarioKind};
