//! # weft-telemetry
//!
//! Event bus for simulation telemetry. The stepping pipeline and the
//! contact pipeline stay oblivious to observers; callers that want
//! timing, contact counts, or lifecycle events emit them here and attach
//! sinks (in-memory, `tracing`, or their own).

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
