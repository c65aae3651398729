//! Junction Core - Traffic Signal Cycling for Driving Simulation
//!
//! This library advances the traffic lights of a road junction, one arm at a
//! time, from a per-frame simulation tick:
//! 1. **Signal groups**: round-robin scheduling over the controllers of a junction,
//!    with freezing, replay suspension and in-phase seeking
//! 2. **Traffic light controllers**: timed light stages per junction arm
//! 3. **Semantic ray tracing**: labelled hit points over the host's line traces

pub mod arena;
pub mod controller;
pub mod error;
pub mod group;
pub mod raytrace;
pub mod scene;
pub mod traffic_light;

// Re-export key types for convenience
pub use arena::{ControllerArena, ControllerId, ControllerStore};
pub use controller::PhaseController;
pub use error::SignalError;
pub use group::{GroupId, SignalGroup, TickOutcome};
pub use raytrace::{LabelledPoint, RayTracer, UNKNOWN_FRICTION};
pub use scene::SignalScene;
pub use traffic_light::{default_stages, LightStage, LightState, TrafficLightController};
