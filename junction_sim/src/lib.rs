//! Junction Deterministic Simulation Harness
//!
//! Drives signal scenes frame by frame under a seeded virtual clock and
//! checks the scheduler's invariants from the outside.
//!
//! # Core Principle: One Seed, One Timeline
//!
//! Every source of variation is derived from the run seed:
//! - **Time**: frame deltas come from [`SimClock`], optionally jittered
//! - **Layout**: junctions come from JSON or the built-in presets
//! - **Replay**: a [`junction_env::ReplayFlag`] the scenario toggles
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    SimWorld                      │
//! │  ┌──────────┐   dt    ┌───────────────────────┐  │
//! │  │ SimClock │────────►│ SignalScene           │  │
//! │  └──────────┘         │  groups ─► controllers │  │
//! │                       └───────────┬───────────┘  │
//! │  ┌──────────────┐  snapshots      │              │
//! │  │ SignalOracle │◄────────────────┘              │
//! │  └──────────────┘                                │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use junction_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_duration(30.0)
//!     .run(ScenarioId::FourWay);
//! assert!(result.passed);
//! ```

mod clock;
mod exporter;
mod layout;
mod oracle;
mod runner;
pub mod scenarios;
mod world;

pub use clock::SimClock;
pub use exporter::{LightFrame, SimEvent, SimExport, SimFrame};
pub use layout::{ControllerLayout, JunctionLayout, LayoutError, SceneLayout, TrafficLightLayout, POLE_HEIGHT};
pub use oracle::{snapshot_scene, GroupSnapshot, SignalOracle};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld, TickCounters};
