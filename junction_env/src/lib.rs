//! Junction Environment Abstraction Layer
//!
//! This crate isolates everything a signal group or a semantic ray tracer
//! needs from the host simulator, so the cycling logic runs the same way
//! inside the engine, in the deterministic harness and in unit tests:
//! - Replay state (`ReplayStatus`)
//! - Physics line traces (`SceneQuery`)
//! - Identifiers and semantic labels shared by both
//!
//! # Example
//!
//! ```ignore
//! use junction_env::{ReplayFlag, StaticScene};
//!
//! let replay = ReplayFlag::new();
//! let scene = SignalScene::new(replay.as_status());
//! // ... later, when a recording starts playing back
//! replay.set_active(true);
//! ```

mod query;
mod replay;
mod static_scene;
mod types;

pub use query::{QueryParams, SceneQuery, TraceChannel, TraceHit};
pub use replay::{NoReplay, ReplayFlag, ReplayStatus};
pub use static_scene::{SceneBox, StaticScene};
pub use types::{ActorId, CityObjectLabel, JunctionId};
