//! Physics-query abstraction used by semantic ray tracing.

use crate::types::{ActorId, CityObjectLabel};
use nalgebra::Vector3;

/// Collision channel a trace runs on.
///
/// Scene geometry decides per channel whether it blocks, overlaps or
/// ignores a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceChannel {
    /// Overlap channel: every primitive along the segment reports a hit
    Overlap,

    /// Camera channel: what a camera sensor would see
    Camera,

    /// Visibility channel: generic line-of-sight
    Visibility,
}

/// Extra parameters for a trace.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Actors whose geometry the trace passes through
    pub ignored_actors: Vec<ActorId>,

    /// Whether hits should carry the physical material of the surface
    pub return_physical_material: bool,
}

impl QueryParams {
    /// Returns true if `actor` is on the ignore list.
    pub fn ignores(&self, actor: ActorId) -> bool {
        self.ignored_actors.contains(&actor)
    }
}

/// A single hit reported by a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceHit {
    /// World position of the impact
    pub location: Vector3<f32>,

    /// Surface normal at the impact
    pub normal: Vector3<f32>,

    /// Semantic tag of the hit component
    pub label: CityObjectLabel,

    /// Actor owning the hit component
    pub actor: ActorId,

    /// Friction of the surface material; `None` when not requested or not resolvable
    pub physical_friction: Option<f32>,

    /// Distance from the trace start
    pub distance: f32,
}

/// Line-trace capability of the host world.
///
/// # Implementations
///
/// - **Host engine**: wraps the engine's physics scene
/// - **Simulation / tests**: `StaticScene` - axis-aligned boxes in memory
pub trait SceneQuery {
    /// Traces the segment `start -> end` and returns every hit, closest first.
    fn line_trace_multi(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        channel: TraceChannel,
        params: &QueryParams,
    ) -> Vec<TraceHit>;

    /// Traces the segment `start -> end` and returns the closest hit.
    fn line_trace_single(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        channel: TraceChannel,
        params: &QueryParams,
    ) -> Option<TraceHit>;
}
