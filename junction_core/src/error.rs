//! Error types for signal controller construction and scene registration.
//!
//! The scheduler's tick path never fails; these errors only come from
//! building controllers and wiring them into a scene.

use crate::arena::ControllerId;
use crate::group::GroupId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// A traffic light controller was given an empty stage list
    #[error("Traffic light controller needs at least one stage")]
    EmptyStages,

    /// A stage duration is negative or not finite
    #[error("Invalid duration {duration} for stage {index}")]
    InvalidDuration { index: usize, duration: f32 },

    #[error("Unknown signal group: {0}")]
    UnknownGroup(GroupId),

    #[error("Unknown controller: {0}")]
    UnknownController(ControllerId),
}
