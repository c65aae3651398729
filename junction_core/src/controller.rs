//! The phase controller seam between a signal group and the per-arm state machine.

use crate::group::GroupId;

/// One junction arm's phase state machine, as seen by its signal group.
///
/// The group never inspects a controller's phases; it only resets the
/// controller, asks it to advance, and asks whether its cycle is complete.
pub trait PhaseController {
    /// Puts the controller back at the start of its cycle.
    fn reset_state(&mut self);

    /// Advances to the next phase and returns that phase's duration in seconds.
    fn next_state(&mut self) -> f32;

    /// True once the controller has run its whole cycle and can hand over
    /// to the next controller of the group.
    fn is_cycle_finished(&self) -> bool;

    /// Records the group this controller belongs to.
    fn set_group(&mut self, group: GroupId);

    /// Returns the owning group, if registered.
    fn group(&self) -> Option<GroupId>;
}
