//! Signal group scheduler - round-robin phase cycling for one junction.
//!
//! A group owns the *order* of the controllers at a junction and a single
//! phase timer. Only the active controller changes phase; when it reports a
//! finished cycle the group hands over to the next controller in
//! registration order, wrapping around forever.
//!
//! ```text
//!            remaining <= 0
//!   ┌──────────────────────────────┐
//!   │ active.is_cycle_finished()?  │
//!   └──────┬────────────────┬──────┘
//!       no │                │ yes
//!          ▼                ▼
//!   active.next_state()   index = (index + 1) % len
//!                         controllers[index].next_state()
//! ```
//!
//! # Overshoot
//!
//! At most one cycle step runs per tick. When a large `delta_time` expires
//! the phase early, the time past the boundary is dropped and the new phase
//! starts at its full duration.

use crate::arena::{ControllerId, ControllerStore};
use junction_env::{JunctionId, ReplayStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Index of a group inside a scene; stored in controllers as their back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// What a single [`SignalGroup::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Replay owns signal state; nothing changed
    Suspended,

    /// Group is frozen; nothing changed
    Frozen,

    /// No controllers registered
    Idle,

    /// Timer decremented, phase still running
    Counting,

    /// Active controller moved to its next phase
    Advanced { controller: ControllerId },

    /// Active controller finished its cycle; control moved on
    Rotated { from: ControllerId, to: ControllerId },
}

impl TickOutcome {
    /// True if the tick started a new phase.
    pub fn changed_phase(&self) -> bool {
        matches!(self, TickOutcome::Advanced { .. } | TickOutcome::Rotated { .. })
    }
}

/// Round-robin scheduler over the controllers of one junction.
pub struct SignalGroup {
    /// Handle of this group in its scene
    id: GroupId,

    /// Junction governed by this group
    junction_id: JunctionId,

    /// Activation order
    controllers: Vec<ControllerId>,

    /// Index into `controllers` of the active controller
    current_controller: usize,

    /// Countdown to the end of the current phase (seconds)
    remaining_time: f32,

    /// Duration the current phase started with (seconds)
    current_phase_duration: f32,

    is_frozen: bool,

    /// Polled at the top of every tick
    replay: Arc<dyn ReplayStatus>,
}

impl std::fmt::Debug for SignalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalGroup")
            .field("id", &self.id)
            .field("junction_id", &self.junction_id)
            .field("controllers", &self.controllers)
            .field("current_controller", &self.current_controller)
            .field("remaining_time", &self.remaining_time)
            .field("current_phase_duration", &self.current_phase_duration)
            .field("is_frozen", &self.is_frozen)
            .finish_non_exhaustive()
    }
}

impl SignalGroup {
    /// Creates an empty, unfrozen group.
    pub fn new(id: GroupId, junction_id: JunctionId, replay: Arc<dyn ReplayStatus>) -> Self {
        Self {
            id,
            junction_id,
            controllers: Vec::new(),
            current_controller: 0,
            remaining_time: 0.0,
            current_phase_duration: 0.0,
            is_frozen: false,
            replay,
        }
    }

    /// Appends a controller to the activation order and points its
    /// back-reference at this group.
    ///
    /// No duplicate detection: registering the same controller in two
    /// groups is a caller error.
    pub fn register_controller<S>(&mut self, controller: ControllerId, store: &mut S)
    where
        S: ControllerStore + ?Sized,
    {
        match store.controller_mut(controller) {
            Some(c) => c.set_group(self.id),
            None => warn!("{} registered unresolved {}", self.junction_id, controller),
        }
        self.controllers.push(controller);
    }

    /// Resets every controller and restarts the cycle at the first one.
    pub fn reset<S>(&mut self, store: &mut S)
    where
        S: ControllerStore + ?Sized,
    {
        for &id in &self.controllers {
            if let Some(c) = store.controller_mut(id) {
                c.reset_state();
            }
        }
        self.current_controller = 0;

        let duration = match self.controllers.first() {
            Some(&first) => self.request_next_state(first, store),
            None => 0.0,
        };
        self.begin_phase(duration);

        info!(
            "{} reset: {} controllers, first phase {:.2}s",
            self.junction_id,
            self.controllers.len(),
            duration
        );
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.is_frozen = frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn junction_id(&self) -> JunctionId {
        self.junction_id
    }

    /// Seconds spent in the current phase.
    pub fn elapsed_time(&self) -> f32 {
        self.current_phase_duration - self.remaining_time
    }

    /// Seeks within the current phase.
    ///
    /// The value is not range-checked. A value past the phase duration makes
    /// `remaining_time` negative, and the next tick then advances.
    pub fn set_elapsed_time(&mut self, elapsed: f32) {
        self.remaining_time = self.current_phase_duration - elapsed;
    }

    pub fn remaining_time(&self) -> f32 {
        self.remaining_time
    }

    pub fn current_phase_duration(&self) -> f32 {
        self.current_phase_duration
    }

    /// Index of the active controller, `None` for an empty group.
    pub fn current_controller_index(&self) -> Option<usize> {
        if self.controllers.is_empty() {
            None
        } else {
            Some(self.current_controller)
        }
    }

    /// Handle of the active controller, `None` for an empty group.
    pub fn active_controller(&self) -> Option<ControllerId> {
        self.controllers.get(self.current_controller).copied()
    }

    pub fn controllers(&self) -> &[ControllerId] {
        &self.controllers
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Advances the group by one simulation frame.
    ///
    /// Replay takes precedence over freezing; both leave every timer and
    /// the active controller untouched.
    pub fn tick<S>(&mut self, delta_time: f32, store: &mut S) -> TickOutcome
    where
        S: ControllerStore + ?Sized,
    {
        if self.replay.is_replay_active() {
            trace!("{} tick suspended by replay", self.junction_id);
            return TickOutcome::Suspended;
        }

        if self.is_frozen {
            trace!("{} tick skipped, group frozen", self.junction_id);
            return TickOutcome::Frozen;
        }

        self.remaining_time -= delta_time;

        if self.controllers.is_empty() {
            self.remaining_time = 0.0;
            return TickOutcome::Idle;
        }

        if self.remaining_time <= 0.0 {
            return self.next_cycle_step(store);
        }

        TickOutcome::Counting
    }

    fn next_cycle_step<S>(&mut self, store: &mut S) -> TickOutcome
    where
        S: ControllerStore + ?Sized,
    {
        let active = self.controllers[self.current_controller];

        // An unresolved handle has no cycle to finish
        let finished = store
            .controller(active)
            .map_or(true, |c| c.is_cycle_finished());

        if finished {
            return self.next_controller(store);
        }

        let duration = self.request_next_state(active, store);
        self.begin_phase(duration);
        debug!(
            "{} {} next phase {:.2}s",
            self.junction_id, active, duration
        );
        TickOutcome::Advanced { controller: active }
    }

    fn next_controller<S>(&mut self, store: &mut S) -> TickOutcome
    where
        S: ControllerStore + ?Sized,
    {
        let from = self.controllers[self.current_controller];
        self.current_controller = (self.current_controller + 1) % self.controllers.len();
        let to = self.controllers[self.current_controller];

        let duration = self.request_next_state(to, store);
        self.begin_phase(duration);
        debug!(
            "{} handover {} -> {} (index {}), phase {:.2}s",
            self.junction_id, from, to, self.current_controller, duration
        );
        TickOutcome::Rotated { from, to }
    }

    fn request_next_state<S>(&self, id: ControllerId, store: &mut S) -> f32
    where
        S: ControllerStore + ?Sized,
    {
        match store.controller_mut(id) {
            Some(c) => c.next_state(),
            None => {
                warn!("{} skipping unresolved {}", self.junction_id, id);
                0.0
            }
        }
    }

    fn begin_phase(&mut self, duration: f32) {
        self.remaining_time = duration;
        self.current_phase_duration = duration;
    }
}
