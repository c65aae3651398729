//! Scene-level registry of traffic light controllers and signal groups.
//!
//! The scene owns every controller (in an arena) and every group. It is the
//! single writer for both: the host calls [`SignalScene::tick`] once per
//! frame and uses the other methods between frames.

use crate::arena::{ControllerArena, ControllerId, ControllerStore};
use crate::error::SignalError;
use crate::group::{GroupId, SignalGroup, TickOutcome};
use crate::traffic_light::{LightStage, TrafficLightController};
use junction_env::{JunctionId, ReplayStatus};
use std::sync::Arc;
use tracing::info;

pub struct SignalScene {
    controllers: ControllerArena<TrafficLightController>,
    groups: Vec<SignalGroup>,
    replay: Arc<dyn ReplayStatus>,

    /// Scene-wide freeze, applied to existing and future groups
    frozen: bool,
}

impl SignalScene {
    /// Creates an empty scene whose groups all poll `replay`.
    pub fn new(replay: Arc<dyn ReplayStatus>) -> Self {
        Self {
            controllers: ControllerArena::new(),
            groups: Vec::new(),
            replay,
            frozen: false,
        }
    }

    /// Creates an empty group for a junction.
    pub fn create_group(&mut self, junction_id: JunctionId) -> GroupId {
        let id = GroupId(self.groups.len());
        let mut group = SignalGroup::new(id, junction_id, Arc::clone(&self.replay));
        group.set_frozen(self.frozen);
        self.groups.push(group);
        id
    }

    /// Moves a controller into the scene and registers it with `group`.
    pub fn add_controller(
        &mut self,
        group: GroupId,
        controller: TrafficLightController,
    ) -> Result<ControllerId, SignalError> {
        let signal_group = self
            .groups
            .get_mut(group.0)
            .ok_or(SignalError::UnknownGroup(group))?;
        let id = self.controllers.insert(controller);
        signal_group.register_controller(id, &mut self.controllers);
        Ok(id)
    }

    /// Replaces a controller's cycle. The owning group keeps its timer until
    /// its next phase change or reset.
    pub fn set_controller_stages(
        &mut self,
        controller: ControllerId,
        stages: Vec<LightStage>,
    ) -> Result<(), SignalError> {
        self.controllers
            .get_mut(controller)
            .ok_or(SignalError::UnknownController(controller))?
            .set_stages(stages)
    }

    pub fn group(&self, id: GroupId) -> Option<&SignalGroup> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut SignalGroup> {
        self.groups.get_mut(id.0)
    }

    /// Finds the group governing a junction.
    pub fn group_for_junction(&self, junction_id: JunctionId) -> Option<&SignalGroup> {
        self.groups.iter().find(|g| g.junction_id() == junction_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &SignalGroup> {
        self.groups.iter()
    }

    pub fn controller(&self, id: ControllerId) -> Option<&TrafficLightController> {
        self.controllers.get(id)
    }

    pub fn controllers(&self) -> &ControllerArena<TrafficLightController> {
        &self.controllers
    }

    /// Reads a controller's back-reference.
    pub fn group_of(&self, controller: ControllerId) -> Option<GroupId> {
        self.controllers.controller(controller)?.group()
    }

    /// Resets every group (and through them every registered controller).
    pub fn reset_all(&mut self) {
        for group in &mut self.groups {
            group.reset(&mut self.controllers);
        }
    }

    /// Freezes or unfreezes every group.
    pub fn set_frozen_all(&mut self, frozen: bool) {
        self.frozen = frozen;
        for group in &mut self.groups {
            group.set_frozen(frozen);
        }
        info!(
            "Signal scene {} ({} groups)",
            if frozen { "frozen" } else { "unfrozen" },
            self.groups.len()
        );
    }

    /// Scene-wide freeze flag last set with [`SignalScene::set_frozen_all`].
    pub fn is_frozen_all(&self) -> bool {
        self.frozen
    }

    /// Ticks every group once, in creation order.
    pub fn tick(&mut self, delta_time: f32) -> Vec<(GroupId, TickOutcome)> {
        self.groups
            .iter_mut()
            .map(|group| (group.id(), group.tick(delta_time, &mut self.controllers)))
            .collect()
    }
}
