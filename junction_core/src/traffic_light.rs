//! Traffic light controller: a cyclic list of timed light stages.
//!
//! The last stage is the resting stage. `reset_state` parks the controller
//! there, so the first `next_state` after a reset starts the cycle at stage 0
//! and the cycle is finished once the controller is back on the last stage.

use crate::controller::PhaseController;
use crate::error::SignalError;
use crate::group::GroupId;
use junction_env::ActorId;
use serde::{Deserialize, Serialize};

/// Light shown by every signal head a controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    Red,
    Yellow,
    Green,
    Off,
    Unknown,
}

impl LightState {
    /// True for every state that lets traffic through or warns it to clear.
    pub fn is_permissive(self) -> bool {
        matches!(self, LightState::Green | LightState::Yellow)
    }
}

/// One timed entry of a controller's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightStage {
    pub state: LightState,

    /// Seconds the stage lasts
    pub duration: f32,
}

impl LightStage {
    pub fn new(state: LightState, duration: f32) -> Self {
        Self { state, duration }
    }
}

/// Green 10 s, yellow 3 s, red 2 s.
pub fn default_stages() -> Vec<LightStage> {
    vec![
        LightStage::new(LightState::Green, 10.0),
        LightStage::new(LightState::Yellow, 3.0),
        LightStage::new(LightState::Red, 2.0),
    ]
}

fn validate_stages(stages: &[LightStage]) -> Result<(), SignalError> {
    if stages.is_empty() {
        return Err(SignalError::EmptyStages);
    }
    for (index, stage) in stages.iter().enumerate() {
        if !stage.duration.is_finite() || stage.duration < 0.0 {
            return Err(SignalError::InvalidDuration {
                index,
                duration: stage.duration,
            });
        }
    }
    Ok(())
}

/// Drives the signal heads of one junction arm through its stages.
#[derive(Debug, Clone)]
pub struct TrafficLightController {
    /// OpenDRIVE controller id
    controller_id: String,

    /// Cycle, never empty
    stages: Vec<LightStage>,

    /// Index of the active stage
    current_stage: usize,

    /// Signal heads switched together by this controller
    traffic_lights: Vec<ActorId>,

    /// Back-reference to the owning group
    group: Option<GroupId>,
}

impl TrafficLightController {
    /// Creates a controller parked on its resting stage.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::EmptyStages`] or [`SignalError::InvalidDuration`]
    /// if the stage list is unusable.
    pub fn new(controller_id: impl Into<String>, stages: Vec<LightStage>) -> Result<Self, SignalError> {
        validate_stages(&stages)?;
        let current_stage = stages.len() - 1;
        Ok(Self {
            controller_id: controller_id.into(),
            stages,
            current_stage,
            traffic_lights: Vec::new(),
            group: None,
        })
    }

    /// Creates a controller running [`default_stages`].
    pub fn with_default_stages(controller_id: impl Into<String>) -> Self {
        let stages = default_stages();
        let current_stage = stages.len() - 1;
        Self {
            controller_id: controller_id.into(),
            stages,
            current_stage,
            traffic_lights: Vec::new(),
            group: None,
        }
    }

    /// Adds a signal head to this controller.
    pub fn add_traffic_light(&mut self, actor: ActorId) {
        self.traffic_lights.push(actor);
    }

    pub fn with_traffic_light(mut self, actor: ActorId) -> Self {
        self.add_traffic_light(actor);
        self
    }

    /// Replaces the cycle and parks the controller on the new resting stage.
    pub fn set_stages(&mut self, stages: Vec<LightStage>) -> Result<(), SignalError> {
        validate_stages(&stages)?;
        self.stages = stages;
        self.reset_state();
        Ok(())
    }

    pub fn controller_id(&self) -> &str {
        &self.controller_id
    }

    pub fn stages(&self) -> &[LightStage] {
        &self.stages
    }

    pub fn current_stage(&self) -> usize {
        self.current_stage
    }

    pub fn traffic_lights(&self) -> &[ActorId] {
        &self.traffic_lights
    }

    /// Light currently shown by this controller's signal heads.
    pub fn light_state(&self) -> LightState {
        self.stages[self.current_stage].state
    }

    /// Total length of one cycle in seconds.
    pub fn cycle_duration(&self) -> f32 {
        self.stages.iter().map(|s| s.duration).sum()
    }
}

impl PhaseController for TrafficLightController {
    fn reset_state(&mut self) {
        self.current_stage = self.stages.len() - 1;
    }

    fn next_state(&mut self) -> f32 {
        self.current_stage = (self.current_stage + 1) % self.stages.len();
        self.stages[self.current_stage].duration
    }

    fn is_cycle_finished(&self) -> bool {
        self.current_stage == self.stages.len() - 1
    }

    fn set_group(&mut self, group: GroupId) {
        self.group = Some(group);
    }

    fn group(&self) -> Option<GroupId> {
        self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_controller_rests_on_last_stage() {
        let controller = TrafficLightController::with_default_stages("1");
        assert_eq!(controller.current_stage(), 2);
        assert_eq!(controller.light_state(), LightState::Red);
        assert!(controller.is_cycle_finished());
        assert!(controller.group().is_none());
    }

    #[test]
    fn test_cycle_walks_stages_in_order() {
        let mut controller = TrafficLightController::with_default_stages("1");

        assert_eq!(controller.next_state(), 10.0);
        assert_eq!(controller.light_state(), LightState::Green);
        assert!(!controller.is_cycle_finished());

        assert_eq!(controller.next_state(), 3.0);
        assert_eq!(controller.light_state(), LightState::Yellow);
        assert!(!controller.is_cycle_finished());

        assert_eq!(controller.next_state(), 2.0);
        assert_eq!(controller.light_state(), LightState::Red);
        assert!(controller.is_cycle_finished());

        // Wraps around
        assert_eq!(controller.next_state(), 10.0);
    }

    #[test]
    fn test_single_stage_finishes_every_advance() {
        let mut controller =
            TrafficLightController::new("solo", vec![LightStage::new(LightState::Red, 4.0)]).unwrap();
        assert_eq!(controller.next_state(), 4.0);
        assert!(controller.is_cycle_finished());
        assert_eq!(controller.next_state(), 4.0);
        assert!(controller.is_cycle_finished());
    }

    #[test]
    fn test_reset_state_returns_to_resting_stage() {
        let mut controller = TrafficLightController::with_default_stages("1");
        controller.next_state();
        controller.reset_state();
        assert_eq!(controller.current_stage(), 2);
        assert_eq!(controller.next_state(), 10.0);
    }

    #[test]
    fn test_rejects_empty_stages() {
        let result = TrafficLightController::new("1", Vec::new());
        assert_eq!(result.unwrap_err(), SignalError::EmptyStages);
    }

    #[test]
    fn test_rejects_negative_and_nan_durations() {
        let result = TrafficLightController::new(
            "1",
            vec![
                LightStage::new(LightState::Green, 5.0),
                LightStage::new(LightState::Red, -1.0),
            ],
        );
        assert!(matches!(result, Err(SignalError::InvalidDuration { index: 1, .. })));

        let result = TrafficLightController::new("1", vec![LightStage::new(LightState::Red, f32::NAN)]);
        assert!(matches!(result, Err(SignalError::InvalidDuration { index: 0, .. })));
    }

    #[test]
    fn test_set_stages_resets() {
        let mut controller = TrafficLightController::with_default_stages("1");
        controller.next_state();

        controller
            .set_stages(vec![
                LightStage::new(LightState::Green, 7.0),
                LightStage::new(LightState::Red, 1.0),
            ])
            .unwrap();
        assert_eq!(controller.current_stage(), 1);
        assert_eq!(controller.cycle_duration(), 8.0);

        assert!(controller.set_stages(Vec::new()).is_err());
        // Failed replacement keeps the previous cycle
        assert_eq!(controller.stages().len(), 2);
    }

    #[test]
    fn test_traffic_lights_and_group() {
        let mut controller = TrafficLightController::with_default_stages("1")
            .with_traffic_light(ActorId(10))
            .with_traffic_light(ActorId(11));
        controller.set_group(GroupId(3));

        assert_eq!(controller.traffic_lights(), &[ActorId(10), ActorId(11)]);
        assert_eq!(controller.group(), Some(GroupId(3)));
        assert_eq!(controller.controller_id(), "1");
    }
}
