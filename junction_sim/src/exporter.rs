//! JSON exporter for signal timelines.
//!
//! Exports simulation frames as JSON for offline inspection or plotting.

use crate::oracle::GroupSnapshot;
use junction_core::{LightState, SignalScene};
use junction_env::ActorId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Timer state of every group
    pub groups: Vec<GroupSnapshot>,

    /// Light shown by every signal head
    pub lights: Vec<LightFrame>,

    /// Events (phase changes, freezes, replay toggles)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

impl SimFrame {
    /// Captures the scene at `time_sec`.
    pub fn capture(scene: &SignalScene, time_sec: f64) -> Self {
        let lights = scene
            .controllers()
            .iter()
            .flat_map(|(_, c)| {
                let state = c.light_state();
                c.traffic_lights().iter().map(move |&actor| LightFrame { actor, state })
            })
            .collect();

        Self {
            time_sec,
            groups: scene.groups().map(GroupSnapshot::of).collect(),
            lights,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: SimEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Light state of one signal head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightFrame {
    pub actor: ActorId,
    pub state: LightState,
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Some("warn".to_string()),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SceneLayout;
    use junction_env::NoReplay;

    #[test]
    fn test_capture_lists_every_head() {
        let mut scene = SceneLayout::default_town().build_scene(NoReplay::shared()).unwrap();
        scene.reset_all();

        let frame = SimFrame::capture(&scene, 0.0);
        assert_eq!(frame.groups.len(), 2);
        assert_eq!(frame.lights.len(), 7);

        let green: Vec<ActorId> = frame
            .lights
            .iter()
            .filter(|l| l.state == LightState::Green)
            .map(|l| l.actor)
            .collect();
        // First arm of the four-way plus both main-road heads of the T
        assert_eq!(green, vec![ActorId(100), ActorId(200), ActorId(201)]);
    }

    #[test]
    fn test_export_json_shape() {
        let scene = SceneLayout::default_town().build_scene(NoReplay::shared()).unwrap();
        let mut export = SimExport::new("four_way", 7);
        export.add_frame(SimFrame::capture(&scene, 0.5));
        export.add_frame(SimFrame::capture(&scene, 1.0).with_event(SimEvent::warn("frozen")));
        export.finalize(true, None);

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["scenario"], "four_way");
        assert_eq!(value["duration_sec"], 1.0);
        assert!(value.get("failure_reason").is_none());
        assert!(value["frames"][0].get("events").is_none());
        assert_eq!(value["frames"][1]["events"][0]["level"], "warn");
        assert_eq!(value["frames"][0]["lights"][0]["state"], "red");
    }
}
