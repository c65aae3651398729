//! Junction layouts - the scene description the harness builds from.
//!
//! Layouts are plain serde structs, loaded from JSON or taken from the
//! built-in presets, and turned into a [`SignalScene`] plus matching
//! [`StaticScene`] geometry for the sensor probes.

use junction_core::{default_stages, LightStage, LightState, SignalError, SignalScene, TrafficLightController};
use junction_env::{ActorId, CityObjectLabel, JunctionId, ReplayStatus, SceneBox, StaticScene};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Half-width of the road slab laid under each junction (meters)
const ROAD_HALF_EXTENT: f32 = 30.0;

/// Height of a traffic light pole (meters)
pub const POLE_HEIGHT: f32 = 4.0;

pub(crate) const POLE_HALF_WIDTH: f32 = 0.2;

/// Road surface friction used for generated geometry
const ROAD_FRICTION: f32 = 0.7;

/// Base actor id of generated road slabs; keeps them clear of signal heads
const ROAD_ACTOR_BASE: u64 = 1_000_000;

/// Errors raised while loading or building a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to read layout: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid controller: {0}")]
    Signal(#[from] SignalError),

    #[error("Junction {0} appears more than once")]
    DuplicateJunction(JunctionId),

    #[error("Layout has no junctions")]
    EmptyLayout,
}

/// A signal head placed in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLightLayout {
    pub actor: ActorId,

    /// Pole base position [x, y, z]
    pub position: [f32; 3],
}

/// One junction arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerLayout {
    /// OpenDRIVE controller id
    pub id: String,

    #[serde(default = "default_stages")]
    pub stages: Vec<LightStage>,

    #[serde(default)]
    pub traffic_lights: Vec<TrafficLightLayout>,
}

/// One junction and its arms, in activation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JunctionLayout {
    pub junction_id: JunctionId,

    /// Junction centre [x, y, z]
    #[serde(default)]
    pub origin: [f32; 3],

    pub controllers: Vec<ControllerLayout>,
}

/// A whole town's signalised junctions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneLayout {
    pub junctions: Vec<JunctionLayout>,
}

fn offset(origin: [f32; 3], dx: f32, dy: f32) -> [f32; 3] {
    [origin[0] + dx, origin[1] + dy, origin[2]]
}

impl JunctionLayout {
    /// Four arms with the default green/yellow/red cycle, one signal head
    /// per arm 8 m from the centre. Actor ids start at `first_actor`.
    pub fn four_way(junction_id: JunctionId, origin: [f32; 3], first_actor: u64) -> Self {
        let arms = [(8.0, 0.0), (0.0, 8.0), (-8.0, 0.0), (0.0, -8.0)];
        let controllers = arms
            .iter()
            .enumerate()
            .map(|(i, &(dx, dy))| ControllerLayout {
                id: (i + 1).to_string(),
                stages: default_stages(),
                traffic_lights: vec![TrafficLightLayout {
                    actor: ActorId(first_actor + i as u64),
                    position: offset(origin, dx, dy),
                }],
            })
            .collect();

        Self {
            junction_id,
            origin,
            controllers,
        }
    }

    /// Main road with two heads and a long green, side road with a short one.
    pub fn t_junction(junction_id: JunctionId, origin: [f32; 3], first_actor: u64) -> Self {
        let main_stages = vec![
            LightStage::new(LightState::Green, 12.0),
            LightStage::new(LightState::Yellow, 3.0),
            LightStage::new(LightState::Red, 2.0),
        ];
        let side_stages = vec![
            LightStage::new(LightState::Green, 6.0),
            LightStage::new(LightState::Yellow, 2.0),
            LightStage::new(LightState::Red, 2.0),
        ];

        Self {
            junction_id,
            origin,
            controllers: vec![
                ControllerLayout {
                    id: "main".to_string(),
                    stages: main_stages,
                    traffic_lights: vec![
                        TrafficLightLayout {
                            actor: ActorId(first_actor),
                            position: offset(origin, 8.0, 0.0),
                        },
                        TrafficLightLayout {
                            actor: ActorId(first_actor + 1),
                            position: offset(origin, -8.0, 0.0),
                        },
                    ],
                },
                ControllerLayout {
                    id: "side".to_string(),
                    stages: side_stages,
                    traffic_lights: vec![TrafficLightLayout {
                        actor: ActorId(first_actor + 2),
                        position: offset(origin, 0.0, -8.0),
                    }],
                },
            ],
        }
    }

    /// Seconds for every controller to run one full cycle.
    pub fn round_duration(&self) -> f32 {
        self.controllers
            .iter()
            .flat_map(|c| c.stages.iter())
            .map(|s| s.duration)
            .sum()
    }
}

impl SceneLayout {
    /// A single junction layout.
    pub fn single(junction: JunctionLayout) -> Self {
        Self {
            junctions: vec![junction],
        }
    }

    /// Four-way junction at the origin plus a T-junction 120 m east.
    pub fn default_town() -> Self {
        Self {
            junctions: vec![
                JunctionLayout::four_way(JunctionId(1), [0.0, 0.0, 0.0], 100),
                JunctionLayout::t_junction(JunctionId(2), [120.0, 0.0, 0.0], 200),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Builds the signal scene: one group per junction, controllers
    /// registered in layout order. Groups are not reset.
    pub fn build_scene(&self, replay: Arc<dyn ReplayStatus>) -> Result<SignalScene, LayoutError> {
        if self.junctions.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }

        let mut seen = HashSet::new();
        let mut scene = SignalScene::new(replay);

        for junction in &self.junctions {
            if !seen.insert(junction.junction_id) {
                return Err(LayoutError::DuplicateJunction(junction.junction_id));
            }

            let group = scene.create_group(junction.junction_id);
            for layout in &junction.controllers {
                let mut controller = TrafficLightController::new(layout.id.clone(), layout.stages.clone())?;
                for light in &layout.traffic_lights {
                    controller.add_traffic_light(light.actor);
                }
                scene.add_controller(group, controller)?;
            }
        }

        Ok(scene)
    }

    /// Query geometry: a road slab under each junction and a pole per
    /// signal head.
    pub fn build_geometry(&self) -> StaticScene {
        let mut world = StaticScene::new();

        for (i, junction) in self.junctions.iter().enumerate() {
            let o = Vector3::from(junction.origin);
            world.add_box(
                SceneBox::new(
                    ActorId(ROAD_ACTOR_BASE + i as u64),
                    CityObjectLabel::Roads,
                    o + Vector3::new(-ROAD_HALF_EXTENT, -ROAD_HALF_EXTENT, -0.5),
                    o + Vector3::new(ROAD_HALF_EXTENT, ROAD_HALF_EXTENT, 0.0),
                )
                .with_friction(ROAD_FRICTION),
            );

            for light in junction.controllers.iter().flat_map(|c| c.traffic_lights.iter()) {
                let base = Vector3::from(light.position);
                world.add_box(SceneBox::new(
                    light.actor,
                    CityObjectLabel::TrafficLight,
                    base + Vector3::new(-POLE_HALF_WIDTH, -POLE_HALF_WIDTH, 0.0),
                    base + Vector3::new(POLE_HALF_WIDTH, POLE_HALF_WIDTH, POLE_HEIGHT),
                ));
            }
        }

        world
    }

    /// Every signal head in the layout.
    pub fn traffic_lights(&self) -> impl Iterator<Item = &TrafficLightLayout> {
        self.junctions
            .iter()
            .flat_map(|j| j.controllers.iter())
            .flat_map(|c| c.traffic_lights.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_env::NoReplay;

    #[test]
    fn test_default_town_builds() {
        let layout = SceneLayout::default_town();
        let scene = layout.build_scene(NoReplay::shared()).unwrap();

        let four_way = scene.group_for_junction(JunctionId(1)).unwrap();
        let t = scene.group_for_junction(JunctionId(2)).unwrap();
        assert_eq!(four_way.len(), 4);
        assert_eq!(t.len(), 2);
        assert_eq!(layout.traffic_lights().count(), 7);
    }

    #[test]
    fn test_json_layout_with_default_stages() {
        let json = r#"{
            "junctions": [{
                "junction_id": 55,
                "controllers": [
                    { "id": "a", "traffic_lights": [{ "actor": 9, "position": [1.0, 2.0, 0.0] }] },
                    { "id": "b", "stages": [{ "state": "green", "duration": 4.0 }, { "state": "red", "duration": 1.0 }] }
                ]
            }]
        }"#;
        let layout = SceneLayout::from_json_str(json).unwrap();
        let junction = &layout.junctions[0];

        assert_eq!(junction.junction_id, JunctionId(55));
        assert_eq!(junction.origin, [0.0, 0.0, 0.0]);
        assert_eq!(junction.controllers[0].stages, default_stages());
        assert_eq!(junction.controllers[1].stages[0].state, LightState::Green);
        assert_eq!(junction.controllers[0].traffic_lights[0].actor, ActorId(9));
        assert_eq!(junction.round_duration(), 15.0 + 5.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{ "junctions": [], "speed": 3 }"#;
        assert!(matches!(SceneLayout::from_json_str(json), Err(LayoutError::Json(_))));
    }

    #[test]
    fn test_empty_layout_rejected() {
        let layout = SceneLayout { junctions: Vec::new() };
        assert!(matches!(layout.build_scene(NoReplay::shared()), Err(LayoutError::EmptyLayout)));
    }

    #[test]
    fn test_duplicate_junction_rejected() {
        let layout = SceneLayout {
            junctions: vec![
                JunctionLayout::four_way(JunctionId(3), [0.0; 3], 0),
                JunctionLayout::t_junction(JunctionId(3), [50.0, 0.0, 0.0], 10),
            ],
        };
        assert!(matches!(
            layout.build_scene(NoReplay::shared()),
            Err(LayoutError::DuplicateJunction(JunctionId(3)))
        ));
    }

    #[test]
    fn test_invalid_stage_rejected() {
        let mut junction = JunctionLayout::four_way(JunctionId(1), [0.0; 3], 0);
        junction.controllers[2].stages[1].duration = -2.0;
        let result = SceneLayout::single(junction).build_scene(NoReplay::shared());
        assert!(matches!(
            result,
            Err(LayoutError::Signal(SignalError::InvalidDuration { index: 1, .. }))
        ));
    }

    #[test]
    fn test_geometry_has_road_and_poles() {
        let layout = SceneLayout::single(JunctionLayout::four_way(JunctionId(1), [0.0; 3], 0));
        let world = layout.build_geometry();
        assert_eq!(world.len(), 1 + 4);
    }
}
