//! In-memory implementation of SceneQuery built from axis-aligned boxes.

use crate::query::{QueryParams, SceneQuery, TraceChannel, TraceHit};
use crate::types::{ActorId, CityObjectLabel};
use nalgebra::Vector3;

const PARALLEL_EPSILON: f32 = 1e-9;

/// An axis-aligned box of labelled geometry.
#[derive(Debug, Clone)]
pub struct SceneBox {
    /// Owning actor
    pub actor: ActorId,

    /// Semantic tag reported on hit
    pub label: CityObjectLabel,

    /// Minimum corner
    pub min: Vector3<f32>,

    /// Maximum corner
    pub max: Vector3<f32>,

    /// Surface friction; `None` models geometry without a physical material
    pub friction: Option<f32>,

    /// Channels this box responds to
    pub channels: Vec<TraceChannel>,
}

impl SceneBox {
    /// Creates a box responding to every channel, without a physical material.
    pub fn new(actor: ActorId, label: CityObjectLabel, min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self {
            actor,
            label,
            min: min.inf(&max),
            max: min.sup(&max),
            friction: None,
            channels: vec![TraceChannel::Overlap, TraceChannel::Camera, TraceChannel::Visibility],
        }
    }

    /// Sets the surface friction.
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }

    /// Restricts the channels this box responds to.
    pub fn with_channels(mut self, channels: &[TraceChannel]) -> Self {
        self.channels = channels.to_vec();
        self
    }

    /// Slab test against the segment `start + t * delta`, `t` in `[0, 1]`.
    ///
    /// Returns the entry parameter and the entry face normal. A segment that
    /// starts inside the box enters at `t = 0` with a zero normal.
    fn intersect(&self, start: &Vector3<f32>, delta: &Vector3<f32>) -> Option<(f32, Vector3<f32>)> {
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;
        let mut normal = Vector3::zeros();

        for axis in 0..3 {
            if delta[axis].abs() < PARALLEL_EPSILON {
                if start[axis] < self.min[axis] || start[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / delta[axis];
            let t_min_face = (self.min[axis] - start[axis]) * inv;
            let t_max_face = (self.max[axis] - start[axis]) * inv;

            let mut face_normal = Vector3::zeros();
            let (t_near, t_far) = if t_min_face < t_max_face {
                face_normal[axis] = -1.0;
                (t_min_face, t_max_face)
            } else {
                face_normal[axis] = 1.0;
                (t_max_face, t_min_face)
            };

            if t_near > t_enter {
                t_enter = t_near;
                normal = face_normal;
            }
            t_exit = t_exit.min(t_far);

            if t_enter > t_exit {
                return None;
            }
        }

        Some((t_enter, normal))
    }
}

/// A static scene made of labelled boxes.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    boxes: Vec<SceneBox>,
}

impl StaticScene {
    /// Creates an empty scene. Every trace against it misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a box to the scene.
    pub fn add_box(&mut self, scene_box: SceneBox) {
        self.boxes.push(scene_box);
    }

    /// Builder-style variant of [`StaticScene::add_box`].
    pub fn with_box(mut self, scene_box: SceneBox) -> Self {
        self.add_box(scene_box);
        self
    }

    /// Returns the number of boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns true if the scene has no geometry.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn hits(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        channel: TraceChannel,
        params: &QueryParams,
    ) -> Vec<TraceHit> {
        let delta = end - start;
        let length = delta.norm();
        if length <= PARALLEL_EPSILON {
            return Vec::new();
        }

        let mut hits: Vec<TraceHit> = self
            .boxes
            .iter()
            .filter(|b| b.channels.contains(&channel) && !params.ignores(b.actor))
            .filter_map(|b| {
                b.intersect(&start, &delta).map(|(t, normal)| TraceHit {
                    location: start + delta * t,
                    normal,
                    label: b.label,
                    actor: b.actor,
                    physical_friction: if params.return_physical_material {
                        b.friction
                    } else {
                        None
                    },
                    distance: t * length,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl SceneQuery for StaticScene {
    fn line_trace_multi(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        channel: TraceChannel,
        params: &QueryParams,
    ) -> Vec<TraceHit> {
        self.hits(start, end, channel, params)
    }

    fn line_trace_single(
        &self,
        start: Vector3<f32>,
        end: Vector3<f32>,
        channel: TraceChannel,
        params: &QueryParams,
    ) -> Option<TraceHit> {
        self.hits(start, end, channel, params).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn road_scene() -> StaticScene {
        StaticScene::new()
            .with_box(
                SceneBox::new(
                    ActorId(1),
                    CityObjectLabel::Roads,
                    Vector3::new(-50.0, -50.0, -1.0),
                    Vector3::new(50.0, 50.0, 0.0),
                )
                .with_friction(0.8),
            )
            .with_box(SceneBox::new(
                ActorId(2),
                CityObjectLabel::Poles,
                Vector3::new(4.0, -0.5, 0.0),
                Vector3::new(5.0, 0.5, 6.0),
            ))
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = StaticScene::new();
        let hit = scene.line_trace_single(
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, -10.0),
            TraceChannel::Visibility,
            &QueryParams::default(),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_downward_trace_hits_road_top_face() {
        let scene = road_scene();
        let hit = scene
            .line_trace_single(
                Vector3::new(0.0, 0.0, 10.0),
                Vector3::new(0.0, 0.0, -10.0),
                TraceChannel::Visibility,
                &QueryParams::default(),
            )
            .unwrap();

        assert_eq!(hit.label, CityObjectLabel::Roads);
        assert_relative_eq!(hit.location.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-5);
        assert!(hit.physical_friction.is_none());
    }

    #[test]
    fn test_multi_trace_sorted_by_distance() {
        let scene = road_scene();
        let hits = scene.line_trace_multi(
            Vector3::new(0.0, 0.0, 3.0),
            Vector3::new(10.0, 0.0, -3.0),
            TraceChannel::Overlap,
            &QueryParams::default(),
        );

        // Crosses the pole first, then the road surface
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].label, CityObjectLabel::Poles);
        assert_eq!(hits[1].label, CityObjectLabel::Roads);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_ignored_actor_is_skipped() {
        let scene = road_scene();
        let params = QueryParams {
            ignored_actors: vec![ActorId(1)],
            return_physical_material: true,
        };
        let hit = scene.line_trace_single(
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, -10.0),
            TraceChannel::Visibility,
            &params,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_channel_filter() {
        let scene = StaticScene::new().with_box(
            SceneBox::new(
                ActorId(7),
                CityObjectLabel::Vegetation,
                Vector3::new(-1.0, -1.0, -1.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
            .with_channels(&[TraceChannel::Overlap]),
        );
        let params = QueryParams::default();
        let start = Vector3::new(-5.0, 0.0, 0.0);
        let end = Vector3::new(5.0, 0.0, 0.0);

        assert!(scene.line_trace_single(start, end, TraceChannel::Camera, &params).is_none());
        assert_eq!(scene.line_trace_multi(start, end, TraceChannel::Overlap, &params).len(), 1);
    }

    #[test]
    fn test_start_inside_box_reports_start() {
        let scene = road_scene();
        let start = Vector3::new(4.5, 0.0, 3.0);
        let hit = scene
            .line_trace_single(start, Vector3::new(4.5, 0.0, 20.0), TraceChannel::Camera, &QueryParams::default())
            .unwrap();
        assert_eq!(hit.actor, ActorId(2));
        assert_eq!(hit.location, start);
        assert_eq!(hit.normal, Vector3::zeros());
    }

    #[test]
    fn test_zero_length_segment_misses() {
        let scene = road_scene();
        let p = Vector3::new(0.0, 0.0, -0.5);
        assert!(scene.line_trace_single(p, p, TraceChannel::Camera, &QueryParams::default()).is_none());
    }
}
