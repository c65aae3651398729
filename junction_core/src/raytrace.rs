//! Semantic ray tracing - labelled hit points over a physics-query capability.
//!
//! Stateless wrapper: every call is one or more line traces against the
//! injected [`SceneQuery`], with each hit converted into a [`LabelledPoint`].
//! A miss is a regular result carrying the unlabelled sentinel point.

use junction_env::{ActorId, CityObjectLabel, QueryParams, SceneQuery, TraceChannel, TraceHit};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Friction reported when no physical material is resolvable.
pub const UNKNOWN_FRICTION: f32 = -1.0;

const NORMALIZE_EPSILON: f32 = 1e-8;

/// A scene query result: position, semantic tag, surface normal, friction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelledPoint {
    pub location: Vector3<f32>,
    pub label: CityObjectLabel,
    pub normal: Vector3<f32>,
    pub friction: f32,
}

impl LabelledPoint {
    /// Point with a location and label only.
    pub fn new(location: Vector3<f32>, label: CityObjectLabel) -> Self {
        Self {
            location,
            label,
            normal: Vector3::zeros(),
            friction: UNKNOWN_FRICTION,
        }
    }

    pub fn with_surface(
        location: Vector3<f32>,
        label: CityObjectLabel,
        normal: Vector3<f32>,
        friction: f32,
    ) -> Self {
        Self {
            location,
            label,
            normal,
            friction,
        }
    }

    /// Miss sentinel: origin, unlabelled.
    pub fn unlabelled() -> Self {
        Self::new(Vector3::zeros(), CityObjectLabel::None)
    }

    pub fn is_unlabelled(&self) -> bool {
        self.label.is_unlabelled()
    }
}

impl Default for LabelledPoint {
    fn default() -> Self {
        Self::unlabelled()
    }
}

impl From<&TraceHit> for LabelledPoint {
    fn from(hit: &TraceHit) -> Self {
        Self::new(hit.location, hit.label)
    }
}

/// Semantic ray tracer bound to a world for the duration of a query batch.
pub struct RayTracer<'w, Q: SceneQuery + ?Sized> {
    world: &'w Q,
}

impl<'w, Q: SceneQuery + ?Sized> RayTracer<'w, Q> {
    pub fn new(world: &'w Q) -> Self {
        Self { world }
    }

    /// Every labelled point along `start -> end`, closest first.
    ///
    /// Runs on the overlap channel; points carry location and label only.
    pub fn cast_ray(&self, start: Vector3<f32>, end: Vector3<f32>) -> Vec<LabelledPoint> {
        self.world
            .line_trace_multi(start, end, TraceChannel::Overlap, &QueryParams::default())
            .iter()
            .map(LabelledPoint::from)
            .collect()
    }

    /// First point hit from `start` along `direction`, up to `max_distance`.
    ///
    /// Returns `(false, LabelledPoint::unlabelled())` on a miss.
    pub fn project_point(
        &self,
        start: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
    ) -> (bool, LabelledPoint) {
        let end = start + safe_normal(&direction) * max_distance;
        match self
            .world
            .line_trace_single(start, end, TraceChannel::Camera, &QueryParams::default())
        {
            Some(hit) => (true, LabelledPoint::from(&hit)),
            None => (false, LabelledPoint::unlabelled()),
        }
    }

    /// One projection per start point, sharing a direction and an ignore list.
    ///
    /// Hits carry the surface normal and material friction
    /// ([`UNKNOWN_FRICTION`] when the surface has no material). Misses are
    /// unlabelled sentinels, so the output is index-aligned with `starts`.
    pub fn project_points(
        &self,
        starts: &[Vector3<f32>],
        direction: Vector3<f32>,
        max_distance: f32,
        ignored_actors: &[ActorId],
    ) -> Vec<LabelledPoint> {
        let params = QueryParams {
            ignored_actors: ignored_actors.to_vec(),
            return_physical_material: true,
        };
        let offset = safe_normal(&direction) * max_distance;

        starts
            .iter()
            .map(|&start| {
                match self
                    .world
                    .line_trace_single(start, start + offset, TraceChannel::Visibility, &params)
                {
                    Some(hit) => LabelledPoint::with_surface(
                        hit.location,
                        hit.label,
                        hit.normal,
                        hit.physical_friction.unwrap_or(UNKNOWN_FRICTION),
                    ),
                    None => LabelledPoint::unlabelled(),
                }
            })
            .collect()
    }
}

/// Unit vector along `v`, or zero when `v` is too short to normalise.
fn safe_normal(v: &Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(NORMALIZE_EPSILON).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use junction_env::{SceneBox, StaticScene};

    fn junction_scene() -> StaticScene {
        StaticScene::new()
            .with_box(
                SceneBox::new(
                    ActorId(1),
                    CityObjectLabel::Roads,
                    Vector3::new(-20.0, -20.0, -0.5),
                    Vector3::new(20.0, 20.0, 0.0),
                )
                .with_friction(0.7),
            )
            .with_box(SceneBox::new(
                ActorId(2),
                CityObjectLabel::Sidewalks,
                Vector3::new(20.0, -20.0, -0.5),
                Vector3::new(25.0, 20.0, 0.15),
            ))
            .with_box(SceneBox::new(
                ActorId(3),
                CityObjectLabel::TrafficLight,
                Vector3::new(-0.2, -0.2, 0.0),
                Vector3::new(0.2, 0.2, 5.0),
            ))
    }

    #[test]
    fn test_project_point_miss_on_empty_scene() {
        let scene = StaticScene::new();
        let tracer = RayTracer::new(&scene);

        let (found, point) = tracer.project_point(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -1.0), 100.0);
        assert!(!found);
        assert_eq!(point.location, Vector3::zeros());
        assert_eq!(point.label, CityObjectLabel::None);
        assert_eq!(point.friction, UNKNOWN_FRICTION);
    }

    #[test]
    fn test_project_point_hit_normalizes_direction() {
        let scene = junction_scene();
        let tracer = RayTracer::new(&scene);

        // Unnormalised direction still projects up to max_distance metres
        let (found, point) = tracer.project_point(Vector3::new(10.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -40.0), 6.0);
        assert!(found);
        assert_eq!(point.label, CityObjectLabel::Roads);
        assert_relative_eq!(point.location.z, 0.0, epsilon = 1e-5);
        assert_eq!(point.normal, Vector3::zeros());

        let (found, _) = tracer.project_point(Vector3::new(10.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0), 4.0);
        assert!(!found);
    }

    #[test]
    fn test_project_point_zero_direction_misses() {
        let scene = junction_scene();
        let tracer = RayTracer::new(&scene);
        let (found, point) = tracer.project_point(Vector3::new(10.0, 0.0, -0.2), Vector3::zeros(), 50.0);
        assert!(!found);
        assert!(point.is_unlabelled());
    }

    #[test]
    fn test_cast_ray_reports_every_hit() {
        let scene = junction_scene();
        let tracer = RayTracer::new(&scene);

        let points = tracer.cast_ray(Vector3::new(-10.0, 0.0, 1.0), Vector3::new(30.0, 0.0, 1.0));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, CityObjectLabel::TrafficLight);
        assert_relative_eq!(points[0].location.x, -0.2, epsilon = 1e-5);
        assert_eq!(points[0].friction, UNKNOWN_FRICTION);

        // Descends past the pole, onto the road, then into the kerb
        let points = tracer.cast_ray(Vector3::new(-10.0, 0.0, 1.0), Vector3::new(24.0, 0.0, -0.3));
        let labels: Vec<_> = points.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec![CityObjectLabel::TrafficLight, CityObjectLabel::Roads, CityObjectLabel::Sidewalks]
        );
    }

    #[test]
    fn test_project_points_aligned_with_inputs() {
        let scene = junction_scene();
        let tracer = RayTracer::new(&scene);

        let starts = vec![
            Vector3::new(5.0, 5.0, 10.0),   // road
            Vector3::new(22.0, 0.0, 10.0),  // sidewalk, no material
            Vector3::new(100.0, 0.0, 10.0), // nothing below
            Vector3::new(0.0, 0.0, 10.0),   // traffic light pole
        ];
        let points = tracer.project_points(&starts, Vector3::new(0.0, 0.0, -1.0), 50.0, &[]);

        assert_eq!(points.len(), starts.len());

        assert_eq!(points[0].label, CityObjectLabel::Roads);
        assert_relative_eq!(points[0].friction, 0.7);
        assert_relative_eq!(points[0].normal.z, 1.0);

        assert_eq!(points[1].label, CityObjectLabel::Sidewalks);
        assert_eq!(points[1].friction, UNKNOWN_FRICTION);
        assert_relative_eq!(points[1].location.z, 0.15, epsilon = 1e-5);

        assert_eq!(points[2], LabelledPoint::unlabelled());

        assert_eq!(points[3].label, CityObjectLabel::TrafficLight);
        assert_relative_eq!(points[3].location.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_project_points_ignores_actors() {
        let scene = junction_scene();
        let tracer = RayTracer::new(&scene);

        let points = tracer.project_points(
            &[Vector3::new(0.0, 0.0, 10.0)],
            Vector3::new(0.0, 0.0, -1.0),
            50.0,
            &[ActorId(3)],
        );
        assert_eq!(points[0].label, CityObjectLabel::Roads);
        assert_relative_eq!(points[0].location.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_labelled_point_serialization() {
        let point = LabelledPoint::with_surface(
            Vector3::new(1.0, 2.0, 3.0),
            CityObjectLabel::Vehicles,
            Vector3::new(0.0, 0.0, 1.0),
            0.9,
        );
        let json = serde_json::to_string(&point).unwrap();
        let back: LabelledPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);

        assert_eq!(LabelledPoint::default().friction, -1.0);
    }
}
