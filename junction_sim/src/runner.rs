//! Scenario runner - executes signal cycling test scenarios.

use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::layout::{JunctionLayout, LayoutError, SceneLayout, POLE_HALF_WIDTH, POLE_HEIGHT};
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use junction_core::{GroupId, LightState, RayTracer, SignalScene, TickOutcome};
use junction_env::{ActorId, CityObjectLabel, JunctionId};
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Height above a signal head base that sensor probes start from (meters)
const PROBE_HEIGHT: f32 = 20.0;

/// Probe range (meters)
const PROBE_RANGE: f32 = 50.0;

/// Half-length of the horizontal sweep through each junction (meters)
const SWEEP_HALF_LENGTH: f32 = 50.0;

/// Length of a single overshoot frame (seconds)
const OVERSHOOT_FRAME_SECS: f64 = 100.0;

/// Number of overshoot frames before normal ticking resumes
const OVERSHOOT_FRAMES: u64 = 5;

/// Longest replay window in seconds
const MAX_REPLAY_WINDOW_SECS: f64 = 3.0;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Controller handovers across all groups
    pub rotations: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Group ticks that changed phase
    pub phase_changes: u64,

    /// Group ticks suppressed by replay
    pub suspended_ticks: u64,

    /// Group ticks suppressed by freezing
    pub frozen_ticks: u64,

    /// Oracle violations recorded
    pub oracle_violations: u64,

    /// Ray queries issued against the junction geometry
    pub sensor_probes: u64,
}

/// Optional frame recorder for a run.
struct Timeline {
    export: Option<SimExport>,
    interval: u64,
}

impl Timeline {
    fn disabled() -> Self {
        Self {
            export: None,
            interval: 1,
        }
    }

    fn enabled(scenario: ScenarioId, seed: u64, tick_rate_hz: u32) -> Self {
        Self {
            export: Some(SimExport::new(scenario.name(), seed)),
            // ~3 frames per simulated second, plus every handover
            interval: (tick_rate_hz as u64 / 3).max(1),
        }
    }

    fn record(&mut self, world: &SimWorld, outcomes: &[(GroupId, TickOutcome)]) {
        let Some(export) = self.export.as_mut() else {
            return;
        };

        let events: Vec<SimEvent> = outcomes
            .iter()
            .filter_map(|(group, outcome)| match outcome {
                TickOutcome::Rotated { from, to } => {
                    Some(SimEvent::info(format!("{} handover {} -> {}", group, from, to)))
                }
                _ => None,
            })
            .collect();

        if world.tick_count() % self.interval != 0 && events.is_empty() {
            return;
        }

        let mut frame = SimFrame::capture(&world.scene, world.time());
        frame.events = events;
        export.add_frame(frame);
    }

    fn mark(&mut self, world: &SimWorld, event: SimEvent) {
        if let Some(export) = self.export.as_mut() {
            export.add_frame(SimFrame::capture(&world.scene, world.time()).with_event(event));
        }
    }
}

/// Runs signal scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Layout overriding each scenario's preset
    layout: Option<SceneLayout>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 30,
            max_duration_secs: 60.0,
            layout: None,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs.max(0.0);
        self
    }

    /// Runs every scenario on `layout` instead of its preset.
    pub fn with_layout(mut self, layout: SceneLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with_timeline(scenario, &mut Timeline::disabled())
    }

    /// Runs a scenario and records its timeline.
    pub fn run_exported(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut timeline = Timeline::enabled(scenario, self.seed, self.tick_rate_hz);
        let result = self.run_with_timeline(scenario, &mut timeline);

        let mut export = timeline
            .export
            .unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn run_with_timeline(&self, scenario: ScenarioId, timeline: &mut Timeline) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let outcome = match scenario {
            ScenarioId::FourWay => self.run_four_way(timeline),
            ScenarioId::TJunction => self.run_t_junction(timeline),
            ScenarioId::Freeze => self.run_freeze(timeline),
            ScenarioId::ReplaySeek => self.run_replay_seek(timeline),
            ScenarioId::Overshoot => self.run_overshoot(timeline),
            ScenarioId::Jitter => self.run_jitter(timeline),
            ScenarioId::SensorProbe => self.run_sensor_probe(timeline),
        };

        outcome.unwrap_or_else(|e| {
            warn!("Scenario {} could not start: {}", scenario.name(), e);
            ScenarioResult {
                scenario,
                seed: self.seed,
                passed: false,
                total_ticks: 0,
                final_time_secs: 0.0,
                rotations: 0,
                failure_reason: Some(e.to_string()),
                metrics: ScenarioMetrics::default(),
            }
        })
    }

    fn config(&self) -> SimConfig {
        SimConfig {
            seed: self.seed,
            tick_rate_hz: self.tick_rate_hz,
            max_duration_secs: self.max_duration_secs,
            frame_jitter_std: 0.0,
        }
    }

    fn layout_or(&self, preset: impl FnOnce() -> SceneLayout) -> SceneLayout {
        self.layout.clone().unwrap_or_else(preset)
    }

    fn four_way_preset() -> SceneLayout {
        SceneLayout::single(JunctionLayout::four_way(JunctionId(1), [0.0, 0.0, 0.0], 100))
    }

    /// Summarises a finished world into a result.
    fn conclude(
        &self,
        scenario: ScenarioId,
        world: &SimWorld,
        failures: Vec<String>,
        sensor_probes: u64,
    ) -> ScenarioResult {
        let counters = world.counters();
        let violations = world.oracle.violations();

        let failure_reason = match violations.first() {
            Some(first) => Some(format!("{} oracle violations, first: {}", violations.len(), first)),
            None => failures.into_iter().next(),
        };

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            total_ticks: world.tick_count(),
            final_time_secs: world.time(),
            rotations: counters.rotations,
            failure_reason,
            metrics: ScenarioMetrics {
                phase_changes: counters.phase_changes,
                suspended_ticks: counters.suspended_ticks,
                frozen_ticks: counters.frozen_ticks,
                oracle_violations: violations.len() as u64,
                sensor_probes,
            },
        }
    }

    /// SIG-001: FourWay - round-robin order over a single junction.
    ///
    /// **Assertion**: every handover goes to the next registered controller,
    /// and every group whose first cycle fits in the run rotates at least once.
    fn run_four_way(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-001: FourWay - round-robin order");

        let config = self.config();
        let mut world = SimWorld::new(config.clone(), &self.layout_or(Self::four_way_preset))?;
        let mut failures = Vec::new();
        let mut rotations: HashMap<GroupId, u64> = HashMap::new();

        for tick in 0..config.target_ticks() {
            let outcomes = world.tick();

            for &(id, outcome) in &outcomes {
                let TickOutcome::Rotated { from, to } = outcome else {
                    continue;
                };
                *rotations.entry(id).or_default() += 1;

                let Some(group) = world.scene.group(id) else {
                    continue;
                };
                let order = group.controllers();
                let expected = order
                    .iter()
                    .position(|&c| c == from)
                    .map(|i| order[(i + 1) % order.len()]);
                if expected != Some(to) {
                    failures.push(format!(
                        "{} handed over {} -> {}, expected {:?}",
                        group.junction_id(),
                        from,
                        to,
                        expected
                    ));
                }
            }

            timeline.record(&world, &outcomes);

            if tick % config.tick_rate_hz as u64 == 0 {
                debug!("  t={:.1}s | rotations={}", world.time(), world.counters().rotations);
            }
        }

        for group in world.scene.groups() {
            let first_cycle = group
                .controllers()
                .first()
                .and_then(|&id| world.scene.controller(id))
                .map(|c| c.cycle_duration() as f64);
            let due = first_cycle.is_some_and(|cycle| cycle + 2.0 * period(&config) < world.time());
            if due && !rotations.contains_key(&group.id()) {
                failures.push(format!("{} never rotated", group.junction_id()));
            }
        }

        Ok(self.conclude(ScenarioId::FourWay, &world, failures, 0))
    }

    /// SIG-002: TJunction - groups of a town tick independently.
    ///
    /// **Assertion**: each junction in the town ends in exactly the state it
    /// reaches when simulated alone.
    fn run_t_junction(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-002: TJunction - independent schedules");

        let config = self.config();
        let layout = self.layout_or(SceneLayout::default_town);
        let mut town = SimWorld::new(config.clone(), &layout)?;
        let mut alone = layout
            .junctions
            .iter()
            .map(|j| SimWorld::new(config.clone(), &SceneLayout::single(j.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        for _ in 0..config.target_ticks() {
            let outcomes = town.tick();
            for world in &mut alone {
                world.tick();
            }
            timeline.record(&town, &outcomes);
        }

        let mut failures = Vec::new();
        for (junction, world) in layout.junctions.iter().zip(&alone) {
            let in_town = town.scene.group_for_junction(junction.junction_id);
            let solo = world.scene.groups().next();
            let (Some(a), Some(b)) = (in_town, solo) else {
                failures.push(format!("{} missing from scene", junction.junction_id));
                continue;
            };

            let same = a.current_controller_index() == b.current_controller_index()
                && a.remaining_time() == b.remaining_time()
                && a.current_phase_duration() == b.current_phase_duration();
            if !same {
                failures.push(format!(
                    "{} diverged: town {:?}/{:.3}s, alone {:?}/{:.3}s",
                    junction.junction_id,
                    a.current_controller_index(),
                    a.remaining_time(),
                    b.current_controller_index(),
                    b.remaining_time()
                ));
            }
            if !world.oracle.is_clean() {
                failures.push(format!("{} alone: {}", junction.junction_id, world.oracle.violations()[0]));
            }
        }

        Ok(self.conclude(ScenarioId::TJunction, &town, failures, 0))
    }

    /// SIG-003: Freeze - a frozen scene holds every timer and light.
    ///
    /// **Assertion**: nothing moves while frozen, and after unfreezing the run
    /// matches a reference that never saw the frozen ticks.
    fn run_freeze(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-003: Freeze - hold and resume");

        let config = self.config();
        let layout = self.layout_or(Self::four_way_preset);
        let mut world = SimWorld::new(config.clone(), &layout)?;
        let mut reference = SimWorld::new(config.clone(), &layout)?;
        let mut failures = Vec::new();

        let target = config.target_ticks();
        let pre = target / 4;
        let hold = target / 4;

        for _ in 0..pre {
            let outcomes = world.tick();
            reference.tick();
            timeline.record(&world, &outcomes);
        }

        world.scene.set_frozen_all(true);
        timeline.mark(&world, SimEvent::warn("scene frozen"));
        let held = world.snapshots();
        let held_lights = light_states(&world.scene);

        for _ in 0..hold {
            let outcomes = world.tick();
            if outcomes.iter().any(|(_, o)| *o != TickOutcome::Frozen) {
                failures.push(format!("t={:.3}s: group ticked while frozen", world.time()));
            }
            timeline.record(&world, &outcomes);
        }

        if light_states(&world.scene) != held_lights {
            failures.push("lights changed while frozen".to_string());
        }
        if world.snapshots() != held {
            failures.push("timers changed while frozen".to_string());
        }

        world.scene.set_frozen_all(false);
        timeline.mark(&world, SimEvent::info("scene unfrozen"));

        for _ in (pre + hold)..target {
            let outcomes = world.tick();
            reference.tick();
            timeline.record(&world, &outcomes);
        }

        if world.snapshots() != reference.snapshots() {
            failures.push("resumed run diverged from the unfrozen reference".to_string());
        }

        Ok(self.conclude(ScenarioId::Freeze, &world, failures, 0))
    }

    /// SIG-004: ReplaySeek - replay owns the timers, then hands them back.
    ///
    /// A reference world runs live; the replayed world is suspended for a
    /// window inside the reference's phases and seeks each group to the
    /// reference's elapsed time every frame, the way a recording restores
    /// signal state.
    ///
    /// **Assertion**: every window tick is suspended, and after the window the
    /// replayed world stays identical to the reference.
    fn run_replay_seek(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-004: ReplaySeek - suspended scheduling with seeks");

        let config = self.config();
        let layout = self.layout_or(Self::four_way_preset);
        let mut live = SimWorld::new(config.clone(), &layout)?;
        let mut replayed = SimWorld::new(config.clone(), &layout)?;
        let mut failures = Vec::new();

        let target = config.target_ticks();
        let arm_at = target / 3;
        let max_window = (MAX_REPLAY_WINDOW_SECS * config.tick_rate_hz as f64) as u64;
        let mut window_ticks = 0u64;
        let mut window_closed = false;

        for tick in 0..target {
            let live_outcomes = live.tick();

            // Seeks stay exact while every group is in the first half of its phase
            let seekable = live_outcomes.iter().all(|(_, o)| !o.changed_phase())
                && live
                    .scene
                    .groups()
                    .all(|g| g.remaining_time() >= g.current_phase_duration() / 2.0);
            let in_window = tick >= arm_at && !window_closed && seekable && window_ticks < max_window;

            if in_window {
                if window_ticks == 0 {
                    replayed.replay.set_active(true);
                    timeline.mark(&replayed, SimEvent::warn("replay started"));
                }
                let outcomes = replayed.tick();
                if outcomes.iter().any(|(_, o)| *o != TickOutcome::Suspended) {
                    failures.push(format!("t={:.3}s: group ticked during replay", replayed.time()));
                }
                let targets: Vec<(GroupId, f32)> =
                    live.scene.groups().map(|g| (g.id(), g.elapsed_time())).collect();
                for (group, elapsed) in targets {
                    replayed.seek(group, elapsed);
                }
                window_ticks += 1;
                timeline.record(&replayed, &outcomes);
                continue;
            }

            if window_ticks > 0 && !window_closed {
                window_closed = true;
                replayed.replay.set_active(false);
                timeline.mark(&replayed, SimEvent::info("replay ended"));
            }

            let outcomes = replayed.tick();
            timeline.record(&replayed, &outcomes);
        }

        if window_ticks == 0 {
            failures.push("no replay window found".to_string());
        }

        let group_count = replayed.scene.groups().count() as u64;
        if replayed.counters().suspended_ticks != window_ticks * group_count {
            failures.push(format!(
                "{} suspended ticks for a {}-tick window",
                replayed.counters().suspended_ticks,
                window_ticks
            ));
        }

        if replayed.snapshots() != live.snapshots() || light_states(&replayed.scene) != light_states(&live.scene) {
            failures.push("replayed run out of sync after the window".to_string());
        }
        if let Some(v) = live.oracle.violations().first() {
            failures.push(format!("live: {}", v));
        }

        debug!("  replay window {} ticks", window_ticks);
        Ok(self.conclude(ScenarioId::ReplaySeek, &replayed, failures, 0))
    }

    /// SIG-005: Overshoot - one frame never skips a phase.
    ///
    /// **Assertion**: each 100 s frame makes exactly one phase change per
    /// non-empty group, and the new phase starts at its full duration.
    fn run_overshoot(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-005: Overshoot - long frames");

        let config = self.config();
        let mut world = SimWorld::new(config.clone(), &self.layout_or(Self::four_way_preset))?;
        let mut failures = Vec::new();

        for _ in 0..OVERSHOOT_FRAMES {
            let outcomes = world.step(OVERSHOOT_FRAME_SECS);
            for &(id, outcome) in &outcomes {
                let Some(group) = world.scene.group(id) else {
                    continue;
                };
                if group.is_empty() {
                    continue;
                }
                if !outcome.changed_phase() {
                    failures.push(format!("{} did not change phase: {:?}", group.junction_id(), outcome));
                }
                if group.remaining_time() != group.current_phase_duration() {
                    failures.push(format!(
                        "{} carried {:.3}s of overshoot",
                        group.junction_id(),
                        group.current_phase_duration() - group.remaining_time()
                    ));
                }
            }
            timeline.record(&world, &outcomes);
        }

        let active_groups = world.scene.groups().filter(|g| !g.is_empty()).count() as u64;
        if world.counters().phase_changes != OVERSHOOT_FRAMES * active_groups {
            failures.push(format!(
                "{} phase changes over {} long frames",
                world.counters().phase_changes,
                OVERSHOOT_FRAMES
            ));
        }

        for _ in OVERSHOOT_FRAMES..config.target_ticks() {
            let outcomes = world.tick();
            timeline.record(&world, &outcomes);
        }

        Ok(self.conclude(ScenarioId::Overshoot, &world, failures, 0))
    }

    /// SIG-006: Jitter - jittered runs are reproducible from the seed.
    ///
    /// **Assertion**: two runs with the same seed produce the same phase
    /// timeline, and a different seed produces different frame times.
    fn run_jitter(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-006: Jitter - seeded frame times");

        let mut config = self.config();
        config.frame_jitter_std = period(&config) * 0.3;
        let layout = self.layout_or(Self::four_way_preset);

        let mut first = SimWorld::new(config.clone(), &layout)?;
        let mut second = SimWorld::new(config.clone(), &layout)?;
        let other_config = SimConfig {
            seed: config.seed.wrapping_add(1),
            ..config.clone()
        };
        let mut other = SimWorld::new(other_config, &layout)?;

        let mut events_first = Vec::new();
        let mut events_second = Vec::new();

        for tick in 0..config.target_ticks() {
            let outcomes = first.tick();
            events_first.extend(outcomes.iter().filter(|(_, o)| o.changed_phase()).map(|&e| (tick, e)));
            timeline.record(&first, &outcomes);

            let outcomes = second.tick();
            events_second.extend(outcomes.iter().filter(|(_, o)| o.changed_phase()).map(|&e| (tick, e)));

            other.tick();
        }

        let mut failures = Vec::new();
        if events_first != events_second || first.time() != second.time() {
            failures.push("same seed produced different timelines".to_string());
        }
        if first.snapshots() != second.snapshots() {
            failures.push("same seed ended in different states".to_string());
        }
        if config.target_ticks() > 0 && first.time() == other.time() {
            failures.push("different seeds produced identical frame times".to_string());
        }

        debug!(
            "  jittered run: {} ticks in {:.3}s (nominal {:.3}s)",
            first.tick_count(),
            first.time(),
            config.target_ticks() as f64 * period(&config)
        );
        Ok(self.conclude(ScenarioId::Jitter, &first, failures, 0))
    }

    /// SIG-007: SensorProbe - semantic queries over the junction geometry.
    ///
    /// **Assertion**: probes above each signal head hit a traffic light,
    /// probes ignoring the heads reach the road with a friction value, a
    /// probe outside the town misses with the unlabelled sentinel, and a
    /// sweep through each junction meets exactly the heads on its line.
    fn run_sensor_probe(&self, timeline: &mut Timeline) -> Result<ScenarioResult, LayoutError> {
        info!("SIG-007: SensorProbe - labelled projections");

        let config = self.config();
        let layout = self.layout_or(SceneLayout::default_town);
        let mut world = SimWorld::new(config.clone(), &layout)?;
        let mut failures = Vec::new();
        let mut probes = 0u64;

        {
            let tracer = RayTracer::new(&world.geometry);
            let down = Vector3::new(0.0, 0.0, -1.0);

            let heads: Vec<(ActorId, Vector3<f32>)> = layout
                .traffic_lights()
                .map(|l| (l.actor, Vector3::from(l.position)))
                .collect();
            let starts: Vec<Vector3<f32>> = heads
                .iter()
                .map(|(_, base)| base + Vector3::new(0.0, 0.0, PROBE_HEIGHT))
                .collect();
            let actors: Vec<ActorId> = heads.iter().map(|(actor, _)| *actor).collect();

            let points = tracer.project_points(&starts, down, PROBE_RANGE, &[]);
            probes += starts.len() as u64;
            for ((actor, base), point) in heads.iter().zip(&points) {
                if point.label != CityObjectLabel::TrafficLight {
                    failures.push(format!("probe over {} hit {:?}", actor, point.label));
                } else if (point.location.z - (base.z + POLE_HEIGHT)).abs() > 1e-3 {
                    failures.push(format!("probe over {} hit at z={:.3}", actor, point.location.z));
                }
            }

            let points = tracer.project_points(&starts, down, PROBE_RANGE, &actors);
            probes += starts.len() as u64;
            for ((actor, _), point) in heads.iter().zip(&points) {
                if point.label != CityObjectLabel::Roads || point.friction < 0.0 {
                    failures.push(format!(
                        "probe through {} hit {:?} (friction {:.2})",
                        actor, point.label, point.friction
                    ));
                }
            }

            let outside = Vector3::new(1.0e4, 1.0e4, PROBE_HEIGHT);
            let (found, point) = tracer.project_point(outside, down, PROBE_RANGE);
            probes += 1;
            if found || !point.is_unlabelled() || point.location != Vector3::zeros() {
                failures.push(format!("probe outside the town returned {:?}", point));
            }

            for junction in &layout.junctions {
                let o = Vector3::from(junction.origin);
                let start = o + Vector3::new(-SWEEP_HALF_LENGTH, 0.0, 1.0);
                let end = o + Vector3::new(SWEEP_HALF_LENGTH, 0.0, 1.0);
                let hits = tracer.cast_ray(start, end);
                probes += 1;

                let expected = heads
                    .iter()
                    .filter(|(_, p)| {
                        (p.y - o.y).abs() < POLE_HALF_WIDTH
                            && (p.x - o.x).abs() < SWEEP_HALF_LENGTH
                            && p.z <= start.z
                            && start.z <= p.z + POLE_HEIGHT
                    })
                    .count();
                let lights = hits.iter().filter(|p| p.label == CityObjectLabel::TrafficLight).count();
                let ordered = hits.windows(2).all(|w| w[0].location.x <= w[1].location.x);
                if lights != expected || !ordered {
                    failures.push(format!(
                        "sweep through {} met {} heads, expected {}",
                        junction.junction_id, lights, expected
                    ));
                }
            }
        }

        for _ in 0..config.target_ticks() {
            let outcomes = world.tick();
            timeline.record(&world, &outcomes);
        }

        debug!("  {} sensor probes", probes);
        Ok(self.conclude(ScenarioId::SensorProbe, &world, failures, probes))
    }
}

fn period(config: &SimConfig) -> f64 {
    1.0 / config.tick_rate_hz.max(1) as f64
}

fn light_states(scene: &SignalScene) -> Vec<LightState> {
    scene.controllers().iter().map(|(_, c)| c.light_state()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_pass_on_presets() {
        let runner = ScenarioRunner::new(42).with_duration(40.0);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
            assert_eq!(result.seed, 42);
        }
    }

    #[test]
    fn test_four_way_rotation_count() {
        let result = ScenarioRunner::new(1).with_duration(59.0).run(ScenarioId::FourWay);
        assert!(result.passed);
        assert_eq!(result.total_ticks, 1770);
        // One handover every 15s cycle, three phase changes per cycle
        assert_eq!(result.rotations, 3);
        assert_eq!(result.metrics.phase_changes, 11);
    }

    #[test]
    fn test_freeze_metrics() {
        let result = ScenarioRunner::new(3)
            .with_duration(20.0)
            .with_tick_rate(10)
            .run(ScenarioId::Freeze);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.frozen_ticks, 50);
    }

    #[test]
    fn test_replay_seek_suspends_ticks() {
        let result = ScenarioRunner::new(9).run(ScenarioId::ReplaySeek);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert!(result.metrics.suspended_ticks > 0);
    }

    #[test]
    fn test_overshoot_on_town_layout() {
        let result = ScenarioRunner::new(5)
            .with_duration(10.0)
            .with_layout(SceneLayout::default_town())
            .run(ScenarioId::Overshoot);
        assert!(result.passed, "{:?}", result.failure_reason);
    }

    #[test]
    fn test_sensor_probe_counts() {
        let result = ScenarioRunner::new(42).with_duration(1.0).run(ScenarioId::SensorProbe);
        assert!(result.passed, "{:?}", result.failure_reason);
        // 7 heads probed twice, one outside probe, one sweep per junction
        assert_eq!(result.metrics.sensor_probes, 7 * 2 + 1 + 2);
    }

    #[test]
    fn test_bad_layout_fails_cleanly() {
        let result = ScenarioRunner::new(1)
            .with_layout(SceneLayout { junctions: Vec::new() })
            .run(ScenarioId::FourWay);
        assert!(!result.passed);
        assert_eq!(result.total_ticks, 0);
        assert!(result.failure_reason.unwrap().contains("no junctions"));
    }

    #[test]
    fn test_run_exported_records_handovers() {
        let (result, export) = ScenarioRunner::new(42).with_duration(20.0).run_exported(ScenarioId::FourWay);
        assert!(result.passed);
        assert!(export.passed);
        assert_eq!(export.scenario, "four_way");
        assert!(export.frames.iter().any(|f| !f.events.is_empty()));
        assert!(export.duration_sec > 19.0);
    }
}
