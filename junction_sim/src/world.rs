//! SimWorld - the simulation harness container.

use crate::clock::SimClock;
use crate::layout::{LayoutError, SceneLayout};
use crate::oracle::{snapshot_scene, GroupSnapshot, SignalOracle};

use junction_core::{GroupId, SignalScene, TickOutcome};
use junction_env::{ReplayFlag, StaticScene};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Maximum simulation duration in seconds
    pub max_duration_secs: f64,

    /// Frame time jitter standard deviation in seconds (0 = fixed step)
    pub frame_jitter_std: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 30,
            max_duration_secs: 60.0,
            frame_jitter_std: 0.0,
        }
    }
}

impl SimConfig {
    pub fn target_ticks(&self) -> u64 {
        (self.max_duration_secs * self.tick_rate_hz as f64) as u64
    }
}

/// Counters collected while ticking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickCounters {
    /// Group ticks that changed phase (advance or rotation)
    pub phase_changes: u64,

    /// Group ticks that moved to the next controller
    pub rotations: u64,

    /// Group ticks suppressed by replay
    pub suspended_ticks: u64,

    /// Group ticks suppressed by freezing
    pub frozen_ticks: u64,
}

impl TickCounters {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Advanced { .. } => self.phase_changes += 1,
            TickOutcome::Rotated { .. } => {
                self.phase_changes += 1;
                self.rotations += 1;
            }
            TickOutcome::Suspended => self.suspended_ticks += 1,
            TickOutcome::Frozen => self.frozen_ticks += 1,
            TickOutcome::Idle | TickOutcome::Counting => {}
        }
    }
}

/// The SimWorld - a signal scene driven by a virtual clock and watched by
/// the oracle.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Signal groups and controllers under test
    pub scene: SignalScene,

    /// Static geometry matching the layout
    pub geometry: StaticScene,

    /// Replay switch shared with every group
    pub replay: ReplayFlag,

    /// Invariant checks
    pub oracle: SignalOracle,

    clock: SimClock,

    counters: TickCounters,

    /// Current tick count
    tick_count: u64,
}

impl SimWorld {
    /// Builds and resets the scene described by `layout`.
    pub fn new(config: SimConfig, layout: &SceneLayout) -> Result<Self, LayoutError> {
        let replay = ReplayFlag::new();
        let mut scene = layout.build_scene(replay.as_status())?;
        scene.reset_all();

        // Frame timing draws from its own stream so layouts never shift it
        let clock_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let clock = SimClock::new(clock_seed, config.tick_rate_hz).with_jitter(config.frame_jitter_std);

        Ok(Self {
            geometry: layout.build_geometry(),
            config,
            scene,
            replay,
            oracle: SignalOracle::new(),
            clock,
            counters: TickCounters::default(),
            tick_count: 0,
        })
    }

    /// Advances one frame using the clock's next delta time.
    pub fn tick(&mut self) -> Vec<(GroupId, TickOutcome)> {
        let dt = self.clock.next_delta();
        self.step(dt)
    }

    /// Advances one frame by an explicit delta time.
    pub fn step(&mut self, delta_secs: f64) -> Vec<(GroupId, TickOutcome)> {
        let before = snapshot_scene(&self.scene);
        let outcomes = self.scene.tick(delta_secs as f32);
        self.clock.advance(delta_secs);
        self.tick_count += 1;

        for &(_, outcome) in &outcomes {
            self.counters.record(outcome);
        }
        self.oracle
            .observe(&self.scene, &before, &outcomes, self.clock.time());

        outcomes
    }

    /// Seeks a group to `elapsed` seconds into its current phase.
    pub fn seek(&mut self, group: GroupId, elapsed: f32) {
        if let Some(g) = self.scene.group_mut(group) {
            g.set_elapsed_time(elapsed);
            self.oracle.note_seek(group);
        }
    }

    pub fn snapshots(&self) -> Vec<GroupSnapshot> {
        snapshot_scene(&self.scene)
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn counters(&self) -> &TickCounters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::JunctionLayout;
    use approx::assert_relative_eq;
    use junction_env::JunctionId;

    fn world(config: SimConfig) -> SimWorld {
        SimWorld::new(config, &SceneLayout::default_town()).unwrap()
    }

    #[test]
    fn test_world_starts_reset() {
        let world = world(SimConfig::default());
        for snap in world.snapshots() {
            assert!(snap.active.is_some());
            assert_eq!(snap.remaining_time, snap.phase_duration);
        }
        assert_eq!(world.geometry.len(), 2 + 7);
    }

    #[test]
    fn test_fixed_step_run_is_clean() {
        let config = SimConfig {
            max_duration_secs: 120.0,
            ..Default::default()
        };
        let mut world = world(config.clone());
        for _ in 0..config.target_ticks() {
            world.tick();
        }

        assert_eq!(world.tick_count(), 3600);
        assert_relative_eq!(world.time(), 120.0, epsilon = 1e-6);
        assert!(world.oracle.is_clean(), "{:?}", world.oracle.violations());
        assert!(world.counters().rotations > 0);
    }

    #[test]
    fn test_replay_counts_suspended_ticks() {
        let layout = SceneLayout::single(JunctionLayout::four_way(JunctionId(1), [0.0; 3], 0));
        let mut world = SimWorld::new(SimConfig::default(), &layout).unwrap();

        world.replay.set_active(true);
        for _ in 0..10 {
            world.step(1.0);
        }
        world.replay.set_active(false);
        world.step(1.0);

        assert_eq!(world.counters().suspended_ticks, 10);
        assert!((world.snapshots()[0].elapsed_time() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_layout_is_reported() {
        let layout = SceneLayout { junctions: Vec::new() };
        assert!(matches!(
            SimWorld::new(SimConfig::default(), &layout),
            Err(LayoutError::EmptyLayout)
        ));
    }
}
