//! Signal oracle - per-tick invariant checks over a signal scene.
//!
//! The oracle watches every tick from the outside and records violations of:
//! - mutual exclusion: at most one permissive (green/yellow) controller per
//!   junction, and it must be the group's active controller
//! - phase timing: a freshly started phase runs for its full duration,
//!   and a running phase never exceeds it (unless a seek pushed it there)
//! - suspension: frozen or replay-suspended ticks change nothing

use junction_core::{ControllerId, GroupId, SignalGroup, SignalScene, TickOutcome};
use junction_env::JunctionId;
use serde::{Deserialize, Serialize};

const TIME_EPSILON: f32 = 1e-4;

/// Observable state of one group at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub group: GroupId,
    pub junction: JunctionId,
    pub active: Option<ControllerId>,
    pub remaining_time: f32,
    pub phase_duration: f32,
    pub frozen: bool,
}

impl GroupSnapshot {
    pub fn of(group: &SignalGroup) -> Self {
        Self {
            group: group.id(),
            junction: group.junction_id(),
            active: group.active_controller(),
            remaining_time: group.remaining_time(),
            phase_duration: group.current_phase_duration(),
            frozen: group.is_frozen(),
        }
    }

    pub fn elapsed_time(&self) -> f32 {
        self.phase_duration - self.remaining_time
    }
}

/// Snapshots every group of a scene, in creation order.
pub fn snapshot_scene(scene: &SignalScene) -> Vec<GroupSnapshot> {
    scene.groups().map(GroupSnapshot::of).collect()
}

/// Collects invariant violations across a run.
#[derive(Debug, Default)]
pub struct SignalOracle {
    violations: Vec<String>,
    observed_ticks: u64,

    /// Groups whose timer was set by a seek since their last phase change
    seeked: Vec<GroupId>,
}

impl SignalOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a group as externally seeked; the over-long phase check is
    /// waived for it until its next phase change.
    pub fn note_seek(&mut self, group: GroupId) {
        if !self.seeked.contains(&group) {
            self.seeked.push(group);
        }
    }

    /// Checks one tick given the snapshots taken right before it.
    pub fn observe(
        &mut self,
        scene: &SignalScene,
        before: &[GroupSnapshot],
        outcomes: &[(GroupId, TickOutcome)],
        time_secs: f64,
    ) {
        self.observed_ticks += 1;

        for &(id, outcome) in outcomes {
            let Some(group) = scene.group(id) else {
                self.violations.push(format!("t={:.3}s: {} vanished", time_secs, id));
                continue;
            };
            let after = GroupSnapshot::of(group);
            let prior = before.iter().find(|s| s.group == id);

            match outcome {
                TickOutcome::Frozen | TickOutcome::Suspended => {
                    if prior != Some(&after) {
                        self.violations.push(format!(
                            "t={:.3}s: {} changed during a {:?} tick",
                            time_secs, group.junction_id(), outcome
                        ));
                    }
                }
                TickOutcome::Advanced { .. } | TickOutcome::Rotated { .. } => {
                    self.seeked.retain(|g| *g != id);
                    if (after.remaining_time - after.phase_duration).abs() > TIME_EPSILON {
                        self.violations.push(format!(
                            "t={:.3}s: {} new phase starts at {:.3}s of {:.3}s",
                            time_secs, group.junction_id(), after.remaining_time, after.phase_duration
                        ));
                    }
                }
                TickOutcome::Counting => {
                    if !self.seeked.contains(&id) && after.remaining_time > after.phase_duration + TIME_EPSILON {
                        self.violations.push(format!(
                            "t={:.3}s: {} remaining {:.3}s exceeds phase {:.3}s",
                            time_secs, group.junction_id(), after.remaining_time, after.phase_duration
                        ));
                    }
                }
                TickOutcome::Idle => {
                    if after.remaining_time != 0.0 {
                        self.violations.push(format!(
                            "t={:.3}s: empty {} kept {:.3}s on its timer",
                            time_secs, group.junction_id(), after.remaining_time
                        ));
                    }
                }
            }

            self.check_exclusion(scene, group, time_secs);
        }
    }

    fn check_exclusion(&mut self, scene: &SignalScene, group: &SignalGroup, time_secs: f64) {
        let permissive: Vec<ControllerId> = group
            .controllers()
            .iter()
            .copied()
            .filter(|&id| {
                scene
                    .controller(id)
                    .is_some_and(|c| c.light_state().is_permissive())
            })
            .collect();

        if permissive.len() > 1 {
            self.violations.push(format!(
                "t={:.3}s: {} has {} permissive controllers",
                time_secs,
                group.junction_id(),
                permissive.len()
            ));
        } else if let Some(&only) = permissive.first() {
            if group.active_controller() != Some(only) {
                self.violations.push(format!(
                    "t={:.3}s: {} shows green on inactive {}",
                    time_secs,
                    group.junction_id(),
                    only
                ));
            }
        }
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn observed_ticks(&self) -> u64 {
        self.observed_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{JunctionLayout, SceneLayout};
    use junction_env::NoReplay;

    fn scene() -> SignalScene {
        let mut scene = SceneLayout::single(JunctionLayout::four_way(JunctionId(1), [0.0; 3], 0))
            .build_scene(NoReplay::shared())
            .unwrap();
        scene.reset_all();
        scene
    }

    #[test]
    fn test_clean_run() {
        let mut scene = scene();
        let mut oracle = SignalOracle::new();

        for i in 0..2000 {
            let before = snapshot_scene(&scene);
            let outcomes = scene.tick(0.1);
            oracle.observe(&scene, &before, &outcomes, i as f64 * 0.1);
        }

        assert!(oracle.is_clean(), "{:?}", oracle.violations());
        assert_eq!(oracle.observed_ticks(), 2000);
    }

    #[test]
    fn test_detects_change_during_frozen_tick() {
        let mut scene = scene();
        let mut oracle = SignalOracle::new();
        scene.set_frozen_all(true);

        // Forge a stale "before" snapshot to simulate an unexpected change
        let mut before = snapshot_scene(&scene);
        before[0].remaining_time += 1.0;
        let outcomes = scene.tick(0.1);
        oracle.observe(&scene, &before, &outcomes, 0.0);

        assert_eq!(oracle.violations().len(), 1);
    }

    #[test]
    fn test_seek_waives_overlong_check() {
        let mut scene = scene();
        let mut oracle = SignalOracle::new();
        let id = GroupId(0);

        scene.group_mut(id).unwrap().set_elapsed_time(-5.0);
        oracle.note_seek(id);

        let before = snapshot_scene(&scene);
        let outcomes = scene.tick(0.1);
        oracle.observe(&scene, &before, &outcomes, 0.0);
        assert!(oracle.is_clean());

        let mut strict = SignalOracle::new();
        let before = snapshot_scene(&scene);
        let outcomes = scene.tick(0.1);
        strict.observe(&scene, &before, &outcomes, 0.1);
        assert!(!strict.is_clean());
    }

    #[test]
    fn test_snapshot_elapsed() {
        let mut scene = scene();
        scene.tick(2.5);
        let snap = &snapshot_scene(&scene)[0];
        assert!((snap.elapsed_time() - 2.5).abs() < 1e-5);
        assert_eq!(snap.active, Some(ControllerId(0)));
    }
}
