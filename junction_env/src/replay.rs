//! Replay status capability consumed by signal groups.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports whether a recorded-state player currently owns signal state.
///
/// Signal groups poll this at the start of every tick and do nothing while
/// it returns `true`.
///
/// # Implementations
///
/// - **Live simulation**: `NoReplay` - never active
/// - **Replay / tests**: `ReplayFlag` - a shared switch flipped by the replayer
pub trait ReplayStatus: Send + Sync {
    /// Returns true while replay is authoritative over signal state.
    fn is_replay_active(&self) -> bool;
}

/// Replay status for scenes without a replayer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReplay;

impl NoReplay {
    /// Creates an Arc-wrapped status for sharing across groups.
    pub fn shared() -> Arc<dyn ReplayStatus> {
        Arc::new(NoReplay)
    }
}

impl ReplayStatus for NoReplay {
    fn is_replay_active(&self) -> bool {
        false
    }
}

/// A shareable on/off replay switch.
///
/// Clones share the same underlying flag, so the replayer keeps one clone
/// and hands another to the scene.
#[derive(Debug, Clone, Default)]
pub struct ReplayFlag {
    active: Arc<AtomicBool>,
}

impl ReplayFlag {
    /// Creates an inactive flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks replay as started or stopped.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Returns this flag as a trait object sharing the same state.
    pub fn as_status(&self) -> Arc<dyn ReplayStatus> {
        Arc::new(self.clone())
    }
}

impl ReplayStatus for ReplayFlag {
    fn is_replay_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
