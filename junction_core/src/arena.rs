//! Arena storage for phase controllers.
//!
//! Controllers live in one vector owned by the surrounding scene. Groups
//! only keep `ControllerId`s into it, and each controller keeps the
//! `GroupId` of its owner, so neither side holds the other by reference.

use crate::controller::PhaseController;
use serde::{Deserialize, Serialize};

/// Index of a controller inside a [`ControllerArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(pub usize);

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "controller#{}", self.0)
    }
}

/// Resolves controller handles for a signal group.
///
/// Group operations that touch controllers take the store as an explicit
/// argument instead of holding it.
pub trait ControllerStore {
    /// Looks up a controller for reading.
    fn controller(&self, id: ControllerId) -> Option<&dyn PhaseController>;

    /// Looks up a controller for mutation.
    fn controller_mut(&mut self, id: ControllerId) -> Option<&mut dyn PhaseController>;
}

/// Vector-backed controller storage.
#[derive(Debug, Clone)]
pub struct ControllerArena<C> {
    controllers: Vec<C>,
}

impl<C> ControllerArena<C> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
        }
    }

    /// Moves a controller into the arena and returns its handle.
    pub fn insert(&mut self, controller: C) -> ControllerId {
        self.controllers.push(controller);
        ControllerId(self.controllers.len() - 1)
    }

    pub fn get(&self, id: ControllerId) -> Option<&C> {
        self.controllers.get(id.0)
    }

    pub fn get_mut(&mut self, id: ControllerId) -> Option<&mut C> {
        self.controllers.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Iterates over `(handle, controller)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ControllerId, &C)> {
        self.controllers
            .iter()
            .enumerate()
            .map(|(i, c)| (ControllerId(i), c))
    }
}

impl<C> Default for ControllerArena<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PhaseController> ControllerStore for ControllerArena<C> {
    fn controller(&self, id: ControllerId) -> Option<&dyn PhaseController> {
        self.controllers.get(id.0).map(|c| c as &dyn PhaseController)
    }

    fn controller_mut(&mut self, id: ControllerId) -> Option<&mut dyn PhaseController> {
        self.controllers
            .get_mut(id.0)
            .map(|c| c as &mut dyn PhaseController)
    }
}
