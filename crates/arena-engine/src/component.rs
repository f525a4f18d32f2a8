//! Server components and their back-reference to the manager.

use std::sync::{Arc, Weak};

use arena_core::ComponentError;

use crate::manager::GameManager;

/// Non-owning back-reference from a component to its manager.
///
/// Components are owned by the manager, so the handle is weak to avoid a
/// reference cycle.
#[derive(Clone, Debug, Default)]
pub struct ManagerHandle(Weak<GameManager>);

impl ManagerHandle {
    /// Point a handle at `manager`.
    pub fn new(manager: &Arc<GameManager>) -> Self {
        Self(Arc::downgrade(manager))
    }

    /// The manager, if it is still alive.
    pub fn get(&self) -> Option<Arc<GameManager>> {
        self.0.upgrade()
    }

    /// The manager, or [`ComponentError::ManagerDropped`].
    pub fn require(&self) -> Result<Arc<GameManager>, ComponentError> {
        self.get().ok_or(ComponentError::ManagerDropped)
    }

    /// Whether the handle still points at a live manager.
    pub fn is_set(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// A unit of server logic with a one-time setup hook.
///
/// `set_manager` runs when the component is added, before it is stored.
/// `register` runs once from [`GameManager::register_components`]; it must
/// not assume any other component has registered already.
pub trait Component: Send + Sync {
    /// Receive the manager back-reference.
    fn set_manager(&mut self, manager: ManagerHandle);

    /// Perform one-time setup such as defining events and subscribing handlers.
    fn register(&self) -> Result<(), ComponentError>;
}
