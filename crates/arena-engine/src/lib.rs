//! # arena-engine
//!
//! The event-routing core: components register themselves, declare named
//! events, and subscribe handlers; [`GameManager::fire_event`] routes each
//! event to in-process subscribers, one client, or every client.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `component` | [`Component`] trait and the [`ManagerHandle`] back-reference |
//! | `registry` | Event definition and subscriber registries |
//! | `dispatch` | Spawned delivery paths and their [`Dispatch`] handles |
//! | `manager` | [`GameManager`], which ties the registries and directory together |
//!
//! ## Crate Position
//!
//! Depends on arena-core, arena-server, arena-settings.

#![deny(unsafe_code)]

pub mod component;
pub mod dispatch;
pub mod manager;
pub mod registry;

pub use component::{Component, ManagerHandle};
pub use dispatch::{Dispatch, DispatchReport, PathOutcome};
pub use manager::GameManager;
pub use registry::{EventHandler, handler};
