//! # arena-core
//!
//! Foundation types shared by every arena crate.
//!
//! - **Events**: [`events::Event`] instances and their [`events::EventDefinition`] routing policy
//! - **Clients**: [`client::ClientConnection`] with its bounded outbound queue
//! - **Directory**: [`directory::ConnectionDirectory`], the contract the dispatch engine
//!   consumes for finding and broadcasting to live clients
//! - **Errors**: [`errors::DispatchError`] and [`errors::ComponentError`] via `thiserror`
//! - **Logging**: [`logging::init_subscriber`] for the global `tracing` subscriber
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other arena crates.

#![deny(unsafe_code)]

pub mod client;
pub mod directory;
pub mod errors;
pub mod events;
pub mod logging;

pub use client::ClientConnection;
pub use directory::ConnectionDirectory;
pub use errors::{ComponentError, DispatchError};
pub use events::{Event, EventDefinition};
