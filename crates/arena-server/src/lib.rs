//! # arena-server
//!
//! The networking side of the event core, minus the socket accept loop.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `directory` | [`Server`]: live client set, lookup, fan-out with slow-client eviction |
//! | `writer` | Drains one client's outbound queue into a transport sink as JSON text |
//! | `metrics` | Metric name constants shared with the dispatch engine |
//!
//! ## Crate Position
//!
//! Depends on arena-core. Depended on by arena-engine.

#![deny(unsafe_code)]

pub mod directory;
pub mod metrics;
pub mod writer;

pub use directory::{DEFAULT_MAX_DROPPED_MESSAGES, Server};
pub use writer::pump_outbound;
