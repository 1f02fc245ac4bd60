//! Headless runner for the idle simulation.
//!
//! Drives [`idle_core::simulation::Simulation`] without a UI: over a JSON
//! lines protocol, in real time with autosaves, or as fixed batch and
//! offline workloads. This is the only crate that touches the filesystem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod content_loader;
pub mod protocol;
pub mod runner;
pub mod save_store;

pub use content_loader::{config_or_default, content_or_standard, ContentError};
pub use protocol::{Request, Response, StateView};
pub use runner::{BatchSummary, HeadlessRunner, LiveSummary};
pub use save_store::{SaveError, SaveStore};
