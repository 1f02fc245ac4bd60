//! # Idle Core
//!
//! Simulation core for an incremental resource-management game.
//!
//! This crate contains **only** engine logic:
//! - No rendering
//! - No IO (callers pass timestamps in, bytes out)
//! - No ambient randomness (every roll goes through a [`rng::RandomSource`])
//!
//! The engine advances a tick-driven economy, resolves timed missions,
//! travel and derelict opportunities exactly once, and folds every modifier
//! source (technologies, prestige perks, unit upgrades, formations, alien
//! tech, territory) into a single aggregate per target.
//!
//! ## Crate Structure
//!
//! - [`modifiers`] - Effect aggregation across all modifier sources
//! - [`formulas`] - Price curves, bulk pricing, production math
//! - [`production`] - Per-period production plans shared by live and offline
//! - [`scheduler`] - Self-rescheduling tick state machine
//! - [`missions`], [`travel`], [`derelicts`], [`contracts`] - Timed entities
//! - [`offline`] - Closed-form catch-up after an absence
//! - [`automation`] - Rule-driven command issuing
//! - [`prestige`] - Run reset transition
//! - [`simulation`] - The engine object owning all state

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod automation;
pub mod clock;
pub mod colonies;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod data;
pub mod derelicts;
pub mod error;
pub mod formulas;
pub mod ids;
pub mod missions;
pub mod modifiers;
pub mod notifications;
pub mod offline;
pub mod prestige;
pub mod production;
pub mod resources;
pub mod rng;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod state;
pub mod travel;
pub mod units;
pub mod upgrades;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::automation::{AutomationFlag, AutomationSettings};
    pub use crate::clock::Millis;
    pub use crate::commands::{BuyAmount, Command, CommandEffect, CommandResult};
    pub use crate::config::EngineConfig;
    pub use crate::data::{GameData, MissionAction, MissionKind, Rarity};
    pub use crate::error::{GameError, Rejection, Result};
    pub use crate::ids::{
        ContractId, DerelictId, DerelictKind, FormationId, LocationId, MissionId, UnitKind,
        UpgradeId,
    };
    pub use crate::missions::{MissionOutcome, MissionReport, MissionTarget};
    pub use crate::modifiers::{Aggregate, Effect, EffectKind, ModifierSet, ModifierSource};
    pub use crate::notifications::GameEvent;
    pub use crate::offline::OfflineReport;
    pub use crate::resources::{Cost, ResourceKind, ResourceLedger};
    pub use crate::rng::{ChaChaSource, RandomSource, ScriptedRandom};
    pub use crate::simulation::{Simulation, Step, TickReport};
    pub use crate::snapshot::SaveSnapshot;
    pub use crate::state::GameState;
}
