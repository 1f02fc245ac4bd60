//! Error types for the simulation.
//!
//! Two families live here:
//! - [`GameError`] for failures of the engine itself (bad content, bad
//!   configuration, unreadable snapshots).
//! - [`Rejection`] for player commands that are refused. A rejection never
//!   mutates state and is reported back to the caller with a reason.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{MissionAction, MissionKind};
use crate::ids::{
    ContractId, DerelictId, DerelictKind, FormationId, LocationId, MissionId, UnitKind, UpgradeId,
};
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for engine failures.
#[derive(Debug, Error)]
pub enum GameError {
    /// Content or configuration text could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed.
        what: String,
        /// Error message.
        message: String,
    },

    /// Content tables failed validation.
    #[error("Invalid game data: {}", .0.join("; "))]
    InvalidContent(Vec<String>),

    /// Engine configuration failed validation.
    #[error("Invalid engine configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// Serialization of state failed.
    #[error("Failed to serialize {what}: {message}")]
    SerializeError {
        /// What was being serialized.
        what: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Reason a player command was refused.
///
/// Every validation failure maps to exactly one variant; the engine state is
/// untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Unit kind is not in the content tables.
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitKind),

    /// Upgrade is not in the content tables.
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(UpgradeId),

    /// Location is not in the content tables.
    #[error("Unknown location: {0}")]
    UnknownLocation(LocationId),

    /// Formation is not in the content tables.
    #[error("Unknown formation: {0}")]
    UnknownFormation(FormationId),

    /// Contract is not in the content tables.
    #[error("Unknown contract: {0}")]
    UnknownContract(ContractId),

    /// Derelict type is not in the content tables.
    #[error("Unknown derelict type: {0}")]
    UnknownDerelictKind(DerelictKind),

    /// No live derelict with this id.
    #[error("No derelict {0}")]
    UnknownDerelict(DerelictId),

    /// No active mission with this id.
    #[error("No active mission {0}")]
    UnknownMission(MissionId),

    /// Mission kind has no content entry.
    #[error("Mission kind {0:?} is not configured")]
    UnknownMissionKind(MissionKind),

    /// Mission action has no content entry.
    #[error("Mission action {0:?} is not configured")]
    UnknownAction(MissionAction),

    /// Requested amount was zero.
    #[error("Amount must be at least one")]
    ZeroAmount,

    /// Not enough of a resource.
    #[error("Insufficient {resource}: need {required:.0}, have {available:.0}")]
    InsufficientResources {
        /// Resource that is short.
        resource: ResourceKind,
        /// Amount required.
        required: f64,
        /// Amount available.
        available: f64,
    },

    /// All units of this kind are busy (or none are owned).
    #[error("No {unit} available ({busy}/{capacity} slots busy)")]
    NoUnitAvailable {
        /// Unit kind requested.
        unit: UnitKind,
        /// Missions currently using this kind.
        busy: u64,
        /// Mission slots this kind provides.
        capacity: u64,
    },

    /// Unit kind cannot run this mission kind.
    #[error("{unit} cannot perform {kind:?} missions")]
    UnitCannotPerform {
        /// Unit kind requested.
        unit: UnitKind,
        /// Mission kind requested.
        kind: MissionKind,
    },

    /// Target does not fit the mission kind.
    #[error("Invalid mission target: {0}")]
    InvalidTarget(String),

    /// Target is not at the fleet's current location.
    #[error("Target is at {target}, fleet is at {current}")]
    WrongLocation {
        /// Where the target is.
        target: LocationId,
        /// Where the fleet is.
        current: LocationId,
    },

    /// Derelict is already claimed by a mission.
    #[error("Derelict {0} is already being salvaged")]
    DerelictClaimed(DerelictId),

    /// Location already hosts a colony.
    #[error("{0} is already colonized")]
    ColonyExists(LocationId),

    /// A colony mission is already under way at this location.
    #[error("A colony mission to {0} is already under way")]
    ColonyPending(LocationId),

    /// Location cannot be colonized.
    #[error("{0} cannot be colonized")]
    NotColonizable(LocationId),

    /// Fleet is in transit.
    #[error("Fleet is in transit")]
    InTransit,

    /// No voyage to cancel.
    #[error("Fleet is not traveling")]
    NotTraveling,

    /// Destination equals the current location.
    #[error("Fleet is already at {0}")]
    AlreadyAtLocation(LocationId),

    /// Destination requirements are unmet.
    #[error("{location} is locked: requires {missing}")]
    LocationLocked {
        /// Destination.
        location: LocationId,
        /// First missing requirement.
        missing: String,
    },

    /// Instant travel requested without a warp charge.
    #[error("No warp charges available")]
    NoWarpCharges,

    /// Upgrade has reached its purchase limit.
    #[error("{0} is already at its maximum level")]
    UpgradeMaxed(UpgradeId),

    /// Upgrade prerequisite not owned.
    #[error("{upgrade} requires {missing}")]
    PrerequisiteMissing {
        /// Upgrade requested.
        upgrade: UpgradeId,
        /// Missing prerequisite.
        missing: UpgradeId,
    },

    /// Formation's unlocking upgrade not owned.
    #[error("{formation} requires {missing}")]
    FormationLocked {
        /// Formation requested.
        formation: FormationId,
        /// Missing upgrade.
        missing: UpgradeId,
    },

    /// Capability has not been unlocked.
    #[error("Capability {0} is not unlocked")]
    CapabilityLocked(String),

    /// Prestige would award nothing.
    #[error("Not enough progress to gain dark matter")]
    NothingToGain,

    /// Contract is already accepted.
    #[error("Contract {0} is already active")]
    ContractActive(ContractId),

    /// Contract is not active (never accepted or expired).
    #[error("Contract {0} is not active")]
    ContractNotActive(ContractId),
}

/// Why a due mission could not be settled.
///
/// Never surfaced to the player directly: the mission is counted as failed
/// and the message is kept in its report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Unit kind vanished from content.
    #[error("unit {0} is not in the content tables")]
    MissingUnit(UnitKind),
    /// Location vanished from content.
    #[error("location {0} is not in the content tables")]
    MissingLocation(LocationId),
    /// Derelict is no longer live.
    #[error("derelict {0} is gone")]
    MissingDerelict(DerelictId),
    /// Derelict type vanished from content.
    #[error("derelict type {0} is not in the content tables")]
    MissingDerelictKind(DerelictKind),
    /// Mission kind has no content entry.
    #[error("mission kind {0:?} is not configured")]
    MissingMissionKind(MissionKind),
    /// Action vanished from content.
    #[error("mission action {0:?} is not configured")]
    MissingAction(MissionAction),
    /// Salvage mission without a target.
    #[error("salvage mission has no derelict")]
    NoTarget,
    /// Another colony got there first.
    #[error("{0} is already colonized")]
    ColonyExists(LocationId),
}
