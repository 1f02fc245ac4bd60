//! Mission kinds and the actions that tune them.

use serde::{Deserialize, Serialize};

use crate::resources::Cost;

/// What a mission does on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    /// Search a location for derelicts.
    Scout,
    /// Strip a derelict for resources.
    Salvage,
    /// Found a colony at a location.
    Colony,
}

impl MissionKind {
    /// All mission kinds.
    pub const ALL: [Self; 3] = [Self::Scout, Self::Salvage, Self::Colony];

    /// Snake-case key used in modifier targets.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Salvage => "salvage",
            Self::Colony => "colony",
        }
    }
}

/// How the crew approaches a mission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MissionAction {
    /// No adjustments.
    #[default]
    Standard,
    /// Slower, safer.
    Careful,
    /// Faster, riskier.
    Rushed,
    /// Slower, richer payout.
    Thorough,
    /// Always succeeds, at a premium.
    Guaranteed,
}

impl MissionAction {
    /// All actions.
    pub const ALL: [Self; 5] = [
        Self::Standard,
        Self::Careful,
        Self::Rushed,
        Self::Thorough,
        Self::Guaranteed,
    ];
}

/// Base parameters of a mission kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionKindData {
    /// Which kind this row configures.
    pub kind: MissionKind,

    /// Base duration in seconds. Salvage uses the derelict's own duration.
    #[serde(default)]
    pub base_secs: f64,

    /// Fuel spent at launch before modifiers.
    #[serde(default)]
    pub fuel_cost: f64,
}

/// Adjustments applied by a mission action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    /// Which action this row configures.
    pub action: MissionAction,

    /// Multiplies mission duration.
    #[serde(default = "default_one")]
    pub duration_multiplier: f64,

    /// Added to success probability before multipliers.
    #[serde(default)]
    pub success_bonus: f64,

    /// Multiplies salvage rewards.
    #[serde(default = "default_one")]
    pub reward_multiplier: f64,

    /// Skip the success roll entirely.
    #[serde(default)]
    pub guaranteed: bool,

    /// Paid on top of the mission's fuel.
    #[serde(default)]
    pub extra_cost: Cost,
}

const fn default_one() -> f64 {
    1.0
}
