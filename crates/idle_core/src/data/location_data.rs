//! Locations of the travel graph.

use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, UpgradeId};

use super::RarityWeights;

/// What must be owned before the fleet may travel somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    /// Upgrades that must be purchased.
    pub upgrades: Vec<UpgradeId>,
    /// Locations that must already be colonized.
    pub colonies: Vec<LocationId>,
}

impl Requirements {
    /// True when nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty() && self.colonies.is_empty()
    }
}

/// Data-driven location definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// Unique identifier.
    pub id: LocationId,

    /// Display name.
    pub name: String,

    /// Adjacent locations (used by adjacent discovery).
    #[serde(default)]
    pub neighbors: Vec<LocationId>,

    /// Fuel spent traveling here, before modifiers.
    #[serde(default)]
    pub travel_fuel: f64,

    /// Seconds spent traveling here, before modifiers.
    #[serde(default)]
    pub travel_secs: f64,

    /// Base success probability of scouting here.
    pub scout_success: f64,

    /// Base success probability of founding a colony here.
    #[serde(default)]
    pub colony_success: f64,

    /// Production bonus granted by a colony here (0.2 is +20%).
    #[serde(default)]
    pub colony_bonus: f64,

    /// Whether a colony can be founded here at all.
    #[serde(default = "default_colonizable")]
    pub colonizable: bool,

    /// Rarity weights of derelicts spawned here.
    pub rarity_weights: RarityWeights,

    /// Travel requirements.
    #[serde(default)]
    pub requires: Requirements,
}

const fn default_colonizable() -> bool {
    true
}
