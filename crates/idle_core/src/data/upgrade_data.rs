//! Purchasable upgrades and fleet formations.

use serde::{Deserialize, Serialize};

use crate::ids::{FormationId, UpgradeId};
use crate::modifiers::{Effect, ModifierSource};
use crate::resources::Cost;

/// Data-driven upgrade definition.
///
/// Covers technologies, unit upgrades, alien tech and prestige perks; the
/// `source` decides which modifier group the effects land in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeData {
    /// Unique identifier.
    pub id: UpgradeId,

    /// Display name.
    pub name: String,

    /// Modifier group the effects join.
    pub source: ModifierSource,

    /// Price of the first level.
    pub cost: Cost,

    /// Price growth per owned level.
    #[serde(default = "default_cost_growth")]
    pub cost_growth: f64,

    /// How many times this can be bought.
    #[serde(default = "default_max_level")]
    pub max_level: u32,

    /// Upgrades that must be owned first.
    #[serde(default)]
    pub prerequisites: Vec<UpgradeId>,

    /// Effects granted per level.
    #[serde(default)]
    pub effects: Vec<Effect>,

    /// Warp charges granted per level.
    #[serde(default)]
    pub warp_charges: u32,
}

const fn default_cost_growth() -> f64 {
    1.0
}

const fn default_max_level() -> u32 {
    1
}

impl UpgradeData {
    /// Whether buying this survives a prestige reset.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.source.survives_prestige()
    }
}

/// Data-driven formation definition.
///
/// Exactly one formation is active at a time; its effects replace the
/// whole formation modifier group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationData {
    /// Unique identifier.
    pub id: FormationId,

    /// Display name.
    pub name: String,

    /// Upgrade that unlocks this formation.
    #[serde(default)]
    pub requires: Option<UpgradeId>,

    /// Effects while active.
    #[serde(default)]
    pub effects: Vec<Effect>,
}
