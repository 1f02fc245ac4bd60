//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::ids::UnitKind;
use crate::resources::Cost;

use super::MissionKind;

/// Data-driven unit definition.
///
/// A unit is a producer (non-empty `produces`), a converter (non-empty
/// `consumes`), a mission-capable ship (non-empty `missions`), or any mix.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "mining_drone",
///     name: "Mining Drone",
///     cost: {metal: 10.0},
///     cost_growth: 1.15,
///     produces: {metal: 1.0},
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Unique identifier.
    pub id: UnitKind,

    /// Display name.
    pub name: String,

    /// Price of the first unit.
    pub cost: Cost,

    /// Price growth per owned unit.
    #[serde(default = "default_cost_growth")]
    pub cost_growth: f64,

    /// Output per second per unit.
    #[serde(default)]
    pub produces: Cost,

    /// Input per second per unit (converters only).
    #[serde(default)]
    pub consumes: Cost,

    /// Mission kinds this unit can run.
    #[serde(default)]
    pub missions: Vec<MissionKind>,

    /// Base share of launch fuel returned when a mission fails.
    #[serde(default)]
    pub abort_refund: f64,
}

const fn default_cost_growth() -> f64 {
    1.15
}

impl UnitData {
    /// Whether this unit consumes inputs to produce.
    #[must_use]
    pub fn is_converter(&self) -> bool {
        !self.consumes.is_empty()
    }

    /// Whether this unit can run `kind` missions.
    #[must_use]
    pub fn can_perform(&self, kind: MissionKind) -> bool {
        self.missions.contains(&kind)
    }
}
