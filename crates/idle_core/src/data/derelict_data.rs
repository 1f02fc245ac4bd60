//! Derelict types, rarity bands and salvage reward tables.

use serde::{Deserialize, Serialize};

use crate::ids::{DerelictKind, LocationId};
use crate::resources::{Cost, ResourceKind};

/// Rarity band of a derelict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Most frequent.
    Common,
    /// Less frequent.
    Uncommon,
    /// Rare.
    Rare,
    /// Very rare.
    Epic,
    /// Rarest.
    Legendary,
}

impl Rarity {
    /// All bands from most to least common.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    /// Pick a band from weights `[common, uncommon, rare, epic, legendary]`
    /// using a uniform draw in `[0, 1)`.
    ///
    /// Zero-weight bands are never picked. All-zero weights fall back to
    /// [`Rarity::Common`].
    #[must_use]
    pub fn roll(weights: &RarityWeights, draw: f64) -> Self {
        let total = weights.total();
        if total == 0 {
            return Self::Common;
        }
        let threshold = draw.clamp(0.0, 1.0) * f64::from(total);
        let mut cumulative = 0.0;
        let mut last = Self::Common;
        for (band, weight) in Self::ALL.iter().zip(weights.0) {
            if weight == 0 {
                continue;
            }
            cumulative += f64::from(weight);
            last = *band;
            if threshold < cumulative {
                return *band;
            }
        }
        last
    }
}

/// Weights of each rarity band at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RarityWeights(pub [u32; 5]);

impl RarityWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

/// One possible payout line of a salvage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardLine {
    /// Resource paid out.
    pub resource: ResourceKind,
    /// Amount before multipliers.
    pub amount: f64,
    /// Chance this line pays out at all.
    #[serde(default = "default_chance")]
    pub chance: f64,
}

const fn default_chance() -> f64 {
    1.0
}

/// Data-driven derelict definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerelictData {
    /// Unique identifier.
    pub kind: DerelictKind,

    /// Display name.
    pub name: String,

    /// Rarity band.
    pub rarity: Rarity,

    /// Locations where this type may appear. Empty means anywhere.
    #[serde(default)]
    pub locations: Vec<LocationId>,

    /// How long a spawned derelict stays before expiring.
    pub lifetime_secs: f64,

    /// Base salvage duration.
    pub salvage_secs: f64,

    /// Base salvage success probability.
    pub salvage_success: f64,

    /// Payout table.
    #[serde(default)]
    pub rewards: Vec<RewardLine>,
}

impl DerelictData {
    /// Whether this type may appear at `location`.
    #[must_use]
    pub fn appears_at(&self, location: &LocationId) -> bool {
        self.locations.is_empty() || self.locations.contains(location)
    }

    /// Sum of every reward line assuming all pay out.
    #[must_use]
    pub fn max_payout(&self) -> Cost {
        self.rewards
            .iter()
            .map(|line| (line.resource, line.amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_roll_bands() {
        let weights = RarityWeights([70, 25, 5, 0, 0]);
        assert_eq!(Rarity::roll(&weights, 0.0), Rarity::Common);
        assert_eq!(Rarity::roll(&weights, 0.69), Rarity::Common);
        assert_eq!(Rarity::roll(&weights, 0.70), Rarity::Uncommon);
        assert_eq!(Rarity::roll(&weights, 0.96), Rarity::Rare);
        assert_eq!(Rarity::roll(&weights, 0.999_999), Rarity::Rare);
    }

    #[test]
    fn test_rarity_roll_skips_zero_bands() {
        let weights = RarityWeights([0, 0, 0, 0, 10]);
        assert_eq!(Rarity::roll(&weights, 0.0), Rarity::Legendary);
        assert_eq!(Rarity::roll(&RarityWeights::default(), 0.5), Rarity::Common);
    }

    #[test]
    fn test_appears_at() {
        let anywhere = DerelictData {
            kind: "debris_field".into(),
            name: "Debris".into(),
            rarity: Rarity::Common,
            locations: vec![],
            lifetime_secs: 60.0,
            salvage_secs: 10.0,
            salvage_success: 0.9,
            rewards: vec![],
        };
        assert!(anywhere.appears_at(&"mars".into()));
        let local = DerelictData {
            locations: vec!["luna".into()],
            ..anywhere
        };
        assert!(local.appears_at(&"luna".into()));
        assert!(!local.appears_at(&"mars".into()));
    }
}
