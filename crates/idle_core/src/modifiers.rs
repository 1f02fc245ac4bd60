//! Effect aggregation across every modifier source.
//!
//! Each source (technologies, prestige perks, unit upgrades, the active
//! formation, alien tech, territory) contributes a list of [`Effect`]s.
//! Aggregating a target walks every source and folds matching effects:
//!
//! - `Multiplier` effects multiply together
//! - `Additive` effects sum
//! - `Conditional` effects contribute `1 + floor(count / per) * value` to the
//!   product, where `count` is the owned count of a unit kind
//!
//! A target nothing touches aggregates to the identity (`x1`, `+0`), so
//! referencing an unknown target is harmless.
//!
//! Matching factors are sorted before folding, which keeps the result
//! bit-identical no matter in which order effects were unlocked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::UnitKind;
use crate::resources::ResourceKind;
use crate::units::UnitStock;

/// Well-known modifier targets.
pub mod targets {
    use crate::data::MissionKind;
    use crate::ids::UnitKind;
    use crate::resources::ResourceKind;

    /// Output of every producer.
    pub const PRODUCTION: &str = "production";
    /// Price of every unit.
    pub const UNIT_COST: &str = "unit_cost";
    /// Duration of every mission.
    pub const MISSION_TIME: &str = "mission_time";
    /// Success chance of every mission.
    pub const MISSION_SUCCESS: &str = "mission_success";
    /// Fuel spent launching a mission.
    pub const MISSION_FUEL_COST: &str = "mission_fuel_cost";
    /// Salvage payouts.
    pub const SALVAGE_REWARD: &str = "salvage_reward";
    /// Fraction of fuel returned when a mission fails.
    pub const ABORT_REFUND: &str = "abort_refund";
    /// Fuel spent on a voyage.
    pub const TRAVEL_FUEL_COST: &str = "travel_fuel_cost";
    /// Voyage duration.
    pub const TRAVEL_TIME: &str = "travel_time";
    /// Voyage speed; duration is divided by it.
    pub const TRAVEL_SPEED: &str = "travel_speed";
    /// Share of production credited while away.
    pub const OFFLINE_EFFICIENCY: &str = "offline_efficiency";
    /// Chance of a passive derelict spawn.
    pub const DERELICT_SPAWN_CHANCE: &str = "derelict_spawn_chance";
    /// Dark matter awarded on prestige.
    pub const PRESTIGE_GAIN: &str = "prestige_gain";

    /// Capability: every mission-capable unit runs two missions at once.
    pub const DUAL_MISSIONS: &str = "dual_missions";
    /// Capability: scouting may discover derelicts at neighboring locations.
    pub const ADJACENT_DISCOVERY: &str = "adjacent_discovery";
    /// Capability: automatic scouting.
    pub const AUTOMATION_SCOUT: &str = "automation_scout";
    /// Capability: automatic salvaging.
    pub const AUTOMATION_SALVAGE: &str = "automation_salvage";

    /// Output of producers of one resource, e.g. `metal_production`.
    #[must_use]
    pub fn production(kind: ResourceKind) -> String {
        format!("{}_production", kind.key())
    }

    /// Storage cap of one resource, e.g. `metal_storage`.
    #[must_use]
    pub fn storage(kind: ResourceKind) -> String {
        format!("{}_storage", kind.key())
    }

    /// Price of one unit kind, e.g. `mining_drone_cost`.
    #[must_use]
    pub fn unit_cost(unit: &UnitKind) -> String {
        format!("{unit}_cost")
    }

    /// Duration of one mission kind, e.g. `scout_mission_time`.
    #[must_use]
    pub fn mission_time(kind: MissionKind) -> String {
        format!("{}_mission_time", kind.key())
    }

    /// Success chance of one mission kind, e.g. `scout_success`.
    #[must_use]
    pub fn mission_success(kind: MissionKind) -> String {
        format!("{}_success", kind.key())
    }
}

/// Where a group of effects comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierSource {
    /// Researched technologies.
    Tech,
    /// Perks bought with dark matter.
    PrestigePerks,
    /// Upgrades to ships and drones.
    UnitUpgrades,
    /// The currently selected fleet formation.
    Formation,
    /// Technology reverse-engineered from artifacts.
    AlienTech,
    /// Bonuses from established colonies.
    Territory,
}

impl ModifierSource {
    /// All sources in aggregation order.
    pub const ALL: [Self; 6] = [
        Self::Tech,
        Self::PrestigePerks,
        Self::UnitUpgrades,
        Self::Formation,
        Self::AlienTech,
        Self::Territory,
    ];

    /// Whether effects from this source survive a prestige reset.
    #[must_use]
    pub const fn survives_prestige(self) -> bool {
        matches!(self, Self::PrestigePerks)
    }
}

/// How an effect combines with others on the same target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Multiplies the target.
    Multiplier,
    /// Adds to the target.
    Additive,
    /// Multiplies by `1 + floor(count(unit) / per) * value`.
    Conditional {
        /// Unit kind whose count drives the effect.
        unit: UnitKind,
        /// Units per step.
        per: u32,
    },
}

/// A single modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// How this effect combines.
    pub kind: EffectKind,
    /// Target name (see [`targets`]).
    pub target: String,
    /// Magnitude.
    pub value: f64,
}

impl Effect {
    /// A multiplicative effect.
    #[must_use]
    pub fn multiplier(target: impl Into<String>, value: f64) -> Self {
        Self {
            kind: EffectKind::Multiplier,
            target: target.into(),
            value,
        }
    }

    /// An additive effect.
    #[must_use]
    pub fn additive(target: impl Into<String>, value: f64) -> Self {
        Self {
            kind: EffectKind::Additive,
            target: target.into(),
            value,
        }
    }

    /// A conditional effect scaling with owned units.
    #[must_use]
    pub fn per_units(target: impl Into<String>, unit: impl Into<UnitKind>, per: u32, value: f64) -> Self {
        Self {
            kind: EffectKind::Conditional {
                unit: unit.into(),
                per,
            },
            target: target.into(),
            value,
        }
    }

    /// A capability flag (an additive `1.0` on the capability target).
    #[must_use]
    pub fn capability(target: impl Into<String>) -> Self {
        Self::additive(target, 1.0)
    }
}

/// Folded result of every effect on one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Product of multiplier and conditional factors.
    pub multiplier: f64,
    /// Sum of additive values.
    pub additive: f64,
}

impl Aggregate {
    /// No effect: `x1`, `+0`.
    pub const IDENTITY: Self = Self {
        multiplier: 1.0,
        additive: 0.0,
    };

    /// Combined scalar, `multiplier + additive`.
    ///
    /// This is the form used for rate and time multipliers, where a `+0.5`
    /// additive reads as "50% more".
    #[must_use]
    pub fn value(self) -> f64 {
        self.multiplier + self.additive
    }

    /// Apply to a base value: `base * multiplier + additive`.
    #[must_use]
    pub fn apply(self, base: f64) -> f64 {
        base * self.multiplier + self.additive
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fold `effects` matching `target` into an [`Aggregate`].
pub fn aggregate<'a, I>(effects: I, target: &str, units: &UnitStock) -> Aggregate
where
    I: IntoIterator<Item = &'a Effect>,
{
    let mut factors = Vec::new();
    let mut addends = Vec::new();
    for effect in effects.into_iter().filter(|e| e.target == target) {
        match &effect.kind {
            EffectKind::Multiplier => factors.push(effect.value),
            EffectKind::Additive => addends.push(effect.value),
            EffectKind::Conditional { unit, per } => {
                let steps = if *per == 0 {
                    0
                } else {
                    units.count(unit) / u64::from(*per)
                };
                factors.push(1.0 + steps as f64 * effect.value);
            }
        }
    }
    factors.sort_by(f64::total_cmp);
    addends.sort_by(f64::total_cmp);
    Aggregate {
        multiplier: factors.iter().fold(1.0, |acc, f| acc * f),
        additive: addends.iter().fold(0.0, |acc, a| acc + a),
    }
}

/// Every active effect, grouped by source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierSet {
    sources: BTreeMap<ModifierSource, Vec<Effect>>,
}

impl ModifierSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append effects to a source.
    pub fn unlock(&mut self, source: ModifierSource, effects: impl IntoIterator<Item = Effect>) {
        self.sources.entry(source).or_default().extend(effects);
    }

    /// Replace every effect of a source.
    pub fn replace(&mut self, source: ModifierSource, effects: impl IntoIterator<Item = Effect>) {
        let effects: Vec<Effect> = effects.into_iter().collect();
        if effects.is_empty() {
            self.sources.remove(&source);
        } else {
            self.sources.insert(source, effects);
        }
    }

    /// Drop every effect of a source.
    pub fn clear(&mut self, source: ModifierSource) {
        self.sources.remove(&source);
    }

    /// Effects of one source.
    #[must_use]
    pub fn effects(&self, source: ModifierSource) -> &[Effect] {
        self.sources.get(&source).map_or(&[], Vec::as_slice)
    }

    /// Every effect of every source.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.sources.values().flatten()
    }

    /// Number of effects across all sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    /// True when no source carries any effect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate `target` across every source.
    #[must_use]
    pub fn aggregate(&self, target: &str, units: &UnitStock) -> Aggregate {
        aggregate(self.iter(), target, units)
    }

    /// Aggregate `target` from a single source.
    #[must_use]
    pub fn aggregate_from(&self, source: ModifierSource, target: &str, units: &UnitStock) -> Aggregate {
        aggregate(self.effects(source), target, units)
    }

    /// Shorthand for `aggregate(target).value()`.
    #[must_use]
    pub fn value(&self, target: &str, units: &UnitStock) -> f64 {
        self.aggregate(target, units).value()
    }

    /// Combined output multiplier for producers of `kind`.
    #[must_use]
    pub fn production_multiplier(&self, kind: ResourceKind, units: &UnitStock) -> f64 {
        self.value(&targets::production(kind), units) * self.value(targets::PRODUCTION, units)
    }

    /// Whether a capability has been unlocked by any source.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.aggregate(capability, &UnitStock::new()).additive > 0.0
    }

    /// Keep only sources for which `keep` returns true.
    pub fn retain_sources(&mut self, mut keep: impl FnMut(ModifierSource) -> bool) {
        self.sources.retain(|source, _| keep(*source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_is_identity() {
        let set = ModifierSet::new();
        let agg = set.aggregate("nonexistent", &UnitStock::new());
        assert_eq!(agg, Aggregate::IDENTITY);
        assert_eq!(agg.value(), 1.0);
    }

    #[test]
    fn test_multiplier_and_additive_fold() {
        let mut set = ModifierSet::new();
        set.unlock(ModifierSource::Tech, [Effect::multiplier("production", 1.5)]);
        set.unlock(ModifierSource::PrestigePerks, [Effect::multiplier("production", 2.0)]);
        set.unlock(ModifierSource::UnitUpgrades, [Effect::additive("production", 0.25)]);
        let agg = set.aggregate("production", &UnitStock::new());
        assert_eq!(agg.multiplier, 3.0);
        assert_eq!(agg.additive, 0.25);
        assert_eq!(agg.value(), 3.25);
        assert_eq!(agg.apply(10.0), 30.25);
    }

    #[test]
    fn test_conditional_scales_with_units() {
        let mut set = ModifierSet::new();
        set.unlock(
            ModifierSource::Tech,
            [Effect::per_units("metal_production", "mining_drone", 10, 0.05)],
        );
        let few = UnitStock::new().with("mining_drone", 9);
        let many = UnitStock::new().with("mining_drone", 25);
        assert_eq!(set.aggregate("metal_production", &few).multiplier, 1.0);
        assert!((set.aggregate("metal_production", &many).multiplier - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_conditional_with_zero_step_is_neutral() {
        let mut set = ModifierSet::new();
        set.unlock(
            ModifierSource::Tech,
            [Effect::per_units("production", "mining_drone", 0, 0.5)],
        );
        let units = UnitStock::new().with("mining_drone", 100);
        assert_eq!(set.aggregate("production", &units), Aggregate::IDENTITY);
    }

    #[test]
    fn test_unlock_order_does_not_change_result() {
        let effects = [
            Effect::multiplier("production", 1.1),
            Effect::multiplier("production", 1.3),
            Effect::multiplier("production", 0.7),
            Effect::additive("production", 0.1),
            Effect::additive("production", 0.2),
        ];
        let mut forward = ModifierSet::new();
        forward.unlock(ModifierSource::Tech, effects.iter().cloned());
        let mut backward = ModifierSet::new();
        backward.unlock(ModifierSource::AlienTech, effects.iter().rev().cloned());
        let units = UnitStock::new();
        assert_eq!(
            forward.aggregate("production", &units),
            backward.aggregate("production", &units)
        );
    }

    #[test]
    fn test_aggregate_from_single_source() {
        let mut set = ModifierSet::new();
        set.unlock(ModifierSource::Formation, [Effect::multiplier("salvage_reward", 1.2)]);
        set.unlock(ModifierSource::AlienTech, [Effect::multiplier("salvage_reward", 1.5)]);
        let units = UnitStock::new();
        assert_eq!(
            set.aggregate_from(ModifierSource::Formation, "salvage_reward", &units)
                .multiplier,
            1.2
        );
        assert_eq!(
            set.aggregate_from(ModifierSource::Territory, "salvage_reward", &units),
            Aggregate::IDENTITY
        );
    }

    #[test]
    fn test_capabilities() {
        let mut set = ModifierSet::new();
        assert!(!set.has_capability(targets::DUAL_MISSIONS));
        set.unlock(ModifierSource::Tech, [Effect::capability(targets::DUAL_MISSIONS)]);
        assert!(set.has_capability(targets::DUAL_MISSIONS));
    }

    #[test]
    fn test_replace_and_retain() {
        let mut set = ModifierSet::new();
        set.unlock(ModifierSource::Formation, [Effect::multiplier("travel_time", 0.8)]);
        set.replace(ModifierSource::Formation, [Effect::multiplier("travel_time", 0.5)]);
        assert_eq!(set.effects(ModifierSource::Formation).len(), 1);
        set.unlock(ModifierSource::PrestigePerks, [Effect::multiplier("production", 2.0)]);
        set.retain_sources(ModifierSource::survives_prestige);
        assert_eq!(set.len(), 1);
        assert!(set.effects(ModifierSource::Formation).is_empty());
    }

    #[test]
    fn test_production_multiplier_combines_generic_and_specific() {
        let mut set = ModifierSet::new();
        set.unlock(ModifierSource::Tech, [Effect::multiplier("metal_production", 1.5)]);
        set.unlock(ModifierSource::Territory, [Effect::multiplier("production", 1.2)]);
        let m = set.production_multiplier(ResourceKind::Metal, &UnitStock::new());
        assert!((m - 1.8).abs() < 1e-12);
        let c = set.production_multiplier(ResourceKind::Crystal, &UnitStock::new());
        assert!((c - 1.2).abs() < 1e-12);
    }
}
