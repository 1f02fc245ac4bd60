//! Resources, costs and the capped resource ledger.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::formulas::whole_units;

/// Tolerance when comparing a stock against a price.
///
/// Stocks accumulate fractional per-tick production; prices are whole
/// numbers. Without a tolerance `99.99999999` would fail to buy a `100`.
pub const AFFORD_EPSILON: f64 = 1e-9;

/// Every resource the economy tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Primary building material.
    Metal,
    /// Secondary material for advanced units.
    Crystal,
    /// Spent by missions and travel.
    Fuel,
    /// Feeds converters.
    Energy,
    /// Rare salvage currency for alien tech.
    Artifacts,
    /// Prestige currency; survives resets.
    DarkMatter,
}

impl ResourceKind {
    /// All resources in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Metal,
        Self::Crystal,
        Self::Fuel,
        Self::Energy,
        Self::Artifacts,
        Self::DarkMatter,
    ];

    /// Snake-case key used in modifier targets and content files.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Crystal => "crystal",
            Self::Fuel => "fuel",
            Self::Energy => "energy",
            Self::Artifacts => "artifacts",
            Self::DarkMatter => "dark_matter",
        }
    }

    /// Whether this resource carries over through a prestige reset.
    #[must_use]
    pub const fn survives_prestige(self) -> bool {
        matches!(self, Self::DarkMatter)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A bundle of resource amounts (a price, a reward, a payout).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost(BTreeMap<ResourceKind, f64>);

impl Cost {
    /// An empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle of a single resource.
    #[must_use]
    pub fn single(kind: ResourceKind, amount: f64) -> Self {
        Self::new().with(kind, amount)
    }

    /// Builder: add `amount` of `kind`.
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.add(kind, amount);
        self
    }

    /// Add `amount` of `kind` in place.
    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        *self.0.entry(kind).or_insert(0.0) += amount;
    }

    /// Add every entry of another bundle in place.
    pub fn merge(&mut self, other: &Self) {
        for (kind, amount) in other.iter() {
            self.add(kind, amount);
        }
    }

    /// Amount of `kind` in this bundle (zero when absent).
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    /// Iterate entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// True when every entry is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v == 0.0)
    }

    /// Every entry multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        self.iter().map(|(k, v)| (k, v * factor)).collect()
    }

    /// Every entry rounded down to whole units.
    #[must_use]
    pub fn floored(&self) -> Self {
        self.iter().map(|(k, v)| (k, whole_units(v))).collect()
    }
}

impl FromIterator<(ResourceKind, f64)> for Cost {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, f64)>>(iter: I) -> Self {
        let mut cost = Self::new();
        for (kind, amount) in iter {
            cost.add(kind, amount);
        }
        cost
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, amount) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{amount:.0} {kind}")?;
            first = false;
        }
        if first {
            f.write_str("nothing")?;
        }
        Ok(())
    }
}

/// Stock and cap of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Current amount, always within `0..=cap`.
    pub amount: f64,
    /// Storage cap; `None` is uncapped.
    pub cap: Option<f64>,
}

/// All resource stocks with their caps.
///
/// Amounts never go negative and never exceed their cap; every mutation
/// clamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLedger {
    entries: BTreeMap<ResourceKind, LedgerEntry>,
}

impl ResourceLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set amount and cap of `kind`.
    #[must_use]
    pub fn with_entry(mut self, kind: ResourceKind, amount: f64, cap: Option<f64>) -> Self {
        self.entries.insert(kind, LedgerEntry { amount: 0.0, cap });
        self.set_amount(kind, amount);
        self
    }

    /// Current amount of `kind`.
    #[must_use]
    pub fn amount(&self, kind: ResourceKind) -> f64 {
        self.entries.get(&kind).map_or(0.0, |e| e.amount)
    }

    /// Cap of `kind` (`None` when uncapped).
    #[must_use]
    pub fn cap(&self, kind: ResourceKind) -> Option<f64> {
        self.entries.get(&kind).and_then(|e| e.cap)
    }

    /// Whether the ledger tracks `kind` at all.
    #[must_use]
    pub fn tracks(&self, kind: ResourceKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Change the cap of `kind`, clamping the stock down if needed.
    pub fn set_cap(&mut self, kind: ResourceKind, cap: Option<f64>) {
        let entry = self.entries.entry(kind).or_default();
        entry.cap = cap.map(|c| c.max(0.0));
        if let Some(cap) = entry.cap {
            entry.amount = entry.amount.min(cap);
        }
    }

    /// Overwrite the amount of `kind`, clamped to `0..=cap`.
    pub fn set_amount(&mut self, kind: ResourceKind, amount: f64) {
        let entry = self.entries.entry(kind).or_default();
        entry.amount = clamp_to_cap(amount, entry.cap);
    }

    /// Space left below the cap.
    #[must_use]
    pub fn headroom(&self, kind: ResourceKind) -> f64 {
        match self.cap(kind) {
            Some(cap) => (cap - self.amount(kind)).max(0.0),
            None => f64::INFINITY,
        }
    }

    /// True when `kind` sits at its cap.
    #[must_use]
    pub fn is_full(&self, kind: ResourceKind) -> bool {
        self.cap(kind)
            .is_some_and(|cap| self.amount(kind) + AFFORD_EPSILON >= cap)
    }

    /// Check every entry of `cost` against current stock.
    pub fn can_afford(&self, cost: &Cost) -> Result<(), Rejection> {
        for (resource, required) in cost.iter() {
            let available = self.amount(resource);
            if available + AFFORD_EPSILON < required {
                return Err(Rejection::InsufficientResources {
                    resource,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Deduct `cost` atomically: either every entry is paid or nothing is.
    pub fn spend(&mut self, cost: &Cost) -> Result<(), Rejection> {
        self.can_afford(cost)?;
        for (resource, amount) in cost.iter() {
            let entry = self.entries.entry(resource).or_default();
            entry.amount = (entry.amount - amount).max(0.0);
        }
        Ok(())
    }

    /// Add `amount` of `kind`, clamped to the cap. Returns the amount credited.
    pub fn deposit(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        self.apply_delta(kind, amount.max(0.0))
    }

    /// Deposit every entry of `bundle`. Returns what was actually credited.
    pub fn deposit_all(&mut self, bundle: &Cost) -> Cost {
        bundle
            .iter()
            .map(|(kind, amount)| (kind, self.deposit(kind, amount)))
            .collect()
    }

    /// Apply a signed change, clamped to `0..=cap`. Returns the applied change.
    pub fn apply_delta(&mut self, kind: ResourceKind, delta: f64) -> f64 {
        let entry = self.entries.entry(kind).or_default();
        let before = entry.amount;
        entry.amount = clamp_to_cap(before + delta, entry.cap);
        entry.amount - before
    }

    /// Iterate entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &LedgerEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

fn clamp_to_cap(amount: f64, cap: Option<f64>) -> f64 {
    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    match cap {
        Some(cap) => amount.min(cap),
        None => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ResourceLedger {
        ResourceLedger::new()
            .with_entry(ResourceKind::Metal, 100.0, Some(500.0))
            .with_entry(ResourceKind::Fuel, 20.0, Some(50.0))
            .with_entry(ResourceKind::DarkMatter, 0.0, None)
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut l = ledger();
        let cost = Cost::single(ResourceKind::Metal, 50.0).with(ResourceKind::Fuel, 30.0);
        let err = l.spend(&cost).unwrap_err();
        assert!(matches!(
            err,
            Rejection::InsufficientResources {
                resource: ResourceKind::Fuel,
                ..
            }
        ));
        assert_eq!(l.amount(ResourceKind::Metal), 100.0);
        assert_eq!(l.amount(ResourceKind::Fuel), 20.0);
    }

    #[test]
    fn test_spend_deducts_every_entry() {
        let mut l = ledger();
        let cost = Cost::single(ResourceKind::Metal, 40.0).with(ResourceKind::Fuel, 20.0);
        l.spend(&cost).unwrap();
        assert_eq!(l.amount(ResourceKind::Metal), 60.0);
        assert_eq!(l.amount(ResourceKind::Fuel), 0.0);
    }

    #[test]
    fn test_deposit_clamps_to_cap() {
        let mut l = ledger();
        let credited = l.deposit(ResourceKind::Fuel, 100.0);
        assert_eq!(credited, 30.0);
        assert!(l.is_full(ResourceKind::Fuel));
        assert_eq!(l.headroom(ResourceKind::Fuel), 0.0);
    }

    #[test]
    fn test_uncapped_resource_has_infinite_headroom() {
        let mut l = ledger();
        l.deposit(ResourceKind::DarkMatter, 1e12);
        assert_eq!(l.amount(ResourceKind::DarkMatter), 1e12);
        assert!(!l.is_full(ResourceKind::DarkMatter));
        assert!(l.headroom(ResourceKind::DarkMatter).is_infinite());
    }

    #[test]
    fn test_apply_delta_never_negative() {
        let mut l = ledger();
        let applied = l.apply_delta(ResourceKind::Metal, -250.0);
        assert_eq!(applied, -100.0);
        assert_eq!(l.amount(ResourceKind::Metal), 0.0);
    }

    #[test]
    fn test_lowering_cap_clamps_stock() {
        let mut l = ledger();
        l.set_cap(ResourceKind::Metal, Some(80.0));
        assert_eq!(l.amount(ResourceKind::Metal), 80.0);
    }

    #[test]
    fn test_can_afford_tolerates_float_noise() {
        let mut l = ledger();
        l.set_amount(ResourceKind::Metal, 99.999_999_999_9);
        assert!(l.can_afford(&Cost::single(ResourceKind::Metal, 100.0)).is_ok());
    }

    #[test]
    fn test_cost_display() {
        let cost = Cost::single(ResourceKind::Metal, 10.0).with(ResourceKind::Fuel, 2.0);
        assert_eq!(cost.to_string(), "10 metal, 2 fuel");
        assert_eq!(Cost::new().to_string(), "nothing");
    }
}
