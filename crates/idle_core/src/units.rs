//! Owned unit counts, per-kind enabled flags, and buying units.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::commands::BuyAmount;
use crate::data::GameData;
use crate::error::Rejection;
use crate::formulas::{bulk_cost, cost_at, max_affordable};
use crate::ids::UnitKind;
use crate::modifiers::targets;
use crate::resources::Cost;
use crate::state::GameState;

/// How many of each unit kind the player owns.
///
/// Kinds default to enabled; a disabled kind keeps its count but neither
/// produces nor converts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitStock {
    counts: BTreeMap<UnitKind, u64>,
    disabled: BTreeSet<UnitKind>,
}

impl UnitStock {
    /// Empty stock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: own `count` of `kind`.
    #[must_use]
    pub fn with(mut self, kind: impl Into<UnitKind>, count: u64) -> Self {
        self.add(&kind.into(), count);
        self
    }

    /// Owned count of `kind`.
    #[must_use]
    pub fn count(&self, kind: &UnitKind) -> u64 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Add `amount` units of `kind`.
    pub fn add(&mut self, kind: &UnitKind, amount: u64) {
        if amount == 0 {
            return;
        }
        let count = self.counts.entry(kind.clone()).or_insert(0);
        *count = count.saturating_add(amount);
    }

    /// Whether `kind` is switched on.
    #[must_use]
    pub fn is_enabled(&self, kind: &UnitKind) -> bool {
        !self.disabled.contains(kind)
    }

    /// Switch `kind` on or off.
    pub fn set_enabled(&mut self, kind: &UnitKind, enabled: bool) {
        if enabled {
            self.disabled.remove(kind);
        } else {
            self.disabled.insert(kind.clone());
        }
    }

    /// Owned count of `kind` that is currently active.
    #[must_use]
    pub fn active_count(&self, kind: &UnitKind) -> u64 {
        if self.is_enabled(kind) {
            self.count(kind)
        } else {
            0
        }
    }

    /// Iterate owned kinds in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitKind, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    /// Total owned units across all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// A completed unit purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPurchase {
    /// Kind bought.
    pub unit: UnitKind,
    /// How many.
    pub amount: u64,
    /// Total paid.
    pub cost: Cost,
    /// Owned count afterwards.
    pub owned: u64,
}

/// Price multiplier for `unit` from its own and the generic cost targets.
#[must_use]
pub fn cost_multiplier(state: &GameState, unit: &UnitKind) -> f64 {
    state.modifiers.value(&targets::unit_cost(unit), &state.units)
        * state.modifiers.value(targets::UNIT_COST, &state.units)
}

/// Price of the next single `unit`.
pub fn next_price(state: &GameState, data: &GameData, unit: &UnitKind) -> Result<Cost, Rejection> {
    let info = data
        .unit(unit)
        .ok_or_else(|| Rejection::UnknownUnit(unit.clone()))?;
    Ok(cost_at(
        &info.cost,
        info.cost_growth,
        state.units.count(unit),
        cost_multiplier(state, unit),
    ))
}

/// How many of `unit` the ledger can pay for right now.
pub fn affordable(state: &GameState, data: &GameData, unit: &UnitKind) -> Result<u64, Rejection> {
    let info = data
        .unit(unit)
        .ok_or_else(|| Rejection::UnknownUnit(unit.clone()))?;
    Ok(max_affordable(
        &info.cost,
        info.cost_growth,
        state.units.count(unit),
        cost_multiplier(state, unit),
        &state.ledger,
    ))
}

/// Resolve `amount` to a count and its total price, without buying.
pub fn quote(
    state: &GameState,
    data: &GameData,
    unit: &UnitKind,
    amount: BuyAmount,
) -> Result<(u64, Cost), Rejection> {
    let info = data
        .unit(unit)
        .ok_or_else(|| Rejection::UnknownUnit(unit.clone()))?;
    let owned = state.units.count(unit);
    let multiplier = cost_multiplier(state, unit);
    let count = match amount {
        BuyAmount::Count(0) => return Err(Rejection::ZeroAmount),
        BuyAmount::Count(n) => n,
        BuyAmount::Max => {
            max_affordable(&info.cost, info.cost_growth, owned, multiplier, &state.ledger).max(1)
        }
    };
    let cost = bulk_cost(&info.cost, info.cost_growth, owned, count, multiplier);
    Ok((count, cost))
}

/// Buy units, paying the bulk price atomically.
///
/// `Max` with nothing affordable is rejected with the shortfall of a single
/// unit.
pub fn buy(
    state: &mut GameState,
    data: &GameData,
    unit: &UnitKind,
    amount: BuyAmount,
) -> Result<UnitPurchase, Rejection> {
    let (count, cost) = quote(state, data, unit, amount)?;
    state.ledger.spend(&cost)?;
    state.units.add(unit, count);
    state.run.current.units_bought += count;
    let owned = state.units.count(unit);
    tracing::debug!(%unit, count, owned, %cost, "Units bought");
    Ok(UnitPurchase {
        unit: unit.clone(),
        amount: count,
        cost,
        owned,
    })
}

/// Switch production of `unit` on or off.
pub fn set_enabled(
    state: &mut GameState,
    data: &GameData,
    unit: &UnitKind,
    enabled: bool,
) -> Result<(), Rejection> {
    if data.unit(unit).is_none() {
        return Err(Rejection::UnknownUnit(unit.clone()));
    }
    state.units.set_enabled(unit, enabled);
    Ok(())
}
