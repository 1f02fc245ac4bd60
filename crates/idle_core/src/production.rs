//! Production planning over a period.
//!
//! A plan answers: "if `seconds` of production happened now, what changes?"
//! Live ticks plan `1 / ticks_per_second` seconds; offline catch-up plans the
//! whole (capped, efficiency-scaled) absence in one step. Both use this
//! module, so the two paths agree on converter accounting.
//!
//! Producers run first. Converters then run in table order, each limited by
//! a budget of snapshot stock plus everything produced earlier in the same
//! period. A converter short on input runs at the fraction it can afford
//! instead of stalling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{GameData, UnitData};
use crate::formulas::{conversion_fraction, production_over};
use crate::ids::UnitKind;
use crate::modifiers::ModifierSet;
use crate::resources::{Cost, ResourceKind, ResourceLedger};
use crate::state::GameState;
use crate::units::UnitStock;

/// Resource changes for one period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductionPlan {
    /// Length of the planned period.
    pub seconds: f64,
    /// Output of every producer and converter.
    pub produced: BTreeMap<ResourceKind, f64>,
    /// Input taken by converters.
    pub consumed: BTreeMap<ResourceKind, f64>,
    /// Converters that ran below full capacity.
    pub throttled: Vec<UnitKind>,
}

impl ProductionPlan {
    /// Net change of `kind` (produced minus consumed).
    #[must_use]
    pub fn net(&self, kind: ResourceKind) -> f64 {
        self.produced.get(&kind).copied().unwrap_or(0.0)
            - self.consumed.get(&kind).copied().unwrap_or(0.0)
    }

    /// Net change of every touched resource.
    #[must_use]
    pub fn deltas(&self) -> BTreeMap<ResourceKind, f64> {
        let mut deltas = BTreeMap::new();
        for kind in self.produced.keys().chain(self.consumed.keys()) {
            deltas.insert(*kind, self.net(*kind));
        }
        deltas
    }

    /// Apply the plan to `ledger`, clamping to caps.
    ///
    /// Returns the change actually applied per resource.
    pub fn apply(&self, ledger: &mut ResourceLedger) -> BTreeMap<ResourceKind, f64> {
        self.deltas()
            .into_iter()
            .map(|(kind, delta)| (kind, ledger.apply_delta(kind, delta)))
            .collect()
    }
}

/// Plan `seconds` of production from the current stock.
#[must_use]
pub fn plan(
    units: &[UnitData],
    stock: &UnitStock,
    modifiers: &ModifierSet,
    ledger: &ResourceLedger,
    seconds: f64,
) -> ProductionPlan {
    let mut plan = ProductionPlan {
        seconds,
        ..ProductionPlan::default()
    };
    if seconds.is_nan() || seconds <= 0.0 {
        return plan;
    }

    for unit in units.iter().filter(|u| !u.is_converter()) {
        let owned = stock.active_count(&unit.id);
        if owned == 0 {
            continue;
        }
        for (resource, rate) in unit.produces.iter() {
            let multiplier = modifiers.production_multiplier(resource, stock);
            *plan.produced.entry(resource).or_insert(0.0) +=
                production_over(rate, owned, multiplier, seconds);
        }
    }

    for unit in units.iter().filter(|u| u.is_converter()) {
        let owned = stock.active_count(&unit.id);
        if owned == 0 {
            continue;
        }
        let mut fraction: f64 = 1.0;
        for (resource, rate) in unit.consumes.iter() {
            let desired = production_over(rate, owned, 1.0, seconds);
            let budget = ledger.amount(resource) + plan.net(resource);
            fraction = fraction.min(conversion_fraction(desired, budget));
        }
        if fraction < 1.0 {
            plan.throttled.push(unit.id.clone());
        }
        if fraction <= 0.0 {
            continue;
        }
        for (resource, rate) in unit.consumes.iter() {
            *plan.consumed.entry(resource).or_insert(0.0) +=
                production_over(rate, owned, 1.0, seconds) * fraction;
        }
        for (resource, rate) in unit.produces.iter() {
            let multiplier = modifiers.production_multiplier(resource, stock);
            *plan.produced.entry(resource).or_insert(0.0) +=
                production_over(rate, owned, multiplier, seconds) * fraction;
        }
    }

    plan
}

/// Net change per second at full input, for display.
#[must_use]
pub fn rates_per_second(
    units: &[UnitData],
    stock: &UnitStock,
    modifiers: &ModifierSet,
    ledger: &ResourceLedger,
) -> BTreeMap<ResourceKind, f64> {
    plan(units, stock, modifiers, ledger, 1.0).deltas()
}

/// Plan `seconds` of production against `state` and apply it.
///
/// Positive changes count toward the run's earnings. Returns the change
/// actually applied per resource.
pub fn advance(state: &mut GameState, data: &GameData, seconds: f64) -> BTreeMap<ResourceKind, f64> {
    let plan = plan(&data.units, &state.units, &state.modifiers, &state.ledger, seconds);
    let applied = plan.apply(&mut state.ledger);
    let earned: Cost = applied
        .iter()
        .filter(|(_, delta)| **delta > 0.0)
        .map(|(kind, delta)| (*kind, *delta))
        .collect();
    state.record_earned(&earned);
    applied
}
