//! Proptest strategies.
//!
//! Generators for effects, cost curves, ledgers and command streams. Ids
//! are drawn from the standard content so generated commands hit real
//! validation paths rather than bouncing off unknown-id checks.

use idle_core::automation::AutomationFlag;
use idle_core::commands::{BuyAmount, Command};
use idle_core::data::{MissionAction, MissionKind};
use idle_core::missions::MissionTarget;
use idle_core::modifiers::{targets, Effect, ModifierSource};
use idle_core::resources::{Cost, ResourceKind, ResourceLedger};
use proptest::prelude::*;

/// Targets effects are drawn from.
pub const TARGETS: [&str; 5] = [
    targets::PRODUCTION,
    targets::UNIT_COST,
    targets::TRAVEL_TIME,
    targets::MISSION_SUCCESS,
    targets::SALVAGE_REWARD,
];

/// Unit kinds in the standard content.
pub const UNITS: [&str; 7] = [
    "mining_drone",
    "crystal_harvester",
    "solar_array",
    "fuel_refinery",
    "scout_ship",
    "salvage_ship",
    "colony_ship",
];

/// Locations in the standard content.
pub const LOCATIONS: [&str; 6] = ["earth_orbit", "luna", "mars", "asteroid_belt", "jupiter", "saturn"];

/// Upgrades in the standard content.
pub const UPGRADES: [&str; 6] = [
    "improved_drills",
    "crystal_resonators",
    "cargo_expansion",
    "ion_drive",
    "warp_core",
    "formation_doctrine",
];

/// Any resource kind.
pub fn arb_resource() -> impl Strategy<Value = ResourceKind> {
    prop::sample::select(ResourceKind::ALL.to_vec())
}

/// Any modifier source.
pub fn arb_source() -> impl Strategy<Value = ModifierSource> {
    prop::sample::select(ModifierSource::ALL.to_vec())
}

/// Price growth factor, including the flat `1.0` edge.
pub fn arb_growth() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), 1.0f64..1.5]
}

/// Base price of one unit.
pub fn arb_base() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 1.0f64..500.0]
}

/// A single effect on one of [`TARGETS`].
pub fn arb_effect() -> impl Strategy<Value = Effect> {
    let target = prop::sample::select(TARGETS.to_vec());
    prop_oneof![
        (target.clone(), 0.5f64..2.0).prop_map(|(t, v)| Effect::multiplier(t, v)),
        (target.clone(), -0.5f64..0.5).prop_map(|(t, v)| Effect::additive(t, v)),
        (target, 1u32..20, 0.0f64..0.2).prop_map(|(t, per, v)| Effect::per_units(t, "mining_drone", per, v)),
    ]
}

/// Effects tagged with the source that unlocks them.
pub fn arb_unlocks(max: usize) -> impl Strategy<Value = Vec<(ModifierSource, Effect)>> {
    prop::collection::vec((arb_source(), arb_effect()), 0..max)
}

/// A cost bundle of one to three resources.
pub fn arb_cost() -> impl Strategy<Value = Cost> {
    prop::collection::btree_map(arb_resource(), 1.0f64..1_000.0, 1..=3)
        .prop_map(|amounts| amounts.into_iter().collect())
}

/// An uncapped ledger holding every resource.
pub fn arb_ledger() -> impl Strategy<Value = ResourceLedger> {
    prop::collection::vec(0.0f64..1.0e6, ResourceKind::ALL.len()).prop_map(|amounts| {
        ResourceKind::ALL
            .into_iter()
            .zip(amounts)
            .fold(ResourceLedger::new(), |ledger, (kind, amount)| {
                ledger.with_entry(kind, amount, None)
            })
    })
}

fn arb_unit() -> impl Strategy<Value = idle_core::ids::UnitKind> {
    prop::sample::select(UNITS.to_vec()).prop_map(Into::into)
}

fn arb_location() -> impl Strategy<Value = idle_core::ids::LocationId> {
    prop::sample::select(LOCATIONS.to_vec()).prop_map(Into::into)
}

/// A command a player could plausibly issue. Many will be refused; that
/// is part of the point.
pub fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => (arb_unit(), prop_oneof![(1u64..5).prop_map(BuyAmount::Count), Just(BuyAmount::Max)])
            .prop_map(|(unit, amount)| Command::BuyUnit { unit, amount }),
        1 => (arb_unit(), any::<bool>()).prop_map(|(unit, enabled)| Command::SetUnitEnabled { unit, enabled }),
        2 => prop::sample::select(UPGRADES.to_vec())
            .prop_map(|u| Command::PurchaseUpgrade { upgrade: u.into() }),
        2 => arb_location().prop_map(|location| Command::StartMission {
            kind: MissionKind::Scout,
            unit: "scout_ship".into(),
            target: MissionTarget::Location(location),
            action: MissionAction::Standard,
        }),
        1 => (arb_location(), any::<bool>())
            .prop_map(|(destination, instant)| Command::StartTravel { destination, instant }),
        1 => Just(Command::CancelTravel),
        1 => (prop::sample::select(AutomationFlag::ALL.to_vec()), any::<bool>())
            .prop_map(|(flag, enabled)| Command::SetAutomation { flag, enabled }),
        1 => Just(Command::PrestigeReset),
    ]
}

/// A sequence of commands.
pub fn arb_command_sequence(max_len: usize) -> impl Strategy<Value = Vec<Command>> {
    prop::collection::vec(arb_command(), 0..max_len)
}
