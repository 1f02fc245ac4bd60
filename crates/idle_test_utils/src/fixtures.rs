//! Test fixtures and helpers.
//!
//! Pre-built simulations and state tweaks for consistent testing. Every
//! fixture uses the standard content set.

use idle_core::clock::Millis;
use idle_core::data::{MissionAction, MissionKind};
use idle_core::missions::MissionTarget;
use idle_core::modifiers::{Effect, ModifierSource};
use idle_core::prelude::*;

/// Live tick length at the default configuration.
pub const TICK_MS: Millis = 100;

/// One minute.
pub const MINUTE_MS: Millis = 60_000;

/// One hour.
pub const HOUR_MS: Millis = 3_600_000;

/// Configuration whose passive spawn check never fires within a test's
/// span, so scripted draws go only where a test expects them.
#[must_use]
pub fn quiet_config() -> EngineConfig {
    EngineConfig {
        spawn_check_interval_secs: 1.0e7,
        ..EngineConfig::default()
    }
}

/// Standard game on a ChaCha stream seeded with `seed`, started at time 0.
///
/// # Panics
///
/// Panics if the standard content fails validation.
#[must_use]
pub fn seeded(seed: u64) -> Simulation {
    Simulation::with_seed(GameData::standard(), EngineConfig::default(), seed, 0)
        .expect("standard content is valid")
}

/// Standard game replaying `draws` (then `fallback` forever), with passive
/// spawning silenced.
///
/// # Panics
///
/// Panics if the standard content fails validation.
#[must_use]
pub fn scripted(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Simulation {
    let rng = ScriptedRandom::new(draws).with_fallback(fallback);
    Simulation::with_random(GameData::standard(), quiet_config(), Box::new(rng), 0)
        .expect("standard content is valid")
}

/// Standard game where every draw is `draw`.
#[must_use]
pub fn constant(draw: f64) -> Simulation {
    scripted([], draw)
}

/// Set `kind` to `amount`, lifting its cap first if it would clip.
pub fn fund(sim: &mut Simulation, kind: ResourceKind, amount: f64) {
    let ledger = &mut sim.state_mut().ledger;
    if ledger.cap(kind).is_some_and(|cap| cap < amount) {
        ledger.set_cap(kind, None);
    }
    ledger.set_amount(kind, amount);
}

/// Add `count` units of `unit` for free.
pub fn give_units(sim: &mut Simulation, unit: &str, count: u64) {
    sim.state_mut().units.add(&unit.into(), count);
}

/// Unlock a capability as if researched.
pub fn unlock(sim: &mut Simulation, capability: &str) {
    sim.state_mut()
        .modifiers
        .unlock(ModifierSource::Tech, [Effect::capability(capability)]);
}

/// Run `count` live ticks after the last known timestamp. Returns the time
/// of the final tick.
pub fn run_ticks(sim: &mut Simulation, count: u64) -> Millis {
    let mut now = sim.state().last_known_timestamp;
    for _ in 0..count {
        now += TICK_MS;
        sim.tick(now);
    }
    now
}

/// Start-mission command aimed at a location.
#[must_use]
pub fn mission_at(kind: MissionKind, unit: &str, location: &str) -> Command {
    Command::StartMission {
        kind,
        unit: unit.into(),
        target: MissionTarget::Location(location.into()),
        action: MissionAction::Standard,
    }
}

/// Start-mission command salvaging a derelict.
#[must_use]
pub fn salvage(unit: &str, derelict: DerelictId, action: MissionAction) -> Command {
    Command::StartMission {
        kind: MissionKind::Salvage,
        unit: unit.into(),
        target: MissionTarget::Derelict(derelict),
        action,
    }
}

/// A derelict of type `kind` at the fleet's location, live for an hour.
pub fn derelict_here(sim: &mut Simulation, kind: &str) -> DerelictId {
    let state = sim.state_mut();
    let here = state.travel.location.clone();
    let now = state.last_known_timestamp;
    state
        .derelicts
        .insert(kind.into(), Rarity::Common, here, now, HOUR_MS)
}

/// A mid-game economy: drones, harvesters, arrays, a refinery, scouts and
/// salvage ships, plenty of fuel, and both automation behaviors on.
///
/// # Panics
///
/// Panics if the standard content fails validation.
#[must_use]
pub fn automated_economy(seed: u64) -> Simulation {
    let mut sim = seeded(seed);
    give_units(&mut sim, "mining_drone", 20);
    give_units(&mut sim, "crystal_harvester", 5);
    give_units(&mut sim, "solar_array", 5);
    give_units(&mut sim, "fuel_refinery", 2);
    give_units(&mut sim, "scout_ship", 2);
    give_units(&mut sim, "salvage_ship", 2);
    fund(&mut sim, ResourceKind::Fuel, 1_000.0);
    unlock(&mut sim, idle_core::modifiers::targets::AUTOMATION_SCOUT);
    unlock(&mut sim, idle_core::modifiers::targets::AUTOMATION_SALVAGE);
    for flag in AutomationFlag::ALL {
        let result = sim.execute(Command::SetAutomation { flag, enabled: true }, 0);
        assert!(result.success, "{}", result.message);
    }
    sim
}
