//! Catch-up after an absence.
//!
//! Instead of replaying every missed tick, catch-up applies the whole
//! absence in one closed-form step:
//!
//! 1. The voyage completes if its arrival falls inside the window.
//! 2. Production runs once for `window * efficiency` seconds.
//! 3. Missions due inside the window resolve in launch order.
//! 4. Derelicts and contracts past their time expire.
//!
//! The window is the time away, capped at `max_offline_secs`. Absences
//! shorter than `offline_min_secs` are left to the live tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::{millis_to_secs, Millis};
use crate::config::EngineConfig;
use crate::data::GameData;
use crate::ids::{ContractId, DerelictId};
use crate::missions::{self, MissionReport};
use crate::modifiers::targets;
use crate::production;
use crate::resources::ResourceKind;
use crate::rng::RandomSource;
use crate::state::GameState;
use crate::travel::{self, Arrival};

/// Summary of one catch-up, shown to the player once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Time actually away.
    pub away_ms: Millis,
    /// Time credited (away time, capped).
    pub applied_ms: Millis,
    /// Whether the cap cut the absence short.
    pub capped: bool,
    /// Share of production credited.
    pub efficiency: f64,
    /// Resource change applied by production.
    pub gains: BTreeMap<ResourceKind, f64>,
    /// Voyage completed while away.
    pub arrival: Option<Arrival>,
    /// Progress of a voyage still under way.
    pub travel_progress: Option<f64>,
    /// Missions resolved while away, in launch order.
    pub missions: Vec<MissionReport>,
    /// Derelicts that drifted away.
    pub derelicts_expired: Vec<DerelictId>,
    /// Contracts whose deadline passed.
    pub contracts_expired: Vec<ContractId>,
}

impl OfflineReport {
    /// Missions that succeeded while away.
    #[must_use]
    pub fn missions_succeeded(&self) -> usize {
        self.missions.iter().filter(|m| m.succeeded()).count()
    }

    /// Missions that failed while away.
    #[must_use]
    pub fn missions_failed(&self) -> usize {
        self.missions.len() - self.missions_succeeded()
    }

    /// Net production of `kind` while away.
    #[must_use]
    pub fn gain(&self, kind: ResourceKind) -> f64 {
        self.gains.get(&kind).copied().unwrap_or(0.0)
    }
}

/// Share of production credited while away:
/// `base * multiplier + additive`, clamped to `[0, 1]`.
#[must_use]
pub fn efficiency(state: &GameState, config: &EngineConfig) -> f64 {
    let agg = state
        .modifiers
        .aggregate(targets::OFFLINE_EFFICIENCY, &state.units);
    agg.apply(config.offline_efficiency).clamp(0.0, 1.0)
}

/// Catch `state` up to `now`. Returns `None` (and changes nothing) when the
/// absence is below the offline threshold.
pub fn catch_up(
    state: &mut GameState,
    data: &GameData,
    config: &EngineConfig,
    rng: &mut dyn RandomSource,
    now: Millis,
) -> Option<OfflineReport> {
    let away_ms = now.saturating_sub(state.last_known_timestamp);
    if away_ms < config.offline_min_ms() {
        return None;
    }
    let applied_ms = away_ms.min(config.max_offline_ms());
    let window_end = state.last_known_timestamp.saturating_add(applied_ms);
    let efficiency = efficiency(state, config);

    let arrival = travel::resolve_arrival(state, window_end);
    let travel_progress = state.travel.voyage.as_ref().map(|v| v.progress(window_end));

    let gains = production::advance(state, data, millis_to_secs(applied_ms) * efficiency);
    let missions = missions::resolve_due(state, data, rng, window_end);

    let derelicts_expired = state
        .derelicts
        .expire(window_end)
        .into_iter()
        .map(|d| d.id)
        .collect();
    let contracts_expired = state.contracts.expire(window_end);

    state.last_known_timestamp = now;
    state.last_spawn_check = now;

    let report = OfflineReport {
        away_ms,
        applied_ms,
        capped: applied_ms < away_ms,
        efficiency,
        gains,
        arrival,
        travel_progress,
        missions,
        derelicts_expired,
        contracts_expired,
    };
    tracing::info!(
        away_ms,
        applied_ms,
        efficiency,
        missions = report.missions.len(),
        metal = report.gain(ResourceKind::Metal),
        "Offline catch-up"
    );
    Some(report)
}
