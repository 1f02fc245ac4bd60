//! Timed missions: scouting, salvage and colonization.
//!
//! A mission occupies one slot of a unit kind from launch to resolution.
//! Its cost and duration are fixed at launch; its success probability is
//! computed when it resolves. Resolution removes the mission from the board
//! before applying any payout, so a mission can never resolve twice.
//!
//! # Resolution
//!
//! 1. Look up everything the payout needs. A missing entry fails the mission
//!    instead of aborting the tick.
//! 2. Roll success (skipped for guaranteed actions).
//! 3. Apply the payout: a discovered derelict, salvage rewards, or a colony.
//! 4. On failure, refund part of the launch fuel and release any derelict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, Millis};
use crate::colonies::{self, Colony};
use crate::data::{ActionData, GameData, MissionAction, MissionKind};
use crate::derelicts;
use crate::error::{Rejection, ResolutionError};
use crate::formulas::whole_units;
use crate::ids::{DerelictId, DerelictKind, LocationId, MissionId, UnitKind};
use crate::modifiers::{targets, ModifierSource};
use crate::resources::{Cost, ResourceKind};
use crate::rng::RandomSource;
use crate::state::GameState;

/// What a mission is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionTarget {
    /// A location (scouting, colonization).
    Location(LocationId),
    /// A derelict (salvage).
    Derelict(DerelictId),
}

/// A mission in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Identifier.
    pub id: MissionId,
    /// Kind.
    pub kind: MissionKind,
    /// Unit kind occupying a slot.
    pub unit: UnitKind,
    /// Approach.
    pub action: MissionAction,
    /// Where the mission takes place.
    pub location: LocationId,
    /// Salvage target.
    pub derelict: Option<DerelictId>,
    /// Launch time.
    pub started_at: Millis,
    /// Resolution time.
    pub ends_at: Millis,
    /// Fuel paid at launch.
    pub fuel_spent: f64,
}

impl Mission {
    /// Share of the mission completed at `now`, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now: Millis) -> f64 {
        let total = self.ends_at.saturating_sub(self.started_at);
        if total == 0 {
            return 1.0;
        }
        (now.saturating_sub(self.started_at) as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Whether the mission should resolve at `now`.
    #[must_use]
    pub const fn is_due(&self, now: Millis) -> bool {
        now >= self.ends_at
    }
}

/// Missions in flight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionBoard {
    missions: BTreeMap<MissionId, Mission>,
    next_id: u64,
}

impl MissionBoard {
    /// Mission by id.
    #[must_use]
    pub fn get(&self, id: MissionId) -> Option<&Mission> {
        self.missions.get(&id)
    }

    /// Number of missions in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.missions.len()
    }

    /// True when nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    /// Slots of `unit` currently in use.
    #[must_use]
    pub fn busy_count(&self, unit: &UnitKind) -> u64 {
        self.missions.values().filter(|m| &m.unit == unit).count() as u64
    }

    /// Missions of `kind` in flight.
    #[must_use]
    pub fn in_flight(&self, kind: MissionKind) -> usize {
        self.missions.values().filter(|m| m.kind == kind).count()
    }

    /// Whether a colony mission to `location` is in flight.
    #[must_use]
    pub fn colony_pending(&self, location: &LocationId) -> bool {
        self.missions
            .values()
            .any(|m| m.kind == MissionKind::Colony && &m.location == location)
    }

    /// Ids of missions due at `now`, in launch order.
    #[must_use]
    pub fn due(&self, now: Millis) -> Vec<MissionId> {
        let mut due: Vec<&Mission> = self.missions.values().filter(|m| m.is_due(now)).collect();
        due.sort_by_key(|m| (m.started_at, m.id));
        due.into_iter().map(|m| m.id).collect()
    }

    fn insert(&mut self, mut mission: Mission) -> MissionId {
        self.next_id += 1;
        let id = MissionId::new(self.next_id);
        mission.id = id;
        self.missions.insert(id, mission);
        id
    }

    fn remove(&mut self, id: MissionId) -> Option<Mission> {
        self.missions.remove(&id)
    }
}

/// A player's (or automation's) request to launch a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionRequest {
    /// Kind.
    pub kind: MissionKind,
    /// Unit kind to send.
    pub unit: UnitKind,
    /// Target.
    pub target: MissionTarget,
    /// Approach.
    #[serde(default)]
    pub action: MissionAction,
}

/// A validated launch, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionPlan {
    /// The request this plan validates.
    pub request: MissionRequest,
    /// Where the mission takes place.
    pub location: LocationId,
    /// Salvage target.
    pub derelict: Option<DerelictId>,
    /// Everything paid at launch (fuel plus action surcharge).
    pub cost: Cost,
    /// Fuel part of the cost.
    pub fuel: f64,
    /// Fixed duration.
    pub duration_ms: Millis,
}

/// What a successful mission produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payout {
    /// Scouting found (or failed to place) a derelict.
    Discovery {
        /// Where the search landed.
        location: LocationId,
        /// The new derelict, if any type may appear there.
        derelict: Option<DerelictId>,
    },
    /// Salvage rewards credited.
    Salvage {
        /// Type that was stripped.
        derelict: DerelictKind,
        /// Amounts actually credited.
        rewards: Cost,
    },
    /// A colony was founded.
    Colony {
        /// Where.
        location: LocationId,
    },
}

/// Why a mission failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The success roll missed.
    Roll {
        /// Probability that was needed.
        chance: f64,
        /// Draw that missed it.
        draw: f64,
    },
    /// Something the mission depended on was missing.
    Lookup(String),
}

/// Final state of a resolved mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    /// It worked.
    Succeeded(Payout),
    /// It did not.
    Failed(FailureReason),
}

/// Everything that happened when a mission resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    /// The mission as it was in flight.
    pub mission: Mission,
    /// Result.
    pub outcome: MissionOutcome,
    /// Fuel refunded on failure.
    pub refund: f64,
}

impl MissionReport {
    /// Whether the mission succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, MissionOutcome::Succeeded(_))
    }
}

/// Mission slots `unit` provides: one per owned unit, two with dual missions.
#[must_use]
pub fn mission_capacity(state: &GameState, unit: &UnitKind) -> u64 {
    let per_unit = if state.modifiers.has_capability(targets::DUAL_MISSIONS) {
        2
    } else {
        1
    };
    state.units.count(unit).saturating_mul(per_unit)
}

/// Validate a launch without changing anything.
pub fn plan_mission(
    state: &GameState,
    data: &GameData,
    request: &MissionRequest,
) -> Result<MissionPlan, Rejection> {
    if state.travel.is_traveling() {
        return Err(Rejection::InTransit);
    }
    let unit = data
        .unit(&request.unit)
        .ok_or_else(|| Rejection::UnknownUnit(request.unit.clone()))?;
    if !unit.can_perform(request.kind) {
        return Err(Rejection::UnitCannotPerform {
            unit: request.unit.clone(),
            kind: request.kind,
        });
    }
    let capacity = mission_capacity(state, &request.unit);
    let busy = state.missions.busy_count(&request.unit);
    if busy >= capacity {
        return Err(Rejection::NoUnitAvailable {
            unit: request.unit.clone(),
            busy,
            capacity,
        });
    }
    let kind_data = data
        .mission_kind(request.kind)
        .ok_or(Rejection::UnknownMissionKind(request.kind))?;
    let action = data
        .action(request.action)
        .ok_or(Rejection::UnknownAction(request.action))?;

    let here = &state.travel.location;
    let (location, derelict, base_secs) = match (request.kind, &request.target) {
        (MissionKind::Salvage, MissionTarget::Derelict(id)) => {
            let derelict = state
                .derelicts
                .get(*id)
                .ok_or(Rejection::UnknownDerelict(*id))?;
            if derelict.claimed_by.is_some() {
                return Err(Rejection::DerelictClaimed(*id));
            }
            if &derelict.location != here {
                return Err(Rejection::WrongLocation {
                    target: derelict.location.clone(),
                    current: here.clone(),
                });
            }
            let info = data
                .derelict(&derelict.kind)
                .ok_or_else(|| Rejection::UnknownDerelictKind(derelict.kind.clone()))?;
            (here.clone(), Some(*id), info.salvage_secs)
        }
        (MissionKind::Scout | MissionKind::Colony, MissionTarget::Location(target)) => {
            let info = data
                .location(target)
                .ok_or_else(|| Rejection::UnknownLocation(target.clone()))?;
            if target != here {
                return Err(Rejection::WrongLocation {
                    target: target.clone(),
                    current: here.clone(),
                });
            }
            if request.kind == MissionKind::Colony {
                if !info.colonizable {
                    return Err(Rejection::NotColonizable(target.clone()));
                }
                if state.colonies.contains(target) {
                    return Err(Rejection::ColonyExists(target.clone()));
                }
                if state.missions.colony_pending(target) {
                    return Err(Rejection::ColonyPending(target.clone()));
                }
            }
            (target.clone(), None, kind_data.base_secs)
        }
        (MissionKind::Salvage, MissionTarget::Location(_)) => {
            return Err(Rejection::InvalidTarget(
                "salvage missions target a derelict".to_string(),
            ))
        }
        (_, MissionTarget::Derelict(_)) => {
            return Err(Rejection::InvalidTarget(
                "only salvage missions target a derelict".to_string(),
            ))
        }
    };

    let mods = &state.modifiers;
    let units = &state.units;
    let fuel = whole_units(kind_data.fuel_cost * mods.value(targets::MISSION_FUEL_COST, units));
    let mut cost = Cost::single(ResourceKind::Fuel, fuel);
    cost.merge(&action.extra_cost);
    state.ledger.can_afford(&cost)?;

    let secs = base_secs
        * mods.value(&targets::mission_time(request.kind), units)
        * mods.value(targets::MISSION_TIME, units)
        * action.duration_multiplier;

    Ok(MissionPlan {
        request: request.clone(),
        location,
        derelict,
        cost,
        fuel,
        duration_ms: secs_to_millis(secs),
    })
}

/// Commit a validated plan at `now`: pay, claim the target, start the clock.
pub fn launch(state: &mut GameState, plan: MissionPlan, now: Millis) -> Result<MissionId, Rejection> {
    state.ledger.spend(&plan.cost)?;
    let id = state.missions.insert(Mission {
        id: MissionId::default(),
        kind: plan.request.kind,
        unit: plan.request.unit.clone(),
        action: plan.request.action,
        location: plan.location,
        derelict: plan.derelict,
        started_at: now,
        ends_at: now.saturating_add(plan.duration_ms),
        fuel_spent: plan.fuel,
    });
    if let Some(derelict) = plan.derelict {
        state.derelicts.claim(derelict, id);
    }
    tracing::info!(
        mission = %id,
        kind = ?plan.request.kind,
        unit = %plan.request.unit,
        duration_ms = plan.duration_ms,
        "Mission launched"
    );
    Ok(id)
}

/// Success probability of `mission` under the current modifiers.
///
/// `(base + kind additive + generic additive + action bonus)` times the kind
/// and generic multipliers, clamped to `[0, 1]`.
pub fn success_chance(
    state: &GameState,
    data: &GameData,
    mission: &Mission,
) -> Result<f64, ResolutionError> {
    let base = match mission.kind {
        MissionKind::Scout => {
            data.location(&mission.location)
                .ok_or_else(|| ResolutionError::MissingLocation(mission.location.clone()))?
                .scout_success
        }
        MissionKind::Colony => {
            data.location(&mission.location)
                .ok_or_else(|| ResolutionError::MissingLocation(mission.location.clone()))?
                .colony_success
        }
        MissionKind::Salvage => {
            let id = mission.derelict.ok_or(ResolutionError::NoTarget)?;
            let derelict = state
                .derelicts
                .get(id)
                .ok_or(ResolutionError::MissingDerelict(id))?;
            data.derelict(&derelict.kind)
                .ok_or_else(|| ResolutionError::MissingDerelictKind(derelict.kind.clone()))?
                .salvage_success
        }
    };
    let action = data
        .action(mission.action)
        .ok_or(ResolutionError::MissingAction(mission.action))?;
    let specific = state
        .modifiers
        .aggregate(&targets::mission_success(mission.kind), &state.units);
    let generic = state
        .modifiers
        .aggregate(targets::MISSION_SUCCESS, &state.units);
    let chance = (base + specific.additive + generic.additive + action.success_bonus)
        * specific.multiplier
        * generic.multiplier;
    Ok(chance.clamp(0.0, 1.0))
}

/// Resolve mission `id` if it is due at `now`.
///
/// Returns `None` if the mission does not exist (already resolved or
/// cancelled) or is not yet due.
pub fn resolve(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    id: MissionId,
    now: Millis,
) -> Option<MissionReport> {
    if !state.missions.get(id).is_some_and(|m| m.is_due(now)) {
        return None;
    }
    let mission = state.missions.remove(id)?;

    let outcome = match settle(state, data, rng, &mission) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(mission = %id, error = %err, "Mission could not be settled");
            MissionOutcome::Failed(FailureReason::Lookup(err.to_string()))
        }
    };

    let mut refund = 0.0;
    if let MissionOutcome::Failed(_) = &outcome {
        if let Some(derelict) = mission.derelict {
            state.derelicts.release(derelict, id);
        }
        let share = data.unit(&mission.unit).map_or(0.0, |u| u.abort_refund)
            + state
                .modifiers
                .aggregate(targets::ABORT_REFUND, &state.units)
                .additive;
        refund = state
            .ledger
            .deposit(ResourceKind::Fuel, mission.fuel_spent * share.clamp(0.0, 1.0));
        state.run.current.missions_failed += 1;
    } else {
        state.run.current.missions_succeeded += 1;
    }

    tracing::info!(
        mission = %id,
        kind = ?mission.kind,
        success = matches!(outcome, MissionOutcome::Succeeded(_)),
        "Mission resolved"
    );
    Some(MissionReport {
        mission,
        outcome,
        refund,
    })
}

/// Resolve every mission due at `now`, in launch order.
pub fn resolve_due(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    now: Millis,
) -> Vec<MissionReport> {
    state
        .missions
        .due(now)
        .into_iter()
        .filter_map(|id| resolve(state, data, rng, id, now))
        .collect()
}

/// Recall a mission early. The slot frees immediately, any derelict is
/// released, and `refund_share` of the launch fuel comes back.
pub fn cancel(state: &mut GameState, id: MissionId, refund_share: f64) -> Result<f64, Rejection> {
    let mission = state
        .missions
        .remove(id)
        .ok_or(Rejection::UnknownMission(id))?;
    if let Some(derelict) = mission.derelict {
        state.derelicts.release(derelict, id);
    }
    let refund = state.ledger.deposit(
        ResourceKind::Fuel,
        mission.fuel_spent * refund_share.clamp(0.0, 1.0),
    );
    tracing::info!(mission = %id, refund, "Mission cancelled");
    Ok(refund)
}

fn settle(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    mission: &Mission,
) -> Result<MissionOutcome, ResolutionError> {
    data.unit(&mission.unit)
        .ok_or_else(|| ResolutionError::MissingUnit(mission.unit.clone()))?;
    let action = data
        .action(mission.action)
        .ok_or(ResolutionError::MissingAction(mission.action))?;
    let chance = success_chance(state, data, mission)?;
    if !action.guaranteed {
        let draw = rng.next_f64();
        if draw >= chance {
            return Ok(MissionOutcome::Failed(FailureReason::Roll { chance, draw }));
        }
    }
    let payout = match mission.kind {
        MissionKind::Scout => discover(state, data, rng, mission)?,
        MissionKind::Salvage => salvage(state, data, rng, mission, action)?,
        MissionKind::Colony => colonize(state, data, mission)?,
    };
    Ok(MissionOutcome::Succeeded(payout))
}

fn discover(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    mission: &Mission,
) -> Result<Payout, ResolutionError> {
    let origin = data
        .location(&mission.location)
        .ok_or_else(|| ResolutionError::MissingLocation(mission.location.clone()))?;
    let mut candidates = vec![origin.id.clone()];
    if state.modifiers.has_capability(targets::ADJACENT_DISCOVERY) {
        candidates.extend(origin.neighbors.iter().cloned());
    }
    let index = if candidates.len() > 1 {
        rng.pick_index(candidates.len()).unwrap_or(0)
    } else {
        0
    };
    let location = candidates.swap_remove(index);
    let derelict = derelicts::spawn_at(state, data, rng, &location, mission.ends_at);
    Ok(Payout::Discovery { location, derelict })
}

/// Combined salvage multiplier: action, formation, unit upgrades, alien tech.
fn salvage_multiplier(state: &GameState, action: &ActionData) -> f64 {
    [
        ModifierSource::Formation,
        ModifierSource::UnitUpgrades,
        ModifierSource::AlienTech,
    ]
    .into_iter()
    .map(|source| {
        state
            .modifiers
            .aggregate_from(source, targets::SALVAGE_REWARD, &state.units)
            .value()
    })
    .fold(action.reward_multiplier, |acc, m| acc * m)
}

fn salvage(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    mission: &Mission,
    action: &ActionData,
) -> Result<Payout, ResolutionError> {
    let id = mission.derelict.ok_or(ResolutionError::NoTarget)?;
    let kind = state
        .derelicts
        .get(id)
        .ok_or(ResolutionError::MissingDerelict(id))?
        .kind
        .clone();
    let info = data
        .derelict(&kind)
        .ok_or_else(|| ResolutionError::MissingDerelictKind(kind.clone()))?;

    let multiplier = salvage_multiplier(state, action);
    let mut rewards = Cost::new();
    for line in &info.rewards {
        if line.chance >= 1.0 || rng.chance(line.chance) {
            rewards.add(line.resource, whole_units(line.amount * multiplier));
        }
    }

    state.derelicts.remove(id);
    let credited = state.ledger.deposit_all(&rewards);
    state.record_earned(&credited);
    state.run.current.derelicts_salvaged += 1;
    Ok(Payout::Salvage {
        derelict: kind,
        rewards: credited,
    })
}

fn colonize(
    state: &mut GameState,
    data: &GameData,
    mission: &Mission,
) -> Result<Payout, ResolutionError> {
    let location = data
        .location(&mission.location)
        .ok_or_else(|| ResolutionError::MissingLocation(mission.location.clone()))?;
    let colony = Colony {
        location: location.id.clone(),
        established_at: mission.ends_at,
        production_bonus: location.colony_bonus,
    };
    if !colonies::establish(state, colony) {
        return Err(ResolutionError::ColonyExists(location.id.clone()));
    }
    Ok(Payout::Colony {
        location: location.id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::Rarity;
    use crate::modifiers::Effect;
    use crate::rng::ScriptedRandom;

    fn setup() -> (GameData, GameState) {
        let data = GameData::standard();
        let mut state = GameState::new(&data, &EngineConfig::default(), 0);
        state.units.add(&"scout_ship".into(), 1);
        state.units.add(&"salvage_ship".into(), 1);
        state.ledger.set_amount(ResourceKind::Fuel, 500.0);
        (data, state)
    }

    fn scout_request() -> MissionRequest {
        MissionRequest {
            kind: MissionKind::Scout,
            unit: "scout_ship".into(),
            target: MissionTarget::Location("earth_orbit".into()),
            action: MissionAction::Standard,
        }
    }

    fn place_derelict(state: &mut GameState) -> DerelictId {
        let here = state.travel.location.clone();
        state
            .derelicts
            .insert("debris_field".into(), Rarity::Common, here, 0, 600_000)
    }

    fn salvage_request(id: DerelictId, action: MissionAction) -> MissionRequest {
        MissionRequest {
            kind: MissionKind::Salvage,
            unit: "salvage_ship".into(),
            target: MissionTarget::Derelict(id),
            action,
        }
    }

    #[test]
    fn test_launch_pays_and_fixes_duration() {
        let (data, mut state) = setup();
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        assert_eq!(plan.fuel, 10.0);
        assert_eq!(plan.duration_ms, 45_000);
        let id = launch(&mut state, plan, 1_000).unwrap();
        let mission = state.missions.get(id).unwrap();
        assert_eq!(mission.ends_at, 46_000);
        assert_eq!(state.ledger.amount(ResourceKind::Fuel), 490.0);
    }

    #[test]
    fn test_slot_exhaustion() {
        let (data, mut state) = setup();
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        launch(&mut state, plan, 0).unwrap();
        assert!(matches!(
            plan_mission(&state, &data, &scout_request()),
            Err(Rejection::NoUnitAvailable {
                busy: 1,
                capacity: 1,
                ..
            })
        ));
        state
            .modifiers
            .unlock(ModifierSource::Tech, [Effect::capability(targets::DUAL_MISSIONS)]);
        assert!(plan_mission(&state, &data, &scout_request()).is_ok());
    }

    #[test]
    fn test_wrong_unit_and_wrong_target() {
        let (data, state) = setup();
        let mut request = scout_request();
        request.unit = "salvage_ship".into();
        assert!(matches!(
            plan_mission(&state, &data, &request),
            Err(Rejection::UnitCannotPerform { .. })
        ));
        let mut request = scout_request();
        request.target = MissionTarget::Location("luna".into());
        assert!(matches!(
            plan_mission(&state, &data, &request),
            Err(Rejection::WrongLocation { .. })
        ));
    }

    #[test]
    fn test_no_missions_while_traveling() {
        let (data, mut state) = setup();
        let plan = crate::travel::plan_travel(&state, &data, &"luna".into(), false).unwrap();
        crate::travel::depart(&mut state, plan, 0).unwrap();
        assert_eq!(
            plan_mission(&state, &data, &scout_request()),
            Err(Rejection::InTransit)
        );
    }

    #[test]
    fn test_scout_success_spawns_derelict_at_target() {
        let (mut data, mut state) = setup();
        data.locations[0].scout_success = 0.15;
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mut rng = ScriptedRandom::new([0.10, 0.0, 0.0]);
        let report = resolve(&mut state, &data, &mut rng, id, 45_000).unwrap();
        assert!(report.succeeded());
        assert_eq!(state.derelicts.len(), 1);
        let derelict = state.derelicts.iter().next().unwrap();
        assert_eq!(derelict.location, LocationId::from("earth_orbit"));
        assert_eq!(derelict.spawned_at, 45_000);
    }

    #[test]
    fn test_scout_failure_refunds_fuel_share() {
        let (mut data, mut state) = setup();
        data.locations[0].scout_success = 0.15;
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mut rng = ScriptedRandom::new([0.15]);
        let report = resolve(&mut state, &data, &mut rng, id, 45_000).unwrap();
        assert!(!report.succeeded());
        // scout ships return a quarter of the 10 fuel
        assert_eq!(report.refund, 2.5);
        assert!(state.derelicts.is_empty());
    }

    #[test]
    fn test_resolution_is_exactly_once() {
        let (data, mut state) = setup();
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mut rng = ScriptedRandom::constant(0.0);
        assert!(resolve(&mut state, &data, &mut rng, id, 44_999).is_none());
        assert!(resolve(&mut state, &data, &mut rng, id, 45_000).is_some());
        assert!(resolve(&mut state, &data, &mut rng, id, 45_000).is_none());
        assert_eq!(state.derelicts.len(), 1);
        assert_eq!(state.run.current.missions_succeeded, 1);
    }

    #[test]
    fn test_salvage_claims_and_pays() {
        let (data, mut state) = setup();
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Standard)).unwrap();
        assert_eq!(plan.duration_ms, 30_000);
        let id = launch(&mut state, plan, 0).unwrap();
        assert_eq!(state.derelicts.get(derelict).unwrap().claimed_by, Some(id));
        assert_eq!(
            plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Standard)),
            Err(Rejection::NoUnitAvailable {
                unit: "salvage_ship".into(),
                busy: 1,
                capacity: 1
            })
        );

        let metal_before = state.ledger.amount(ResourceKind::Metal);
        // success, crystal line misses
        let mut rng = ScriptedRandom::new([0.0, 0.9]);
        let report = resolve(&mut state, &data, &mut rng, id, 30_000).unwrap();
        match report.outcome {
            MissionOutcome::Succeeded(Payout::Salvage { rewards, .. }) => {
                assert_eq!(rewards.get(ResourceKind::Metal), 200.0);
                assert_eq!(rewards.get(ResourceKind::Crystal), 0.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(state.ledger.amount(ResourceKind::Metal), metal_before + 200.0);
        assert!(state.derelicts.get(derelict).is_none());
    }

    #[test]
    fn test_salvage_reward_cascade() {
        let (data, mut state) = setup();
        state
            .modifiers
            .unlock(ModifierSource::Formation, [Effect::multiplier(targets::SALVAGE_REWARD, 1.2)]);
        state.modifiers.unlock(
            ModifierSource::UnitUpgrades,
            [Effect::multiplier(targets::SALVAGE_REWARD, 1.25)],
        );
        state
            .modifiers
            .unlock(ModifierSource::AlienTech, [Effect::multiplier(targets::SALVAGE_REWARD, 1.5)]);
        state.ledger.set_amount(ResourceKind::Crystal, 100.0);
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Thorough)).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        assert_eq!(state.ledger.amount(ResourceKind::Crystal), 50.0);
        let mut rng = ScriptedRandom::new([0.0, 0.9]);
        let report = resolve(&mut state, &data, &mut rng, id, 100_000).unwrap();
        // 200 * 1.5 (thorough) * 1.2 * 1.25 * 1.5 = 675
        match report.outcome {
            MissionOutcome::Succeeded(Payout::Salvage { rewards, .. }) => {
                assert_eq!(rewards.get(ResourceKind::Metal), 675.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_failed_salvage_releases_derelict() {
        let (data, mut state) = setup();
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Standard)).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mut rng = ScriptedRandom::new([0.95]);
        let report = resolve(&mut state, &data, &mut rng, id, 30_000).unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.refund, 10.0);
        assert_eq!(state.derelicts.get(derelict).unwrap().claimed_by, None);
    }

    #[test]
    fn test_guaranteed_skips_roll() {
        let (mut data, mut state) = setup();
        data.derelicts[0].salvage_success = 0.0;
        state.ledger.set_amount(ResourceKind::Artifacts, 1.0);
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Guaranteed)).unwrap();
        assert_eq!(plan.duration_ms, 60_000);
        let id = launch(&mut state, plan, 0).unwrap();
        let mut rng = ScriptedRandom::new([0.9]);
        let report = resolve(&mut state, &data, &mut rng, id, 60_000).unwrap();
        assert!(report.succeeded());
        assert_eq!(state.ledger.amount(ResourceKind::Artifacts), 0.0);
    }

    #[test]
    fn test_missing_content_counts_as_failure() {
        let (data, mut state) = setup();
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Standard)).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mut broken = data.clone();
        broken.derelicts.clear();
        let mut rng = ScriptedRandom::constant(0.0);
        let report = resolve(&mut state, &broken, &mut rng, id, 30_000).unwrap();
        assert!(matches!(
            report.outcome,
            MissionOutcome::Failed(FailureReason::Lookup(_))
        ));
        assert!(state.missions.is_empty());
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn test_success_chance_combines_modifiers() {
        let (data, mut state) = setup();
        state.modifiers.unlock(
            ModifierSource::Tech,
            [Effect::additive(targets::mission_success(MissionKind::Scout), 0.1)],
        );
        state
            .modifiers
            .unlock(ModifierSource::PrestigePerks, [Effect::multiplier(targets::MISSION_SUCCESS, 1.5)]);
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        let mission = state.missions.get(id).unwrap().clone();
        // (0.6 + 0.1) * 1.5 = 1.05 -> clamped
        assert_eq!(success_chance(&state, &data, &mission).unwrap(), 1.0);
    }

    #[test]
    fn test_cancel_frees_slot_and_derelict() {
        let (data, mut state) = setup();
        let derelict = place_derelict(&mut state);
        let plan = plan_mission(&state, &data, &salvage_request(derelict, MissionAction::Standard)).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        assert_eq!(cancel(&mut state, id, 0.5).unwrap(), 10.0);
        assert_eq!(state.derelicts.get(derelict).unwrap().claimed_by, None);
        assert_eq!(state.missions.busy_count(&"salvage_ship".into()), 0);
        assert_eq!(cancel(&mut state, id, 0.5), Err(Rejection::UnknownMission(id)));
    }

    #[test]
    fn test_colony_mission_founds_colony() {
        let (data, mut state) = setup();
        state.travel.location = "luna".into();
        state.units.add(&"colony_ship".into(), 1);
        let request = MissionRequest {
            kind: MissionKind::Colony,
            unit: "colony_ship".into(),
            target: MissionTarget::Location("luna".into()),
            action: MissionAction::Standard,
        };
        let plan = plan_mission(&state, &data, &request).unwrap();
        let id = launch(&mut state, plan, 0).unwrap();
        state.units.add(&"colony_ship".into(), 1);
        assert_eq!(
            plan_mission(&state, &data, &request),
            Err(Rejection::ColonyPending("luna".into()))
        );
        let mut rng = ScriptedRandom::new([0.0]);
        let report = resolve(&mut state, &data, &mut rng, id, 600_000).unwrap();
        assert!(report.succeeded());
        assert!(state.colonies.contains(&"luna".into()));
        assert_eq!(
            plan_mission(&state, &data, &request),
            Err(Rejection::ColonyExists("luna".into()))
        );
    }

    #[test]
    fn test_home_is_not_colonizable() {
        let (data, mut state) = setup();
        state.units.add(&"colony_ship".into(), 1);
        let request = MissionRequest {
            kind: MissionKind::Colony,
            unit: "colony_ship".into(),
            target: MissionTarget::Location("earth_orbit".into()),
            action: MissionAction::Standard,
        };
        assert_eq!(
            plan_mission(&state, &data, &request),
            Err(Rejection::NotColonizable("earth_orbit".into()))
        );
    }

    #[test]
    fn test_due_orders_by_launch() {
        let (data, mut state) = setup();
        state.units.add(&"scout_ship".into(), 1);
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let first = launch(&mut state, plan, 0).unwrap();
        let plan = plan_mission(&state, &data, &scout_request()).unwrap();
        let second = launch(&mut state, plan, 10).unwrap();
        assert_eq!(state.missions.due(100_000), vec![first, second]);
        assert!(state.missions.due(44_999).is_empty());
    }
}
