//! Fleet travel between locations.
//!
//! The fleet is always either idle at a location or on one voyage. Fuel is
//! paid at departure; arrival happens on the first tick at or after the
//! arrival time and is applied at most once. Warp charges skip the voyage
//! entirely.

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, Millis};
use crate::data::GameData;
use crate::error::Rejection;
use crate::formulas::whole_units;
use crate::ids::LocationId;
use crate::modifiers::targets;
use crate::resources::{Cost, ResourceKind};
use crate::state::GameState;

/// A voyage in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voyage {
    /// Where the fleet left from.
    pub from: LocationId,
    /// Where the fleet is headed.
    pub to: LocationId,
    /// Departure time.
    pub departed_at: Millis,
    /// Arrival time.
    pub arrives_at: Millis,
    /// Fuel paid at departure.
    pub fuel_spent: f64,
}

impl Voyage {
    /// Share of the voyage completed at `now`, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now: Millis) -> f64 {
        let total = self.arrives_at.saturating_sub(self.departed_at);
        if total == 0 {
            return 1.0;
        }
        (now.saturating_sub(self.departed_at) as f64 / total as f64).clamp(0.0, 1.0)
    }
}

/// Fleet position and travel resources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Travel {
    /// Current location (the origin while a voyage is under way).
    pub location: LocationId,
    /// Voyage in progress, if any.
    pub voyage: Option<Voyage>,
    /// Instant-travel charges.
    pub warp_charges: u32,
}

impl Travel {
    /// Idle fleet at `location`.
    #[must_use]
    pub fn at(location: LocationId) -> Self {
        Self {
            location,
            voyage: None,
            warp_charges: 0,
        }
    }

    /// Whether a voyage is under way.
    #[must_use]
    pub fn is_traveling(&self) -> bool {
        self.voyage.is_some()
    }
}

/// A validated departure, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelPlan {
    /// Destination.
    pub destination: LocationId,
    /// Fuel to pay (zero for warps).
    pub fuel: f64,
    /// Voyage duration (zero for warps).
    pub duration_ms: Millis,
    /// Whether a warp charge is consumed.
    pub warp: bool,
}

/// Result of committing a travel plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Departure {
    /// Voyage started.
    Underway {
        /// Destination.
        destination: LocationId,
        /// Arrival time.
        arrives_at: Millis,
    },
    /// Warped; already at the destination.
    Warped {
        /// Destination.
        destination: LocationId,
    },
}

/// A completed voyage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    /// Where the fleet arrived.
    pub location: LocationId,
    /// When it arrived.
    pub at: Millis,
}

/// Validate a departure without changing anything.
pub fn plan_travel(
    state: &GameState,
    data: &GameData,
    destination: &LocationId,
    warp: bool,
) -> Result<TravelPlan, Rejection> {
    if state.travel.is_traveling() {
        return Err(Rejection::InTransit);
    }
    let location = data
        .location(destination)
        .ok_or_else(|| Rejection::UnknownLocation(destination.clone()))?;
    if &state.travel.location == destination {
        return Err(Rejection::AlreadyAtLocation(destination.clone()));
    }
    if let Some(missing) = location
        .requires
        .upgrades
        .iter()
        .find(|u| state.upgrade_level(u) == 0)
    {
        return Err(Rejection::LocationLocked {
            location: destination.clone(),
            missing: format!("upgrade {missing}"),
        });
    }
    if let Some(missing) = location
        .requires
        .colonies
        .iter()
        .find(|c| !state.colonies.contains(c))
    {
        return Err(Rejection::LocationLocked {
            location: destination.clone(),
            missing: format!("colony at {missing}"),
        });
    }

    if warp {
        if state.travel.warp_charges == 0 {
            return Err(Rejection::NoWarpCharges);
        }
        return Ok(TravelPlan {
            destination: destination.clone(),
            fuel: 0.0,
            duration_ms: 0,
            warp: true,
        });
    }

    let mods = &state.modifiers;
    let fuel = whole_units(location.travel_fuel * mods.value(targets::TRAVEL_FUEL_COST, &state.units));
    state.ledger.can_afford(&Cost::single(ResourceKind::Fuel, fuel))?;
    let speed = mods.value(targets::TRAVEL_SPEED, &state.units).max(0.01);
    let secs = location.travel_secs * mods.value(targets::TRAVEL_TIME, &state.units) / speed;
    Ok(TravelPlan {
        destination: destination.clone(),
        fuel,
        duration_ms: secs_to_millis(secs),
        warp: false,
    })
}

/// Commit a validated plan at `now`.
pub fn depart(state: &mut GameState, plan: TravelPlan, now: Millis) -> Result<Departure, Rejection> {
    if plan.warp {
        state.travel.warp_charges = state
            .travel
            .warp_charges
            .checked_sub(1)
            .ok_or(Rejection::NoWarpCharges)?;
        tracing::info!(destination = %plan.destination, "Warped");
        state.travel.location = plan.destination.clone();
        return Ok(Departure::Warped {
            destination: plan.destination,
        });
    }
    state
        .ledger
        .spend(&Cost::single(ResourceKind::Fuel, plan.fuel))?;
    let arrives_at = now.saturating_add(plan.duration_ms);
    tracing::info!(
        from = %state.travel.location,
        to = %plan.destination,
        fuel = plan.fuel,
        arrives_at,
        "Voyage started"
    );
    state.travel.voyage = Some(Voyage {
        from: state.travel.location.clone(),
        to: plan.destination.clone(),
        departed_at: now,
        arrives_at,
        fuel_spent: plan.fuel,
    });
    Ok(Departure::Underway {
        destination: plan.destination,
        arrives_at,
    })
}

/// Complete the voyage if it is due. Returns `None` when nothing happened,
/// so calling this twice for one voyage is harmless.
pub fn resolve_arrival(state: &mut GameState, now: Millis) -> Option<Arrival> {
    let due = state
        .travel
        .voyage
        .as_ref()
        .is_some_and(|v| now >= v.arrives_at);
    if !due {
        return None;
    }
    let voyage = state.travel.voyage.take()?;
    tracing::info!(location = %voyage.to, "Arrived");
    state.travel.location = voyage.to.clone();
    Some(Arrival {
        location: voyage.to,
        at: voyage.arrives_at,
    })
}

/// Abort the voyage; the fleet stays at its origin and `refund_share` of the
/// fuel comes back. Returns the fuel credited.
pub fn cancel(state: &mut GameState, refund_share: f64) -> Result<f64, Rejection> {
    let voyage = state.travel.voyage.take().ok_or(Rejection::NotTraveling)?;
    let refund = voyage.fuel_spent * refund_share.clamp(0.0, 1.0);
    let credited = state.ledger.deposit(ResourceKind::Fuel, refund);
    tracing::info!(to = %voyage.to, refund = credited, "Voyage cancelled");
    Ok(credited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::modifiers::{Effect, ModifierSource};

    fn setup() -> (GameData, GameState) {
        let data = GameData::standard();
        let state = GameState::new(&data, &EngineConfig::default(), 0);
        (data, state)
    }

    #[test]
    fn test_travel_to_luna() {
        let (data, mut state) = setup();
        let plan = plan_travel(&state, &data, &"luna".into(), false).unwrap();
        assert_eq!(plan.fuel, 100.0);
        assert_eq!(plan.duration_ms, 60_000);
        let departure = depart(&mut state, plan, 1_000).unwrap();
        assert_eq!(
            departure,
            Departure::Underway {
                destination: "luna".into(),
                arrives_at: 61_000
            }
        );
        assert_eq!(state.ledger.amount(ResourceKind::Fuel), 0.0);
        assert!(state.travel.is_traveling());
        assert_eq!(state.travel.location, LocationId::from("earth_orbit"));
    }

    #[test]
    fn test_formation_adjusts_fuel_and_speed() {
        let (data, mut state) = setup();
        state.modifiers.unlock(
            ModifierSource::Formation,
            [
                Effect::multiplier(targets::TRAVEL_FUEL_COST, 0.8),
                Effect::additive(targets::TRAVEL_SPEED, 0.5),
            ],
        );
        let plan = plan_travel(&state, &data, &"luna".into(), false).unwrap();
        assert_eq!(plan.fuel, 80.0);
        assert_eq!(plan.duration_ms, 40_000);
    }

    #[test]
    fn test_cannot_travel_while_traveling() {
        let (data, mut state) = setup();
        let plan = plan_travel(&state, &data, &"luna".into(), false).unwrap();
        depart(&mut state, plan, 0).unwrap();
        assert_eq!(
            plan_travel(&state, &data, &"earth_orbit".into(), false),
            Err(Rejection::InTransit)
        );
    }

    #[test]
    fn test_locked_and_unknown_destinations() {
        let (data, state) = setup();
        assert!(matches!(
            plan_travel(&state, &data, &"mars".into(), false),
            Err(Rejection::LocationLocked { .. })
        ));
        assert_eq!(
            plan_travel(&state, &data, &"pluto".into(), false),
            Err(Rejection::UnknownLocation("pluto".into()))
        );
        assert_eq!(
            plan_travel(&state, &data, &"earth_orbit".into(), false),
            Err(Rejection::AlreadyAtLocation("earth_orbit".into()))
        );
    }

    #[test]
    fn test_insufficient_fuel_rejected_without_change() {
        let (data, mut state) = setup();
        state.ledger.set_amount(ResourceKind::Fuel, 10.0);
        let before = state.clone();
        assert!(matches!(
            plan_travel(&state, &data, &"luna".into(), false),
            Err(Rejection::InsufficientResources { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_arrival_applied_once() {
        let (data, mut state) = setup();
        let plan = plan_travel(&state, &data, &"luna".into(), false).unwrap();
        depart(&mut state, plan, 0).unwrap();
        assert!(resolve_arrival(&mut state, 59_999).is_none());
        let arrival = resolve_arrival(&mut state, 60_000).unwrap();
        assert_eq!(arrival.location, LocationId::from("luna"));
        assert!(resolve_arrival(&mut state, 60_100).is_none());
        assert_eq!(state.travel.location, LocationId::from("luna"));
    }

    #[test]
    fn test_cancel_refunds_share() {
        let (data, mut state) = setup();
        let plan = plan_travel(&state, &data, &"luna".into(), false).unwrap();
        depart(&mut state, plan, 0).unwrap();
        assert_eq!(cancel(&mut state, 0.5).unwrap(), 50.0);
        assert!(!state.travel.is_traveling());
        assert_eq!(state.travel.location, LocationId::from("earth_orbit"));
        assert_eq!(cancel(&mut state, 0.5), Err(Rejection::NotTraveling));
    }

    #[test]
    fn test_warp_consumes_charge() {
        let (data, mut state) = setup();
        assert_eq!(
            plan_travel(&state, &data, &"luna".into(), true),
            Err(Rejection::NoWarpCharges)
        );
        state.travel.warp_charges = 1;
        let plan = plan_travel(&state, &data, &"luna".into(), true).unwrap();
        let departure = depart(&mut state, plan, 0).unwrap();
        assert!(matches!(departure, Departure::Warped { .. }));
        assert_eq!(state.travel.warp_charges, 0);
        assert_eq!(state.travel.location, LocationId::from("luna"));
        assert_eq!(state.ledger.amount(ResourceKind::Fuel), 100.0);
    }

    #[test]
    fn test_voyage_progress() {
        let voyage = Voyage {
            from: "a".into(),
            to: "b".into(),
            departed_at: 1_000,
            arrives_at: 3_000,
            fuel_spent: 0.0,
        };
        assert_eq!(voyage.progress(0), 0.0);
        assert_eq!(voyage.progress(2_000), 0.5);
        assert_eq!(voyage.progress(5_000), 1.0);
    }
}
