//! Derelict opportunities.
//!
//! Derelicts appear at locations (passively, or discovered by scouting),
//! wait for a salvage mission, and expire if nobody claims them in time.
//! A derelict claimed by a mission never expires; the mission resolves it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, Millis};
use crate::config::EngineConfig;
use crate::data::{DerelictData, GameData, Rarity};
use crate::ids::{DerelictId, DerelictKind, LocationId, MissionId};
use crate::modifiers::targets;
use crate::rng::RandomSource;
use crate::state::GameState;

/// A live derelict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derelict {
    /// Identifier.
    pub id: DerelictId,
    /// Type.
    pub kind: DerelictKind,
    /// Rarity band.
    pub rarity: Rarity,
    /// Where it drifts.
    pub location: LocationId,
    /// When it appeared.
    pub spawned_at: Millis,
    /// When it disappears if unclaimed.
    pub expires_at: Millis,
    /// Salvage mission working on it.
    pub claimed_by: Option<MissionId>,
}

/// Every live derelict.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerelictField {
    derelicts: BTreeMap<DerelictId, Derelict>,
    next_id: u64,
}

impl DerelictField {
    /// Derelict by id.
    #[must_use]
    pub fn get(&self, id: DerelictId) -> Option<&Derelict> {
        self.derelicts.get(&id)
    }

    /// Number of live derelicts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.derelicts.len()
    }

    /// True when no derelict is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.derelicts.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Derelict> {
        self.derelicts.values()
    }

    /// Unclaimed derelicts at `location`, in id order.
    pub fn available_at<'a>(&'a self, location: &'a LocationId) -> impl Iterator<Item = &'a Derelict> {
        self.derelicts
            .values()
            .filter(move |d| &d.location == location && d.claimed_by.is_none())
    }

    /// Add a derelict, assigning its id.
    pub fn insert(
        &mut self,
        kind: DerelictKind,
        rarity: Rarity,
        location: LocationId,
        spawned_at: Millis,
        lifetime_ms: Millis,
    ) -> DerelictId {
        self.next_id += 1;
        let id = DerelictId::new(self.next_id);
        self.derelicts.insert(
            id,
            Derelict {
                id,
                kind,
                rarity,
                location,
                spawned_at,
                expires_at: spawned_at.saturating_add(lifetime_ms),
                claimed_by: None,
            },
        );
        id
    }

    /// Remove a derelict.
    pub fn remove(&mut self, id: DerelictId) -> Option<Derelict> {
        self.derelicts.remove(&id)
    }

    /// Mark a derelict as being salvaged by `mission`.
    pub fn claim(&mut self, id: DerelictId, mission: MissionId) -> bool {
        match self.derelicts.get_mut(&id) {
            Some(derelict) if derelict.claimed_by.is_none() => {
                derelict.claimed_by = Some(mission);
                true
            }
            _ => false,
        }
    }

    /// Release a claim held by `mission`. Other claims are left alone.
    pub fn release(&mut self, id: DerelictId, mission: MissionId) {
        if let Some(derelict) = self.derelicts.get_mut(&id) {
            if derelict.claimed_by == Some(mission) {
                derelict.claimed_by = None;
            }
        }
    }

    /// Remove every unclaimed derelict whose time is up.
    pub fn expire(&mut self, now: Millis) -> Vec<Derelict> {
        let due: Vec<DerelictId> = self
            .derelicts
            .values()
            .filter(|d| d.claimed_by.is_none() && now >= d.expires_at)
            .map(|d| d.id)
            .collect();
        due.into_iter()
            .filter_map(|id| self.derelicts.remove(&id))
            .collect()
    }
}

/// Roll a derelict type for `location`: first a rarity band from the
/// location's weights, then a uniform pick among matching types.
///
/// If no type of the rolled band may appear there, the pick widens to every
/// type that may appear there.
pub fn roll_type<'a>(
    data: &'a GameData,
    location: &LocationId,
    rng: &mut dyn RandomSource,
) -> Option<&'a DerelictData> {
    let weights = data.location(location)?.rarity_weights;
    let rarity = Rarity::roll(&weights, rng.next_f64());
    let mut candidates: Vec<&DerelictData> = data
        .derelicts
        .iter()
        .filter(|d| d.rarity == rarity && d.appears_at(location))
        .collect();
    if candidates.is_empty() {
        candidates = data
            .derelicts
            .iter()
            .filter(|d| d.appears_at(location))
            .collect();
    }
    let index = rng.pick_index(candidates.len())?;
    Some(candidates[index])
}

/// Roll and place a derelict at `location`.
pub fn spawn_at(
    state: &mut GameState,
    data: &GameData,
    rng: &mut dyn RandomSource,
    location: &LocationId,
    now: Millis,
) -> Option<DerelictId> {
    let derelict = roll_type(data, location, rng)?;
    let id = state.derelicts.insert(
        derelict.kind.clone(),
        derelict.rarity,
        location.clone(),
        now,
        secs_to_millis(derelict.lifetime_secs),
    );
    tracing::info!(%id, kind = %derelict.kind, rarity = ?derelict.rarity, %location, "Derelict spawned");
    Some(id)
}

/// Periodic passive spawn check.
///
/// Runs at most once per spawn interval. Does nothing while the global
/// live-derelict cap is reached.
pub fn passive_spawn(
    state: &mut GameState,
    data: &GameData,
    config: &EngineConfig,
    rng: &mut dyn RandomSource,
    now: Millis,
) -> Option<DerelictId> {
    if now.saturating_sub(state.last_spawn_check) < config.spawn_check_interval_ms() {
        return None;
    }
    state.last_spawn_check = now;
    if state.derelicts.len() >= config.max_live_derelicts {
        return None;
    }
    let chance = config.spawn_chance * state.modifiers.value(targets::DERELICT_SPAWN_CHANCE, &state.units);
    if !rng.chance(chance) {
        return None;
    }
    let location = state.travel.location.clone();
    spawn_at(state, data, rng, &location, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;

    fn field() -> DerelictField {
        DerelictField::default()
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut f = field();
        let a = f.insert("debris_field".into(), Rarity::Common, "luna".into(), 0, 1_000);
        let b = f.insert("debris_field".into(), Rarity::Common, "luna".into(), 0, 1_000);
        assert!(a < b);
        assert_eq!(f.get(a).unwrap().expires_at, 1_000);
    }

    #[test]
    fn test_claimed_derelicts_never_expire() {
        let mut f = field();
        let a = f.insert("debris_field".into(), Rarity::Common, "luna".into(), 0, 1_000);
        let b = f.insert("debris_field".into(), Rarity::Common, "luna".into(), 0, 1_000);
        assert!(f.claim(a, MissionId::new(1)));
        assert!(!f.claim(a, MissionId::new(2)));
        let expired = f.expire(5_000);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, b);
        assert!(f.get(a).is_some());
    }

    #[test]
    fn test_release_only_by_owner() {
        let mut f = field();
        let a = f.insert("debris_field".into(), Rarity::Common, "luna".into(), 0, 1_000);
        f.claim(a, MissionId::new(1));
        f.release(a, MissionId::new(2));
        assert_eq!(f.get(a).unwrap().claimed_by, Some(MissionId::new(1)));
        f.release(a, MissionId::new(1));
        assert_eq!(f.get(a).unwrap().claimed_by, None);
    }

    #[test]
    fn test_available_at_filters_location_and_claims() {
        let mut f = field();
        let luna: LocationId = "luna".into();
        let a = f.insert("debris_field".into(), Rarity::Common, luna.clone(), 0, 1_000);
        f.insert("debris_field".into(), Rarity::Common, "mars".into(), 0, 1_000);
        let c = f.insert("debris_field".into(), Rarity::Common, luna.clone(), 0, 1_000);
        f.claim(c, MissionId::new(9));
        let ids: Vec<DerelictId> = f.available_at(&luna).map(|d| d.id).collect();
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn test_roll_type_respects_location() {
        let data = GameData::standard();
        // earth orbit, draw 0.0 => common band; pick index 0
        let mut rng = ScriptedRandom::new([0.0, 0.0]);
        let d = roll_type(&data, &"earth_orbit".into(), &mut rng).unwrap();
        assert_eq!(d.rarity, Rarity::Common);
        assert!(d.appears_at(&"earth_orbit".into()));
    }

    #[test]
    fn test_roll_type_falls_back_when_band_empty() {
        let mut data = GameData::standard();
        data.derelicts.retain(|d| d.rarity == Rarity::Common);
        // draw 0.99 at earth orbit => rare band, which now has no types
        let mut rng = ScriptedRandom::new([0.99, 0.0]);
        let d = roll_type(&data, &"earth_orbit".into(), &mut rng).unwrap();
        assert_eq!(d.rarity, Rarity::Common);
    }
}
