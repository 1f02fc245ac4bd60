//! Automatic scouting and salvaging.
//!
//! A pass looks at every enabled behavior whose capability is unlocked and
//! issues ordinary mission launches through [`missions::plan_mission`], so
//! automation is held to exactly the rules manual play is. Slot usage is
//! derived from the live mission board on every plan, which keeps manual and
//! automatic launches from double-booking a unit or a derelict.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::data::{GameData, MissionAction, MissionKind};
use crate::error::Rejection;
use crate::ids::{DerelictId, MissionId};
use crate::missions::{self, MissionRequest, MissionTarget};
use crate::modifiers::targets;
use crate::state::GameState;

/// Derelict cap used when nothing else is configured.
pub const DEFAULT_DERELICT_CAP: usize = 5;

/// An automatable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationFlag {
    /// Keep scouts busy until enough derelicts are known.
    AutoScout,
    /// Send salvage ships to every unclaimed derelict here.
    AutoSalvage,
}

impl AutomationFlag {
    /// All behaviors in pass order.
    pub const ALL: [Self; 2] = [Self::AutoScout, Self::AutoSalvage];

    /// Capability target that must be unlocked first.
    #[must_use]
    pub const fn capability(self) -> &'static str {
        match self {
            Self::AutoScout => targets::AUTOMATION_SCOUT,
            Self::AutoSalvage => targets::AUTOMATION_SALVAGE,
        }
    }
}

/// Player automation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// Behaviors switched on.
    pub enabled: BTreeSet<AutomationFlag>,
    /// Auto-scout stops once live derelicts plus scouts in flight reach this.
    pub derelict_cap: usize,
    /// Action used for automatic scouting.
    pub scout_action: MissionAction,
    /// Action used for automatic salvage.
    pub salvage_action: MissionAction,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self::with_cap(DEFAULT_DERELICT_CAP)
    }
}

impl AutomationSettings {
    /// Everything off, with the given derelict cap.
    #[must_use]
    pub fn with_cap(derelict_cap: usize) -> Self {
        Self {
            enabled: BTreeSet::new(),
            derelict_cap,
            scout_action: MissionAction::Standard,
            salvage_action: MissionAction::Standard,
        }
    }

    /// Whether `flag` is switched on.
    #[must_use]
    pub fn is_enabled(&self, flag: AutomationFlag) -> bool {
        self.enabled.contains(&flag)
    }
}

/// One launch made by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoLaunch {
    /// Behavior responsible.
    pub flag: AutomationFlag,
    /// Mission started.
    pub mission: MissionId,
}

/// Switch a behavior on or off. Switching on needs its capability.
pub fn set_flag(state: &mut GameState, flag: AutomationFlag, enabled: bool) -> Result<(), Rejection> {
    if enabled {
        let capability = flag.capability();
        if !state.modifiers.has_capability(capability) {
            return Err(Rejection::CapabilityLocked(capability.to_string()));
        }
        state.automation.enabled.insert(flag);
    } else {
        state.automation.enabled.remove(&flag);
    }
    tracing::info!(?flag, enabled, "Automation toggled");
    Ok(())
}

fn active(state: &GameState, flag: AutomationFlag) -> bool {
    state.automation.is_enabled(flag) && state.modifiers.has_capability(flag.capability())
}

/// Run every eligible behavior once.
pub fn run_pass(state: &mut GameState, data: &GameData, now: Millis) -> Vec<AutoLaunch> {
    let mut launched = Vec::new();
    if state.travel.is_traveling() {
        return launched;
    }
    if active(state, AutomationFlag::AutoScout) {
        auto_scout(state, data, now, &mut launched);
    }
    if active(state, AutomationFlag::AutoSalvage) {
        auto_salvage(state, data, now, &mut launched);
    }
    launched
}

/// Try each capable unit kind in table order; launch with the first that
/// passes validation.
fn launch_first(
    state: &mut GameState,
    data: &GameData,
    kind: MissionKind,
    target: &MissionTarget,
    action: MissionAction,
    now: Millis,
) -> Option<MissionId> {
    let plan = data.units_for(kind).find_map(|unit| {
        let request = MissionRequest {
            kind,
            unit: unit.id.clone(),
            target: target.clone(),
            action,
        };
        missions::plan_mission(state, data, &request).ok()
    })?;
    missions::launch(state, plan, now).ok()
}

fn auto_scout(state: &mut GameState, data: &GameData, now: Millis, launched: &mut Vec<AutoLaunch>) {
    let target = MissionTarget::Location(state.travel.location.clone());
    let action = state.automation.scout_action;
    while state.derelicts.len() + state.missions.in_flight(MissionKind::Scout)
        < state.automation.derelict_cap
    {
        let Some(mission) = launch_first(state, data, MissionKind::Scout, &target, action, now) else {
            break;
        };
        tracing::debug!(%mission, "Auto-scout launched");
        launched.push(AutoLaunch {
            flag: AutomationFlag::AutoScout,
            mission,
        });
    }
}

fn auto_salvage(state: &mut GameState, data: &GameData, now: Millis, launched: &mut Vec<AutoLaunch>) {
    let here = state.travel.location.clone();
    let candidates: Vec<DerelictId> = state.derelicts.available_at(&here).map(|d| d.id).collect();
    let action = state.automation.salvage_action;
    for derelict in candidates {
        let target = MissionTarget::Derelict(derelict);
        let Some(mission) = launch_first(state, data, MissionKind::Salvage, &target, action, now) else {
            break;
        };
        tracing::debug!(%mission, %derelict, "Auto-salvage launched");
        launched.push(AutoLaunch {
            flag: AutomationFlag::AutoSalvage,
            mission,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::Rarity;
    use crate::modifiers::{Effect, ModifierSource};
    use crate::resources::ResourceKind;

    fn setup() -> (GameData, GameState) {
        let data = GameData::standard();
        let mut state = GameState::new(&data, &EngineConfig::default(), 0);
        state.ledger.set_amount(ResourceKind::Fuel, 1_000.0);
        state.modifiers.unlock(
            ModifierSource::Tech,
            [
                Effect::capability(targets::AUTOMATION_SCOUT),
                Effect::capability(targets::AUTOMATION_SALVAGE),
            ],
        );
        (data, state)
    }

    fn derelict_here(state: &mut GameState) -> DerelictId {
        let here = state.travel.location.clone();
        state
            .derelicts
            .insert("debris_field".into(), Rarity::Common, here, 0, 600_000)
    }

    #[test]
    fn test_enabling_requires_capability() {
        let data = GameData::standard();
        let mut state = GameState::new(&data, &EngineConfig::default(), 0);
        assert_eq!(
            set_flag(&mut state, AutomationFlag::AutoScout, true),
            Err(Rejection::CapabilityLocked("automation_scout".into()))
        );
        assert!(set_flag(&mut state, AutomationFlag::AutoScout, false).is_ok());
    }

    #[test]
    fn test_disabled_behaviors_do_nothing() {
        let (data, mut state) = setup();
        state.units.add(&"scout_ship".into(), 2);
        assert!(run_pass(&mut state, &data, 0).is_empty());
        assert!(state.missions.is_empty());
    }

    #[test]
    fn test_auto_scout_fills_free_slots() {
        let (data, mut state) = setup();
        state.units.add(&"scout_ship".into(), 3);
        set_flag(&mut state, AutomationFlag::AutoScout, true).unwrap();
        let launched = run_pass(&mut state, &data, 0);
        assert_eq!(launched.len(), 3);
        assert_eq!(state.missions.in_flight(MissionKind::Scout), 3);
        assert!(run_pass(&mut state, &data, 10).is_empty());
    }

    #[test]
    fn test_auto_scout_respects_derelict_cap() {
        let (data, mut state) = setup();
        state.units.add(&"scout_ship".into(), 5);
        state.automation.derelict_cap = 3;
        derelict_here(&mut state);
        derelict_here(&mut state);
        set_flag(&mut state, AutomationFlag::AutoScout, true).unwrap();
        let launched = run_pass(&mut state, &data, 0);
        assert_eq!(launched.len(), 1);
    }

    #[test]
    fn test_auto_salvage_never_double_targets() {
        let (data, mut state) = setup();
        state.units.add(&"salvage_ship".into(), 3);
        let first = derelict_here(&mut state);
        let second = derelict_here(&mut state);
        set_flag(&mut state, AutomationFlag::AutoSalvage, true).unwrap();
        let launched = run_pass(&mut state, &data, 0);
        assert_eq!(launched.len(), 2);
        assert!(state.derelicts.get(first).unwrap().claimed_by.is_some());
        assert!(state.derelicts.get(second).unwrap().claimed_by.is_some());
        assert!(run_pass(&mut state, &data, 10).is_empty());
        assert_eq!(state.missions.busy_count(&"salvage_ship".into()), 2);
    }

    #[test]
    fn test_auto_salvage_shares_slots_with_manual_play() {
        let (data, mut state) = setup();
        state.units.add(&"salvage_ship".into(), 1);
        let manual = derelict_here(&mut state);
        let request = MissionRequest {
            kind: MissionKind::Salvage,
            unit: "salvage_ship".into(),
            target: MissionTarget::Derelict(manual),
            action: MissionAction::Standard,
        };
        let plan = missions::plan_mission(&state, &data, &request).unwrap();
        missions::launch(&mut state, plan, 0).unwrap();
        derelict_here(&mut state);
        set_flag(&mut state, AutomationFlag::AutoSalvage, true).unwrap();
        assert!(run_pass(&mut state, &data, 0).is_empty());
    }

    #[test]
    fn test_settings_survive_serialization_defaults() {
        let settings: AutomationSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.derelict_cap, DEFAULT_DERELICT_CAP);
        assert!(settings.enabled.is_empty());
    }
}
