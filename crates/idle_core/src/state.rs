//! The complete mutable state of one game.
//!
//! Everything the engine mutates lives in [`GameState`]: ledger, units,
//! unlocked effects, timed entities, colonies, automation settings and run
//! statistics. Content tables and engine configuration are not part of it;
//! they are passed in alongside.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::automation::AutomationSettings;
use crate::clock::Millis;
use crate::colonies::Colonies;
use crate::config::EngineConfig;
use crate::contracts::ContractBoard;
use crate::data::GameData;
use crate::derelicts::DerelictField;
use crate::ids::{FormationId, UpgradeId};
use crate::missions::MissionBoard;
use crate::modifiers::{targets, ModifierSet, ModifierSource};
use crate::prestige::RunMeta;
use crate::resources::{Cost, ResourceLedger};
use crate::travel::Travel;
use crate::units::UnitStock;

/// Full game state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// Live ticks applied so far.
    pub tick: u64,
    /// Time the state was last advanced to.
    pub last_known_timestamp: Millis,
    /// Resource stocks and caps.
    pub ledger: ResourceLedger,
    /// Owned units.
    pub units: UnitStock,
    /// Upgrade purchase counts.
    pub purchased: BTreeMap<UpgradeId, u32>,
    /// Active formation.
    pub formation: Option<FormationId>,
    /// Every unlocked effect.
    pub modifiers: ModifierSet,
    /// Missions in flight.
    pub missions: MissionBoard,
    /// Fleet position and voyage.
    pub travel: Travel,
    /// Live derelicts.
    pub derelicts: DerelictField,
    /// Established colonies.
    pub colonies: Colonies,
    /// Accepted contracts.
    pub contracts: ContractBoard,
    /// Automation toggles.
    pub automation: AutomationSettings,
    /// Run and lifetime statistics.
    pub run: RunMeta,
    /// Time of the last passive spawn check.
    pub last_spawn_check: Millis,
}

impl GameState {
    /// Fresh game at `now`.
    #[must_use]
    pub fn new(data: &GameData, config: &EngineConfig, now: Millis) -> Self {
        let ledger = data
            .resources
            .iter()
            .fold(ResourceLedger::new(), |ledger, r| {
                ledger.with_entry(r.kind, r.starting_amount, r.base_cap)
            });
        let units = data
            .starting_units
            .iter()
            .fold(UnitStock::new(), |units, s| units.with(s.unit.clone(), s.count));

        let mut state = Self {
            last_known_timestamp: now,
            ledger,
            units,
            travel: Travel::at(data.home.clone()),
            automation: AutomationSettings::with_cap(config.default_derelict_cap),
            run: RunMeta::started(now),
            last_spawn_check: now,
            ..Self::default()
        };
        state.refresh_caps(data);
        state
    }

    /// Times `id` has been bought.
    #[must_use]
    pub fn upgrade_level(&self, id: &UpgradeId) -> u32 {
        self.purchased.get(id).copied().unwrap_or(0)
    }

    /// Count positive amounts toward this run's earnings.
    pub fn record_earned(&mut self, credited: &Cost) {
        for (kind, amount) in credited.iter() {
            if amount > 0.0 {
                self.run.current.earned.add(kind, amount);
            }
        }
    }

    /// Recompute every storage cap from base caps and storage effects.
    pub fn refresh_caps(&mut self, data: &GameData) {
        for resource in &data.resources {
            let multiplier = self
                .modifiers
                .value(&targets::storage(resource.kind), &self.units);
            self.ledger
                .set_cap(resource.kind, resource.base_cap.map(|cap| cap * multiplier));
        }
    }

    /// Repair a state loaded from an older or foreign snapshot.
    ///
    /// Adds ledger entries for resources the snapshot lacks, moves a fleet
    /// stranded at an unknown location home, clears an unknown formation
    /// and recomputes caps.
    pub fn normalize(&mut self, data: &GameData) {
        for resource in &data.resources {
            if !self.ledger.tracks(resource.kind) {
                tracing::warn!(resource = %resource.kind, "Snapshot lacks resource, defaulting");
                self.ledger.set_amount(resource.kind, resource.starting_amount);
            }
        }
        if data.location(&self.travel.location).is_none() {
            tracing::warn!(location = %self.travel.location, "Snapshot location unknown, returning home");
            self.travel.location = data.home.clone();
            self.travel.voyage = None;
        }
        if let Some(formation) = &self.formation {
            if data.formation(formation).is_none() {
                tracing::warn!(%formation, "Snapshot formation unknown, clearing");
                self.formation = None;
                self.modifiers.clear(ModifierSource::Formation);
            }
        }
        self.refresh_caps(data);
    }
}
