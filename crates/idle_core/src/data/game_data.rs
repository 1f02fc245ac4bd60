//! The full content bundle and its cross-reference validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::ids::{ContractId, DerelictKind, FormationId, LocationId, UnitKind, UpgradeId};
use crate::modifiers::ModifierSource;
use crate::resources::ResourceKind;

use super::{
    ActionData, ContractData, DerelictData, FormationData, LocationData, MissionAction,
    MissionKind, MissionKindData, ResourceData, UnitData, UpgradeData,
};

/// Units owned at the start of every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingUnit {
    /// Unit kind.
    pub unit: UnitKind,
    /// How many.
    pub count: u64,
}

/// Every content table the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    /// Resource starting stock and caps.
    pub resources: Vec<ResourceData>,
    /// Unit definitions.
    pub units: Vec<UnitData>,
    /// Mission kind parameters.
    pub mission_kinds: Vec<MissionKindData>,
    /// Mission action parameters.
    pub actions: Vec<ActionData>,
    /// Travel graph.
    pub locations: Vec<LocationData>,
    /// Derelict types.
    pub derelicts: Vec<DerelictData>,
    /// Purchasable upgrades.
    #[serde(default)]
    pub upgrades: Vec<UpgradeData>,
    /// Fleet formations.
    #[serde(default)]
    pub formations: Vec<FormationData>,
    /// Delivery contracts.
    #[serde(default)]
    pub contracts: Vec<ContractData>,
    /// Where every run starts.
    pub home: LocationId,
    /// Units owned at the start of every run.
    #[serde(default)]
    pub starting_units: Vec<StartingUnit>,
}

impl GameData {
    /// Parse content from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::ParseError {
            what: "game data".to_string(),
            message: e.to_string(),
        })
    }

    /// Parse content from RON text and reject it unless it validates.
    pub fn load(text: &str) -> Result<Self> {
        let data = Self::from_ron_str(text)?;
        data.ensure_valid()?;
        Ok(data)
    }

    /// Render content as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::SerializeError {
                what: "game data".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Resource parameters.
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceData> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: &UnitKind) -> Option<&UnitData> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Mission kind parameters.
    #[must_use]
    pub fn mission_kind(&self, kind: MissionKind) -> Option<&MissionKindData> {
        self.mission_kinds.iter().find(|m| m.kind == kind)
    }

    /// Mission action parameters.
    #[must_use]
    pub fn action(&self, action: MissionAction) -> Option<&ActionData> {
        self.actions.iter().find(|a| a.action == action)
    }

    /// Get a location by id.
    #[must_use]
    pub fn location(&self, id: &LocationId) -> Option<&LocationData> {
        self.locations.iter().find(|l| &l.id == id)
    }

    /// Get a derelict type by id.
    #[must_use]
    pub fn derelict(&self, kind: &DerelictKind) -> Option<&DerelictData> {
        self.derelicts.iter().find(|d| &d.kind == kind)
    }

    /// Get an upgrade by id.
    #[must_use]
    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeData> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    /// Get a formation by id.
    #[must_use]
    pub fn formation(&self, id: &FormationId) -> Option<&FormationData> {
        self.formations.iter().find(|f| &f.id == id)
    }

    /// Get a contract by id.
    #[must_use]
    pub fn contract(&self, id: &ContractId) -> Option<&ContractData> {
        self.contracts.iter().find(|c| &c.id == id)
    }

    /// Units able to run `kind` missions, in table order.
    pub fn units_for(&self, kind: MissionKind) -> impl Iterator<Item = &UnitData> {
        self.units.iter().filter(move |u| u.can_perform(kind))
    }

    /// Return an error listing every validation problem, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidContent(errors))
        }
    }

    /// Validate that all references point to existing entries and every
    /// numeric parameter is in range.
    ///
    /// Returns a list of validation errors (empty if valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        check_unique(&mut errors, "resource", self.resources.iter().map(|r| r.kind));
        check_unique(&mut errors, "unit", self.units.iter().map(|u| &u.id));
        check_unique(&mut errors, "location", self.locations.iter().map(|l| &l.id));
        check_unique(&mut errors, "derelict", self.derelicts.iter().map(|d| &d.kind));
        check_unique(&mut errors, "upgrade", self.upgrades.iter().map(|u| &u.id));
        check_unique(&mut errors, "formation", self.formations.iter().map(|f| &f.id));
        check_unique(&mut errors, "contract", self.contracts.iter().map(|c| &c.id));

        for resource in &self.resources {
            if resource.starting_amount < 0.0 {
                errors.push(format!("Resource '{}' starts negative", resource.kind));
            }
            if let Some(cap) = resource.base_cap {
                if cap < resource.starting_amount {
                    errors.push(format!(
                        "Resource '{}' starts above its cap ({} > {cap})",
                        resource.kind, resource.starting_amount
                    ));
                }
            }
        }

        for unit in &self.units {
            if unit.cost_growth < 1.0 {
                errors.push(format!(
                    "Unit '{}' has cost growth below 1 ({})",
                    unit.id, unit.cost_growth
                ));
            }
            if unit.produces.iter().chain(unit.consumes.iter()).any(|(_, v)| v < 0.0) {
                errors.push(format!("Unit '{}' has a negative rate", unit.id));
            }
            if !(0.0..=1.0).contains(&unit.abort_refund) {
                errors.push(format!("Unit '{}' abort refund outside [0, 1]", unit.id));
            }
        }

        for kind in MissionKind::ALL {
            match self.mission_kind(kind) {
                None => errors.push(format!("Mission kind '{}' is not configured", kind.key())),
                Some(data) if data.base_secs < 0.0 || data.fuel_cost < 0.0 => errors.push(
                    format!("Mission kind '{}' has a negative parameter", kind.key()),
                ),
                Some(_) => {}
            }
        }

        for action in MissionAction::ALL {
            match self.action(action) {
                None => errors.push(format!("Mission action '{action:?}' is not configured")),
                Some(data) if data.duration_multiplier <= 0.0 => errors.push(format!(
                    "Mission action '{action:?}' has a non-positive duration multiplier"
                )),
                Some(_) => {}
            }
        }

        if self.location(&self.home).is_none() {
            errors.push(format!("Home location '{}' not found", self.home));
        }

        for location in &self.locations {
            for neighbor in &location.neighbors {
                if self.location(neighbor).is_none() {
                    errors.push(format!(
                        "Location '{}' has unknown neighbor '{neighbor}'",
                        location.id
                    ));
                }
            }
            for upgrade in &location.requires.upgrades {
                if self.upgrade(upgrade).is_none() {
                    errors.push(format!(
                        "Location '{}' requires unknown upgrade '{upgrade}'",
                        location.id
                    ));
                }
            }
            for colony in &location.requires.colonies {
                if self.location(colony).is_none() {
                    errors.push(format!(
                        "Location '{}' requires colony at unknown location '{colony}'",
                        location.id
                    ));
                }
            }
            if location.rarity_weights.total() == 0 {
                errors.push(format!("Location '{}' has all-zero rarity weights", location.id));
            }
            for (name, p) in [
                ("scout", location.scout_success),
                ("colony", location.colony_success),
            ] {
                if !(0.0..=1.0).contains(&p) {
                    errors.push(format!(
                        "Location '{}' {name} success outside [0, 1]",
                        location.id
                    ));
                }
            }
        }

        for derelict in &self.derelicts {
            for location in &derelict.locations {
                if self.location(location).is_none() {
                    errors.push(format!(
                        "Derelict '{}' appears at unknown location '{location}'",
                        derelict.kind
                    ));
                }
            }
            if derelict.lifetime_secs <= 0.0 {
                errors.push(format!("Derelict '{}' has non-positive lifetime", derelict.kind));
            }
            if !(0.0..=1.0).contains(&derelict.salvage_success) {
                errors.push(format!(
                    "Derelict '{}' salvage success outside [0, 1]",
                    derelict.kind
                ));
            }
            if derelict
                .rewards
                .iter()
                .any(|r| r.amount < 0.0 || !(0.0..=1.0).contains(&r.chance))
            {
                errors.push(format!("Derelict '{}' has an invalid reward line", derelict.kind));
            }
        }

        for upgrade in &self.upgrades {
            for prereq in &upgrade.prerequisites {
                if self.upgrade(prereq).is_none() {
                    errors.push(format!(
                        "Upgrade '{}' has unknown prerequisite '{prereq}'",
                        upgrade.id
                    ));
                }
            }
            if matches!(
                upgrade.source,
                ModifierSource::Formation | ModifierSource::Territory
            ) {
                errors.push(format!(
                    "Upgrade '{}' cannot join the {:?} modifier group",
                    upgrade.id, upgrade.source
                ));
            }
            if upgrade.max_level == 0 {
                errors.push(format!("Upgrade '{}' has max level 0", upgrade.id));
            }
            if upgrade.cost_growth < 1.0 {
                errors.push(format!("Upgrade '{}' has cost growth below 1", upgrade.id));
            }
        }

        for formation in &self.formations {
            if let Some(upgrade) = &formation.requires {
                if self.upgrade(upgrade).is_none() {
                    errors.push(format!(
                        "Formation '{}' requires unknown upgrade '{upgrade}'",
                        formation.id
                    ));
                }
            }
        }

        for contract in &self.contracts {
            if contract.duration_secs <= 0.0 {
                errors.push(format!("Contract '{}' has non-positive duration", contract.id));
            }
        }

        for start in &self.starting_units {
            if self.unit(&start.unit).is_none() {
                errors.push(format!("Starting unit '{}' not found", start.unit));
            }
        }

        errors
    }
}

fn check_unique<T, I>(errors: &mut Vec<String>, what: &str, ids: I)
where
    T: Ord + std::fmt::Display,
    I: IntoIterator<Item = T>,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        let label = id.to_string();
        if !seen.insert(id) {
            errors.push(format!("Duplicate {what} '{label}'"));
        }
    }
}
