//! Established colonies.
//!
//! A colony is permanent for the rest of the run. Each one contributes a
//! territory production bonus through the modifier aggregator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::ids::LocationId;
use crate::modifiers::{targets, Effect, ModifierSource};
use crate::state::GameState;

/// One colony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colony {
    /// Where it is.
    pub location: LocationId,
    /// When it was founded.
    pub established_at: Millis,
    /// Production bonus it grants (0.2 is +20%).
    pub production_bonus: f64,
}

/// All colonies of the current run, at most one per location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Colonies {
    colonies: BTreeMap<LocationId, Colony>,
}

impl Colonies {
    /// Whether `location` hosts a colony.
    #[must_use]
    pub fn contains(&self, location: &LocationId) -> bool {
        self.colonies.contains_key(location)
    }

    /// Colony at `location`.
    #[must_use]
    pub fn get(&self, location: &LocationId) -> Option<&Colony> {
        self.colonies.get(location)
    }

    /// Number of colonies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colonies.len()
    }

    /// True when no colony exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colonies.is_empty()
    }

    /// Iterate colonies in location order.
    pub fn iter(&self) -> impl Iterator<Item = &Colony> {
        self.colonies.values()
    }

    fn insert(&mut self, colony: Colony) -> bool {
        if self.contains(&colony.location) {
            return false;
        }
        self.colonies.insert(colony.location.clone(), colony);
        true
    }
}

/// Territory effect granted by one colony.
#[must_use]
pub fn territory_effect(colony: &Colony) -> Effect {
    Effect::multiplier(targets::PRODUCTION, 1.0 + colony.production_bonus)
}

/// Record a colony and grant its territory bonus.
///
/// Returns `false` and changes nothing if `location` already hosts one.
pub fn establish(state: &mut GameState, colony: Colony) -> bool {
    let effect = territory_effect(&colony);
    let location = colony.location.clone();
    if !state.colonies.insert(colony) {
        return false;
    }
    state.modifiers.unlock(ModifierSource::Territory, [effect]);
    tracing::info!(%location, "Colony established");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::GameData;
    use crate::resources::ResourceKind;

    #[test]
    fn test_establish_grants_territory_bonus_once() {
        let data = GameData::standard();
        let mut state = GameState::new(&data, &EngineConfig::default(), 0);
        let colony = Colony {
            location: "luna".into(),
            established_at: 10,
            production_bonus: 0.2,
        };
        assert!(establish(&mut state, colony.clone()));
        assert!(!establish(&mut state, colony));
        assert_eq!(state.colonies.len(), 1);
        let m = state
            .modifiers
            .production_multiplier(ResourceKind::Metal, &state.units);
        assert!((m - 1.2).abs() < 1e-12);
    }
}
