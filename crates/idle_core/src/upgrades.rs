//! Upgrade purchases and fleet formations.
//!
//! Buying an upgrade level unlocks its effects under the upgrade's modifier
//! source. Repeatable upgrades stack: each level appends another copy of the
//! effects. Formations are different: exactly one (or none) is active, and
//! switching replaces the whole formation source.

use serde::{Deserialize, Serialize};

use crate::data::{GameData, UpgradeData};
use crate::error::Rejection;
use crate::formulas::unit_price;
use crate::ids::{FormationId, UpgradeId};
use crate::modifiers::ModifierSource;
use crate::resources::Cost;
use crate::state::GameState;

/// A completed upgrade purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradePurchase {
    /// Upgrade bought.
    pub id: UpgradeId,
    /// Level reached.
    pub level: u32,
    /// Price paid.
    pub cost: Cost,
}

/// Price of the level after `owned`: `cost * cost_growth^owned`, floored.
#[must_use]
pub fn upgrade_price(upgrade: &UpgradeData, owned: u32) -> Cost {
    upgrade
        .cost
        .iter()
        .map(|(kind, amount)| (kind, unit_price(amount, upgrade.cost_growth, u64::from(owned))))
        .collect()
}

/// Check whether the next level of `id` could be bought, returning its price.
pub fn check_purchase(state: &GameState, data: &GameData, id: &UpgradeId) -> Result<Cost, Rejection> {
    let upgrade = data
        .upgrade(id)
        .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
    let owned = state.upgrade_level(id);
    if owned >= upgrade.max_level {
        return Err(Rejection::UpgradeMaxed(id.clone()));
    }
    if let Some(missing) = upgrade
        .prerequisites
        .iter()
        .find(|p| state.upgrade_level(p) == 0)
    {
        return Err(Rejection::PrerequisiteMissing {
            upgrade: id.clone(),
            missing: missing.clone(),
        });
    }
    let cost = upgrade_price(upgrade, owned);
    state.ledger.can_afford(&cost)?;
    Ok(cost)
}

/// Buy the next level of `id`.
pub fn purchase(
    state: &mut GameState,
    data: &GameData,
    id: &UpgradeId,
) -> Result<UpgradePurchase, Rejection> {
    let cost = check_purchase(state, data, id)?;
    let upgrade = data
        .upgrade(id)
        .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
    state.ledger.spend(&cost)?;

    let level = state.upgrade_level(id) + 1;
    state.purchased.insert(id.clone(), level);
    state
        .modifiers
        .unlock(upgrade.source, upgrade.effects.iter().cloned());
    state.travel.warp_charges = state.travel.warp_charges.saturating_add(upgrade.warp_charges);
    state.run.current.upgrades_bought += 1;
    state.refresh_caps(data);

    tracing::info!(upgrade = %id, level, source = ?upgrade.source, "Upgrade purchased");
    Ok(UpgradePurchase {
        id: id.clone(),
        level,
        cost,
    })
}

/// Upgrades whose next level is unlocked (prerequisites met, not maxed),
/// regardless of price.
pub fn available<'a>(state: &'a GameState, data: &'a GameData) -> impl Iterator<Item = &'a UpgradeData> {
    data.upgrades.iter().filter(move |u| {
        state.upgrade_level(&u.id) < u.max_level
            && u.prerequisites.iter().all(|p| state.upgrade_level(p) > 0)
    })
}

/// Activate a formation, or clear it with `None`.
pub fn set_formation(
    state: &mut GameState,
    data: &GameData,
    formation: Option<&FormationId>,
) -> Result<(), Rejection> {
    let Some(id) = formation else {
        state.formation = None;
        state.modifiers.clear(ModifierSource::Formation);
        tracing::info!("Formation cleared");
        return Ok(());
    };
    let info = data
        .formation(id)
        .ok_or_else(|| Rejection::UnknownFormation(id.clone()))?;
    if let Some(required) = &info.requires {
        if state.upgrade_level(required) == 0 {
            return Err(Rejection::FormationLocked {
                formation: id.clone(),
                missing: required.clone(),
            });
        }
    }
    state.formation = Some(id.clone());
    state
        .modifiers
        .replace(ModifierSource::Formation, info.effects.iter().cloned());
    tracing::info!(formation = %id, "Formation set");
    Ok(())
}
