//! Delivery contracts.
//!
//! Accepting a contract starts its deadline. Fulfilling it before the
//! deadline hands over the demanded resources and pays the reward. An
//! unfulfilled contract is dropped once its deadline passes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, Millis};
use crate::data::GameData;
use crate::error::Rejection;
use crate::ids::ContractId;
use crate::resources::Cost;
use crate::state::GameState;

/// An accepted contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveContract {
    /// Which contract.
    pub id: ContractId,
    /// When it was accepted.
    pub accepted_at: Millis,
    /// Last moment it can be fulfilled (exclusive).
    pub deadline: Millis,
}

/// Accepted contracts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractBoard {
    active: BTreeMap<ContractId, ActiveContract>,
    fulfilled: u64,
}

impl ContractBoard {
    /// Accepted contract by id.
    #[must_use]
    pub fn get(&self, id: &ContractId) -> Option<&ActiveContract> {
        self.active.get(id)
    }

    /// Iterate accepted contracts.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveContract> {
        self.active.values()
    }

    /// Contracts fulfilled this run.
    #[must_use]
    pub const fn fulfilled(&self) -> u64 {
        self.fulfilled
    }

    /// Drop every contract whose deadline has passed.
    pub fn expire(&mut self, now: Millis) -> Vec<ContractId> {
        let due: Vec<ContractId> = self
            .active
            .values()
            .filter(|c| now >= c.deadline)
            .map(|c| c.id.clone())
            .collect();
        for id in &due {
            self.active.remove(id);
            tracing::info!(contract = %id, "Contract expired");
        }
        due
    }
}

/// Accept a contract at `now`. Returns its deadline.
pub fn accept(
    state: &mut GameState,
    data: &GameData,
    id: &ContractId,
    now: Millis,
) -> Result<Millis, Rejection> {
    let contract = data
        .contract(id)
        .ok_or_else(|| Rejection::UnknownContract(id.clone()))?;
    if state.contracts.active.contains_key(id) {
        return Err(Rejection::ContractActive(id.clone()));
    }
    let deadline = now.saturating_add(secs_to_millis(contract.duration_secs));
    state.contracts.active.insert(
        id.clone(),
        ActiveContract {
            id: id.clone(),
            accepted_at: now,
            deadline,
        },
    );
    tracing::info!(contract = %id, deadline, "Contract accepted");
    Ok(deadline)
}

/// Deliver a contract's demand and collect its reward.
///
/// Returns the reward actually credited (caps may clip it).
pub fn fulfill(
    state: &mut GameState,
    data: &GameData,
    id: &ContractId,
    now: Millis,
) -> Result<Cost, Rejection> {
    let contract = data
        .contract(id)
        .ok_or_else(|| Rejection::UnknownContract(id.clone()))?;
    let open = state
        .contracts
        .active
        .get(id)
        .is_some_and(|c| now < c.deadline);
    if !open {
        return Err(Rejection::ContractNotActive(id.clone()));
    }
    state.ledger.spend(&contract.demand)?;
    state.contracts.active.remove(id);
    state.contracts.fulfilled += 1;
    let credited = state.ledger.deposit_all(&contract.reward);
    state.record_earned(&credited);
    tracing::info!(contract = %id, reward = %credited, "Contract fulfilled");
    Ok(credited)
}
