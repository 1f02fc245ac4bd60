//! Delivery contracts.

use serde::{Deserialize, Serialize};

use crate::ids::ContractId;
use crate::resources::Cost;

/// A contract: deliver `demand` before the deadline, receive `reward`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractData {
    /// Unique identifier.
    pub id: ContractId,
    /// Display name.
    pub name: String,
    /// Resources handed over on fulfilment.
    pub demand: Cost,
    /// Resources received on fulfilment.
    pub reward: Cost,
    /// Seconds between acceptance and deadline.
    pub duration_secs: f64,
}
