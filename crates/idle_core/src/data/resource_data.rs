//! Starting stock and base storage of each resource.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Static parameters of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Which resource.
    pub kind: ResourceKind,

    /// Amount held at the start of a run.
    #[serde(default)]
    pub starting_amount: f64,

    /// Storage cap before `<resource>_storage` modifiers. `None` is uncapped.
    #[serde(default)]
    pub base_cap: Option<f64>,
}
