//! Command surface.
//!
//! Every player action (and every automation launch) enters the engine as a
//! [`Command`]. Execution validates first and mutates second; a refused
//! command leaves the state untouched and comes back as a
//! [`CommandResult`] carrying the [`Rejection`] and its message.
//!
//! Commands serialize as internally tagged JSON so a UI or the headless
//! protocol can send them verbatim:
//!
//! ```json
//! {"cmd": "buy_unit", "unit": "mining_drone", "amount": {"count": 5}}
//! {"cmd": "start_travel", "destination": "luna"}
//! ```

use serde::{Deserialize, Serialize};

use crate::automation::AutomationFlag;
use crate::clock::Millis;
use crate::data::{MissionAction, MissionKind};
use crate::error::Rejection;
use crate::ids::{ContractId, FormationId, LocationId, MissionId, UnitKind, UpgradeId};
use crate::missions::MissionTarget;
use crate::prestige::PrestigeSummary;
use crate::resources::Cost;
use crate::travel::Departure;
use crate::units::UnitPurchase;
use crate::upgrades::UpgradePurchase;

/// How many units to buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyAmount {
    /// Exactly this many.
    Count(u64),
    /// As many as the ledger can pay for (at least one).
    Max,
}

impl Default for BuyAmount {
    fn default() -> Self {
        Self::Count(1)
    }
}

/// A player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Buy units.
    BuyUnit {
        /// Kind to buy.
        unit: UnitKind,
        /// How many.
        #[serde(default)]
        amount: BuyAmount,
    },
    /// Switch a unit kind's production on or off.
    SetUnitEnabled {
        /// Kind.
        unit: UnitKind,
        /// New setting.
        enabled: bool,
    },
    /// Buy the next level of an upgrade.
    PurchaseUpgrade {
        /// Upgrade.
        upgrade: UpgradeId,
    },
    /// Activate or clear a formation.
    SetFormation {
        /// Formation, or `None` to clear.
        #[serde(default)]
        formation: Option<FormationId>,
    },
    /// Launch a mission.
    StartMission {
        /// Mission kind.
        kind: MissionKind,
        /// Unit kind to send.
        unit: UnitKind,
        /// Location or derelict.
        target: MissionTarget,
        /// Action variant.
        #[serde(default)]
        action: MissionAction,
    },
    /// Recall an in-flight mission.
    CancelMission {
        /// Mission.
        mission: MissionId,
    },
    /// Depart for another location.
    StartTravel {
        /// Destination.
        destination: LocationId,
        /// Spend a warp charge and arrive immediately.
        #[serde(default)]
        instant: bool,
    },
    /// Abandon the current voyage.
    CancelTravel,
    /// Switch an automation behavior on or off.
    SetAutomation {
        /// Behavior.
        flag: AutomationFlag,
        /// New setting.
        enabled: bool,
    },
    /// Change the auto-scout derelict cap.
    SetDerelictCap {
        /// New cap.
        cap: usize,
    },
    /// Take on a contract.
    AcceptContract {
        /// Contract.
        contract: ContractId,
    },
    /// Deliver a contract.
    FulfillContract {
        /// Contract.
        contract: ContractId,
    },
    /// End the run for dark matter.
    PrestigeReset,
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BuyUnit { .. } => "buy_unit",
            Self::SetUnitEnabled { .. } => "set_unit_enabled",
            Self::PurchaseUpgrade { .. } => "purchase_upgrade",
            Self::SetFormation { .. } => "set_formation",
            Self::StartMission { .. } => "start_mission",
            Self::CancelMission { .. } => "cancel_mission",
            Self::StartTravel { .. } => "start_travel",
            Self::CancelTravel => "cancel_travel",
            Self::SetAutomation { .. } => "set_automation",
            Self::SetDerelictCap { .. } => "set_derelict_cap",
            Self::AcceptContract { .. } => "accept_contract",
            Self::FulfillContract { .. } => "fulfill_contract",
            Self::PrestigeReset => "prestige_reset",
        }
    }
}

/// What an accepted command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandEffect {
    /// Units bought.
    UnitsBought(UnitPurchase),
    /// Unit production toggled.
    UnitToggled {
        /// Kind.
        unit: UnitKind,
        /// New setting.
        enabled: bool,
    },
    /// Upgrade level bought.
    UpgradePurchased(UpgradePurchase),
    /// Formation changed.
    FormationChanged {
        /// Active formation.
        formation: Option<FormationId>,
    },
    /// Mission launched.
    MissionStarted {
        /// Mission.
        mission: MissionId,
        /// Resolution time.
        ends_at: Millis,
    },
    /// Mission recalled.
    MissionCancelled {
        /// Fuel refunded.
        refund: f64,
    },
    /// Voyage started or warp made.
    TravelStarted(Departure),
    /// Voyage abandoned.
    TravelCancelled {
        /// Fuel refunded.
        refund: f64,
    },
    /// Automation toggled.
    AutomationChanged {
        /// Behavior.
        flag: AutomationFlag,
        /// New setting.
        enabled: bool,
    },
    /// Derelict cap changed.
    DerelictCapChanged {
        /// New cap.
        cap: usize,
    },
    /// Contract accepted.
    ContractAccepted {
        /// Deadline.
        deadline: Millis,
    },
    /// Contract delivered.
    ContractFulfilled {
        /// Reward credited.
        reward: Cost,
    },
    /// Run reset.
    Prestige(PrestigeSummary),
}

/// Outcome of one command, ready for a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command was applied.
    pub success: bool,
    /// Why it was refused.
    pub reason: Option<Rejection>,
    /// Human-readable summary.
    pub message: String,
    /// What it did.
    pub effect: Option<CommandEffect>,
}

impl CommandResult {
    /// An applied command.
    #[must_use]
    pub fn applied(effect: CommandEffect, message: impl Into<String>) -> Self {
        Self {
            success: true,
            reason: None,
            message: message.into(),
            effect: Some(effect),
        }
    }

    /// A refused command.
    #[must_use]
    pub fn rejected(reason: Rejection) -> Self {
        Self {
            success: false,
            message: reason.to_string(),
            reason: Some(reason),
            effect: None,
        }
    }
}
