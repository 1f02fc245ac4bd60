//! Event log and toasts.
//!
//! Engine events land in one [`Notifications::push`], which appends to a
//! bounded log (oldest entries fall off) and, for events worth interrupting
//! the player for, raises a toast that expires on its own.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::automation::AutomationFlag;
use crate::clock::Millis;
use crate::config::EngineConfig;
use crate::data::{MissionKind, Rarity};
use crate::ids::{ContractId, DerelictId, DerelictKind, FormationId, LocationId, MissionId, UnitKind, UpgradeId};
use crate::resources::{ResourceKind, ResourceLedger};

/// Something that happened in the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// Units bought.
    UnitsBought {
        /// Kind.
        unit: UnitKind,
        /// How many.
        amount: u64,
        /// Owned afterwards.
        owned: u64,
    },
    /// Upgrade level bought.
    UpgradePurchased {
        /// Upgrade.
        upgrade: UpgradeId,
        /// Level reached.
        level: u32,
    },
    /// Formation switched.
    FormationChanged {
        /// New formation, if any.
        formation: Option<FormationId>,
    },
    /// Mission launched.
    MissionStarted {
        /// Mission.
        mission: MissionId,
        /// Kind.
        kind: MissionKind,
        /// Resolution time.
        ends_at: Millis,
    },
    /// Mission succeeded.
    MissionSucceeded {
        /// Mission.
        mission: MissionId,
        /// Kind.
        kind: MissionKind,
    },
    /// Mission failed.
    MissionFailed {
        /// Mission.
        mission: MissionId,
        /// Kind.
        kind: MissionKind,
        /// Fuel refunded.
        refund: f64,
    },
    /// Mission recalled.
    MissionCancelled {
        /// Mission.
        mission: MissionId,
        /// Fuel refunded.
        refund: f64,
    },
    /// Derelict appeared.
    DerelictSpawned {
        /// Derelict.
        derelict: DerelictId,
        /// Type.
        kind: DerelictKind,
        /// Band.
        rarity: Rarity,
        /// Where.
        location: LocationId,
    },
    /// Derelict drifted away.
    DerelictExpired {
        /// Derelict.
        derelict: DerelictId,
        /// Type.
        kind: DerelictKind,
    },
    /// Voyage started.
    TravelStarted {
        /// Destination.
        destination: LocationId,
        /// Arrival time.
        arrives_at: Millis,
    },
    /// Instant travel used.
    Warped {
        /// Destination.
        destination: LocationId,
    },
    /// Fleet arrived.
    TravelArrived {
        /// Where.
        location: LocationId,
    },
    /// Voyage abandoned.
    TravelCancelled {
        /// Fuel refunded.
        refund: f64,
    },
    /// Colony founded.
    ColonyEstablished {
        /// Where.
        location: LocationId,
    },
    /// A resource reached its cap.
    StorageFull {
        /// Resource.
        resource: ResourceKind,
    },
    /// Contract accepted.
    ContractAccepted {
        /// Contract.
        contract: ContractId,
        /// Deadline.
        deadline: Millis,
    },
    /// Contract delivered.
    ContractFulfilled {
        /// Contract.
        contract: ContractId,
    },
    /// Contract deadline passed.
    ContractExpired {
        /// Contract.
        contract: ContractId,
    },
    /// Automation toggled.
    AutomationToggled {
        /// Behavior.
        flag: AutomationFlag,
        /// New setting.
        enabled: bool,
    },
    /// Run reset.
    PrestigeReset {
        /// Dark matter gained.
        gain: f64,
        /// Resets so far.
        runs_completed: u64,
    },
    /// Catch-up after an absence.
    OfflineProgress {
        /// Time away.
        away_ms: Millis,
        /// Share of production credited.
        efficiency: f64,
    },
    /// The host should write a save.
    AutosaveDue,
}

impl GameEvent {
    /// One-line description for logs and toasts.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::UnitsBought { unit, amount, owned } => {
                format!("Bought {amount} {unit} ({owned} owned)")
            }
            Self::UpgradePurchased { upgrade, level } => format!("{upgrade} reached level {level}"),
            Self::FormationChanged { formation: Some(f) } => format!("Formation set to {f}"),
            Self::FormationChanged { formation: None } => "Formation cleared".to_string(),
            Self::MissionStarted { mission, kind, .. } => format!("{} mission {mission} launched", kind.key()),
            Self::MissionSucceeded { mission, kind } => format!("{} mission {mission} succeeded", kind.key()),
            Self::MissionFailed { mission, kind, refund } => {
                format!("{} mission {mission} failed ({refund:.0} fuel recovered)", kind.key())
            }
            Self::MissionCancelled { mission, refund } => {
                format!("Mission {mission} recalled ({refund:.0} fuel recovered)")
            }
            Self::DerelictSpawned {
                kind,
                rarity,
                location,
                ..
            } => format!("{rarity:?} {kind} detected at {location}"),
            Self::DerelictExpired { kind, .. } => format!("{kind} drifted out of range"),
            Self::TravelStarted { destination, .. } => format!("Fleet departed for {destination}"),
            Self::Warped { destination } => format!("Fleet warped to {destination}"),
            Self::TravelArrived { location } => format!("Fleet arrived at {location}"),
            Self::TravelCancelled { refund } => format!("Voyage cancelled ({refund:.0} fuel recovered)"),
            Self::ColonyEstablished { location } => format!("Colony established at {location}"),
            Self::StorageFull { resource } => format!("{resource} storage is full"),
            Self::ContractAccepted { contract, .. } => format!("Contract {contract} accepted"),
            Self::ContractFulfilled { contract } => format!("Contract {contract} fulfilled"),
            Self::ContractExpired { contract } => format!("Contract {contract} expired"),
            Self::AutomationToggled { flag, enabled } => {
                format!("{flag:?} {}", if *enabled { "enabled" } else { "disabled" })
            }
            Self::PrestigeReset { gain, .. } => format!("Prestige reset: +{gain:.0} dark matter"),
            Self::OfflineProgress { away_ms, efficiency } => format!(
                "Welcome back: {}s away at {:.0}% efficiency",
                away_ms / 1000,
                efficiency * 100.0
            ),
            Self::AutosaveDue => "Autosave".to_string(),
        }
    }

    /// Whether the event deserves a toast.
    #[must_use]
    pub const fn is_toast(&self) -> bool {
        !matches!(
            self,
            Self::UnitsBought { .. } | Self::MissionStarted { .. } | Self::AutosaveDue
        )
    }
}

/// A logged event with its time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// When it happened.
    pub at: Millis,
    /// What happened.
    pub event: GameEvent,
}

/// A transient message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Sequence number.
    pub id: u64,
    /// Text.
    pub message: String,
    /// When it disappears.
    pub expires_at: Millis,
}

/// Bounded event log plus live toasts.
#[derive(Debug, Clone)]
pub struct Notifications {
    log: VecDeque<LoggedEvent>,
    capacity: usize,
    toasts: VecDeque<Toast>,
    toast_ttl_ms: Millis,
    next_toast: u64,
    full: BTreeSet<ResourceKind>,
    total: u64,
}

impl Notifications {
    /// Log holding `capacity` events; toasts live `toast_ttl_ms`.
    #[must_use]
    pub fn new(capacity: usize, toast_ttl_ms: Millis) -> Self {
        Self {
            log: VecDeque::with_capacity(capacity),
            capacity,
            toasts: VecDeque::new(),
            toast_ttl_ms,
            next_toast: 0,
            full: BTreeSet::new(),
            total: 0,
        }
    }

    /// Sized from engine configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.event_log_capacity, config.toast_ttl_ms())
    }

    /// Record an event at `now`.
    pub fn push(&mut self, event: GameEvent, now: Millis) {
        if event.is_toast() {
            self.next_toast += 1;
            self.toasts.push_back(Toast {
                id: self.next_toast,
                message: event.message(),
                expires_at: now.saturating_add(self.toast_ttl_ms),
            });
        }
        if self.capacity > 0 {
            while self.log.len() >= self.capacity {
                self.log.pop_front();
            }
            self.log.push_back(LoggedEvent { at: now, event });
        }
        self.total += 1;
    }

    /// Record several events at `now`.
    pub fn extend(&mut self, events: impl IntoIterator<Item = GameEvent>, now: Millis) {
        for event in events {
            self.push(event, now);
        }
    }

    /// Logged events, oldest first.
    pub fn log(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.log.iter()
    }

    /// Most recent logged event.
    #[must_use]
    pub fn latest(&self) -> Option<&LoggedEvent> {
        self.log.back()
    }

    /// Events currently in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// True when the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Events pushed since creation, including those that fell off the log.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Drop expired toasts and return the rest.
    pub fn toasts(&mut self, now: Millis) -> Vec<Toast> {
        self.toasts.retain(|t| t.expires_at > now);
        self.toasts.iter().cloned().collect()
    }

    /// Emit [`GameEvent::StorageFull`] for resources that just hit their cap.
    ///
    /// Each resource fires once per crossing; it re-arms after dropping
    /// below the cap.
    pub fn watch_storage(&mut self, ledger: &ResourceLedger, now: Millis) {
        for (resource, _) in ledger.iter() {
            if ledger.is_full(resource) {
                if self.full.insert(resource) {
                    self.push(GameEvent::StorageFull { resource }, now);
                }
            } else {
                self.full.remove(&resource);
            }
        }
    }
}
