//! JSON protocol for headless game communication.
//!
//! The interactive runner communicates via JSON lines (one JSON object per
//! line):
//!
//! **Input (stdin):** Requests from a controller script
//! **Output (stdout):** Responses, one per request
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends requests as JSON lines
//! 3. Runner answers each request with exactly one response
//! 4. On `quit` (or end of input), outputs `{"type":"bye","tick":N}`
//!
//! Time is virtual: `tick` advances one tick interval per tick, `advance`
//! moves the clock by an arbitrary amount and lets the scheduler decide
//! whether that is a tick or a catch-up.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"command","command":{"cmd":"buy_unit","unit":"mining_drone"}}
//! <- {"type":"result","result":{"success":true,...}}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"ticked","ticks":60,"tick":60,"now":6000,...}
//! -> {"cmd":"advance","ms":7200000}
//! <- {"type":"advanced","tick":61,"offline":{...}}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":61,"resources":{...},...}
//! ```

use std::collections::BTreeMap;

use idle_core::automation::AutomationFlag;
use idle_core::clock::Millis;
use idle_core::commands::{Command, CommandResult};
use idle_core::ids::LocationId;
use idle_core::notifications::LoggedEvent;
use idle_core::offline::OfflineReport;
use idle_core::resources::ResourceKind;
use idle_core::simulation::Simulation;
use serde::{Deserialize, Serialize};

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Requests (controller -> runner)
// ============================================================================

/// Requests that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Advance by N tick intervals (default: 1).
    Tick {
        /// Number of ticks.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Move the virtual clock forward by `ms` and let the scheduler react.
    Advance {
        /// Milliseconds to skip.
        ms: Millis,
    },

    /// Current state without advancing time.
    Query,

    /// Apply a player command.
    Command {
        /// The command.
        command: Command,
    },

    /// Write a save, to `path` or the runner's default slot.
    Save {
        /// Save file.
        #[serde(default)]
        path: Option<String>,
    },

    /// Load a save and catch it up to the current virtual time.
    Load {
        /// Save file.
        path: String,
    },

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept requests.
    Ready {
        /// Protocol version.
        version: String,
        /// Tick of the loaded state.
        tick: u64,
    },

    /// Current game state.
    State(Box<StateView>),

    /// Outcome of a player command.
    Result {
        /// Engine result.
        result: CommandResult,
    },

    /// Ticks ran.
    Ticked {
        /// Ticks run for this request.
        ticks: u32,
        /// Tick counter afterwards.
        tick: u64,
        /// Virtual time afterwards.
        now: Millis,
        /// Missions resolved across these ticks.
        missions_resolved: usize,
        /// Whether the scheduler asked for a save along the way.
        save_due: bool,
    },

    /// The clock jumped.
    Advanced {
        /// Tick counter afterwards.
        tick: u64,
        /// Virtual time afterwards.
        now: Millis,
        /// Catch-up summary if the jump was long enough to count as an
        /// absence.
        #[serde(skip_serializing_if = "Option::is_none")]
        offline: Option<OfflineReport>,
    },

    /// Save written.
    Saved {
        /// Save file.
        path: String,
        /// Tick saved.
        tick: u64,
    },

    /// Save loaded.
    Loaded {
        /// Save file.
        path: String,
        /// Tick after catch-up.
        tick: u64,
        /// Catch-up summary.
        #[serde(skip_serializing_if = "Option::is_none")]
        offline: Option<OfflineReport>,
    },

    /// Error processing a request.
    Error {
        /// What went wrong.
        message: String,
        /// Request that failed, if it parsed.
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye {
        /// Final tick.
        tick: u64,
    },
}

// ============================================================================
// State Types
// ============================================================================

/// One resource line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    /// Stock.
    pub amount: f64,
    /// Storage cap, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
    /// Net change per second at the current rates.
    pub rate: f64,
}

/// Fleet position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelView {
    /// Current location (origin while under way).
    pub location: LocationId,
    /// Destination of the current voyage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<LocationId>,
    /// Voyage progress in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Instant-travel charges.
    pub warp_charges: u32,
}

/// Snapshot of the game for a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    /// Live ticks applied.
    pub tick: u64,
    /// Time the state was last advanced to.
    pub now: Millis,
    /// Resources by kind.
    pub resources: BTreeMap<ResourceKind, ResourceView>,
    /// Owned units by kind.
    pub units: BTreeMap<String, u64>,
    /// Missions in flight.
    pub missions_in_flight: usize,
    /// Live derelicts.
    pub derelicts: usize,
    /// Fleet position.
    pub travel: TravelView,
    /// Enabled automation behaviors.
    pub automation: Vec<AutomationFlag>,
    /// Dark matter a reset would pay now.
    pub pending_prestige: f64,
    /// Resets performed.
    pub runs_completed: u64,
    /// Most recent log entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_event: Option<LoggedEvent>,
    /// State hash for determinism checks.
    pub hash: u64,
}

impl StateView {
    /// Build a view of `sim` at `now`.
    #[must_use]
    pub fn capture(sim: &Simulation, now: Millis) -> Self {
        let state = sim.state();
        let rates = sim.production_rates();
        let resources = state
            .ledger
            .iter()
            .map(|(kind, entry)| {
                let view = ResourceView {
                    amount: entry.amount,
                    cap: entry.cap,
                    rate: rates.get(&kind).copied().unwrap_or(0.0),
                };
                (kind, view)
            })
            .collect();
        let voyage = state.travel.voyage.as_ref();
        Self {
            tick: state.tick,
            now,
            resources,
            units: state
                .units
                .iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
            missions_in_flight: state.missions.len(),
            derelicts: state.derelicts.len(),
            travel: TravelView {
                location: state.travel.location.clone(),
                destination: voyage.map(|v| v.to.clone()),
                progress: voyage.map(|v| v.progress(now)),
                warp_charges: state.travel.warp_charges,
            },
            automation: AutomationFlag::ALL
                .into_iter()
                .filter(|&flag| state.automation.is_enabled(flag))
                .collect(),
            pending_prestige: sim.pending_prestige_gain(),
            runs_completed: state.run.runs_completed,
            latest_event: sim.notifications().latest().cloned(),
            hash: sim.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create a state response.
    #[must_use]
    pub fn state(sim: &Simulation, now: Millis) -> Self {
        Self::State(Box::new(StateView::capture(sim, now)))
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Request {
    /// Parse from a JSON line.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the line is not a request.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Request name for error responses.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Advance { .. } => "advance",
            Self::Query => "query",
            Self::Command { .. } => "command",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Quit => "quit",
        }
    }
}
