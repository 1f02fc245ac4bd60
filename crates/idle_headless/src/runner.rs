//! Headless game runner implementation.
//!
//! Three ways to drive a [`Simulation`] without a UI:
//!
//! - [`HeadlessRunner`] answers JSON-line [`Request`]s over a virtual clock.
//! - [`run_live`] sleeps until the scheduler's next firing, like a real
//!   host, and writes a save whenever the scheduler asks for one.
//! - [`run_batch`] and [`absence_from_save`] run fixed workloads and return
//!   serializable summaries.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use idle_core::automation::AutomationFlag;
use idle_core::clock::Millis;
use idle_core::commands::Command;
use idle_core::config::EngineConfig;
use idle_core::data::GameData;
use idle_core::error::Result as GameResult;
use idle_core::offline::OfflineReport;
use idle_core::resources::ResourceKind;
use idle_core::rng::RandomSource;
use idle_core::simulation::{Simulation, Step, TickReport};
use idle_core::snapshot::SaveSnapshot;
use serde::{Deserialize, Serialize};

use crate::protocol::{Request, Response};
use crate::save_store::{SaveError, SaveStore};

// ============================================================================
// Interactive
// ============================================================================

/// JSON-lines session over a virtual clock.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
    now: Millis,
    save: Option<SaveStore>,
}

impl HeadlessRunner {
    /// Session around `sim`, with the virtual clock at `now`. The
    /// scheduler is started.
    pub fn new(mut sim: Simulation, now: Millis) -> Self {
        sim.start(now);
        Self {
            sim,
            now,
            save: None,
        }
    }

    /// Default slot for `save` requests without a path, and for autosaves.
    #[must_use]
    pub fn with_save(mut self, store: SaveStore) -> Self {
        self.save = Some(store);
        self
    }

    /// The simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Virtual time.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Answer one request. The flag is `true` once the session should end.
    pub fn handle(&mut self, request: Request) -> (Response, bool) {
        let name = request.name();
        let response = match request {
            Request::Tick { count } => self.tick(count),
            Request::Advance { ms } => {
                self.now = self.now.saturating_add(ms);
                let offline = match self.sim.advance(self.now) {
                    Step::CaughtUp { offline, save_due, .. } => {
                        self.autosave(save_due);
                        Some(offline)
                    }
                    Step::Ticked { save_due, .. } => {
                        self.autosave(save_due);
                        None
                    }
                    Step::Stopped | Step::Waiting { .. } => None,
                };
                Response::Advanced {
                    tick: self.sim.state().tick,
                    now: self.now,
                    offline,
                }
            }
            Request::Query => Response::state(&self.sim, self.now),
            Request::Command { command } => Response::Result {
                result: self.sim.execute(command, self.now),
            },
            Request::Save { path } => match path.map(SaveStore::new).or_else(|| self.save.clone()) {
                Some(store) => match store.save(&self.sim) {
                    Ok(()) => Response::Saved {
                        path: store.path().display().to_string(),
                        tick: self.sim.state().tick,
                    },
                    Err(e) => Response::error(e.to_string(), Some(name)),
                },
                None => Response::error("No save path given and no default slot", Some(name)),
            },
            Request::Load { path } => {
                let store = SaveStore::new(&path);
                match store.load_into(&mut self.sim, self.now) {
                    Ok(offline) => {
                        self.now = self.now.max(self.sim.state().last_known_timestamp);
                        Response::Loaded {
                            path,
                            tick: self.sim.state().tick,
                            offline,
                        }
                    }
                    Err(e) => Response::error(e.to_string(), Some(name)),
                }
            }
            Request::Quit => {
                return (
                    Response::Bye {
                        tick: self.sim.state().tick,
                    },
                    true,
                )
            }
        };
        (response, false)
    }

    fn tick(&mut self, count: u32) -> Response {
        let interval = self.sim.scheduler().interval_ms();
        let mut missions_resolved = 0;
        let mut any_save = false;
        for _ in 0..count {
            self.now = self.now.saturating_add(interval);
            match self.sim.advance(self.now) {
                Step::Ticked { report, save_due } | Step::CaughtUp { report, save_due, .. } => {
                    missions_resolved += report.missions.len();
                    any_save |= save_due;
                }
                Step::Stopped | Step::Waiting { .. } => {}
            }
        }
        self.autosave(any_save);
        Response::Ticked {
            ticks: count,
            tick: self.sim.state().tick,
            now: self.now,
            missions_resolved,
            save_due: any_save,
        }
    }

    fn autosave(&self, due: bool) {
        if !due {
            return;
        }
        if let Some(store) = &self.save {
            if let Err(e) = store.save(&self.sim) {
                tracing::warn!(error = %e, "Autosave failed");
            }
        }
    }

    /// Serve requests from `input` until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        tracing::info!(tick = self.sim.state().tick, "Starting interactive session");
        output.write_all(Response::ready(self.sim.state().tick).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (response, quit) = match Request::from_json(line) {
                Ok(request) => {
                    tracing::debug!(cmd = request.name(), "Request");
                    self.handle(request)
                }
                Err(e) => (Response::error(format!("Invalid request: {e}"), None), false),
            };
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;
            if quit {
                return Ok(());
            }
        }

        let bye = Response::Bye {
            tick: self.sim.state().tick,
        };
        output.write_all(bye.to_json_line().as_bytes())?;
        output.flush()
    }
}

// ============================================================================
// Live
// ============================================================================

/// What a live session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiveSummary {
    /// Ticks run.
    pub ticks: u64,
    /// Ticks preceded by an offline catch-up.
    pub catch_ups: u64,
    /// Saves written, including the final one.
    pub saves: u64,
    /// Tick counter at the end.
    pub final_tick: u64,
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn wall_clock_ms() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| Millis::try_from(d.as_millis()).unwrap_or(Millis::MAX))
}

/// Drive `sim` in real time until `clock()` reaches `until`.
///
/// Between firings the loop calls `sleep` with the milliseconds left until
/// the next one. A save is written whenever the scheduler flags one as due,
/// and once more at the end.
///
/// # Errors
///
/// Returns [`SaveError`] if a save cannot be written.
pub fn run_live<C, S>(
    sim: &mut Simulation,
    until: Millis,
    store: Option<&SaveStore>,
    mut clock: C,
    mut sleep: S,
) -> Result<LiveSummary, SaveError>
where
    C: FnMut() -> Millis,
    S: FnMut(Millis),
{
    let mut summary = LiveSummary::default();
    sim.start(clock());
    loop {
        let now = clock();
        if now >= until {
            break;
        }
        match sim.advance(now) {
            Step::Stopped => break,
            Step::Waiting { next_fire_at } => sleep(next_fire_at.min(until).saturating_sub(now)),
            step => {
                summary.ticks += 1;
                if matches!(step, Step::CaughtUp { .. }) {
                    summary.catch_ups += 1;
                }
                if let (true, Some(store)) = (step.save_due(), store) {
                    store.save(sim)?;
                    summary.saves += 1;
                }
            }
        }
    }
    sim.stop();
    if let Some(store) = store {
        store.save(sim)?;
        summary.saves += 1;
    }
    summary.final_tick = sim.state().tick;
    tracing::info!(
        ticks = summary.ticks,
        catch_ups = summary.catch_ups,
        saves = summary.saves,
        "Live session finished"
    );
    Ok(summary)
}

// ============================================================================
// Batch
// ============================================================================

/// Result of a batch run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Ticks requested.
    pub ticks: u64,
    /// Tick counter at the end.
    pub final_tick: u64,
    /// Simulated time covered.
    pub elapsed_ms: Millis,
    /// Missions that succeeded.
    pub missions_succeeded: usize,
    /// Missions that failed.
    pub missions_failed: usize,
    /// Derelicts from passive spawn checks.
    pub derelicts_spawned: usize,
    /// Missions launched by automation.
    pub automation_launches: usize,
    /// Voyages completed.
    pub arrivals: usize,
    /// Final stocks.
    pub resources: BTreeMap<ResourceKind, f64>,
    /// Final unit counts.
    pub units: BTreeMap<String, u64>,
    /// Dark matter a reset would pay.
    pub pending_prestige: f64,
    /// Final state hash.
    pub hash: u64,
}

impl BatchSummary {
    fn record(&mut self, report: &TickReport) {
        let succeeded = report.missions.iter().filter(|m| m.succeeded()).count();
        self.missions_succeeded += succeeded;
        self.missions_failed += report.missions.len() - succeeded;
        self.derelicts_spawned += usize::from(report.spawned.is_some());
        self.automation_launches += report.automation.len();
        self.arrivals += usize::from(report.arrival.is_some());
    }
}

/// Switch on every automation behavior `sim` has unlocked. Returns the
/// flags that were refused.
pub fn enable_automation(sim: &mut Simulation, now: Millis) -> Vec<AutomationFlag> {
    AutomationFlag::ALL
        .into_iter()
        .filter(|&flag| {
            let result = sim.execute(Command::SetAutomation { flag, enabled: true }, now);
            if !result.success {
                tracing::debug!(?flag, reason = %result.message, "Automation not available");
            }
            !result.success
        })
        .collect()
}

/// Run `ticks` live ticks back to back after the last known timestamp.
pub fn run_batch(sim: &mut Simulation, ticks: u64) -> BatchSummary {
    let interval = sim.config().tick_interval_ms();
    let start = sim.state().last_known_timestamp;
    let mut now = start;
    let mut summary = BatchSummary {
        ticks,
        ..BatchSummary::default()
    };
    for _ in 0..ticks {
        now = now.saturating_add(interval);
        let report = sim.tick(now);
        summary.record(&report);
    }

    let state = sim.state();
    summary.final_tick = state.tick;
    summary.elapsed_ms = now - start;
    summary.resources = state.ledger.iter().map(|(kind, entry)| (kind, entry.amount)).collect();
    summary.units = state
        .units
        .iter()
        .map(|(kind, count)| (kind.to_string(), count))
        .collect();
    summary.pending_prestige = sim.pending_prestige_gain();
    summary.hash = sim.state_hash();
    tracing::info!(
        ticks,
        missions = summary.missions_succeeded + summary.missions_failed,
        hash = summary.hash,
        "Batch finished"
    );
    summary
}

// ============================================================================
// Offline
// ============================================================================

/// Restore a JSON save and pretend `away_ms` passed since it was written.
///
/// # Errors
///
/// Returns a parse or validation error from the engine.
pub fn absence_from_save(
    data: GameData,
    config: EngineConfig,
    text: &str,
    away_ms: Millis,
    rng: Box<dyn RandomSource>,
) -> GameResult<(Simulation, Option<OfflineReport>)> {
    let snapshot = SaveSnapshot::from_json(text)?;
    let back_at = snapshot.state.last_known_timestamp.saturating_add(away_ms);
    let mut sim = Simulation::from_state(data, config, snapshot.state, rng)?;
    let report = sim.catch_up(back_at);
    Ok((sim, report))
}

/// Default save slot next to the working directory.
#[must_use]
pub fn default_save_path() -> PathBuf {
    PathBuf::from("idle_save.json")
}
