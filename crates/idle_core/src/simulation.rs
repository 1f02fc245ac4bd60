//! The engine object.
//!
//! [`Simulation`] owns the content tables, the engine configuration, the
//! [`GameState`], the tick scheduler, the notification log and the random
//! source. Hosts drive it with timestamps; nothing in here reads a clock.
//!
//! # Tick Order
//!
//! Each live tick runs, in this order:
//! 1. **Production** - one fixed period (`1 / ticks_per_second`) of output
//! 2. **Travel** - arrival if the voyage is due
//! 3. **Missions** - every due mission, in launch order
//! 4. **Expiry** - derelicts and contracts past their time
//! 5. **Spawning** - the periodic passive derelict check
//! 6. **Automation** - one pass of every enabled behavior
//!
//! Production reads the modifier snapshot as it stands at tick start, so a
//! purchase made between ticks only affects later ticks.
//!
//! # Example
//!
//! ```
//! use idle_core::prelude::*;
//!
//! let mut sim = Simulation::with_seed(GameData::standard(), EngineConfig::default(), 7, 0).unwrap();
//! let result = sim.execute(
//!     Command::BuyUnit {
//!         unit: "mining_drone".into(),
//!         amount: BuyAmount::Count(1),
//!     },
//!     0,
//! );
//! assert!(result.success);
//!
//! sim.start(0);
//! sim.advance(100);
//! assert_eq!(sim.state().tick, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::automation::{self, AutoLaunch, AutomationFlag};
use crate::clock::Millis;
use crate::commands::{BuyAmount, Command, CommandEffect, CommandResult};
use crate::config::EngineConfig;
use crate::contracts;
use crate::data::{GameData, MissionAction, MissionKind};
use crate::derelicts;
use crate::error::{Rejection, Result};
use crate::formulas;
use crate::ids::{ContractId, DerelictId, FormationId, LocationId, MissionId, UnitKind, UpgradeId};
use crate::missions::{self, MissionOutcome, MissionReport, MissionRequest, MissionTarget, Payout};
use crate::notifications::{GameEvent, Notifications};
use crate::offline::{self, OfflineReport};
use crate::prestige::{self, PrestigeSummary};
use crate::production;
use crate::resources::{Cost, ResourceKind};
use crate::rng::{ChaChaSource, RandomSource};
use crate::scheduler::{Firing, TickScheduler};
use crate::snapshot::SaveSnapshot;
use crate::state::GameState;
use crate::travel::{self, Arrival, Departure};
use crate::units::{self, UnitPurchase};
use crate::upgrades::{self, UpgradePurchase};

/// Everything one live tick did.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number after the tick.
    pub tick: u64,
    /// When it ran.
    pub at: Millis,
    /// Resource change applied by production.
    pub production: BTreeMap<ResourceKind, f64>,
    /// Voyage completed this tick.
    pub arrival: Option<Arrival>,
    /// Missions resolved this tick.
    pub missions: Vec<MissionReport>,
    /// Derelicts that drifted away.
    pub derelicts_expired: Vec<DerelictId>,
    /// Contracts whose deadline passed.
    pub contracts_expired: Vec<ContractId>,
    /// Derelict from the passive spawn check.
    pub spawned: Option<DerelictId>,
    /// Missions launched by automation.
    pub automation: Vec<AutoLaunch>,
}

/// What [`Simulation::advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The scheduler is stopped.
    Stopped,
    /// Nothing due yet.
    Waiting {
        /// When the next tick is due.
        next_fire_at: Millis,
    },
    /// One live tick ran.
    Ticked {
        /// The tick.
        report: TickReport,
        /// The host should write a save.
        save_due: bool,
    },
    /// A long gap was caught up, then one live tick ran.
    CaughtUp {
        /// The catch-up.
        offline: OfflineReport,
        /// The tick after it.
        report: TickReport,
        /// The host should write a save.
        save_due: bool,
    },
}

impl Step {
    /// Whether the host should write a save now.
    #[must_use]
    pub const fn save_due(&self) -> bool {
        matches!(
            self,
            Self::Ticked { save_due: true, .. } | Self::CaughtUp { save_due: true, .. }
        )
    }
}

/// The game engine.
#[derive(Debug)]
pub struct Simulation {
    data: GameData,
    config: EngineConfig,
    state: GameState,
    scheduler: TickScheduler,
    notifications: Notifications,
    rng: Box<dyn RandomSource>,
}

impl Simulation {
    /// New game at `now` with an entropy-seeded random source.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidContent`](crate::error::GameError::InvalidContent) or
    /// [`InvalidConfig`](crate::error::GameError::InvalidConfig)
    /// if the tables or the configuration fail validation.
    pub fn new(data: GameData, config: EngineConfig, now: Millis) -> Result<Self> {
        Self::with_random(data, config, Box::new(ChaChaSource::from_entropy()), now)
    }

    /// New game at `now` with a seeded random source.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::new`].
    pub fn with_seed(data: GameData, config: EngineConfig, seed: u64, now: Millis) -> Result<Self> {
        Self::with_random(data, config, Box::new(ChaChaSource::new(seed)), now)
    }

    /// New game at `now` drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::new`].
    pub fn with_random(
        data: GameData,
        config: EngineConfig,
        rng: Box<dyn RandomSource>,
        now: Millis,
    ) -> Result<Self> {
        let state = GameState::new(&data, &config, now);
        Self::from_state(data, config, state, rng)
    }

    /// Engine around an existing state. The state is normalized against
    /// `data` but not caught up.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::new`].
    pub fn from_state(
        data: GameData,
        config: EngineConfig,
        mut state: GameState,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        data.ensure_valid()?;
        config.ensure_valid()?;
        state.normalize(&data);
        Ok(Self {
            scheduler: TickScheduler::from_config(&config),
            notifications: Notifications::from_config(&config),
            data,
            config,
            state,
            rng,
        })
    }

    /// Engine restored from a JSON save and caught up to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::error::GameError::ParseError) if the text is not a save, or a
    /// validation error as in [`Simulation::new`].
    pub fn from_json(
        data: GameData,
        config: EngineConfig,
        text: &str,
        rng: Box<dyn RandomSource>,
        now: Millis,
    ) -> Result<(Self, Option<OfflineReport>)> {
        let snapshot = SaveSnapshot::from_json(text)?;
        let mut sim = Self::from_state(data, config, snapshot.state, rng)?;
        let report = sim.catch_up(now);
        Ok((sim, report))
    }

    /// Content tables.
    #[must_use]
    pub const fn data(&self) -> &GameData {
        &self.data
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state, bypassing command validation. Meant for tools and
    /// test setup.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Tick scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Event log and toasts.
    #[must_use]
    pub const fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Event log and toasts, for pruning toasts.
    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Start ticking. Returns `false` if already running.
    pub fn start(&mut self, now: Millis) -> bool {
        self.scheduler.start(now)
    }

    /// Stop ticking. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        self.scheduler.stop()
    }

    /// Let the scheduler decide what `now` calls for, and do it.
    pub fn advance(&mut self, now: Millis) -> Step {
        let step = match self.scheduler.poll(now) {
            Firing::Stopped => return Step::Stopped,
            Firing::NotDue { next_fire_at } => return Step::Waiting { next_fire_at },
            Firing::Tick { save_due, .. } => Step::Ticked {
                report: self.tick(now),
                save_due,
            },
            Firing::Gap { save_due, .. } => match self.catch_up(now) {
                Some(offline) => Step::CaughtUp {
                    offline,
                    report: self.tick(now),
                    save_due,
                },
                None => Step::Ticked {
                    report: self.tick(now),
                    save_due,
                },
            },
        };
        if step.save_due() {
            self.notifications.push(GameEvent::AutosaveDue, now);
        }
        step
    }

    /// Run one live tick at `now`, whether or not the scheduler is due.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        let production = production::advance(&mut self.state, &self.data, self.config.tick_secs());
        let arrival = travel::resolve_arrival(&mut self.state, now);
        let missions = missions::resolve_due(&mut self.state, &self.data, self.rng.as_mut(), now);

        let expired = self.state.derelicts.expire(now);
        let contracts_expired = self.state.contracts.expire(now);
        let spawned = derelicts::passive_spawn(
            &mut self.state,
            &self.data,
            &self.config,
            self.rng.as_mut(),
            now,
        );
        let automation = automation::run_pass(&mut self.state, &self.data, now);

        self.state.tick += 1;
        self.state.last_known_timestamp = now;

        if let Some(arrival) = &arrival {
            self.notifications.push(
                GameEvent::TravelArrived {
                    location: arrival.location.clone(),
                },
                now,
            );
        }
        self.notify_missions(&missions, now);
        for derelict in &expired {
            self.notifications.push(
                GameEvent::DerelictExpired {
                    derelict: derelict.id,
                    kind: derelict.kind.clone(),
                },
                now,
            );
        }
        for contract in &contracts_expired {
            self.notifications.push(
                GameEvent::ContractExpired {
                    contract: contract.clone(),
                },
                now,
            );
        }
        if let Some(id) = spawned {
            self.notify_spawn(id, now);
        }
        for launch in &automation {
            self.notify_launch(launch.mission, now);
        }
        self.notifications.watch_storage(&self.state.ledger, now);

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.state.tick, state_hash = hash, "Simulation state hash");
        }

        TickReport {
            tick: self.state.tick,
            at: now,
            production,
            arrival,
            missions,
            derelicts_expired: expired.into_iter().map(|d| d.id).collect(),
            contracts_expired,
            spawned,
            automation,
        }
    }

    /// Apply the absence since the last known timestamp in one step.
    ///
    /// Returns `None` when the absence is too short to count.
    pub fn catch_up(&mut self, now: Millis) -> Option<OfflineReport> {
        let report = offline::catch_up(
            &mut self.state,
            &self.data,
            &self.config,
            self.rng.as_mut(),
            now,
        )?;
        if let Some(arrival) = &report.arrival {
            self.notifications.push(
                GameEvent::TravelArrived {
                    location: arrival.location.clone(),
                },
                now,
            );
        }
        self.notify_missions(&report.missions, now);
        for contract in &report.contracts_expired {
            self.notifications.push(
                GameEvent::ContractExpired {
                    contract: contract.clone(),
                },
                now,
            );
        }
        self.notifications.push(
            GameEvent::OfflineProgress {
                away_ms: report.away_ms,
                efficiency: report.efficiency,
            },
            now,
        );
        Some(report)
    }

    fn notify_missions(&mut self, reports: &[MissionReport], now: Millis) {
        for report in reports {
            let mission = report.mission.id;
            let kind = report.mission.kind;
            match &report.outcome {
                MissionOutcome::Succeeded(payout) => {
                    self.notifications
                        .push(GameEvent::MissionSucceeded { mission, kind }, now);
                    match payout {
                        Payout::Discovery {
                            derelict: Some(id), ..
                        } => self.notify_spawn(*id, now),
                        Payout::Colony { location } => self.notifications.push(
                            GameEvent::ColonyEstablished {
                                location: location.clone(),
                            },
                            now,
                        ),
                        Payout::Discovery { derelict: None, .. } | Payout::Salvage { .. } => {}
                    }
                }
                MissionOutcome::Failed(_) => self.notifications.push(
                    GameEvent::MissionFailed {
                        mission,
                        kind,
                        refund: report.refund,
                    },
                    now,
                ),
            }
        }
    }

    fn notify_spawn(&mut self, id: DerelictId, now: Millis) {
        if let Some(derelict) = self.state.derelicts.get(id) {
            let event = GameEvent::DerelictSpawned {
                derelict: id,
                kind: derelict.kind.clone(),
                rarity: derelict.rarity,
                location: derelict.location.clone(),
            };
            self.notifications.push(event, now);
        }
    }

    fn notify_launch(&mut self, id: MissionId, now: Millis) {
        if let Some(mission) = self.state.missions.get(id) {
            let event = GameEvent::MissionStarted {
                mission: id,
                kind: mission.kind,
                ends_at: mission.ends_at,
            };
            self.notifications.push(event, now);
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Validate and apply `command` at `now`.
    pub fn execute(&mut self, command: Command, now: Millis) -> CommandResult {
        let name = command.name();
        match self.apply(command, now) {
            Ok((effect, message)) => {
                tracing::debug!(command = name, "Command applied");
                CommandResult::applied(effect, message)
            }
            Err(reason) => {
                tracing::debug!(command = name, %reason, "Command rejected");
                CommandResult::rejected(reason)
            }
        }
    }

    fn apply(
        &mut self,
        command: Command,
        now: Millis,
    ) -> std::result::Result<(CommandEffect, String), Rejection> {
        let before = self.notifications.total();
        let effect = match command {
            Command::BuyUnit { unit, amount } => {
                CommandEffect::UnitsBought(self.buy_unit(&unit, amount, now)?)
            }
            Command::SetUnitEnabled { unit, enabled } => {
                units::set_enabled(&mut self.state, &self.data, &unit, enabled)?;
                CommandEffect::UnitToggled { unit, enabled }
            }
            Command::PurchaseUpgrade { upgrade } => {
                CommandEffect::UpgradePurchased(self.purchase_upgrade(&upgrade, now)?)
            }
            Command::SetFormation { formation } => {
                self.set_formation(formation.as_ref(), now)?;
                CommandEffect::FormationChanged { formation }
            }
            Command::StartMission {
                kind,
                unit,
                target,
                action,
            } => {
                let mission = self.start_mission(kind, unit, target, action, now)?;
                let ends_at = self.state.missions.get(mission).map_or(now, |m| m.ends_at);
                CommandEffect::MissionStarted { mission, ends_at }
            }
            Command::CancelMission { mission } => CommandEffect::MissionCancelled {
                refund: self.cancel_mission(mission, now)?,
            },
            Command::StartTravel {
                destination,
                instant,
            } => CommandEffect::TravelStarted(self.start_travel(&destination, instant, now)?),
            Command::CancelTravel => CommandEffect::TravelCancelled {
                refund: self.cancel_travel(now)?,
            },
            Command::SetAutomation { flag, enabled } => {
                self.set_automation(flag, enabled, now)?;
                CommandEffect::AutomationChanged { flag, enabled }
            }
            Command::SetDerelictCap { cap } => {
                self.state.automation.derelict_cap = cap;
                CommandEffect::DerelictCapChanged { cap }
            }
            Command::AcceptContract { contract } => CommandEffect::ContractAccepted {
                deadline: self.accept_contract(&contract, now)?,
            },
            Command::FulfillContract { contract } => CommandEffect::ContractFulfilled {
                reward: self.fulfill_contract(&contract, now)?,
            },
            Command::PrestigeReset => CommandEffect::Prestige(self.prestige_reset(now)?),
        };
        let message = match &effect {
            CommandEffect::UnitToggled { unit, enabled } => {
                format!("{unit} {}", if *enabled { "enabled" } else { "disabled" })
            }
            CommandEffect::DerelictCapChanged { cap } => format!("Derelict cap set to {cap}"),
            _ if self.notifications.total() > before => self
                .notifications
                .latest()
                .map_or_else(String::new, |logged| logged.event.message()),
            _ => String::new(),
        };
        Ok((effect, message))
    }

    /// Buy units.
    ///
    /// # Errors
    ///
    /// Refused for unknown kinds, zero amounts and short ledgers.
    pub fn buy_unit(
        &mut self,
        unit: &UnitKind,
        amount: BuyAmount,
        now: Millis,
    ) -> std::result::Result<UnitPurchase, Rejection> {
        let purchase = units::buy(&mut self.state, &self.data, unit, amount)?;
        self.notifications.push(
            GameEvent::UnitsBought {
                unit: purchase.unit.clone(),
                amount: purchase.amount,
                owned: purchase.owned,
            },
            now,
        );
        Ok(purchase)
    }

    /// Buy the next level of an upgrade.
    ///
    /// # Errors
    ///
    /// Refused for unknown, maxed, locked or unaffordable upgrades.
    pub fn purchase_upgrade(
        &mut self,
        upgrade: &UpgradeId,
        now: Millis,
    ) -> std::result::Result<UpgradePurchase, Rejection> {
        let purchase = upgrades::purchase(&mut self.state, &self.data, upgrade)?;
        self.notifications.push(
            GameEvent::UpgradePurchased {
                upgrade: purchase.id.clone(),
                level: purchase.level,
            },
            now,
        );
        Ok(purchase)
    }

    /// Activate a formation, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Refused for unknown or locked formations.
    pub fn set_formation(
        &mut self,
        formation: Option<&FormationId>,
        now: Millis,
    ) -> std::result::Result<(), Rejection> {
        upgrades::set_formation(&mut self.state, &self.data, formation)?;
        self.notifications.push(
            GameEvent::FormationChanged {
                formation: formation.cloned(),
            },
            now,
        );
        Ok(())
    }

    /// Launch a mission at `now`.
    ///
    /// # Errors
    ///
    /// Refused with the first failed check of [`missions::plan_mission`].
    pub fn start_mission(
        &mut self,
        kind: MissionKind,
        unit: UnitKind,
        target: MissionTarget,
        action: MissionAction,
        now: Millis,
    ) -> std::result::Result<MissionId, Rejection> {
        let request = MissionRequest {
            kind,
            unit,
            target,
            action,
        };
        let plan = missions::plan_mission(&self.state, &self.data, &request)?;
        let id = missions::launch(&mut self.state, plan, now)?;
        self.notify_launch(id, now);
        Ok(id)
    }

    /// Recall a mission. Returns the fuel refunded.
    ///
    /// # Errors
    ///
    /// [`Rejection::UnknownMission`] if it is not in flight.
    pub fn cancel_mission(&mut self, mission: MissionId, now: Millis) -> std::result::Result<f64, Rejection> {
        let refund = missions::cancel(&mut self.state, mission, self.config.mission_cancel_refund)?;
        self.notifications
            .push(GameEvent::MissionCancelled { mission, refund }, now);
        Ok(refund)
    }

    /// Depart for `destination`, or warp there with `instant`.
    ///
    /// # Errors
    ///
    /// Refused with the first failed check of [`travel::plan_travel`].
    pub fn start_travel(
        &mut self,
        destination: &LocationId,
        instant: bool,
        now: Millis,
    ) -> std::result::Result<Departure, Rejection> {
        let plan = travel::plan_travel(&self.state, &self.data, destination, instant)?;
        let departure = travel::depart(&mut self.state, plan, now)?;
        let event = match &departure {
            Departure::Underway {
                destination,
                arrives_at,
            } => GameEvent::TravelStarted {
                destination: destination.clone(),
                arrives_at: *arrives_at,
            },
            Departure::Warped { destination } => GameEvent::Warped {
                destination: destination.clone(),
            },
        };
        self.notifications.push(event, now);
        Ok(departure)
    }

    /// Abandon the voyage. Returns the fuel refunded.
    ///
    /// # Errors
    ///
    /// [`Rejection::NotTraveling`] when no voyage is under way.
    pub fn cancel_travel(&mut self, now: Millis) -> std::result::Result<f64, Rejection> {
        let refund = travel::cancel(&mut self.state, self.config.travel_cancel_refund)?;
        self.notifications
            .push(GameEvent::TravelCancelled { refund }, now);
        Ok(refund)
    }

    /// Switch an automation behavior on or off.
    ///
    /// # Errors
    ///
    /// [`Rejection::CapabilityLocked`] when enabling a locked behavior.
    pub fn set_automation(
        &mut self,
        flag: AutomationFlag,
        enabled: bool,
        now: Millis,
    ) -> std::result::Result<(), Rejection> {
        automation::set_flag(&mut self.state, flag, enabled)?;
        self.notifications
            .push(GameEvent::AutomationToggled { flag, enabled }, now);
        Ok(())
    }

    /// Accept a contract. Returns its deadline.
    ///
    /// # Errors
    ///
    /// Refused for unknown or already active contracts.
    pub fn accept_contract(&mut self, contract: &ContractId, now: Millis) -> std::result::Result<Millis, Rejection> {
        let deadline = contracts::accept(&mut self.state, &self.data, contract, now)?;
        self.notifications.push(
            GameEvent::ContractAccepted {
                contract: contract.clone(),
                deadline,
            },
            now,
        );
        Ok(deadline)
    }

    /// Deliver a contract. Returns the reward credited.
    ///
    /// # Errors
    ///
    /// Refused for inactive contracts and short ledgers.
    pub fn fulfill_contract(&mut self, contract: &ContractId, now: Millis) -> std::result::Result<Cost, Rejection> {
        let reward = contracts::fulfill(&mut self.state, &self.data, contract, now)?;
        self.notifications.push(
            GameEvent::ContractFulfilled {
                contract: contract.clone(),
            },
            now,
        );
        Ok(reward)
    }

    /// End the run for dark matter.
    ///
    /// # Errors
    ///
    /// [`Rejection::NothingToGain`] when the reset would award nothing.
    pub fn prestige_reset(&mut self, now: Millis) -> std::result::Result<PrestigeSummary, Rejection> {
        let summary = prestige::reset(&mut self.state, &self.data, &self.config, now)?;
        self.notifications.push(
            GameEvent::PrestigeReset {
                gain: summary.gain,
                runs_completed: summary.runs_completed,
            },
            now,
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Net change per second at full input.
    #[must_use]
    pub fn production_rates(&self) -> BTreeMap<ResourceKind, f64> {
        production::rates_per_second(
            &self.data.units,
            &self.state.units,
            &self.state.modifiers,
            &self.state.ledger,
        )
    }

    /// Price of the next single `unit`.
    ///
    /// # Errors
    ///
    /// [`Rejection::UnknownUnit`] for unknown kinds.
    pub fn unit_price(&self, unit: &UnitKind) -> std::result::Result<Cost, Rejection> {
        units::next_price(&self.state, &self.data, unit)
    }

    /// How many of `unit` the ledger can pay for.
    ///
    /// # Errors
    ///
    /// [`Rejection::UnknownUnit`] for unknown kinds.
    pub fn max_affordable(&self, unit: &UnitKind) -> std::result::Result<u64, Rejection> {
        units::affordable(&self.state, &self.data, unit)
    }

    /// Dark matter a reset would award now.
    #[must_use]
    pub fn pending_prestige_gain(&self) -> f64 {
        prestige::pending_gain(&self.state, &self.config)
    }

    /// Success chance of an in-flight mission, as it would resolve now.
    #[must_use]
    pub fn mission_success_chance(&self, mission: MissionId) -> Option<f64> {
        let mission = self.state.missions.get(mission)?;
        missions::success_chance(&self.state, &self.data, mission).ok()
    }

    /// Seconds until `cost` is affordable at current rates, or `None` if
    /// some resource in it is not being produced.
    #[must_use]
    pub fn seconds_until_affordable(&self, cost: &Cost) -> Option<f64> {
        let rates = self.production_rates();
        cost.iter().try_fold(0.0_f64, |longest, (kind, amount)| {
            let missing = formulas::whole_units(amount) - self.state.ledger.amount(kind);
            if missing <= 0.0 {
                return Some(longest);
            }
            let rate = rates.get(&kind).copied().unwrap_or(0.0);
            (rate > 0.0).then(|| longest.max(missing / rate))
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Current state as a save.
    #[must_use]
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot::new(&self.state)
    }

    /// Current state as JSON save text.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::error::GameError::SerializeError) if encoding fails.
    pub fn export_json(&self) -> Result<String> {
        self.snapshot().to_json()
    }

    /// Replace the state with a JSON save and catch it up to `now`.
    ///
    /// On a parse failure the current state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::error::GameError::ParseError) if the text is not a save.
    pub fn import_json(&mut self, text: &str, now: Millis) -> Result<Option<OfflineReport>> {
        let snapshot = SaveSnapshot::from_json(text)?;
        self.restore(snapshot.state, now);
        Ok(self.catch_up(now))
    }

    /// Current state as a binary checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::error::GameError::SerializeError) if encoding fails.
    pub fn checkpoint(&self) -> Result<Vec<u8>> {
        self.snapshot().to_bytes()
    }

    /// Roll back to a binary checkpoint. No catch-up is applied.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::error::GameError::ParseError) if the bytes are not a checkpoint.
    pub fn rollback(&mut self, bytes: &[u8]) -> Result<()> {
        let snapshot = SaveSnapshot::from_bytes(bytes)?;
        self.restore(snapshot.state, snapshot.saved_at);
        Ok(())
    }

    fn restore(&mut self, mut state: GameState, now: Millis) {
        state.normalize(&self.data);
        tracing::info!(tick = state.tick, saved_at = state.last_known_timestamp, "State restored");
        self.state = state;
        if self.scheduler.stop() {
            self.scheduler.start(now);
        }
    }

    /// Hash of the encoded state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match bincode::serialize(&self.state) {
            Ok(bytes) => bytes.hash(&mut hasher),
            Err(e) => {
                tracing::warn!(error = %e, "State could not be encoded for hashing");
                self.state.tick.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::modifiers::{targets, Effect, ModifierSource};
    use crate::rng::ScriptedRandom;

    fn sim() -> Simulation {
        Simulation::with_seed(GameData::standard(), EngineConfig::default(), 1, 0).unwrap()
    }

    /// Constant draws, and no passive spawn check within a test's span.
    fn scripted(draw: f64) -> Simulation {
        let config = EngineConfig {
            spawn_check_interval_secs: 1.0e7,
            ..EngineConfig::default()
        };
        Simulation::with_random(
            GameData::standard(),
            config,
            Box::new(ScriptedRandom::constant(draw)),
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = EngineConfig {
            ticks_per_second: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Simulation::with_seed(GameData::standard(), config, 1, 0),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scheduler_drives_ticks() {
        let mut sim = sim();
        assert_eq!(sim.advance(100), Step::Stopped);
        sim.start(0);
        assert_eq!(sim.advance(50), Step::Waiting { next_fire_at: 100 });
        assert!(matches!(sim.advance(100), Step::Ticked { .. }));
        assert!(matches!(sim.advance(350), Step::Ticked { .. }));
        assert_eq!(sim.state().tick, 2);
        assert_eq!(sim.scheduler().next_fire_at(), Some(450));
        sim.stop();
        assert_eq!(sim.advance(1_000), Step::Stopped);
    }

    #[test]
    fn test_tick_produces_one_fixed_period() {
        let mut sim = sim();
        let report = sim.tick(100);
        assert!((report.production[&ResourceKind::Metal] - 0.1).abs() < 1e-12);
        assert_eq!(report.tick, 1);
        assert_eq!(sim.state().last_known_timestamp, 100);
    }

    #[test]
    fn test_long_gap_is_caught_up() {
        let mut sim = sim();
        sim.start(0);
        let step = sim.advance(3_600_000);
        let Step::CaughtUp { offline, .. } = step else {
            panic!("expected catch-up, got {step:?}");
        };
        assert_eq!(offline.away_ms, 3_600_000);
        assert!(sim.state().ledger.amount(ResourceKind::Metal) > 1_800.0);
    }

    #[test]
    fn test_autosave_event() {
        let mut sim = sim();
        sim.start(0);
        let mut saves = 0;
        for t in 1..=400 {
            if sim.advance(t * 100).save_due() {
                saves += 1;
            }
        }
        assert_eq!(saves, 1);
        assert!(sim
            .notifications()
            .log()
            .any(|e| e.event == GameEvent::AutosaveDue));
    }

    #[test]
    fn test_rejected_command_changes_nothing() {
        let mut sim = sim();
        let before = sim.state().clone();
        let result = sim.execute(
            Command::BuyUnit {
                unit: "scout_ship".into(),
                amount: BuyAmount::Count(1),
            },
            0,
        );
        assert!(!result.success);
        assert!(matches!(
            result.reason,
            Some(Rejection::InsufficientResources { .. })
        ));
        assert_eq!(sim.state(), &before);
        assert!(sim.notifications().is_empty());
    }

    #[test]
    fn test_accepted_command_reports_effect() {
        let mut sim = sim();
        let result = sim.execute(
            Command::BuyUnit {
                unit: "mining_drone".into(),
                amount: BuyAmount::Count(2),
            },
            0,
        );
        assert!(result.success);
        assert_eq!(result.message, "Bought 2 mining_drone (3 owned)");
        let Some(CommandEffect::UnitsBought(purchase)) = result.effect else {
            panic!("unexpected effect");
        };
        assert_eq!(purchase.owned, 3);
    }

    #[test]
    fn test_mission_resolves_on_tick() {
        let mut sim = scripted(0.0);
        sim.state_mut().units.add(&"scout_ship".into(), 1);
        let mission = sim
            .start_mission(
                MissionKind::Scout,
                "scout_ship".into(),
                MissionTarget::Location("earth_orbit".into()),
                MissionAction::Standard,
                0,
            )
            .unwrap();
        let ends_at = sim.state().missions.get(mission).unwrap().ends_at;
        assert!(sim.tick(ends_at - 1).missions.is_empty());
        let report = sim.tick(ends_at);
        assert_eq!(report.missions.len(), 1);
        assert!(report.missions[0].succeeded());
        assert_eq!(sim.state().derelicts.len(), 1);
        assert!(sim.tick(ends_at + 100).missions.is_empty());
        assert!(sim.notifications().log().any(|e| matches!(
            e.event,
            GameEvent::DerelictSpawned { .. }
        )));
    }

    #[test]
    fn test_travel_and_cancel_events() {
        let mut sim = sim();
        let departure = sim.start_travel(&"luna".into(), false, 0).unwrap();
        let Departure::Underway { arrives_at, .. } = departure else {
            panic!("expected a voyage");
        };
        assert_eq!(sim.start_travel(&"mars".into(), false, 0), Err(Rejection::InTransit));
        let report = sim.tick(arrives_at);
        assert_eq!(report.arrival.unwrap().location.as_str(), "luna");
        assert_eq!(sim.cancel_travel(arrives_at), Err(Rejection::NotTraveling));
    }

    #[test]
    fn test_automation_launches_from_tick() {
        let mut sim = sim();
        let state = sim.state_mut();
        state.units.add(&"scout_ship".into(), 2);
        state.ledger.set_amount(ResourceKind::Fuel, 500.0);
        state
            .modifiers
            .unlock(ModifierSource::Tech, [Effect::capability(targets::AUTOMATION_SCOUT)]);
        sim.set_automation(AutomationFlag::AutoScout, true, 0).unwrap();
        let report = sim.tick(100);
        assert_eq!(report.automation.len(), 2);
        assert_eq!(sim.state().missions.in_flight(MissionKind::Scout), 2);
    }

    #[test]
    fn test_import_failure_leaves_state() {
        let mut sim = sim();
        sim.tick(100);
        let before = sim.state().clone();
        assert!(sim.import_json("{broken", 200).is_err());
        assert_eq!(sim.state(), &before);
    }

    #[test]
    fn test_import_runs_catch_up() {
        let mut sim = sim();
        let json = sim.export_json().unwrap();
        let report = sim.import_json(&json, 2 * 3_600_000).unwrap().unwrap();
        assert_eq!(report.away_ms, 2 * 3_600_000);
        assert_eq!(sim.state().last_known_timestamp, 2 * 3_600_000);
    }

    #[test]
    fn test_checkpoint_rollback_restores_hash() {
        let mut sim = sim();
        sim.tick(100);
        let bytes = sim.checkpoint().unwrap();
        let hash = sim.state_hash();
        sim.tick(200);
        assert_ne!(sim.state_hash(), hash);
        sim.rollback(&bytes).unwrap();
        assert_eq!(sim.state_hash(), hash);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = sim();
        let mut b = sim();
        for t in 1..=50 {
            a.tick(t * 100);
            b.tick(t * 100);
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_seconds_until_affordable() {
        let sim = sim();
        let cost = Cost::single(ResourceKind::Metal, 60.0);
        let secs = sim.seconds_until_affordable(&cost).unwrap();
        assert!((secs - 10.0).abs() < 1e-9);
        assert_eq!(
            sim.seconds_until_affordable(&Cost::single(ResourceKind::Artifacts, 1.0)),
            None
        );
        assert_eq!(sim.seconds_until_affordable(&Cost::single(ResourceKind::Metal, 10.0)), Some(0.0));
    }
}
