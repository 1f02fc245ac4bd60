//! Tick scheduler.
//!
//! A two-state machine (`Stopped`, `Running`) that decides when the host
//! should run a tick. Each firing schedules the next one relative to the
//! moment it ran, so a late timer never queues a burst of catch-up ticks:
//! missed ticks are skipped, and long gaps are handed to offline catch-up.
//!
//! The scheduler owns no time source. The host calls [`TickScheduler::poll`]
//! with the current timestamp whenever its timer fires (or whenever it likes)
//! and reads [`TickScheduler::next_fire_at`] to arm the next timer.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::config::EngineConfig;

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerState {
    /// No ticks fire.
    #[default]
    Stopped,
    /// Ticks fire every interval.
    Running,
}

/// What a poll decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// The scheduler is stopped.
    Stopped,
    /// Too early; nothing to do until `next_fire_at`.
    NotDue {
        /// When the next tick is due.
        next_fire_at: Millis,
    },
    /// Run one live tick.
    Tick {
        /// Time since the previous tick.
        elapsed_ms: Millis,
        /// Autosave interval has elapsed.
        save_due: bool,
    },
    /// The gap since the previous tick is long enough for offline catch-up.
    Gap {
        /// Time since the previous tick.
        elapsed_ms: Millis,
        /// Autosave interval has elapsed.
        save_due: bool,
    },
}

/// Self-rescheduling tick timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickScheduler {
    state: SchedulerState,
    interval_ms: Millis,
    autosave_ms: Millis,
    gap_threshold_ms: Millis,
    last_tick_at: Millis,
    next_fire_at: Millis,
    last_save_at: Millis,
    ticks_fired: u64,
}

impl TickScheduler {
    /// Scheduler firing every `interval_ms`, requesting a save every
    /// `autosave_ms`, and reporting gaps of at least `gap_threshold_ms`.
    #[must_use]
    pub fn new(interval_ms: Millis, autosave_ms: Millis, gap_threshold_ms: Millis) -> Self {
        Self {
            state: SchedulerState::Stopped,
            interval_ms: interval_ms.max(1),
            autosave_ms,
            gap_threshold_ms,
            last_tick_at: 0,
            next_fire_at: 0,
            last_save_at: 0,
            ticks_fired: 0,
        }
    }

    /// Scheduler using the intervals from `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.tick_interval_ms(),
            config.autosave_interval_ms(),
            config.offline_min_ms(),
        )
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether ticks are firing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Tick interval.
    #[must_use]
    pub const fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    /// Ticks fired since creation.
    #[must_use]
    pub const fn ticks_fired(&self) -> u64 {
        self.ticks_fired
    }

    /// When the next tick is due, if running.
    #[must_use]
    pub fn next_fire_at(&self) -> Option<Millis> {
        self.is_running().then_some(self.next_fire_at)
    }

    /// Start firing. The first tick is due one interval after `now`.
    ///
    /// Returns `false` (and changes nothing) if already running.
    pub fn start(&mut self, now: Millis) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = SchedulerState::Running;
        self.last_tick_at = now;
        self.last_save_at = now;
        self.next_fire_at = now.saturating_add(self.interval_ms);
        tracing::debug!(now, interval_ms = self.interval_ms, "Tick scheduler started");
        true
    }

    /// Stop firing. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = SchedulerState::Stopped;
        tracing::debug!(ticks = self.ticks_fired, "Tick scheduler stopped");
        true
    }

    /// Decide what to do at `now`.
    ///
    /// A due tick reschedules itself for `now + interval`, however late it
    /// ran. Intermediate ticks are never replayed.
    pub fn poll(&mut self, now: Millis) -> Firing {
        if !self.is_running() {
            return Firing::Stopped;
        }
        if now < self.next_fire_at {
            return Firing::NotDue {
                next_fire_at: self.next_fire_at,
            };
        }

        let elapsed_ms = now.saturating_sub(self.last_tick_at);
        self.last_tick_at = now;
        self.next_fire_at = now.saturating_add(self.interval_ms);
        self.ticks_fired += 1;

        let save_due = self.autosave_ms > 0 && now.saturating_sub(self.last_save_at) >= self.autosave_ms;
        if save_due {
            self.last_save_at = now;
        }

        if self.gap_threshold_ms > 0 && elapsed_ms >= self.gap_threshold_ms {
            tracing::info!(elapsed_ms, "Long gap between ticks");
            Firing::Gap {
                elapsed_ms,
                save_due,
            }
        } else {
            Firing::Tick {
                elapsed_ms,
                save_due,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TickScheduler {
        TickScheduler::new(100, 30_000, 60_000)
    }

    #[test]
    fn test_stopped_never_fires() {
        let mut s = scheduler();
        assert_eq!(s.poll(1_000), Firing::Stopped);
        assert_eq!(s.next_fire_at(), None);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut s = scheduler();
        assert!(s.start(0));
        assert!(!s.start(50));
        assert_eq!(s.next_fire_at(), Some(100));
    }

    #[test]
    fn test_fires_on_interval() {
        let mut s = scheduler();
        s.start(0);
        assert_eq!(s.poll(50), Firing::NotDue { next_fire_at: 100 });
        assert_eq!(
            s.poll(100),
            Firing::Tick {
                elapsed_ms: 100,
                save_due: false
            }
        );
        assert_eq!(s.next_fire_at(), Some(200));
    }

    #[test]
    fn test_late_tick_reschedules_from_now() {
        let mut s = scheduler();
        s.start(0);
        // timer woke very late; one tick, next due relative to now
        assert!(matches!(s.poll(1_050), Firing::Tick { elapsed_ms: 1_050, .. }));
        assert_eq!(s.next_fire_at(), Some(1_150));
        assert!(matches!(s.poll(1_100), Firing::NotDue { .. }));
        assert_eq!(s.ticks_fired(), 1);
    }

    #[test]
    fn test_long_gap_reported() {
        let mut s = scheduler();
        s.start(0);
        assert!(matches!(s.poll(120_000), Firing::Gap { elapsed_ms: 120_000, .. }));
    }

    #[test]
    fn test_autosave_cadence() {
        let mut s = scheduler();
        s.start(0);
        let mut saves = 0;
        let mut now = 0;
        while now < 90_000 {
            now += 100;
            if let Firing::Tick { save_due: true, .. } = s.poll(now) {
                saves += 1;
            }
        }
        assert_eq!(saves, 3);
    }

    #[test]
    fn test_stop_then_restart() {
        let mut s = scheduler();
        s.start(0);
        assert!(s.stop());
        assert!(!s.stop());
        assert_eq!(s.poll(500), Firing::Stopped);
        s.start(1_000);
        assert_eq!(s.next_fire_at(), Some(1_100));
    }
}
