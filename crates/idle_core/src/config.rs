//! Engine tuning knobs.
//!
//! Everything here is a number the host may want to change without touching
//! content: tick rate, autosave cadence, offline caps, spawn cadence, refund
//! shares. Loaded from RON; every field has a default.

use serde::{Deserialize, Serialize};

use crate::clock::{secs_to_millis, Millis};
use crate::error::{GameError, Result};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Live ticks per second.
    pub ticks_per_second: u32,
    /// Seconds between autosave requests.
    pub autosave_interval_secs: f64,
    /// Gaps shorter than this are absorbed by a normal tick.
    pub offline_min_secs: f64,
    /// Longest absence credited by catch-up.
    pub max_offline_secs: f64,
    /// Base share of production credited while away.
    pub offline_efficiency: f64,
    /// Seconds between passive derelict spawn checks.
    pub spawn_check_interval_secs: f64,
    /// Base chance a spawn check produces a derelict.
    pub spawn_chance: f64,
    /// Passive spawns stop once this many derelicts are live.
    pub max_live_derelicts: usize,
    /// Bounded event log size.
    pub event_log_capacity: usize,
    /// Seconds a toast stays visible.
    pub toast_ttl_secs: f64,
    /// Share of travel fuel returned on cancel.
    pub travel_cancel_refund: f64,
    /// Share of mission fuel returned on cancel.
    pub mission_cancel_refund: f64,
    /// Metal earned per unit of the prestige square root.
    pub prestige_divisor: f64,
    /// Default automation derelict cap for a fresh game.
    pub default_derelict_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 10,
            autosave_interval_secs: 30.0,
            offline_min_secs: 60.0,
            max_offline_secs: 43_200.0,
            offline_efficiency: 0.5,
            spawn_check_interval_secs: 30.0,
            spawn_chance: 0.10,
            max_live_derelicts: 10,
            event_log_capacity: 100,
            toast_ttl_secs: 5.0,
            travel_cancel_refund: 0.5,
            mission_cancel_refund: 0.5,
            prestige_divisor: 1_000_000.0,
            default_derelict_cap: 5,
        }
    }
}

impl EngineConfig {
    /// Parse from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ParseError {
            what: "engine config".to_string(),
            message: e.to_string(),
        })?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| {
            GameError::SerializeError {
                what: "engine config".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Milliseconds between live ticks.
    #[must_use]
    pub fn tick_interval_ms(&self) -> Millis {
        (1000 / u64::from(self.ticks_per_second.max(1))).max(1)
    }

    /// Seconds of production credited by one live tick.
    #[must_use]
    pub fn tick_secs(&self) -> f64 {
        1.0 / f64::from(self.ticks_per_second.max(1))
    }

    /// Autosave cadence in milliseconds.
    #[must_use]
    pub fn autosave_interval_ms(&self) -> Millis {
        secs_to_millis(self.autosave_interval_secs)
    }

    /// Offline threshold in milliseconds.
    #[must_use]
    pub fn offline_min_ms(&self) -> Millis {
        secs_to_millis(self.offline_min_secs)
    }

    /// Offline cap in milliseconds.
    #[must_use]
    pub fn max_offline_ms(&self) -> Millis {
        secs_to_millis(self.max_offline_secs)
    }

    /// Spawn check cadence in milliseconds.
    #[must_use]
    pub fn spawn_check_interval_ms(&self) -> Millis {
        secs_to_millis(self.spawn_check_interval_secs)
    }

    /// Toast lifetime in milliseconds.
    #[must_use]
    pub fn toast_ttl_ms(&self) -> Millis {
        secs_to_millis(self.toast_ttl_secs)
    }

    /// Return an error listing every validation problem, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GameError::InvalidConfig(errors))
        }
    }

    /// Returns a list of validation errors (empty if valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.ticks_per_second == 0 || self.ticks_per_second > 1000 {
            errors.push(format!(
                "ticks_per_second must be in 1..=1000, got {}",
                self.ticks_per_second
            ));
        }
        for (name, value) in [
            ("offline_efficiency", self.offline_efficiency),
            ("spawn_chance", self.spawn_chance),
            ("travel_cancel_refund", self.travel_cancel_refund),
            ("mission_cancel_refund", self.mission_cancel_refund),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        for (name, value) in [
            ("autosave_interval_secs", self.autosave_interval_secs),
            ("spawn_check_interval_secs", self.spawn_check_interval_secs),
            ("prestige_divisor", self.prestige_divisor),
        ] {
            if value.is_nan() || value <= 0.0 {
                errors.push(format!("{name} must be positive, got {value}"));
            }
        }
        if self.max_offline_secs < self.offline_min_secs {
            errors.push("max_offline_secs must not be below offline_min_secs".to_string());
        }
        errors
    }
}
