//! Run reset ("prestige").
//!
//! A reset trades the current run for dark matter. Everything bought or
//! built during the run goes; dark matter, prestige perks, automation
//! settings and lifetime statistics stay. The new state is built in full
//! and swapped in at once, so no caller can observe a half-reset game.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::config::EngineConfig;
use crate::data::{GameData, UpgradeData};
use crate::error::Rejection;
use crate::formulas::whole_units;
use crate::modifiers::{targets, ModifierSource};
use crate::resources::{Cost, ResourceKind};
use crate::state::GameState;

/// Counters for one run (or summed over all runs).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    /// Resources credited by production, salvage and contracts.
    pub earned: Cost,
    /// Units bought.
    pub units_bought: u64,
    /// Upgrade levels bought.
    pub upgrades_bought: u64,
    /// Missions that succeeded.
    pub missions_succeeded: u64,
    /// Missions that failed.
    pub missions_failed: u64,
    /// Derelicts stripped.
    pub derelicts_salvaged: u64,
}

impl RunStats {
    fn accumulate(&mut self, other: &Self) {
        self.earned.merge(&other.earned);
        self.units_bought += other.units_bought;
        self.upgrades_bought += other.upgrades_bought;
        self.missions_succeeded += other.missions_succeeded;
        self.missions_failed += other.missions_failed;
        self.derelicts_salvaged += other.derelicts_salvaged;
    }
}

/// Best-run records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BestRecords {
    /// Most metal earned in one run.
    pub most_metal: f64,
    /// Largest dark matter gain from one reset.
    pub largest_gain: f64,
    /// Shortest completed run.
    pub fastest_run_ms: Option<Millis>,
}

/// Statistics that frame the current run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMeta {
    /// When the current run began.
    pub started_at: Millis,
    /// Resets performed.
    pub runs_completed: u64,
    /// Dark matter gained across all resets.
    pub dark_matter_earned: f64,
    /// This run.
    pub current: RunStats,
    /// Every finished run, summed.
    pub lifetime: RunStats,
    /// Best-run records.
    pub best: BestRecords,
}

impl RunMeta {
    /// First run starting at `now`.
    #[must_use]
    pub fn started(now: Millis) -> Self {
        Self {
            started_at: now,
            ..Self::default()
        }
    }

    fn finish(&mut self, now: Millis, gain: f64) {
        let run_ms = now.saturating_sub(self.started_at);
        let metal = self.current.earned.get(ResourceKind::Metal);
        self.best.most_metal = self.best.most_metal.max(metal);
        self.best.largest_gain = self.best.largest_gain.max(gain);
        self.best.fastest_run_ms = Some(self.best.fastest_run_ms.map_or(run_ms, |b| b.min(run_ms)));
        self.lifetime.accumulate(&self.current);
        self.current = RunStats::default();
        self.runs_completed += 1;
        self.dark_matter_earned += gain;
        self.started_at = now;
    }
}

/// What a reset did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeSummary {
    /// Dark matter awarded.
    pub gain: f64,
    /// Dark matter held afterwards.
    pub dark_matter: f64,
    /// Length of the run that ended.
    pub run_ms: Millis,
    /// Resets performed, including this one.
    pub runs_completed: u64,
}

/// Dark matter a reset would award now.
///
/// `floor(sqrt(metal earned / divisor) * prestige_gain)`, and zero until a
/// full divisor of metal has been earned.
#[must_use]
pub fn pending_gain(state: &GameState, config: &EngineConfig) -> f64 {
    let earned = state.run.current.earned.get(ResourceKind::Metal);
    if config.prestige_divisor.is_nan() || config.prestige_divisor <= 0.0 {
        return 0.0;
    }
    if earned < config.prestige_divisor {
        return 0.0;
    }
    let multiplier = state.modifiers.value(targets::PRESTIGE_GAIN, &state.units);
    whole_units((earned / config.prestige_divisor).sqrt() * multiplier).max(0.0)
}

/// End the run. Fails with [`Rejection::NothingToGain`] (and changes
/// nothing) when the reset would award no dark matter.
pub fn reset(
    state: &mut GameState,
    data: &GameData,
    config: &EngineConfig,
    now: Millis,
) -> Result<PrestigeSummary, Rejection> {
    let gain = pending_gain(state, config);
    if gain <= 0.0 {
        return Err(Rejection::NothingToGain);
    }

    let mut next = GameState::new(data, config, now);
    for kind in ResourceKind::ALL.into_iter().filter(|k| k.survives_prestige()) {
        next.ledger.set_amount(kind, state.ledger.amount(kind));
    }
    next.ledger.deposit(ResourceKind::DarkMatter, gain);

    next.purchased = state
        .purchased
        .iter()
        .filter(|(id, _)| data.upgrade(id).is_some_and(UpgradeData::is_permanent))
        .map(|(id, level)| (id.clone(), *level))
        .collect();
    next.modifiers = state.modifiers.clone();
    next.modifiers.retain_sources(ModifierSource::survives_prestige);
    next.automation = state.automation.clone();
    next.tick = state.tick;

    let run_ms = now.saturating_sub(state.run.started_at);
    next.run = state.run.clone();
    next.run.finish(now, gain);
    next.refresh_caps(data);

    let summary = PrestigeSummary {
        gain,
        dark_matter: next.ledger.amount(ResourceKind::DarkMatter),
        run_ms,
        runs_completed: next.run.runs_completed,
    };
    *state = next;
    tracing::info!(
        gain = summary.gain,
        dark_matter = summary.dark_matter,
        run = summary.runs_completed,
        "Prestige reset"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::Effect;

    fn setup(metal_earned: f64) -> (GameData, EngineConfig, GameState) {
        let data = GameData::standard();
        let config = EngineConfig::default();
        let mut state = GameState::new(&data, &config, 0);
        state.record_earned(&Cost::single(ResourceKind::Metal, metal_earned));
        (data, config, state)
    }

    #[test]
    fn test_gain_is_zero_below_divisor() {
        let (_, config, state) = setup(999_999.0);
        assert_eq!(pending_gain(&state, &config), 0.0);
    }

    #[test]
    fn test_gain_grows_with_square_root() {
        let (_, config, state) = setup(4_000_000.0);
        assert_eq!(pending_gain(&state, &config), 2.0);
        let (_, config, state) = setup(10_000_000.0);
        assert_eq!(pending_gain(&state, &config), 3.0);
    }

    #[test]
    fn test_gain_multiplier() {
        let (_, config, mut state) = setup(9_000_000.0);
        state.modifiers.unlock(
            ModifierSource::PrestigePerks,
            [Effect::multiplier(targets::PRESTIGE_GAIN, 1.5)],
        );
        assert_eq!(pending_gain(&state, &config), 4.0);
    }

    #[test]
    fn test_reset_without_gain_changes_nothing() {
        let (data, config, mut state) = setup(10.0);
        let before = state.clone();
        assert_eq!(
            reset(&mut state, &data, &config, 5_000),
            Err(Rejection::NothingToGain)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset_keeps_permanent_progress_only() {
        let (data, config, mut state) = setup(4_000_000.0);
        state.ledger.set_amount(ResourceKind::DarkMatter, 3.0);
        state.ledger.set_amount(ResourceKind::Metal, 9_000.0);
        state.units.add(&"scout_ship".into(), 4);
        state.purchased.insert("dark_efficiency".into(), 2);
        state.purchased.insert("improved_drills".into(), 1);
        state
            .modifiers
            .unlock(ModifierSource::PrestigePerks, [Effect::multiplier(targets::PRODUCTION, 1.25)]);
        state
            .modifiers
            .unlock(ModifierSource::Tech, [Effect::multiplier(targets::production(ResourceKind::Metal), 1.5)]);
        state
            .derelicts
            .insert("debris_field".into(), crate::data::Rarity::Common, "earth_orbit".into(), 0, 1_000);
        state.tick = 77;

        let summary = reset(&mut state, &data, &config, 60_000).unwrap();
        assert_eq!(summary.gain, 2.0);
        assert_eq!(summary.dark_matter, 5.0);
        assert_eq!(summary.run_ms, 60_000);

        assert_eq!(state.ledger.amount(ResourceKind::DarkMatter), 5.0);
        assert_eq!(state.ledger.amount(ResourceKind::Metal), 50.0);
        assert_eq!(state.units.count(&"scout_ship".into()), 0);
        assert_eq!(state.upgrade_level(&"dark_efficiency".into()), 2);
        assert_eq!(state.upgrade_level(&"improved_drills".into()), 0);
        assert_eq!(state.modifiers.effects(ModifierSource::PrestigePerks).len(), 1);
        assert!(state.modifiers.effects(ModifierSource::Tech).is_empty());
        assert!(state.derelicts.is_empty());
        assert!(state.missions.is_empty());
        assert!(!state.travel.is_traveling());
        assert_eq!(state.tick, 77);
    }

    #[test]
    fn test_reset_rolls_run_statistics() {
        let (data, config, mut state) = setup(4_000_000.0);
        state.run.current.missions_succeeded = 3;
        reset(&mut state, &data, &config, 50_000).unwrap();
        assert_eq!(state.run.runs_completed, 1);
        assert_eq!(state.run.current, RunStats::default());
        assert_eq!(state.run.lifetime.missions_succeeded, 3);
        assert_eq!(state.run.lifetime.earned.get(ResourceKind::Metal), 4_000_000.0);
        assert_eq!(state.run.best.most_metal, 4_000_000.0);
        assert_eq!(state.run.best.fastest_run_ms, Some(50_000));
        assert_eq!(state.run.started_at, 50_000);

        state.record_earned(&Cost::single(ResourceKind::Metal, 1_000_000.0));
        reset(&mut state, &data, &config, 150_000).unwrap();
        assert_eq!(state.run.best.most_metal, 4_000_000.0);
        assert_eq!(state.run.best.fastest_run_ms, Some(50_000));
        assert_eq!(state.run.dark_matter_earned, 3.0);
        assert_eq!(state.ledger.amount(ResourceKind::DarkMatter), 3.0);
    }
}
