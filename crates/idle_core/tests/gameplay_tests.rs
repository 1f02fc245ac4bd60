//! Gameplay scenario tests.
//!
//! These drive a full [`Simulation`] over the standard content through
//! multi-step scenarios: travel, missions, offline absences, prestige,
//! contracts and saves.

use idle_core::prelude::*;
use idle_core::modifiers::targets;
use idle_core::travel::Departure;
use idle_test_utils::fixtures::{
    self, constant, derelict_here, fund, give_units, mission_at, run_ticks, salvage, unlock,
    HOUR_MS, TICK_MS,
};
use idle_test_utils::strategies::arb_command_sequence;
use proptest::prelude::*;

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

// =============================================================================
// Travel
// =============================================================================

mod travel {
    use super::*;

    #[test]
    fn test_wedge_formation_cuts_fuel_and_time() {
        let mut sim = constant(0.0);
        fund(&mut sim, ResourceKind::Metal, 1_500.0);
        fund(&mut sim, ResourceKind::Crystal, 300.0);
        sim.purchase_upgrade(&"formation_doctrine".into(), 0).unwrap();
        sim.set_formation(Some(&"wedge".into()), 0).unwrap();

        // 100 fuel * 0.8, and 60 s at speed 1.5.
        let departure = sim.start_travel(&"luna".into(), false, 0).unwrap();
        assert_eq!(
            departure,
            Departure::Underway {
                destination: "luna".into(),
                arrives_at: 40_000,
            }
        );
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 20.0);

        run_ticks(&mut sim, 399);
        assert!(sim.state().travel.is_traveling());
        run_ticks(&mut sim, 1);
        assert!(!sim.state().travel.is_traveling());
        assert_eq!(sim.state().travel.location, LocationId::from("luna"));
    }

    #[test]
    fn test_locked_destination_is_refused() {
        let mut sim = constant(0.0);
        let err = sim.start_travel(&"mars".into(), false, 0).unwrap_err();
        assert!(matches!(err, Rejection::LocationLocked { .. }));
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 100.0);
    }

    #[test]
    fn test_warp_skips_the_voyage() {
        let mut sim = constant(0.0);
        fund(&mut sim, ResourceKind::Artifacts, 5.0);
        sim.purchase_upgrade(&"warp_core".into(), 0).unwrap();
        assert_eq!(sim.state().travel.warp_charges, 1);

        let departure = sim.start_travel(&"luna".into(), true, 0).unwrap();
        assert!(matches!(departure, Departure::Warped { .. }));
        assert_eq!(sim.state().travel.location, LocationId::from("luna"));
        assert_eq!(sim.state().travel.warp_charges, 0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 100.0);

        let err = sim.start_travel(&"earth_orbit".into(), true, 0).unwrap_err();
        assert_eq!(err, Rejection::NoWarpCharges);
    }

    #[test]
    fn test_missions_wait_for_arrival() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "scout_ship", 1);
        sim.start_travel(&"luna".into(), false, 0).unwrap();

        let result = sim.execute(mission_at(MissionKind::Scout, "scout_ship", "earth_orbit"), 0);
        assert!(!result.success);
        assert_eq!(result.reason, Some(Rejection::InTransit));
    }

    #[test]
    fn test_cancel_refunds_half_and_stays_home() {
        let mut sim = constant(0.0);
        sim.start_travel(&"luna".into(), false, 0).unwrap();
        let refund = sim.cancel_travel(1_000).unwrap();
        assert_eq!(refund, 50.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 50.0);
        assert_eq!(sim.state().travel.location, LocationId::from("earth_orbit"));
    }
}

// =============================================================================
// Missions
// =============================================================================

mod missions {
    use super::*;

    #[test]
    fn test_scout_then_salvage() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "scout_ship", 1);
        give_units(&mut sim, "salvage_ship", 1);

        let result = sim.execute(mission_at(MissionKind::Scout, "scout_ship", "earth_orbit"), 0);
        assert!(result.success, "{}", result.message);
        let now = run_ticks(&mut sim, 450);

        let found = sim.state().derelicts.iter().next().cloned().unwrap();
        assert_eq!(found.kind, DerelictKind::from("debris_field"));
        assert_eq!(found.rarity, Rarity::Common);

        let result = sim.execute(salvage("salvage_ship", found.id, MissionAction::Standard), now);
        assert!(result.success, "{}", result.message);
        let metal_before = sim.state().ledger.amount(ResourceKind::Metal);
        run_ticks(&mut sim, 300);

        let state = sim.state();
        assert!(state.derelicts.is_empty());
        assert!(state.missions.is_empty());
        assert_eq!(state.run.current.derelicts_salvaged, 1);
        assert_eq!(state.run.current.missions_succeeded, 2);
        assert_eq!(state.ledger.amount(ResourceKind::Fuel), 70.0);
        assert_eq!(state.ledger.amount(ResourceKind::Crystal), 40.0);
        assert!(close(
            state.ledger.amount(ResourceKind::Metal),
            metal_before + 30.0 + 200.0
        ));
    }

    #[test]
    fn test_failed_salvage_releases_derelict() {
        let mut sim = constant(0.99);
        give_units(&mut sim, "salvage_ship", 1);
        let id = derelict_here(&mut sim, "debris_field");

        assert!(sim.execute(salvage("salvage_ship", id, MissionAction::Standard), 0).success);
        assert!(sim.state().derelicts.get(id).unwrap().claimed_by.is_some());
        run_ticks(&mut sim, 300);

        let state = sim.state();
        assert!(state.derelicts.get(id).unwrap().claimed_by.is_none());
        assert_eq!(state.run.current.missions_failed, 1);
        // 20 fuel spent, half refunded by the salvage ship's abort share.
        assert_eq!(state.ledger.amount(ResourceKind::Fuel), 90.0);
    }

    #[test]
    fn test_guaranteed_salvage_spends_an_artifact() {
        let mut sim = constant(0.99);
        give_units(&mut sim, "salvage_ship", 1);
        fund(&mut sim, ResourceKind::Artifacts, 1.0);
        let id = derelict_here(&mut sim, "debris_field");

        assert!(sim.execute(salvage("salvage_ship", id, MissionAction::Guaranteed), 0).success);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Artifacts), 0.0);
        run_ticks(&mut sim, 600);

        let state = sim.state();
        assert!(state.derelicts.get(id).is_none());
        assert_eq!(state.ledger.amount(ResourceKind::Crystal), 0.0);
        assert!(close(state.ledger.amount(ResourceKind::Metal), 50.0 + 60.0 + 200.0));
    }

    #[test]
    fn test_cancel_mission_frees_the_slot() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "scout_ship", 1);
        let id = sim
            .start_mission(
                MissionKind::Scout,
                "scout_ship".into(),
                MissionTarget::Location("earth_orbit".into()),
                MissionAction::Standard,
                0,
            )
            .unwrap();
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 90.0);

        assert_eq!(sim.cancel_mission(id, 1_000).unwrap(), 5.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 95.0);
        assert!(sim.state().missions.is_empty());
        assert!(sim
            .execute(mission_at(MissionKind::Scout, "scout_ship", "earth_orbit"), 1_000)
            .success);
    }

    #[test]
    fn test_dual_docking_doubles_slots() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "scout_ship", 1);
        let scout = || mission_at(MissionKind::Scout, "scout_ship", "earth_orbit");

        assert!(sim.execute(scout(), 0).success);
        let refused = sim.execute(scout(), 0);
        assert!(matches!(refused.reason, Some(Rejection::NoUnitAvailable { .. })));

        unlock(&mut sim, targets::DUAL_MISSIONS);
        assert!(sim.execute(scout(), 0).success);
        assert_eq!(sim.state().missions.len(), 2);
    }
}

// =============================================================================
// Offline
// =============================================================================

mod offline {
    use super::*;

    #[test]
    fn test_discovery_while_away_can_expire_before_return() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "scout_ship", 1);
        assert!(sim
            .execute(mission_at(MissionKind::Scout, "scout_ship", "earth_orbit"), 0)
            .success);

        let report = sim.catch_up(2 * HOUR_MS).unwrap();
        assert_eq!(report.missions_succeeded(), 1);
        assert_eq!(report.derelicts_expired.len(), 1);
        assert!(sim.state().derelicts.is_empty());
        assert_eq!(report.gain(ResourceKind::Metal), 3_600.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Metal), 3_650.0);
        assert_eq!(sim.state().last_known_timestamp, 2 * HOUR_MS);
    }

    #[test]
    fn test_mission_past_the_window_stays_in_flight() {
        let config = EngineConfig {
            max_offline_secs: 60.0,
            ..fixtures::quiet_config()
        };
        let rng = ScriptedRandom::constant(0.0);
        let mut sim = Simulation::with_random(GameData::standard(), config, Box::new(rng), 0).unwrap();
        give_units(&mut sim, "scout_ship", 1);
        let careful = Command::StartMission {
            kind: MissionKind::Scout,
            unit: "scout_ship".into(),
            target: MissionTarget::Location("earth_orbit".into()),
            action: MissionAction::Careful,
        };
        assert!(sim.execute(careful, 0).success);

        let report = sim.catch_up(HOUR_MS).unwrap();
        assert!(report.capped);
        assert_eq!(report.applied_ms, 60_000);
        assert!(report.missions.is_empty());
        assert_eq!(sim.state().missions.len(), 1);

        let tick = sim.tick(HOUR_MS + TICK_MS);
        assert_eq!(tick.missions.len(), 1);
        assert!(sim.state().missions.is_empty());
    }

    #[test]
    fn test_short_absence_is_left_to_live_ticks() {
        let mut sim = constant(0.0);
        assert!(sim.catch_up(30_000).is_none());
        assert_eq!(sim.state().last_known_timestamp, 0);
    }

    #[test]
    fn test_voyage_completes_while_away() {
        let mut sim = constant(0.0);
        sim.start_travel(&"luna".into(), false, 0).unwrap();
        let report = sim.catch_up(HOUR_MS).unwrap();
        assert_eq!(report.arrival.map(|a| a.at), Some(60_000));
        assert_eq!(sim.state().travel.location, LocationId::from("luna"));
    }
}

// =============================================================================
// Prestige
// =============================================================================

mod prestige {
    use super::*;

    fn earn(sim: &mut Simulation, metal: f64) {
        sim.state_mut()
            .record_earned(&Cost::single(ResourceKind::Metal, metal));
    }

    #[test]
    fn test_perks_survive_reset() {
        let mut sim = constant(0.0);
        give_units(&mut sim, "mining_drone", 10);
        earn(&mut sim, 4.0e6);
        assert_eq!(sim.pending_prestige_gain(), 2.0);

        let summary = sim.prestige_reset(0).unwrap();
        assert_eq!(summary.gain, 2.0);
        assert_eq!(summary.runs_completed, 1);
        assert_eq!(sim.state().units.count(&"mining_drone".into()), 1);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Metal), 50.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::DarkMatter), 2.0);

        sim.purchase_upgrade(&"dark_efficiency".into(), 0).unwrap();
        assert!(close(sim.production_rates()[&ResourceKind::Metal], 1.25));

        earn(&mut sim, 4.0e6);
        let summary = sim.prestige_reset(HOUR_MS).unwrap();
        assert_eq!(summary.dark_matter, 3.0);
        assert_eq!(summary.run_ms, HOUR_MS);
        assert_eq!(sim.state().upgrade_level(&"dark_efficiency".into()), 1);
        assert!(close(sim.production_rates()[&ResourceKind::Metal], 1.25));
    }

    #[test]
    fn test_reset_without_gain_changes_nothing() {
        let mut sim = constant(0.0);
        earn(&mut sim, 999_999.0);
        let before = sim.state().clone();
        let result = sim.execute(Command::PrestigeReset, 0);
        assert_eq!(result.reason, Some(Rejection::NothingToGain));
        assert_eq!(sim.state(), &before);
    }

    #[test]
    fn test_automation_flags_survive_reset() {
        let mut sim = constant(0.0);
        unlock(&mut sim, targets::AUTOMATION_SCOUT);
        sim.set_automation(AutomationFlag::AutoScout, true, 0).unwrap();
        earn(&mut sim, 1.0e6);

        sim.prestige_reset(0).unwrap();
        assert!(sim.state().automation.is_enabled(AutomationFlag::AutoScout));
        // The capability came from a technology, which the reset cleared.
        assert!(!sim.state().modifiers.has_capability(targets::AUTOMATION_SCOUT));
    }
}

// =============================================================================
// Contracts
// =============================================================================

mod contracts {
    use super::*;

    #[test]
    fn test_fulfill_pays_reward() {
        let mut sim = constant(0.0);
        assert_eq!(sim.accept_contract(&"fuel_run".into(), 0).unwrap(), 1_200_000);
        fund(&mut sim, ResourceKind::Fuel, 300.0);

        let reward = sim.fulfill_contract(&"fuel_run".into(), 1_000).unwrap();
        assert_eq!(reward.get(ResourceKind::Metal), 2_500.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Metal), 2_550.0);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 0.0);
        assert_eq!(sim.state().contracts.fulfilled(), 1);
    }

    #[test]
    fn test_short_delivery_is_refused() {
        let mut sim = constant(0.0);
        sim.accept_contract(&"fuel_run".into(), 0).unwrap();
        let result = sim.execute(
            Command::FulfillContract {
                contract: "fuel_run".into(),
            },
            1_000,
        );
        assert!(!result.success);
        assert_eq!(sim.state().ledger.amount(ResourceKind::Fuel), 100.0);
    }

    #[test]
    fn test_contract_expires_while_away() {
        let mut sim = constant(0.0);
        sim.accept_contract(&"crystal_order".into(), 0).unwrap();
        let report = sim.catch_up(HOUR_MS).unwrap();
        assert_eq!(report.contracts_expired, vec![ContractId::from("crystal_order")]);
        assert!(sim
            .fulfill_contract(&"crystal_order".into(), HOUR_MS)
            .is_err());
    }
}

// =============================================================================
// Saves
// =============================================================================

mod saves {
    use super::*;

    #[test]
    fn test_save_loads_into_a_new_simulation() {
        let mut sim = fixtures::automated_economy(3);
        let now = run_ticks(&mut sim, 100);
        let json = sim.export_json().unwrap();

        let (loaded, report) = Simulation::from_json(
            GameData::standard(),
            EngineConfig::default(),
            &json,
            Box::new(ChaChaSource::new(3)),
            now + 2 * HOUR_MS,
        )
        .unwrap();
        assert!(report.is_some());
        assert_eq!(loaded.state().tick, sim.state().tick);
        assert_eq!(loaded.state().units, sim.state().units);
        assert_eq!(loaded.state().last_known_timestamp, now + 2 * HOUR_MS);
    }

    #[test]
    fn test_garbage_is_refused() {
        let result = Simulation::from_json(
            GameData::standard(),
            EngineConfig::default(),
            "not a save",
            Box::new(ChaChaSource::new(3)),
            0,
        );
        assert!(matches!(result, Err(GameError::ParseError { .. })));
    }
}

// =============================================================================
// Command streams
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Refused commands leave the state as it was, and no sequence of
    /// commands and ticks drives a resource negative or over its cap.
    #[test]
    fn prop_command_stream_keeps_ledger_valid(
        seed in any::<u64>(),
        commands in arb_command_sequence(40),
    ) {
        let mut sim = fixtures::seeded(seed);
        fund(&mut sim, ResourceKind::Metal, 5_000.0);
        fund(&mut sim, ResourceKind::Crystal, 1_000.0);
        let mut now = 0;
        for command in commands {
            now += 10 * TICK_MS;
            sim.tick(now);
            let before = sim.state().clone();
            let result = sim.execute(command, now);
            if !result.success {
                prop_assert_eq!(sim.state(), &before);
            }
            for kind in ResourceKind::ALL {
                let amount = sim.state().ledger.amount(kind);
                prop_assert!(amount >= 0.0, "{kind} went negative");
                if let Some(cap) = sim.state().ledger.cap(kind) {
                    prop_assert!(amount <= cap, "{kind} exceeded its cap");
                }
            }
        }
    }
}
