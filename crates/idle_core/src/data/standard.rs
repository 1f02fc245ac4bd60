//! Built-in content used when no content file is supplied.

use crate::ids::{LocationId, UpgradeId};
use crate::modifiers::{targets, Effect, ModifierSource};
use crate::resources::{Cost, ResourceKind};

use super::{
    ActionData, ContractData, DerelictData, FormationData, GameData, LocationData, MissionAction,
    MissionKind, MissionKindData, Rarity, RarityWeights, Requirements, ResourceData, RewardLine,
    StartingUnit, UnitData, UpgradeData,
};

use crate::resources::ResourceKind::{Artifacts, Crystal, DarkMatter, Energy, Fuel, Metal};

impl GameData {
    /// The stock campaign: six resources, seven units, six locations.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            resources: resources(),
            units: units(),
            mission_kinds: mission_kinds(),
            actions: actions(),
            locations: locations(),
            derelicts: derelicts(),
            upgrades: upgrades(),
            formations: formations(),
            contracts: contracts(),
            home: "earth_orbit".into(),
            starting_units: vec![StartingUnit {
                unit: "mining_drone".into(),
                count: 1,
            }],
        }
    }
}

fn resources() -> Vec<ResourceData> {
    let capped = |kind, starting_amount, cap| ResourceData {
        kind,
        starting_amount,
        base_cap: Some(cap),
    };
    vec![
        capped(Metal, 50.0, 10_000.0),
        capped(Crystal, 0.0, 5_000.0),
        capped(Fuel, 100.0, 2_000.0),
        capped(Energy, 0.0, 5_000.0),
        capped(Artifacts, 0.0, 50.0),
        ResourceData {
            kind: DarkMatter,
            starting_amount: 0.0,
            base_cap: None,
        },
    ]
}

fn unit(id: &str, name: &str, cost: Cost, cost_growth: f64) -> UnitData {
    UnitData {
        id: id.into(),
        name: name.into(),
        cost,
        cost_growth,
        produces: Cost::new(),
        consumes: Cost::new(),
        missions: Vec::new(),
        abort_refund: 0.0,
    }
}

fn units() -> Vec<UnitData> {
    vec![
        UnitData {
            produces: Cost::single(Metal, 1.0),
            ..unit("mining_drone", "Mining Drone", Cost::single(Metal, 10.0), 1.15)
        },
        UnitData {
            produces: Cost::single(Crystal, 0.4),
            ..unit(
                "crystal_harvester",
                "Crystal Harvester",
                Cost::single(Metal, 60.0),
                1.15,
            )
        },
        UnitData {
            produces: Cost::single(Energy, 2.0),
            ..unit(
                "solar_array",
                "Solar Array",
                Cost::single(Metal, 40.0).with(Crystal, 10.0),
                1.12,
            )
        },
        UnitData {
            consumes: Cost::single(Metal, 2.0).with(Energy, 1.0),
            produces: Cost::single(Fuel, 0.5),
            ..unit(
                "fuel_refinery",
                "Fuel Refinery",
                Cost::single(Metal, 150.0).with(Crystal, 40.0),
                1.18,
            )
        },
        UnitData {
            missions: vec![MissionKind::Scout],
            abort_refund: 0.25,
            ..unit(
                "scout_ship",
                "Scout Ship",
                Cost::single(Metal, 250.0).with(Fuel, 25.0),
                1.35,
            )
        },
        UnitData {
            missions: vec![MissionKind::Salvage],
            abort_refund: 0.5,
            ..unit(
                "salvage_ship",
                "Salvage Ship",
                Cost::single(Metal, 500.0).with(Crystal, 150.0),
                1.35,
            )
        },
        UnitData {
            missions: vec![MissionKind::Colony],
            ..unit(
                "colony_ship",
                "Colony Ship",
                Cost::single(Metal, 3000.0)
                    .with(Crystal, 1000.0)
                    .with(Fuel, 300.0),
                1.6,
            )
        },
    ]
}

fn mission_kinds() -> Vec<MissionKindData> {
    vec![
        MissionKindData {
            kind: MissionKind::Scout,
            base_secs: 45.0,
            fuel_cost: 10.0,
        },
        MissionKindData {
            kind: MissionKind::Salvage,
            base_secs: 0.0,
            fuel_cost: 20.0,
        },
        MissionKindData {
            kind: MissionKind::Colony,
            base_secs: 600.0,
            fuel_cost: 150.0,
        },
    ]
}

fn actions() -> Vec<ActionData> {
    let action = |action, duration_multiplier, success_bonus, reward_multiplier| ActionData {
        action,
        duration_multiplier,
        success_bonus,
        reward_multiplier,
        guaranteed: false,
        extra_cost: Cost::new(),
    };
    vec![
        action(MissionAction::Standard, 1.0, 0.0, 1.0),
        action(MissionAction::Careful, 1.5, 0.15, 0.9),
        action(MissionAction::Rushed, 0.6, -0.10, 1.0),
        ActionData {
            extra_cost: Cost::single(Crystal, 50.0),
            ..action(MissionAction::Thorough, 1.25, 0.0, 1.5)
        },
        ActionData {
            guaranteed: true,
            extra_cost: Cost::single(Artifacts, 1.0),
            ..action(MissionAction::Guaranteed, 2.0, 0.0, 1.0)
        },
    ]
}

fn location(
    id: &str,
    name: &str,
    neighbors: &[&str],
    travel: (f64, f64),
    success: (f64, f64, f64),
    weights: [u32; 5],
) -> LocationData {
    LocationData {
        id: id.into(),
        name: name.into(),
        neighbors: neighbors.iter().map(|n| LocationId::from(*n)).collect(),
        travel_fuel: travel.0,
        travel_secs: travel.1,
        scout_success: success.0,
        colony_success: success.1,
        colony_bonus: success.2,
        colonizable: true,
        rarity_weights: RarityWeights(weights),
        requires: Requirements::default(),
    }
}

fn requires(upgrades: &[&str], colonies: &[&str]) -> Requirements {
    Requirements {
        upgrades: upgrades.iter().map(|u| UpgradeId::from(*u)).collect(),
        colonies: colonies.iter().map(|c| LocationId::from(*c)).collect(),
    }
}

fn locations() -> Vec<LocationData> {
    vec![
        LocationData {
            colonizable: false,
            ..location(
                "earth_orbit",
                "Earth Orbit",
                &["luna"],
                (50.0, 30.0),
                (0.6, 0.0, 0.0),
                [70, 25, 5, 0, 0],
            )
        },
        location(
            "luna",
            "Luna",
            &["earth_orbit", "mars"],
            (100.0, 60.0),
            (0.5, 0.7, 0.10),
            [60, 28, 10, 2, 0],
        ),
        LocationData {
            requires: requires(&["ion_drive"], &[]),
            ..location(
                "mars",
                "Mars",
                &["luna", "asteroid_belt"],
                (300.0, 180.0),
                (0.4, 0.55, 0.20),
                [50, 30, 15, 4, 1],
            )
        },
        LocationData {
            requires: requires(&["ion_drive"], &["mars"]),
            ..location(
                "asteroid_belt",
                "Asteroid Belt",
                &["mars", "jupiter"],
                (500.0, 300.0),
                (0.35, 0.45, 0.25),
                [40, 32, 20, 6, 2],
            )
        },
        LocationData {
            requires: requires(&["fusion_drive"], &[]),
            ..location(
                "jupiter",
                "Jupiter",
                &["asteroid_belt", "saturn"],
                (900.0, 600.0),
                (0.25, 0.35, 0.35),
                [30, 30, 25, 11, 4],
            )
        },
        LocationData {
            requires: requires(&["fusion_drive"], &["jupiter"]),
            ..location(
                "saturn",
                "Saturn",
                &["jupiter"],
                (1400.0, 900.0),
                (0.15, 0.25, 0.50),
                [20, 30, 28, 15, 7],
            )
        },
    ]
}

fn reward(resource: ResourceKind, amount: f64, chance: f64) -> RewardLine {
    RewardLine {
        resource,
        amount,
        chance,
    }
}

fn derelict(
    kind: &str,
    name: &str,
    rarity: Rarity,
    locations: &[&str],
    timing: (f64, f64),
    salvage_success: f64,
    rewards: Vec<RewardLine>,
) -> DerelictData {
    DerelictData {
        kind: kind.into(),
        name: name.into(),
        rarity,
        locations: locations.iter().map(|l| LocationId::from(*l)).collect(),
        lifetime_secs: timing.0,
        salvage_secs: timing.1,
        salvage_success,
        rewards,
    }
}

fn derelicts() -> Vec<DerelictData> {
    let deep = &["mars", "asteroid_belt", "jupiter", "saturn"];
    vec![
        derelict(
            "debris_field",
            "Debris Field",
            Rarity::Common,
            &[],
            (600.0, 30.0),
            0.9,
            vec![reward(Metal, 200.0, 1.0), reward(Crystal, 40.0, 0.5)],
        ),
        derelict(
            "abandoned_probe",
            "Abandoned Probe",
            Rarity::Common,
            &[],
            (600.0, 40.0),
            0.85,
            vec![
                reward(Metal, 120.0, 1.0),
                reward(Energy, 150.0, 0.6),
                reward(Fuel, 30.0, 0.4),
            ],
        ),
        derelict(
            "cargo_hauler",
            "Cargo Hauler",
            Rarity::Uncommon,
            &[],
            (900.0, 60.0),
            0.75,
            vec![
                reward(Metal, 600.0, 1.0),
                reward(Fuel, 150.0, 0.7),
                reward(Crystal, 120.0, 0.5),
            ],
        ),
        derelict(
            "mining_platform",
            "Mining Platform",
            Rarity::Uncommon,
            &["luna", "mars", "asteroid_belt"],
            (900.0, 90.0),
            0.7,
            vec![reward(Metal, 1500.0, 1.0), reward(Crystal, 300.0, 0.6)],
        ),
        derelict(
            "research_station",
            "Research Station",
            Rarity::Rare,
            &[],
            (1200.0, 120.0),
            0.6,
            vec![reward(Crystal, 800.0, 1.0), reward(Artifacts, 1.0, 0.5)],
        ),
        derelict(
            "warship_hulk",
            "Warship Hulk",
            Rarity::Rare,
            deep,
            (1200.0, 150.0),
            0.55,
            vec![
                reward(Metal, 3000.0, 1.0),
                reward(Fuel, 500.0, 0.7),
                reward(Artifacts, 1.0, 0.3),
            ],
        ),
        derelict(
            "alien_relay",
            "Alien Relay",
            Rarity::Epic,
            &["luna", "mars", "asteroid_belt", "jupiter", "saturn"],
            (1800.0, 240.0),
            0.45,
            vec![reward(Artifacts, 2.0, 1.0), reward(Energy, 2000.0, 0.8)],
        ),
        derelict(
            "precursor_vault",
            "Precursor Vault",
            Rarity::Legendary,
            deep,
            (2400.0, 360.0),
            0.35,
            vec![
                reward(Artifacts, 5.0, 1.0),
                reward(Crystal, 5000.0, 0.8),
                reward(Metal, 10_000.0, 0.8),
            ],
        ),
    ]
}

fn upgrade(id: &str, name: &str, source: ModifierSource, cost: Cost, effects: Vec<Effect>) -> UpgradeData {
    UpgradeData {
        id: id.into(),
        name: name.into(),
        source,
        cost,
        cost_growth: 1.0,
        max_level: 1,
        prerequisites: Vec::new(),
        effects,
        warp_charges: 0,
    }
}

fn upgrades() -> Vec<UpgradeData> {
    use crate::modifiers::ModifierSource::{AlienTech, PrestigePerks, Tech, UnitUpgrades};

    vec![
        upgrade(
            "improved_drills",
            "Improved Drills",
            Tech,
            Cost::single(Metal, 500.0),
            vec![Effect::multiplier(targets::production(Metal), 1.5)],
        ),
        upgrade(
            "crystal_resonators",
            "Crystal Resonators",
            Tech,
            Cost::single(Metal, 800.0).with(Crystal, 200.0),
            vec![Effect::multiplier(targets::production(Crystal), 1.5)],
        ),
        UpgradeData {
            cost_growth: 2.0,
            max_level: 5,
            ..upgrade(
                "cargo_expansion",
                "Cargo Expansion",
                Tech,
                Cost::single(Metal, 1000.0).with(Crystal, 300.0),
                vec![
                    Effect::multiplier(targets::storage(Metal), 2.0),
                    Effect::multiplier(targets::storage(Crystal), 2.0),
                    Effect::multiplier(targets::storage(Fuel), 1.5),
                ],
            )
        },
        upgrade(
            "swarm_sync",
            "Swarm Synchronisation",
            Tech,
            Cost::single(Metal, 2500.0).with(Crystal, 600.0),
            vec![Effect::per_units(
                targets::production(Metal),
                "mining_drone",
                10,
                0.05,
            )],
        ),
        upgrade(
            "ion_drive",
            "Ion Drive",
            Tech,
            Cost::single(Metal, 1500.0)
                .with(Crystal, 400.0)
                .with(Fuel, 100.0),
            vec![Effect::multiplier(targets::TRAVEL_TIME, 0.9)],
        ),
        UpgradeData {
            prerequisites: vec!["ion_drive".into()],
            ..upgrade(
                "fusion_drive",
                "Fusion Drive",
                Tech,
                Cost::single(Metal, 8000.0)
                    .with(Crystal, 2500.0)
                    .with(Fuel, 600.0),
                vec![
                    Effect::multiplier(targets::TRAVEL_TIME, 0.75),
                    Effect::multiplier(targets::TRAVEL_FUEL_COST, 0.85),
                ],
            )
        },
        upgrade(
            "long_range_sensors",
            "Long Range Sensors",
            Tech,
            Cost::single(Metal, 1200.0).with(Crystal, 300.0),
            vec![
                Effect::capability(targets::ADJACENT_DISCOVERY),
                Effect::additive(targets::mission_success(MissionKind::Scout), 0.05),
            ],
        ),
        upgrade(
            "dual_docking",
            "Dual Docking Bays",
            Tech,
            Cost::single(Metal, 3000.0).with(Crystal, 800.0),
            vec![Effect::capability(targets::DUAL_MISSIONS)],
        ),
        upgrade(
            "scout_autopilot",
            "Scout Autopilot",
            Tech,
            Cost::single(Metal, 2000.0).with(Crystal, 500.0),
            vec![Effect::capability(targets::AUTOMATION_SCOUT)],
        ),
        UpgradeData {
            prerequisites: vec!["scout_autopilot".into()],
            ..upgrade(
                "salvage_autopilot",
                "Salvage Autopilot",
                Tech,
                Cost::single(Metal, 4000.0).with(Crystal, 1200.0),
                vec![Effect::capability(targets::AUTOMATION_SALVAGE)],
            )
        },
        upgrade(
            "formation_doctrine",
            "Formation Doctrine",
            Tech,
            Cost::single(Metal, 1500.0).with(Crystal, 300.0),
            Vec::new(),
        ),
        upgrade(
            "reinforced_hulls",
            "Reinforced Hulls",
            UnitUpgrades,
            Cost::single(Metal, 1000.0).with(Crystal, 250.0),
            vec![Effect::multiplier(targets::SALVAGE_REWARD, 1.25)],
        ),
        upgrade(
            "abort_protocols",
            "Abort Protocols",
            UnitUpgrades,
            Cost::single(Metal, 800.0).with(Fuel, 100.0),
            vec![Effect::additive(targets::ABORT_REFUND, 0.25)],
        ),
        upgrade(
            "afterburners",
            "Afterburners",
            UnitUpgrades,
            Cost::single(Metal, 600.0).with(Fuel, 80.0),
            vec![Effect::multiplier(
                targets::mission_time(MissionKind::Scout),
                0.8,
            )],
        ),
        upgrade(
            "xeno_salvage_matrix",
            "Xeno Salvage Matrix",
            AlienTech,
            Cost::single(Artifacts, 3.0),
            vec![Effect::multiplier(targets::SALVAGE_REWARD, 1.5)],
        ),
        UpgradeData {
            max_level: 3,
            warp_charges: 1,
            ..upgrade(
                "warp_core",
                "Warp Core",
                AlienTech,
                Cost::single(Artifacts, 5.0),
                Vec::new(),
            )
        },
        upgrade(
            "precursor_optics",
            "Precursor Optics",
            AlienTech,
            Cost::single(Artifacts, 4.0),
            vec![Effect::multiplier(targets::DERELICT_SPAWN_CHANCE, 1.5)],
        ),
        UpgradeData {
            cost_growth: 1.5,
            max_level: 10,
            ..upgrade(
                "dark_efficiency",
                "Dark Efficiency",
                PrestigePerks,
                Cost::single(DarkMatter, 1.0),
                vec![Effect::multiplier(targets::PRODUCTION, 1.25)],
            )
        },
        UpgradeData {
            cost_growth: 2.0,
            max_level: 3,
            ..upgrade(
                "patient_ai",
                "Patient AI",
                PrestigePerks,
                Cost::single(DarkMatter, 2.0),
                vec![Effect::additive(targets::OFFLINE_EFFICIENCY, 0.1)],
            )
        },
        UpgradeData {
            cost_growth: 1.8,
            max_level: 5,
            ..upgrade(
                "lucky_stars",
                "Lucky Stars",
                PrestigePerks,
                Cost::single(DarkMatter, 3.0),
                vec![Effect::additive(targets::MISSION_SUCCESS, 0.05)],
            )
        },
        upgrade(
            "dark_harvest",
            "Dark Harvest",
            PrestigePerks,
            Cost::single(DarkMatter, 5.0),
            vec![Effect::multiplier(targets::PRESTIGE_GAIN, 1.2)],
        ),
    ]
}

fn formations() -> Vec<FormationData> {
    let doctrine = Some(UpgradeId::from("formation_doctrine"));
    vec![
        FormationData {
            id: "wedge".into(),
            name: "Wedge".into(),
            requires: doctrine.clone(),
            effects: vec![
                Effect::multiplier(targets::TRAVEL_FUEL_COST, 0.8),
                Effect::additive(targets::TRAVEL_SPEED, 0.5),
            ],
        },
        FormationData {
            id: "salvage_net".into(),
            name: "Salvage Net".into(),
            requires: doctrine.clone(),
            effects: vec![
                Effect::multiplier(targets::SALVAGE_REWARD, 1.2),
                Effect::multiplier(targets::mission_time(MissionKind::Salvage), 1.1),
            ],
        },
        FormationData {
            id: "picket_line".into(),
            name: "Picket Line".into(),
            requires: doctrine,
            effects: vec![Effect::additive(
                targets::mission_success(MissionKind::Scout),
                0.1,
            )],
        },
    ]
}

fn contracts() -> Vec<ContractData> {
    vec![
        ContractData {
            id: "metal_shipment".into(),
            name: "Metal Shipment".into(),
            demand: Cost::single(Metal, 2000.0),
            reward: Cost::single(Crystal, 400.0).with(Fuel, 100.0),
            duration_secs: 900.0,
        },
        ContractData {
            id: "fuel_run".into(),
            name: "Fuel Run".into(),
            demand: Cost::single(Fuel, 300.0),
            reward: Cost::single(Metal, 2500.0),
            duration_secs: 1200.0,
        },
        ContractData {
            id: "crystal_order".into(),
            name: "Crystal Order".into(),
            demand: Cost::single(Crystal, 1000.0),
            reward: Cost::single(Artifacts, 1.0).with(Metal, 3000.0),
            duration_secs: 1800.0,
        },
    ]
}
