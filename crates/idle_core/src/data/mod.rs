//! Data structures for game content.
//!
//! This module contains pure data structures that define resources, units,
//! missions, locations, derelicts, upgrades, formations and contracts. All
//! structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `idle_headless`.

mod contract_data;
mod derelict_data;
mod game_data;
mod location_data;
mod mission_data;
mod resource_data;
mod standard;
mod unit_data;
mod upgrade_data;

pub use contract_data::ContractData;
pub use derelict_data::{DerelictData, Rarity, RarityWeights, RewardLine};
pub use game_data::{GameData, StartingUnit};
pub use location_data::{LocationData, Requirements};
pub use mission_data::{ActionData, MissionAction, MissionKind, MissionKindData};
pub use resource_data::ResourceData;
pub use unit_data::UnitData;
pub use upgrade_data::{FormationData, UpgradeData};
