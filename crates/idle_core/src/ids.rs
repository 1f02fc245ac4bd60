//! Identifier newtypes.
//!
//! Content identifiers (unit kinds, locations, upgrades, ...) are strings
//! taken from the data tables. Live entity identifiers (missions, derelicts)
//! are monotonically assigned integers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new identifier.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

content_id!(
    /// Unit kind identifier, e.g. `"mining_drone"`.
    UnitKind
);
content_id!(
    /// Location identifier, e.g. `"mars"`.
    LocationId
);
content_id!(
    /// Purchasable upgrade identifier (tech, unit upgrade, alien tech, perk).
    UpgradeId
);
content_id!(
    /// Fleet formation identifier.
    FormationId
);
content_id!(
    /// Derelict type identifier, e.g. `"cargo_hauler"`.
    DerelictKind
);
content_id!(
    /// Contract identifier.
    ContractId
);

entity_id!(
    /// Identifier of a live mission.
    MissionId
);
entity_id!(
    /// Identifier of a spawned derelict.
    DerelictId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_display_and_from() {
        let id = UnitKind::from("mining_drone");
        assert_eq!(id.as_str(), "mining_drone");
        assert_eq!(id.to_string(), "mining_drone");
        assert_eq!(LocationId::new(String::from("mars")), LocationId::from("mars"));
    }

    #[test]
    fn test_entity_id_ordering() {
        assert!(MissionId::new(1) < MissionId::new(2));
        assert_eq!(DerelictId::new(7).to_string(), "#7");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&UnitKind::from("scout_ship")).unwrap();
        assert_eq!(json, "\"scout_ship\"");
        let json = serde_json::to_string(&MissionId::new(4)).unwrap();
        assert_eq!(json, "4");
    }
}
