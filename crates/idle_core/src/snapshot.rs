//! Versioned save snapshots.
//!
//! A snapshot is the whole [`GameState`] plus a format version and the time
//! it was written. JSON is the portable save format; every struct in the
//! state defaults its missing fields, so saves written by older versions
//! load with new fields at their defaults. Only text that is not a snapshot
//! at all is refused.
//!
//! Binary checkpoints use bincode and are meant for the running process
//! (rollback, determinism checks), not for long-term storage.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::error::{GameError, Result};
use crate::state::GameState;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

/// A saved game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSnapshot {
    /// Format version the snapshot was written with.
    pub version: u32,
    /// When it was written.
    pub saved_at: Millis,
    /// The game.
    pub state: GameState,
}

impl Default for SaveSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: 0,
            state: GameState::default(),
        }
    }
}

impl SaveSnapshot {
    /// Snapshot of `state`, stamped with its last known timestamp.
    #[must_use]
    pub fn new(state: &GameState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: state.last_known_timestamp,
            state: state.clone(),
        }
    }

    /// Encode as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SerializeError`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::SerializeError {
            what: "snapshot".to_string(),
            message: e.to_string(),
        })
    }

    /// Decode from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ParseError`] if the text is not a snapshot.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text).map_err(|e| GameError::ParseError {
            what: "snapshot".to_string(),
            message: e.to_string(),
        })?;
        snapshot.check_version();
        Ok(snapshot)
    }

    /// Encode as a compact binary checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SerializeError`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::SerializeError {
            what: "checkpoint".to_string(),
            message: e.to_string(),
        })
    }

    /// Decode a binary checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ParseError`] if the bytes are not a checkpoint.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = bincode::deserialize(bytes).map_err(|e| GameError::ParseError {
            what: "checkpoint".to_string(),
            message: e.to_string(),
        })?;
        snapshot.check_version();
        Ok(snapshot)
    }

    fn check_version(&self) {
        if self.version > SNAPSHOT_VERSION {
            tracing::warn!(
                version = self.version,
                supported = SNAPSHOT_VERSION,
                "Snapshot written by a newer version; unknown fields ignored"
            );
        } else if self.version < SNAPSHOT_VERSION {
            tracing::debug!(version = self.version, "Loading older snapshot with defaults");
        }
    }
}
