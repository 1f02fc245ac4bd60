//! Save files on disk.
//!
//! A save is the JSON snapshot text produced by
//! [`Simulation::export_json`]. Writes go to a sibling temp file first and
//! are renamed into place, so a crash mid-write never leaves a truncated
//! save behind.

use std::fs;
use std::path::{Path, PathBuf};

use idle_core::clock::Millis;
use idle_core::error::GameError;
use idle_core::offline::OfflineReport;
use idle_core::simulation::Simulation;
use thiserror::Error;

/// Errors from reading or writing saves.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Filesystem failure.
    #[error("IO error on save '{path}': {source}")]
    Io {
        /// Save file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The engine could not encode or decode the save.
    #[error("Save '{path}' rejected: {source}")]
    Engine {
        /// Save file.
        path: PathBuf,
        /// Engine error.
        source: GameError,
    },
}

/// A save slot backed by one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    /// Slot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a save has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn io(&self, source: std::io::Error) -> SaveError {
        SaveError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn engine(&self, source: GameError) -> SaveError {
        SaveError::Engine {
            path: self.path.clone(),
            source,
        }
    }

    /// Write `text` to the slot.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if the temp file cannot be written or renamed.
    pub fn write_text(&self, text: &str) -> Result<(), SaveError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(|e| self.io(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io(e))
    }

    /// Raw save text.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Io`] if the file cannot be read.
    pub fn load_text(&self) -> Result<String, SaveError> {
        fs::read_to_string(&self.path).map_err(|e| self.io(e))
    }

    /// Write the simulation's current state.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if encoding or writing fails.
    pub fn save(&self, sim: &Simulation) -> Result<(), SaveError> {
        let text = sim.export_json().map_err(|e| self.engine(e))?;
        self.write_text(&text)?;
        tracing::debug!(path = %self.path.display(), tick = sim.state().tick, "Saved game");
        Ok(())
    }

    /// Replace the simulation's state with this save and catch it up to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if the file cannot be read or is not a save. The
    /// simulation is left untouched in that case.
    pub fn load_into(&self, sim: &mut Simulation, now: Millis) -> Result<Option<OfflineReport>, SaveError> {
        let text = self.load_text()?;
        let report = sim.import_json(&text, now).map_err(|e| self.engine(e))?;
        tracing::info!(
            path = %self.path.display(),
            tick = sim.state().tick,
            caught_up = report.is_some(),
            "Loaded game"
        );
        Ok(report)
    }
}
