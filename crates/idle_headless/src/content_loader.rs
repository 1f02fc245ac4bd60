//! Content and configuration loading.
//!
//! Loads game content and engine configuration from RON files, falling
//! back to the built-in standard content and default configuration when no
//! path is given.

use std::fs;
use std::path::{Path, PathBuf};

use idle_core::config::EngineConfig;
use idle_core::data::GameData;
use idle_core::error::GameError;
use thiserror::Error;

/// Errors that can occur while loading content or configuration.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Failed to read or write a file.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file was read but is not valid content.
    #[error("Invalid content in '{path}': {source}")]
    Invalid {
        /// File involved.
        path: PathBuf,
        /// Parse or validation failure.
        source: GameError,
    },
    /// The content could not be rendered.
    #[error(transparent)]
    Render(#[from] GameError),
}

impl ContentError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load and validate content from a RON file.
pub fn load_content(path: &Path) -> Result<GameData, ContentError> {
    let text = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
    let data = GameData::load(&text).map_err(|source| ContentError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        units = data.units.len(),
        locations = data.locations.len(),
        "Loaded content"
    );
    Ok(data)
}

/// Load and validate an engine configuration from a RON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ContentError> {
    let text = fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
    let config = EngineConfig::from_ron_str(&text).map_err(|source| ContentError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), tps = config.ticks_per_second, "Loaded config");
    Ok(config)
}

/// Content from `path`, or the standard content.
pub fn content_or_standard(path: Option<&Path>) -> Result<GameData, ContentError> {
    path.map_or_else(|| Ok(GameData::standard()), load_content)
}

/// Configuration from `path`, or the defaults.
pub fn config_or_default(path: Option<&Path>) -> Result<EngineConfig, ContentError> {
    path.map_or_else(|| Ok(EngineConfig::default()), load_config)
}

/// Write `data` as pretty RON to `path`.
pub fn export_content(data: &GameData, path: &Path) -> Result<(), ContentError> {
    let text = data.to_ron_string()?;
    fs::write(path, text).map_err(|e| ContentError::io(path, e))?;
    tracing::info!(path = %path.display(), "Exported content");
    Ok(())
}
