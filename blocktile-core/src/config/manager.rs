//! Settings file loading and saving

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::LayoutSettings;

/// Directory under the user config directory holding `blocktile` files.
pub const CONFIG_DIR_NAME: &str = "blocktile";

/// Settings file name.
pub const CONFIG_FILE_NAME: &str = "layout.toml";

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory could be determined for this user.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for these settings.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Loads and saves [`LayoutSettings`] from a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the default settings file
    /// (`<config dir>/blocktile/layout.toml`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_path(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    /// Creates a manager for an explicit settings file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the settings file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<LayoutSettings, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Settings file missing, using defaults");
            return Ok(LayoutSettings::default());
        }
        let text = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Saves the settings, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, settings: &LayoutSettings) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(settings)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "Saved layout settings");
        Ok(())
    }
}
