//! Configuration management for `blocktile`
//!
//! This module provides the `ConfigManager` for loading and saving the
//! layout settings file in TOML format.

mod manager;
pub mod settings;

pub use manager::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ConfigError, ConfigManager};
pub use settings::{DEFAULT_EXITED_TITLE_MARKER, LayoutSettings, LoggingSettings};
