//! Layout engine settings
//!
//! Stored as TOML. Every field has a default, so a partial or empty file is
//! valid.

use serde::{Deserialize, Serialize};

use crate::layout::{SIZE_TOLERANCE, SplitDirection};
use crate::tracing::{TracingConfig, TracingLevel};

/// Title marker the block store uses for blocks whose process has exited.
pub const DEFAULT_EXITED_TITLE_MARKER: &str = "[exited]";

/// Settings for the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Allowed deviation from 1.0 when checking that sibling sizes sum to one.
    pub size_tolerance: f64,
    /// Blocks whose title contains this marker are closed by state validation.
    ///
    /// An empty marker disables the exited-block sweep.
    pub exited_title_marker: String,
    /// Direction of the root branch created for a fresh or maximized layout.
    pub default_direction: SplitDirection,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            size_tolerance: SIZE_TOLERANCE,
            exited_title_marker: DEFAULT_EXITED_TITLE_MARKER.to_owned(),
            default_direction: SplitDirection::Horizontal,
            logging: LoggingSettings::default(),
        }
    }
}

impl LayoutSettings {
    /// Returns the size tolerance, falling back to the default when the
    /// configured value is unusable.
    #[must_use]
    pub fn effective_tolerance(&self) -> f64 {
        if self.size_tolerance.is_finite() && self.size_tolerance > 0.0 {
            self.size_tolerance
        } else {
            SIZE_TOLERANCE
        }
    }
}

/// Logging section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level to record.
    pub level: TracingLevel,
    /// `EnvFilter` directive string; overrides `level` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl LoggingSettings {
    /// Builds the tracing configuration for these settings.
    #[must_use]
    pub fn to_tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::new().with_level(self.level);
        match &self.filter {
            Some(filter) => config.with_filter(filter.clone()),
            None => config,
        }
    }
}
