//! TOML-based configuration for pickwise.
//!
//! The file is optional. Every field has a default, and command-line flags
//! override whatever the file sets via [`PickConfig::merge_cli`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::models::ReplayOptions;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickConfig {
    /// How each commit is replayed.
    #[serde(default)]
    pub replay: ReplayOptions,

    /// Terminal output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Colorize output. Colors are still dropped when stdout is not a tty.
    #[serde(default = "default_true")]
    pub color: bool,

    /// Minimum tracing level: trace, debug, info, warn, error, off.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: default_true(), log_level: default_log_level() }
    }
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".into()
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl PickConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: PickConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replay.mainline == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "replay.mainline".into(),
                detail: "parent numbers start at 1".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.output.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "output.log_level".into(),
                detail: format!(
                    "unknown level '{}', expected one of {}",
                    self.output.log_level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Load from `path` when given, defaults otherwise, then validate.
    pub fn load_optional<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => {
                debug!("no configuration file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Fold command-line replay flags over the file values. Boolean flags
    /// can only switch a setting on; `mainline` replaces the file value.
    pub fn merge_cli(&mut self, flags: &ReplayOptions) {
        self.replay.record_origin |= flags.record_origin;
        self.replay.allow_empty |= flags.allow_empty;
        if flags.mainline.is_some() {
            self.replay.mainline = flags.mainline;
        }
    }
}
