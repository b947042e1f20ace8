//! TOML configuration for cqm-ap
//!
//! ```toml
//! [player]
//! event_capacity = 1000
//! clip_duration_ms = 2000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use std::path::Path;
use std::time::Duration;

use cqm_common::config::{load_toml, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Root of the config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TomlConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[player]` section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Broadcast buffer size of the event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// How long each simulated clip plays
    #[serde(default = "default_clip_duration_ms")]
    pub clip_duration_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            clip_duration_ms: default_clip_duration_ms(),
        }
    }
}

fn default_event_capacity() -> usize {
    1000
}

fn default_clip_duration_ms() -> u64 {
    2000
}

impl TomlConfig {
    /// Resolve the config file (CLI path, then `CQM_CONFIG`, then the
    /// platform default) and load it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR);
        let config: Self = load_toml(path.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.player.event_capacity == 0 {
            return Err(Error::Config(
                "player.event_capacity must be greater than 0".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn clip_duration(&self) -> Duration {
        Duration::from_millis(self.player.clip_duration_ms)
    }
}
