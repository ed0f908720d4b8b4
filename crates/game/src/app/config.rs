use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::ship::DEFAULT_COLUMNS;

pub const CONFIG_ENV_VAR: &str = "WATERLINE_CONFIG";

/// Session tuning. Loaded from an optional JSON file; anything not given
/// falls back to the built-in values, so a config file may override a single
/// knob.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Fixed column count of the ship grid.
    pub columns: usize,
    /// Draught change per net (weight − buoyancy) unit per second.
    pub buoyancy_scale: f32,
    /// Distance gained per speed unit per second.
    pub distance_scale: f32,
    /// Flood volume a broken hull takes on per second.
    pub flood_rate: f32,
    /// Cooldown armed when construction is confirmed.
    pub build_seconds: f32,
    /// Cooldown armed when a repair starts.
    pub repair_seconds: f32,
    pub difficulty: DifficultyConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            buoyancy_scale: 0.01,
            distance_scale: 1.0,
            flood_rate: 0.4,
            build_seconds: 3.0,
            repair_seconds: 2.5,
            difficulty: DifficultyConfig::default(),
        }
    }
}

/// The difficulty coefficient scales random damage accrual and grows the
/// longer a voyage lasts, in both distance and wall-clock terms.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DifficultyConfig {
    pub base: f32,
    pub per_distance: f32,
    pub per_second: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            per_distance: 0.002,
            per_second: 0.01,
        }
    }
}

impl DifficultyConfig {
    pub fn coefficient(&self, distance: f32, elapsed_seconds: f32) -> f32 {
        self.base + distance * self.per_distance + elapsed_seconds * self.per_second
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path} at `{location}`: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GameConfig {
    /// Tuning from the file named by `WATERLINE_CONFIG`, or the defaults. A
    /// broken config file is reported and ignored rather than fatal.
    pub fn load_or_default() -> Self {
        let Ok(path) = env::var(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        match Self::load_from_path(Path::new(&path)) {
            Ok(config) => {
                info!(path = path.as_str(), "config_loaded");
                config
            }
            Err(error) => {
                warn!(error = %error, "config_load_failed; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&text);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                location: error.path().to_string(),
                source: error.into_inner(),
            }
        })
    }
}
