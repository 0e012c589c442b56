//! Simulation tuning loaded from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::LogLevel;

/// Largest tile count a configured map may hold.
pub const MAX_MAP_TILES: u64 = 1 << 24;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document was not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The movement journal needs room for at least one entry.
    #[error("journal capacity must be positive")]
    ZeroJournalCapacity,
    /// The default map needs a border and at least one interior tile.
    #[error("map of {width}x{height} tiles is too small, need at least 3x3")]
    MapTooSmall {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The default map would hold more than [`MAX_MAP_TILES`] tiles.
    #[error("map of {width}x{height} tiles exceeds the limit of {MAX_MAP_TILES} tiles")]
    MapTooLarge {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
}

/// Dimensions of the lazily materialized default map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum number of movement journal entries retained.
    pub journal_capacity: usize,
    /// Lowest log severity echoed to tracing.
    pub log_print_level: LogLevel,
    /// Default map dimensions.
    pub map: MapConfig,
    /// Seed for autonomous behaviours that do not pick their own.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            journal_capacity: 512,
            log_print_level: LogLevel::Info,
            map: MapConfig::default(),
            seed: 0x5eed,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.journal_capacity == 0 {
            return Err(ConfigError::ZeroJournalCapacity);
        }
        if self.map.width < 3 || self.map.height < 3 {
            return Err(ConfigError::MapTooSmall {
                width: self.map.width,
                height: self.map.height,
            });
        }
        if u64::from(self.map.width) * u64::from(self.map.height) > MAX_MAP_TILES {
            return Err(ConfigError::MapTooLarge {
                width: self.map.width,
                height: self.map.height,
            });
        }
        Ok(())
    }
}
