//! Runtime configuration for loading maps.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

use crate::constants::{DEFAULT_SKY_MODEL, MAX_SPAWNS};
use crate::types::MapDimensions;

const DEFAULT_DATA_DIR: &str = "pork";

pub const ENV_DATA_DIR: &str = "HOW_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "HOW_LOG_LEVEL";
pub const ENV_MAX_SPAWNS: &str = "HOW_MAX_SPAWNS";
pub const ENV_SKY_MODEL: &str = "HOW_SKY_MODEL";

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainConfig {
    /// root that logical asset names are resolved against
    pub data_dir: PathBuf,
    pub dimensions: MapDimensions,
    /// largest spawn count accepted from a `.pog` stream
    pub max_spawns: usize,
    /// sky model used when a manifest names none
    pub sky_model: String,
    pub log_level: LevelFilter,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            dimensions: MapDimensions::default(),
            max_spawns: MAX_SPAWNS,
            sky_model: DEFAULT_SKY_MODEL.to_string(),
            log_level: LevelFilter::Info,
        }
    }
}

impl TerrainConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset or unparsable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = value(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(level) = value(ENV_LOG_LEVEL) {
            match LevelFilter::from_str(level.trim()) {
                Ok(level) => config.log_level = level,
                Err(_) => log::warn!("Ignoring invalid {}: {}", ENV_LOG_LEVEL, level),
            }
        }

        if let Some(max) = value(ENV_MAX_SPAWNS) {
            match max.trim().parse::<usize>() {
                Ok(max) => config.max_spawns = max,
                Err(_) => log::warn!("Ignoring invalid {}: {}", ENV_MAX_SPAWNS, max),
            }
        }

        if let Some(model) = value(ENV_SKY_MODEL) {
            config.sky_model = model;
        }

        config
    }
}
