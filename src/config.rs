//! Configuration management for chainstate

use crate::error::{Result, StateError};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Skip the database entirely and keep state in memory only
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            in_memory: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    let config_str = fs::read_to_string("chainstate.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Sane defaults when chainstate.toml is absent
        Config::default()
    } else {
        toml::from_str(&config_str)
            .map_err(|e| StateError::ConfigError(format!("Failed to parse chainstate.toml: {}", e)))?
    };

    // Validate critical values
    if !config.database.in_memory && config.database.path.is_empty() {
        return Err(StateError::ConfigError(
            "database.path must be set in chainstate.toml".to_string(),
        ));
    }

    Ok(config)
}

fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("./data"));
    base.join("chainstate")
        .join("chainstate.db")
        .to_string_lossy()
        .into_owned()
}
