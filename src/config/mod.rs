//! Configuration management for the engine.
//!
//! Settings come from an optional TOML file (`config.toml`, or the path in
//! `MARKETPLACE_CONFIG`) and from environment variables for the database.

/// Database configuration and connection management
pub mod database;

/// Plan catalog overrides from config.toml
pub mod plans;

/// Referral link and campaign slug settings
pub mod referrals;

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "MARKETPLACE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Overrides applied on top of the built-in plan catalog
    #[serde(default)]
    pub plans: Vec<plans::PlanConfig>,
    /// Identifier generation settings
    #[serde(default)]
    pub referrals: referrals::ReferralSettings,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.referrals.validate()?;
    Ok(config)
}

/// Loads configuration from `MARKETPLACE_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: the built-in defaults are used instead.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        tracing::info!("No configuration file at {path}, using built-in defaults");
        return Ok(AppConfig::default());
    }
    load_config(path)
}
