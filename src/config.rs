//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Lookup order: an explicit `--config` path, then
//! `<config_home>/fxstatement/config.toml`, then built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::rates::mnb::MNB_RATE_TABLE_URL;

const CONFIG_DIR: &str = "fxstatement";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Appended to the input file stem when naming the output file
    pub output_suffix: String,
    pub source_currency: String,
    pub target_currency: String,
    /// Days fetched before the earliest transaction so weekend and holiday
    /// dates still find an earlier published rate
    pub lookback_days: u32,
    pub rate_source: RateSourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("files/input"),
            output_dir: PathBuf::from("files/output"),
            output_suffix: String::new(),
            source_currency: "USD".to_string(),
            target_currency: "HUF".to_string(),
            lookback_days: 7,
            rate_source: RateSourceConfig::default(),
        }
    }
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        Self {
            url: MNB_RATE_TABLE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl RateSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading config file: {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("Parsing config TOML in {}", path.display()))?;
    Ok(config)
}

/// `<config_home>/fxstatement/config.toml`, if the platform has a config home
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load from an explicit path, else the default location, else defaults
///
/// An explicit path that can't be read is an error; a missing default
/// config file is not.
pub fn load_config_with_fallback(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        info!("Loading config from {}", path.display());
        return load_config(path);
    }

    match default_config_path() {
        Some(default_path) if default_path.is_file() => {
            info!("Loading config from {}", default_path.display());
            load_config(&default_path)
        }
        _ => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
