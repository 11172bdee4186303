//! Configuration file support for REB Parser.
//!
//! Loads run settings from `~/.config/reb-parser/config.toml` on Linux
//! (or platform-appropriate location on other OSes). Command-line flags
//! override anything set here.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::OutputFormat;
use crate::region::Region;

/// Default location of the station catalog, relative to the working directory.
pub const DEFAULT_STATIONS_FILE: &str = "resources/stations.json";

/// Run configuration loaded from TOML.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON station catalog.
    pub stations_file: PathBuf,

    /// Directory to scan for bulletins.
    pub root: Option<PathBuf>,

    /// Stations an event may be corroborated by. Empty means all of them.
    pub stations: Vec<String>,

    /// Region events must fall inside.
    pub region: Region,

    /// Result file. Results go to stdout when unset.
    pub output: Option<PathBuf>,

    /// Result file format.
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stations_file: PathBuf::from(DEFAULT_STATIONS_FILE),
            root: None,
            stations: Vec::new(),
            region: Region::default(),
            output: None,
            format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reb-parser/config.toml"))
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        self.region.validate().context("Invalid region")?;
        if let Some(name) = self.stations.iter().find(|s| s.trim().is_empty()) {
            bail!("Invalid station name: '{}'", name);
        }
        Ok(())
    }
}
