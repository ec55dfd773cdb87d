//! Configuration loading and data folder resolution
//!
//! Two concerns live here:
//! 1. **Data folder**: where course files, ledgers and outputs live
//! 2. **TOML bootstrap**: logging level and the small set of processing
//!    knobs (non-assessment grade items, transfer markers, labels)
//!
//! Data folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`ASA_DATA_DIR`)
//! 3. `data_dir` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the data folder
pub const DATA_DIR_ENV: &str = "ASA_DATA_DIR";

/// Config file name looked up inside the data folder and the user config dir
pub const CONFIG_FILE_NAME: &str = "asa.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Data folder (optional, see priority order above)
    pub data_dir: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Ledger update settings
    pub update: UpdateConfig,

    /// Analysis settings
    pub analysis: AnalysisConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings for reconciling submission exports into the ledgers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Grade items that are administrative rows, not assessments
    pub non_assessment_items: Vec<String>,

    /// Case-insensitive feedback substrings that mark a transfer
    pub transfer_markers: Vec<String>,

    /// Grade text written to the results ledger for a passing submission
    pub results_grade_label: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            non_assessment_items: vec!["Course total".to_string()],
            transfer_markers: vec!["transfer".to_string(), "cross credit".to_string()],
            results_grade_label: "Competent".to_string(),
        }
    }
}

/// Settings for the analysis tool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Count transferred assessments towards module completion dates
    pub keep_transfers: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keep_transfers: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load from `path`; a missing file yields defaults with a warning
    ///
    /// A file that exists but cannot be read or parsed is an error: silently
    /// ignoring a broken config would change processing rules unnoticed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&text)?;
        info!(path = %path.display(), "Loaded TOML configuration");
        Ok(config)
    }
}

/// Resolve the data folder following the documented priority order
pub fn resolve_data_dir(cli_arg: Option<&Path>, toml: Option<&TomlConfig>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml.and_then(|c| c.data_dir.clone()) {
        return path;
    }

    // Priority 4: OS-dependent compiled default
    default_data_dir()
}

/// Locate the config file: explicit path, then data folder, then user config dir
pub fn locate_config_file(cli_arg: Option<&Path>, data_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = data_dir.map(|d| d.join(CONFIG_FILE_NAME)) {
        if path.exists() {
            return path;
        }
    }

    dirs::config_dir()
        .map(|d| d.join("asa").join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Get OS-dependent default data folder path
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("asa"))
        .unwrap_or_else(|| PathBuf::from("./asa_data"))
}

/// Fully resolved settings shared by both tools
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub config: TomlConfig,
}

impl Settings {
    /// Resolve config file and data folder from CLI overrides
    ///
    /// The config file is located first (it may name the data folder), then
    /// the data folder is resolved with the CLI and environment taking
    /// precedence over the file.
    pub fn load(cli_config: Option<&Path>, cli_data_dir: Option<&Path>) -> Result<Self> {
        let env_dir = std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from);
        let search_dir = cli_data_dir.map(Path::to_path_buf).or(env_dir);
        let config_path = locate_config_file(cli_config, search_dir.as_deref());
        let config = TomlConfig::load_or_default(&config_path)?;

        let data_dir = resolve_data_dir(cli_data_dir, Some(&config));
        info!(data_dir = %data_dir.display(), "Data folder resolved");

        Ok(Self { data_dir, config })
    }
}
