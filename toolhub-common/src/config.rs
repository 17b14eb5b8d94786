//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority, clap also reads the ENV fallback)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable TOML file is never fatal; it logs a warning and
//! the compiled defaults apply.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TOOLHUB_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "toolhub.db";

/// Default HTTP port for the scoring service
pub const DEFAULT_PORT: u16 = 5740;

/// Default bind address for the scoring service
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Tunables of the score resolver and comparison engine
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Minimum aggregated confidence (0-100) for aggregated scores to be shown
    pub confidence_threshold: f64,
    /// Neutral midpoint used when no source has a value for a metric
    pub default_score: f64,
    /// Largest tool selection the comparison engine accepts
    pub max_compare_tools: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 70.0,
            default_score: 5.0,
            max_compare_tools: 3,
        }
    }
}

/// Optional scoring settings from one configuration layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoringOverrides {
    pub confidence_threshold: Option<f64>,
    pub default_score: Option<f64>,
    pub max_compare_tools: Option<usize>,
}

impl ScoringConfig {
    /// Merge layers, earlier layers winning, then validate
    pub fn from_layers(layers: &[&ScoringOverrides]) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            confidence_threshold: layers
                .iter()
                .find_map(|l| l.confidence_threshold)
                .unwrap_or(defaults.confidence_threshold),
            default_score: layers
                .iter()
                .find_map(|l| l.default_score)
                .unwrap_or(defaults.default_score),
            max_compare_tools: layers
                .iter()
                .find_map(|l| l.max_compare_tools)
                .unwrap_or(defaults.max_compare_tools),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the resolver cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be within 0-100, got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=10.0).contains(&self.default_score) {
            return Err(Error::Config(format!(
                "default_score must be within 0-10, got {}",
                self.default_score
            )));
        }
        if self.max_compare_tools < 2 {
            return Err(Error::Config(format!(
                "max_compare_tools must be at least 2, got {}",
                self.max_compare_tools
            )));
        }
        Ok(())
    }
}

/// Contents of `config.toml`
///
/// ```toml
/// root_folder = "/var/lib/toolhub"
/// port = 5740
/// recompute_interval_secs = 3600
///
/// [scoring]
/// confidence_threshold = 70.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub recompute_interval_secs: Option<u64>,
    #[serde(default)]
    pub scoring: ScoringOverrides,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load the platform config file, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = config_file_path() else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Locate the config file for the platform
///
/// User config (`<config_dir>/toolhub/config.toml`) wins over the system
/// config (`/etc/toolhub/config.toml`, Linux only).
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("toolhub").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/toolhub/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the folder holding the database
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("toolhub"))
        .unwrap_or_else(|| PathBuf::from("./toolhub_data"))
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}
