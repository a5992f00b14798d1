//! # Configuration
//!
//! YAML settings for table building, statistics and logging.
//!
//! ## Search Path
//!
//! [`SpectclConfig::load`] reads the first file found:
//! 1. the path in the `SPECTCL_CONFIG` environment variable
//! 2. `./spectcl.yaml`
//! 3. `config.yaml` in the user config directory (e.g. `~/.config/spectcl/`)
//! 4. `/etc/spectcl/config.yaml`
//!
//! and falls back to defaults when none exists.
//!
//! ## Example Configuration
//!
//! ```yaml
//! table:
//!   out_of_range: clamp
//!
//! stats:
//!   ddof: 0
//!   degeneracy: error
//!
//! logging:
//!   level: debug
//!   format: compact
//! ```

use crate::analysis::{Degeneracy, StatsConfig, WeightedStats};
use crate::logging::LogConfig;
use crate::spectrum::OutOfRangePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "SPECTCL_CONFIG";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Spectrum table settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// What to do with channels outside `[0, bins)`
    pub out_of_range: OutOfRangePolicy,
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectclConfig {
    pub version: String,
    pub table: TableConfig,
    pub stats: StatsConfig,
    pub logging: LogConfig,
}

impl Default for SpectclConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            table: TableConfig::default(),
            stats: StatsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl SpectclConfig {
    /// Load from the search path, or defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points to {}",
                    CONFIG_ENV,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        match Self::config_search_paths().iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Candidate files after the environment variable, in search order.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./spectcl.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "spectcl") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/spectcl/config.yaml"));
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Validation("version must not be empty".into()));
        }
        if let Some(filter) = &self.logging.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "logging.filter must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Statistics engine built from the `stats` section
    pub fn weighted_stats(&self) -> WeightedStats {
        WeightedStats::new(self.stats)
    }

    /// Example configuration with every section spelled out.
    pub fn example_yaml() -> String {
        let config = Self {
            table: TableConfig {
                out_of_range: OutOfRangePolicy::Clamp,
            },
            stats: StatsConfig {
                ddof: 0,
                degeneracy: Degeneracy::Error,
            },
            logging: LogConfig::development(),
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }
}
