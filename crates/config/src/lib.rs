#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mason
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/mason/config.toml)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use mason_errors::{ConfigError, Error};
use mason_types::Settings;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub build: BuildConfig,

    /// Default target settings applied when the caller does not supply
    /// a full set (os, arch, compiler, build_type, ...)
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Parallel lifecycle workers; 0 = auto-detect
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Build phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Allow collaborators network access during the source phase
    #[serde(default = "default_network_access")]
    pub network_access: bool,

    /// Stop scheduling new packages after the first failure
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            network_access: default_network_access(),
            fail_fast: false,
        }
    }
}

fn default_workers() -> usize {
    0
}

fn default_network_access() -> bool {
    true
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when the path does not exist and
    /// `ConfigError::ParseError` on malformed TOML.
    pub async fn load_from(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), "loaded configuration");
        config.validate()?;
        Ok(config)
    }

    /// Default config file path (`~/.config/mason/config.toml`)
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mason").join("config.toml"))
    }

    /// Number of lifecycle workers after auto-detection.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.general.workers == 0 {
            num_cpus::get()
        } else {
            self.general.workers
        }
    }

    /// Default target settings from the `[settings]` table.
    #[must_use]
    pub fn target_settings(&self) -> Settings {
        self.settings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn validate(&self) -> Result<(), Error> {
        if self.general.workers > 512 {
            return Err(ConfigError::InvalidValue {
                key: "general.workers".to_string(),
                message: format!("{} exceeds the supported maximum", self.general.workers),
            }
            .into());
        }
        Ok(())
    }
}
