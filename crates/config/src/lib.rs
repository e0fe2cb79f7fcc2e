#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for modelsync
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/modelsync/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use modelsync_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Parameter file every PaddlePaddle inference model ships with
pub const DEFAULT_REQUIRED_FILE: &str = "inference.pdiparams";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    /// Seconds to wait for response headers; bodies are bounded by
    /// `chunk_timeout` alone
    pub timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout: u64, // seconds
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Where models are placed when the caller does not name a directory
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub models_dir: Option<PathBuf>,
}

/// Files that must exist and be non-empty for a model to count as ready
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_required_files")]
    pub required_files: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 120,
            connect_timeout: 30,
            chunk_timeout: 60,
            user_agent: None,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_files: default_required_files(),
        }
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_chunk_timeout() -> u64 {
    60
}

fn default_required_files() -> Vec<String> {
    vec![DEFAULT_REQUIRED_FILE.to_string()]
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    #[must_use]
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout)
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("modelsync").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(timeout) = env_seconds("MODELSYNC_TIMEOUT")? {
            self.network.timeout = timeout;
        }
        if let Some(timeout) = env_seconds("MODELSYNC_CONNECT_TIMEOUT")? {
            self.network.connect_timeout = timeout;
        }
        if let Some(timeout) = env_seconds("MODELSYNC_CHUNK_TIMEOUT")? {
            self.network.chunk_timeout = timeout;
        }

        if let Ok(dir) = std::env::var("MODELSYNC_MODELS_DIR") {
            if !dir.is_empty() {
                self.store.models_dir = Some(PathBuf::from(dir));
            }
        }

        // Comma separated list of required files
        if let Ok(files) = std::env::var("MODELSYNC_REQUIRED_FILES") {
            let files: Vec<String> = files
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(ToString::to_string)
                .collect();
            if files.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "MODELSYNC_REQUIRED_FILES".to_string(),
                    value: String::new(),
                }
                .into());
            }
            self.validation.required_files = files;
        }

        self.validate()
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero or no required file is listed.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("network.timeout", self.network.timeout),
            ("network.connect_timeout", self.network.connect_timeout),
            ("network.chunk_timeout", self.network.chunk_timeout),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                }
                .into());
            }
        }

        if self.validation.required_files.is_empty() {
            return Err(ConfigError::Invalid {
                message: "validation.required_files must list at least one file".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get the models directory (with default)
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.store.models_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("modelsync")
                .join("models")
        })
    }
}

fn env_seconds(var: &str) -> Result<Option<u64>, Error> {
    match std::env::var(var) {
        Ok(value) => value.parse().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                field: var.to_string(),
                value,
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}
