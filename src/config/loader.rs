//! Configuration loader for dwarf-query
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::loader::{LoaderOptions, PointerLayout};
use crate::memory::GuestArchitecture;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "dwarf-query.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_metadata")]
    pub metadata: MetadataConfig,

    #[serde(default = "default_loader")]
    pub loader: LoaderConfig,

    #[serde(default = "default_reader")]
    pub reader: ReaderConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Metadata source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_path")]
    pub path: String,
}

/// Metadata loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

/// Typed reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default = "default_architecture")]
    pub architecture: GuestArchitecture,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append logs here instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Config {
    /// Loader options derived from the `[loader]` and `[reader]` sections
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            max_threads: self.loader.max_threads,
            parallel_threshold: self.loader.parallel_threshold,
            verbose: self.loader.verbose,
            default_pointer: PointerLayout {
                size_bytes: self.reader.architecture.pointer_size() as u64,
                is_little_endian: true,
            },
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if the file is missing or unreadable
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(ConfigError::FileNotFound(_)) => Config::default(),
            Err(err) => {
                warn!(path = %self.config_path.display(), error = %err, "using default configuration");
                Config::default()
            }
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    Ok(ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default())
}

// Default functions for serde
fn default_metadata() -> MetadataConfig {
    MetadataConfig {
        path: default_metadata_path(),
    }
}

fn default_loader() -> LoaderConfig {
    let defaults = default_config();
    LoaderConfig {
        max_threads: defaults.loader.max_threads,
        parallel_threshold: defaults.loader.parallel_threshold,
        verbose: defaults.loader.verbose,
    }
}

fn default_reader() -> ReaderConfig {
    ReaderConfig {
        architecture: default_architecture(),
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        file: defaults.logging.file,
    }
}

// Individual field defaults
fn default_metadata_path() -> String {
    default_config().metadata.path
}

fn default_max_threads() -> usize {
    default_config().loader.max_threads
}

fn default_parallel_threshold() -> usize {
    default_config().loader.parallel_threshold
}

fn default_verbose() -> bool {
    default_config().loader.verbose
}

fn default_architecture() -> GuestArchitecture {
    default_config().reader.architecture
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            metadata: default_metadata(),
            loader: default_loader(),
            reader: default_reader(),
            logging: default_logging(),
        }
    }
}
