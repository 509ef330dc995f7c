use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles loading, validating and saving the settings of the
/// query layer: where the content store lives and how it is accessed.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Content store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How `random = true` queries are ordered
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RandomStrategy {
    // @strategy: SQLite ORDER BY RANDOM()
    #[default]
    Store,
    // @strategy: Fetch the filtered candidates and shuffle them in memory
    Shuffle,
}

impl std::fmt::Display for RandomStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Shuffle => write!(f, "shuffle"),
        }
    }
}

impl std::str::FromStr for RandomStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "store" => Ok(Self::Store),
            "shuffle" => Ok(Self::Shuffle),
            _ => Err(anyhow!("Invalid random strategy: {}", s)),
        }
    }
}

/// Content store configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    // @field: SQLite file; None means the default data directory location
    #[serde(default)]
    pub path: Option<PathBuf>,

    // @field: Max connections checked out at once
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    // @field: Open the store read-only
    #[serde(default = "default_true")]
    pub read_only: bool,

    // @field: Randomization used for random-order queries
    #[serde(default)]
    pub random_strategy: RandomStrategy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            read_only: default_true(),
            random_strategy: RandomStrategy::default(),
        }
    }
}

impl DatabaseConfig {
    /// Config pointing at a specific SQLite file
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Resolve the configured path, falling back to the data directory
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "english_learning.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "cefr-query";

fn default_pool_size() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Get the default database path
pub fn default_database_path() -> Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;

    Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(anyhow!("database.pool_size must be at least 1"));
        }

        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("database.path must not be empty"));
            }
        }

        Ok(())
    }
}
