//! Service configuration from environment variables
//!
//! | Variable                  | Default    |
//! |---------------------------|------------|
//! | `CASELOG_HOST`            | (all)      |
//! | `CASELOG_PORT`            | `8000`     |
//! | `CASELOG_DATA_FILE`       | `db.jsonl` |
//! | `CASELOG_SYNC_WRITES`     | `true`     |
//! | `CASELOG_ON_CORRUPT_LINE` | `abort`    |
//!
//! Empty values count as unset.

use std::env;
use std::path::PathBuf;

use crate::event_store::{CorruptionPolicy, LogStoreConfig};

pub const HOST_VAR: &str = "CASELOG_HOST";
pub const PORT_VAR: &str = "CASELOG_PORT";
pub const DATA_FILE_VAR: &str = "CASELOG_DATA_FILE";
pub const SYNC_WRITES_VAR: &str = "CASELOG_SYNC_WRITES";
pub const ON_CORRUPT_LINE_VAR: &str = "CASELOG_ON_CORRUPT_LINE";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_FILE: &str = "db.jsonl";

/// Errors raised while reading configuration
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid environment variable CASELOG_PORT, it should be a positive integer, got {0:?}")]
    InvalidPort(String),

    #[error("invalid environment variable CASELOG_SYNC_WRITES, it should be true or false, got {0:?}")]
    InvalidBool(String),

    #[error("invalid environment variable CASELOG_ON_CORRUPT_LINE: {0}")]
    InvalidPolicy(String),
}

/// Runtime configuration for the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub sync_writes: bool,
    pub on_corrupt_line: CorruptionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            sync_writes: true,
            on_corrupt_line: CorruptionPolicy::Abort,
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(HOST_VAR) {
            config.host = host;
        }

        if let Some(port) = get(PORT_VAR) {
            config.port = match port.trim().parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => return Err(ConfigError::InvalidPort(port)),
            };
        }

        if let Some(path) = get(DATA_FILE_VAR) {
            config.data_file = PathBuf::from(path);
        }

        if let Some(sync) = get(SYNC_WRITES_VAR) {
            config.sync_writes = match sync.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(ConfigError::InvalidBool(sync)),
            };
        }

        if let Some(policy) = get(ON_CORRUPT_LINE_VAR) {
            config.on_corrupt_line = policy.parse().map_err(ConfigError::InvalidPolicy)?;
        }

        Ok(config)
    }

    /// Socket address to listen on. An empty host binds all interfaces.
    pub fn addr(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        };
        format!("{}:{}", host, self.port)
    }

    /// Settings for the event log
    pub fn store_config(&self) -> LogStoreConfig {
        LogStoreConfig::new(&self.data_file)
            .with_sync_writes(self.sync_writes)
            .with_corruption_policy(self.on_corrupt_line)
    }
}
