//! Server configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use rollcall_attendance::AttendanceConfig;
use rollcall_db::DbConfig;
use serde::Deserialize;

use crate::error::ServerError;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_ENV: &str = "ROLLCALL_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub attendance: AttendanceConfig,
    /// Seconds between expiry sweeps (default: 60).
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            attendance: AttendanceConfig::default(),
            sweep_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `ROLLCALL_CONFIG`, or fall back to
    /// defaults when the variable is unset.
    pub fn load() -> Result<Self, ServerError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(&PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ServerError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(raw)?)
    }
}
