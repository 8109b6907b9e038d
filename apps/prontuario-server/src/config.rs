//! Server configuration.
//!
//! Supports configuration via environment variables:
//!
//! ```bash
//! # Seconds a credential stays valid after login (default 10)
//! PRONTUARIO_CREDENTIAL_LIFETIME_SECS=10
//!
//! # Where `report` commands write rendered files (default: current directory)
//! PRONTUARIO_REPORT_DIR=/var/lib/prontuario/reports
//! ```

use std::env;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_CREDENTIAL_LIFETIME_SECS: i64 = 10;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long a credential stays usable after issuance.
    pub credential_lifetime: Duration,
    /// Default output directory for rendered reports.
    pub report_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            credential_lifetime: Duration::seconds(DEFAULT_CREDENTIAL_LIFETIME_SECS),
            report_dir: PathBuf::from("."),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid credential lifetime: {0}. Expected a positive number of seconds")]
    InvalidLifetime(String),
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("PRONTUARIO_CREDENTIAL_LIFETIME_SECS") {
            let secs: i64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidLifetime(raw.clone()))?;
            if secs <= 0 {
                return Err(ConfigError::InvalidLifetime(raw));
            }
            config.credential_lifetime =
                Duration::try_seconds(secs).ok_or(ConfigError::InvalidLifetime(raw))?;
        }

        if let Some(dir) = lookup("PRONTUARIO_REPORT_DIR").filter(|d| !d.is_empty()) {
            config.report_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
