//! Service settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SLOTS_*` environment variables and config
//! files, in OrthoConfig's usual precedence. Unset values fall back to the
//! defaults below; [`AppSettings::resolve`] validates the result once at
//! startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_ROOT: &str = ".";
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/slots";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Raw settings as loaded from the environment.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SLOTS")]
pub struct AppSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// Directory holding the front-end assets.
    pub static_root: Option<PathBuf>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Seconds allowed for the initial database connection.
    pub connect_timeout_secs: Option<u64>,
    /// Seconds allowed for each store call made by a command.
    pub request_timeout_secs: Option<u64>,
    /// Seconds allowed for in-flight requests to finish on shutdown.
    pub shutdown_grace_secs: Option<u64>,
    /// Maximum number of pooled database connections.
    pub pool_max_size: Option<u32>,
}

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address `{value}`: {reason}")]
    BindAddr { value: String, reason: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Validated settings used to wire the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub bind_addr: SocketAddr,
    pub static_root: PathBuf,
    pub database_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    pub pool_max_size: u32,
}

fn positive_secs(value: Option<u64>, key: &'static str) -> Result<Duration, SettingsError> {
    match value.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => Err(SettingsError::Zero { key }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

impl AppSettings {
    /// Apply defaults and validate every value.
    ///
    /// # Errors
    /// Returns [`SettingsError`] for an unparsable bind address or a zero
    /// timeout or pool size.
    pub fn resolve(&self) -> Result<RuntimeSettings, SettingsError> {
        let raw_addr = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|err| SettingsError::BindAddr {
                value: raw_addr.to_owned(),
                reason: err.to_string(),
            })?;
        let pool_max_size = match self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE) {
            0 => return Err(SettingsError::Zero { key: "pool_max_size" }),
            size => size,
        };

        Ok(RuntimeSettings {
            bind_addr,
            static_root: self
                .static_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_ROOT)),
            database_url: self
                .database_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            connect_timeout: positive_secs(self.connect_timeout_secs, "connect_timeout_secs")?,
            request_timeout: positive_secs(self.request_timeout_secs, "request_timeout_secs")?,
            shutdown_grace: positive_secs(self.shutdown_grace_secs, "shutdown_grace_secs")?,
            pool_max_size,
        })
    }
}
