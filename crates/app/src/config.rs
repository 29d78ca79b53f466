//! Runtime configuration read from the environment.

use std::path::PathBuf;

use courier_infrastructure::{DEFAULT_MAX_REDIRECTS, TransportConfig, default_data_dir};

/// Directory holding the workspace file.
pub const DATA_DIR_VAR: &str = "COURIER_DATA_DIR";
/// Tracing filter; `RUST_LOG` is consulted when unset.
pub const LOG_VAR: &str = "COURIER_LOG";
/// Transport `User-Agent`.
pub const USER_AGENT_VAR: &str = "COURIER_USER_AGENT";
/// Transport redirect limit.
pub const MAX_REDIRECTS_VAR: &str = "COURIER_MAX_REDIRECTS";
/// Send the active tab after start-up when `1` or `true`.
pub const SEND_ACTIVE_VAR: &str = "COURIER_SEND_ACTIVE";

/// Errors in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No data dir was given and the platform has no config dir.
    #[error("{DATA_DIR_VAR} is not set and no config directory could be determined")]
    NoDataDir,

    /// A numeric variable did not parse.
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `workspace.json`.
    pub data_dir: PathBuf,
    /// Tracing filter directive.
    pub log_filter: String,
    /// Transport settings.
    pub transport: TransportConfig,
    /// Whether to send the active tab after start-up.
    pub send_active: bool,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = match set(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };

        let log_filter = set(LOG_VAR)
            .or_else(|| set("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let mut transport = TransportConfig::default();
        if let Some(agent) = set(USER_AGENT_VAR) {
            transport.user_agent = agent;
        }
        transport.max_redirects = match set(MAX_REDIRECTS_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: MAX_REDIRECTS_VAR,
                    value,
                })?,
            None => DEFAULT_MAX_REDIRECTS,
        };

        let send_active = set(SEND_ACTIVE_VAR)
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"));

        Ok(Self {
            data_dir,
            log_filter,
            transport,
            send_active,
        })
    }
}
