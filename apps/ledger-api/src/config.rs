//! Ledger API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use ledger_db::DbConfig;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Ledger API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Wait for a pooled connection before failing the request
    pub db_acquire_timeout: Duration,

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            bind_addr: lookup("LEDGER_BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_BIND_ADDR".to_string()))?,

            database_path: lookup("LEDGER_DATABASE_PATH")
                .unwrap_or_else(|| "./ledger.db".to_string())
                .into(),

            db_max_connections: lookup("LEDGER_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_DB_MAX_CONNECTIONS".to_string()))?,

            db_acquire_timeout: lookup("LEDGER_DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| {
                    ConfigError::InvalidValue("LEDGER_DB_ACQUIRE_TIMEOUT_SECS".to_string())
                })?,

            run_migrations: lookup("LEDGER_RUN_MIGRATIONS")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_RUN_MIGRATIONS".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "LEDGER_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired(
                "LEDGER_DATABASE_PATH".to_string(),
            ));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .acquire_timeout(self.db_acquire_timeout)
            .run_migrations(self.run_migrations)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
