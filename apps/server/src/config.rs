//! Server configuration module.
//!
//! Layered with the `config` crate, later sources overriding earlier ones:
//!
//! ```text
//!   built-in defaults
//!     └─► config/stockroom.toml          (optional)
//!           └─► STOCKROOM__HTTP_PORT=9000 (environment, `__` separator)
//! ```

use std::net::SocketAddr;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use stockroom_core::CartAtomicity;

/// Default location of the optional config file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_FILE: &str = "config/stockroom";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind_address: String,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// HS256 secret shared with the auth service that issues bearer tokens
    pub jwt_secret: String,

    /// Display label printed in front of amounts on receipts
    pub currency_label: String,

    /// Whether a multi-item sale or return commits as one unit
    pub cart_atomicity: CartAtomicity,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            database_path: "./stockroom.db".to_string(),
            db_max_connections: 5,
            jwt_secret: "stockroom-dev-secret-change-in-production".to_string(),
            currency_label: "PKR".to_string(),
            cart_atomicity: CartAtomicity::AllOrNothing,
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then `config/stockroom.toml` if present, then
    /// `STOCKROOM__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`ServerConfig::load`] with an explicit file stem.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&ServerConfig::default())?;

        let config: ServerConfig = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("STOCKROOM").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue("http_port".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_address".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.currency_label, "PKR");
        assert_eq!(config.cart_atomicity, CartAtomicity::AllOrNothing);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load_from("does/not/exist/stockroom").unwrap();
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        let mut config = ServerConfig::default();
        config.http_port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = ServerConfig::default();
        config.db_max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = ServerConfig::default();
        config.bind_address = "not an address".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }
}
