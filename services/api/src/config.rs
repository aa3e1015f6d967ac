//! Server configuration
//!
//! Loaded once at startup from built-in defaults overridden by `APP_*`
//! environment variables (`APP_PORT`, `APP_LOG_LEVEL`, ...). Database
//! settings live in [`common::database::DatabaseConfig`].

use ::config::{Config, ConfigError, Environment};
use auth::{AuthConfig, HashingCost};
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    pub session_ttl_hours: i64,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl ServerConfig {
    /// Load defaults and apply `APP_*` environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = HashingCost::default();
        let config: ServerConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("log_level", "info")?
            .set_default("session_ttl_hours", 24)?
            .set_default("hash_memory_kib", defaults.memory_kib)?
            .set_default("hash_iterations", defaults.iterations)?
            .set_default("hash_parallelism", defaults.parallelism)?
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.session_ttl_hours <= 0 {
            return Err(ConfigError::Message(
                "session_ttl_hours must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Authentication settings derived from this configuration
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            session_ttl: chrono::Duration::hours(self.session_ttl_hours),
            hashing: HashingCost {
                memory_kib: self.hash_memory_kib,
                iterations: self.hash_iterations,
                parallelism: self.hash_parallelism,
            },
            ..AuthConfig::default()
        }
    }
}
