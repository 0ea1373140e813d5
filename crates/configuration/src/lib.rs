use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::{LOG_FILE_PREFIX, init_tracing};
pub use settings::{AnalyticsSettings, Config, LoggingSettings, ServerSettings};

/// Prefix of the environment variables that override file settings,
/// e.g. `TRADE_JOURNAL__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "TRADE_JOURNAL";
/// Looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads and validates the application configuration.
///
/// Sources are layered in this order, later ones winning:
/// 1. Built-in defaults.
/// 2. The TOML file at `path`, which must exist when given. Without a path,
///    `config.toml` is read if present.
/// 3. Environment variables prefixed with `TRADE_JOURNAL`, nested with `__`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config: Config = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
