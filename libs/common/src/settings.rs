//! Layered configuration shared by the Foodgram binaries
//!
//! Priority (highest to lowest):
//! 1. Conventional variables (`DATABASE_URL`)
//! 2. Prefixed environment variables (`FOODGRAM__DATABASE__URL`, ...)
//! 3. Config file (`CONFIG_PATH`, default `config/default.toml`)
//! 4. Defaults registered by the caller and by [`builder`]

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "FOODGRAM";

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Start a configuration builder with the shared sources and defaults
///
/// Binaries add their own defaults on top and then call
/// `build()?.try_deserialize()`.
pub fn builder(config_path: Option<String>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = Config::builder()
        .set_default("database.url", crate::database::default_database_url())?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("database.connection_timeout", 30)?
        .set_default("logging.level", default_log_level())?;

    let config_file_path = config_path
        .or_else(|| env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    if Path::new(&config_file_path).exists() {
        builder = builder.add_source(File::with_name(&config_file_path));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }

    Ok(builder)
}
