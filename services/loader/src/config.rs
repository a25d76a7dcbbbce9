//! Loader configuration

use common::{database::DatabaseConfig, settings::LoggingConfig};
use config::ConfigError;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub loader: LoaderConfig,
}

/// Ingredient import settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Path of the ingredient file
    pub file: String,
    /// Rows per INSERT statement
    pub batch_size: usize,
}

impl Config {
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        common::settings::builder(config_path)?
            .set_default("loader.file", "/data/ingredients.csv")?
            .set_default("loader.batch_size", 500)?
            .build()?
            .try_deserialize()
    }
}
