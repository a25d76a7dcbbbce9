//! API service configuration

use common::{database::DatabaseConfig, settings::LoggingConfig};
use config::ConfigError;
use serde::Deserialize;
use std::env;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtSettings,
    pub logging: LoggingConfig,
    pub shopping_list: ShoppingListConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Token verification settings
///
/// Tokens are issued elsewhere. A public key selects RS256, otherwise the
/// shared secret selects HS256.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwtSettings {
    /// RS256 public key, PEM text or a path to a PEM file
    pub public_key: Option<String>,
    /// HS256 shared secret
    pub secret: Option<String>,
}

/// Shopping list download settings
#[derive(Debug, Clone, Deserialize)]
pub struct ShoppingListConfig {
    /// First line of the downloaded file
    pub header: String,
    /// File name offered to the client
    pub filename: String,
}

impl Default for ShoppingListConfig {
    fn default() -> Self {
        Self {
            header: "Shopping list:".to_string(),
            filename: "shopping_cart.txt".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment and defaults
    ///
    /// `JWT_PUBLIC_KEY` and `JWT_SECRET` override the `jwt` section.
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let shopping_list = ShoppingListConfig::default();

        let mut builder = common::settings::builder(config_path)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("shopping_list.header", shopping_list.header)?
            .set_default("shopping_list.filename", shopping_list.filename)?;

        if let Ok(public_key) = env::var("JWT_PUBLIC_KEY") {
            builder = builder.set_override("jwt.public_key", public_key)?;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            builder = builder.set_override("jwt.secret", secret)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("database.url cannot be empty".to_string());
        }

        if self.database.min_connections > self.database.max_connections {
            return Err("database.min_connections cannot exceed database.max_connections".to_string());
        }

        let has_key = self.jwt.public_key.as_deref().is_some_and(|key| !key.is_empty());
        let has_secret = self.jwt.secret.as_deref().is_some_and(|secret| !secret.is_empty());
        if !has_key && !has_secret {
            return Err("either jwt.public_key or jwt.secret must be set".to_string());
        }

        if self.shopping_list.filename.trim().is_empty() {
            return Err("shopping_list.filename cannot be empty".to_string());
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
