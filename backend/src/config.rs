//! Configuration management for the Pollination Monitor
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with `PM__` prefix (e.g. `PM__SERVER__PORT`)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Upstream evaluations API configuration
    pub upstream: UpstreamConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Spreadsheet export configuration
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the evaluations API, without trailing slash
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing session tokens
    pub secret: String,

    /// Session lifetime in seconds
    pub session_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Format used when the request does not name one ("xlsx" or "csv")
    pub default_format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("upstream.base_url", "http://localhost:4000/api")?
            .set_default("upstream.timeout_secs", 15)?
            .set_default("jwt.session_expiry", 28800)?
            .set_default("export.default_format", "xlsx")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PM_ prefix)
            .add_source(
                Environment::with_prefix("PM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.upstream.base_url = config.upstream.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}
