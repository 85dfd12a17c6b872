//! Configuration Module
//!
//! This module defines all configuration structures for the validator service.
//! Configuration is loaded from TOML files and parsed using serde.

use serde::Deserialize;
use std::fs;

/// Main configuration structure
///
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [api]
/// host = "127.0.0.1"
/// port = 8545
///
/// [snapshot]
/// database_url = "sqlite://utxos.db"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub snapshot: SnapshotConfig,
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 8545)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Where the UTXO snapshot is read from at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// SQLite connection URL (e.g., "sqlite://utxos.db")
    pub database_url: String,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    ///
    /// # Example
    /// ```no_run
    /// # use utxo_validator::Config;
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [api]
            host = "0.0.0.0"
            port = 9000

            [snapshot]
            database_url = "sqlite::memory:"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.snapshot.database_url, "sqlite::memory:");
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let result = Config::parse(
            r#"
            [api]
            host = "127.0.0.1"
            port = 8545
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_shipped_default_config_parses() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"))
            .unwrap();

        assert_eq!(config.api.port, 8545);
    }
}
