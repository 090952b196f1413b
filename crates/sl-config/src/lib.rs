//! SubLedger Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,

    /// Enable development mode
    pub dev_mode: bool,
}

/// Logging defaults. `RUST_LOG` and `LOG_FORMAT` still win at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Subscription registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Journal every commit and keep a JSON snapshot of the ledger
    pub persist: bool,
    /// Directory holding the snapshot and its journal
    pub data_dir: String,
    /// Snapshot file name, relative to `data_dir`
    pub snapshot_file: String,
    /// Upper bound on `endpoint_uri` length, in characters
    pub max_endpoint_uri_length: usize,
    /// Upper bound on the opaque payload, in bytes
    pub max_payload_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            persist: false,
            data_dir: "./data".to_string(),
            snapshot_file: "registry.json".to_string(),
            max_endpoint_uri_length: 2048,
            max_payload_bytes: 64 * 1024,
        }
    }
}

impl RegistryConfig {
    /// Full snapshot path, or `None` when persistence is disabled.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        if self.persist {
            Some(Path::new(&self.data_dir).join(&self.snapshot_file))
        } else {
            None
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject settings the registry cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.max_endpoint_uri_length == 0 {
            return Err(ConfigError::ValidationError(
                "registry.max_endpoint_uri_length must be greater than zero".to_string(),
            ));
        }
        if self.registry.persist && self.registry.snapshot_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "registry.snapshot_file is required when registry.persist is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# SubLedger Configuration
# Environment variables override these settings

dev_mode = false

[logging]
level = "info"
format = "text"  # text or json

[registry]
persist = false
data_dir = "./data"
snapshot_file = "registry.json"
max_endpoint_uri_length = 2048
max_payload_bytes = 65536
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let config = AppConfig::from_toml_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(config.logging.level, defaults.logging.level);
        assert_eq!(config.registry.max_payload_bytes, defaults.registry.max_payload_bytes);
        assert_eq!(config.registry.snapshot_file, "registry.json");
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[registry]
persist = true
data_dir = "/var/lib/subledger"
"#,
        )
        .unwrap();

        assert!(config.registry.persist);
        assert_eq!(config.registry.max_endpoint_uri_length, 2048);
        assert_eq!(config.logging.format, "text");
        assert_eq!(
            config.registry.snapshot_path(),
            Some(PathBuf::from("/var/lib/subledger/registry.json"))
        );
    }

    #[test]
    fn test_snapshot_path_disabled() {
        assert!(RegistryConfig::default().snapshot_path().is_none());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.registry.persist = true;
        config.registry.snapshot_file = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.registry.snapshot_file = "registry.json".to_string();
        config.registry.max_endpoint_uri_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml_str("[registry\npersist = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
