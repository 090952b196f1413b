//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "subledger.toml",
    "./config/config.toml",
    "./config/subledger.toml",
    "/etc/subledger/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load the file layer only, falling back to defaults when no file exists.
    pub fn load_file(&self) -> Result<AppConfig, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)
            }
            None => Ok(AppConfig::default()),
        }
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        // An explicit path that does not exist is an error at read time,
        // not a reason to fall through to the search paths.
        if let Some(path) = &self.config_path {
            return Some(path.clone());
        }

        if let Ok(path) = env::var("SUBLEDGER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `SUBLEDGER_*` overrides using the given lookup.
///
/// Unparseable numeric or boolean values are ignored and the file value kept.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Logging
    if let Some(val) = lookup("SUBLEDGER_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = lookup("SUBLEDGER_LOG_FORMAT") {
        config.logging.format = val;
    }

    // Registry
    if let Some(val) = lookup("SUBLEDGER_PERSIST") {
        if let Ok(persist) = val.parse() {
            config.registry.persist = persist;
        }
    }
    if let Some(val) = lookup("SUBLEDGER_DATA_DIR") {
        config.registry.data_dir = val;
    }
    if let Some(val) = lookup("SUBLEDGER_SNAPSHOT_FILE") {
        config.registry.snapshot_file = val;
    }
    if let Some(val) = lookup("SUBLEDGER_MAX_ENDPOINT_URI_LENGTH") {
        if let Ok(len) = val.parse() {
            config.registry.max_endpoint_uri_length = len;
        }
    }
    if let Some(val) = lookup("SUBLEDGER_MAX_PAYLOAD_BYTES") {
        if let Ok(size) = val.parse() {
            config.registry.max_payload_bytes = size;
        }
    }

    // General
    if let Some(val) = lookup("SUBLEDGER_DEV_MODE") {
        config.dev_mode = val.parse().unwrap_or(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\nmax_payload_bytes = 16\n\n[logging]\nformat = \"json\"").unwrap();

        let config = ConfigLoader::with_path(file.path()).load_file().unwrap();
        assert_eq!(config.registry.max_payload_bytes, 16);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = ConfigLoader::with_path(missing).load_file().unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SUBLEDGER_PERSIST", "true"),
                ("SUBLEDGER_DATA_DIR", "/tmp/ledger"),
                ("SUBLEDGER_MAX_PAYLOAD_BYTES", "128"),
                ("SUBLEDGER_LOG_LEVEL", "debug"),
            ]),
        );

        assert!(config.registry.persist);
        assert_eq!(config.registry.data_dir, "/tmp/ledger");
        assert_eq!(config.registry.max_payload_bytes, 128);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unparseable_override_keeps_value() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SUBLEDGER_MAX_ENDPOINT_URI_LENGTH", "lots"),
                ("SUBLEDGER_PERSIST", "maybe"),
            ]),
        );

        assert_eq!(config.registry.max_endpoint_uri_length, 2048);
        assert!(!config.registry.persist);
    }
}
