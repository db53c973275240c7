//! Dispatcher configuration, loadable from TOML.
//!
//! ```toml
//! error_message = "forbidden"
//! error_status = 404
//! current_user_key = "account"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::CURRENT_USER;

/// Errors that can occur while loading a `DispatchConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Defaults applied by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Message carried by `guard_or_fail` denials without an `error_message` option.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Status carried by `guard_or_fail` denials without an `error_status` option.
    #[serde(default = "default_error_status")]
    pub error_status: u16,

    /// Assigns key the default user resolver reads.
    #[serde(default = "default_current_user_key")]
    pub current_user_key: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            error_message: default_error_message(),
            error_status: default_error_status(),
            current_user_key: default_current_user_key(),
        }
    }
}

fn default_error_message() -> String {
    "not authorized".to_string()
}

fn default_error_status() -> u16 {
    403
}

fn default_current_user_key() -> String {
    CURRENT_USER.to_string()
}

impl DispatchConfig {
    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DispatchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no dispatch config, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=599).contains(&self.error_status) {
            return Err(ConfigError::Invalid(format!(
                "error_status must be between 100 and 599, got {}",
                self.error_status
            )));
        }
        if self.current_user_key.is_empty() {
            return Err(ConfigError::Invalid(
                "current_user_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.error_message, "not authorized");
        assert_eq!(config.error_status, 403);
        assert_eq!(config.current_user_key, "current_user");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = DispatchConfig::from_toml_str("error_status = 404\n").unwrap();
        assert_eq!(config.error_status, 404);
        assert_eq!(config.error_message, "not authorized");
    }

    #[test]
    fn rejects_out_of_range_status() {
        let err = DispatchConfig::from_toml_str("error_status = 42\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_user_key() {
        let err = DispatchConfig::from_toml_str("current_user_key = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = DispatchConfig::from_toml_str("error_status = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DispatchConfig::load(dir.path().join("warden.toml")).unwrap();
        assert_eq!(config, DispatchConfig::default());
    }

    #[test]
    fn load_from_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(
            &path,
            "error_message = \"forbidden\"\ncurrent_user_key = \"account\"\n",
        )
        .unwrap();
        let config = DispatchConfig::load(&path).unwrap();
        assert_eq!(config.error_message, "forbidden");
        assert_eq!(config.current_user_key, "account");
        assert_eq!(config.error_status, 403);
    }
}
