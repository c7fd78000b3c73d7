//! Telemetry configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration applied by [`Telemetry::init`](crate::Telemetry::init).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Application name, set as the `app_name` context key
    pub app_name: String,
    /// Application version, set as the `app_version` context key
    pub app_version: String,
    /// Whether the crash backend should collect reports
    pub collection_enabled: bool,
    /// User identifier attached to every record, if known
    pub user_id: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            app_name: "Unknown".into(),
            app_version: "0.0.0".into(),
            collection_enabled: true,
            user_id: None,
        }
    }
}

impl TelemetryConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_use_defaults() {
        let config = TelemetryConfig::from_json_str(r#"{"app_name":"demo"}"#).unwrap();

        assert_eq!(config.app_name, "demo");
        assert_eq!(config.app_version, "0.0.0");
        assert!(config.collection_enabled);
        assert_eq!(config.user_id, None);
    }

    #[test]
    fn rejects_malformed_json() {
        let result = TelemetryConfig::from_json_str("{not json");

        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"app_version":"1.2.3","user_id":"u-9","collection_enabled":false}}"#).unwrap();

        let config = TelemetryConfig::from_file(file.path()).unwrap();

        assert_eq!(config.app_version, "1.2.3");
        assert_eq!(config.user_id.as_deref(), Some("u-9"));
        assert!(!config.collection_enabled);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = TelemetryConfig::from_file("/nonexistent/telemetry.json");

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
