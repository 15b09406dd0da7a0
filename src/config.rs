//! Configuration for embedding hosts.
//!
//! Everything has a sensible default; hosts typically ship no config file at
//! all and only override the log filter during debugging.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Bound on queued messages to the model loop; fetchers block rather
    /// than pile up snapshots.
    pub channel_capacity: usize,
    pub logging: LoggingConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config at {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load config from a JSON file.
pub fn load_from_path(path: &Path) -> Result<ModelConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ModelConfig::default();
        assert!(config.channel_capacity > 0);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"channel_capacity": 8}"#).unwrap();
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.logging.filter, "info");
    }
}
