//! Configuration management for the batch cleansing core.
//!
//! Typed sections with defaults, overridable from an optional TOML file and
//! `INSS_BATCH_`-prefixed environment variables (e.g.
//! `INSS_BATCH_ENGINE__RECORD_INTERVAL_MS=500`).

use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the batch cleansing system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InssBatchConfig {
    pub auth: AuthConfig,
    pub lookup: LookupConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub token: TokenConfig,
}

/// Sign-in endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub sign_in_url: String,
    pub access_id: String,
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sign_in_url: "https://api.ajin.io/v3/auth/sign-in".to_string(),
            access_id: String::new(),
            password: String::new(),
        }
    }
}

/// Balance-lookup endpoint behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub balances_url: String,
    /// Retry attempts requested from the external finder per call.
    pub attempts: u32,
    /// Client-enforced request timeout; a timeout counts as a failed lookup.
    pub request_timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            balances_url: "https://api.ajin.io/v3/query-inss-balances/finder/await".to_string(),
            attempts: 3,
            request_timeout_secs: 30,
        }
    }
}

impl LookupConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Result-store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/inss_batch".to_string(),
            max_connections: 10,
        }
    }
}

/// Engine cadence and registry bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum interval between records of one batch; the external service
    /// rate limit this cadence exists to respect.
    pub record_interval_ms: u64,
    /// Maximum number of concurrently registered batches.
    pub max_batches: usize,
    /// Capacity of the progress broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_interval_ms: 1000,
            max_batches: 10,
            event_channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn record_interval(&self) -> Duration {
        Duration::from_millis(self.record_interval_ms)
    }
}

/// Background token refresh scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub refresh_interval_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 1800,
        }
    }
}

impl TokenConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl InssBatchConfig {
    /// Load configuration from defaults, an optional TOML file, and
    /// environment overrides, in that precedence order.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("inss-batch").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("INSS_BATCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| BatchError::Configuration(format!("failed to load config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| BatchError::Configuration(format!("invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_observed_cadence() {
        let config = InssBatchConfig::default();
        assert_eq!(config.engine.record_interval_ms, 1000);
        assert_eq!(config.engine.max_batches, 10);
        assert_eq!(config.lookup.attempts, 3);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[engine]\nrecord_interval_ms = 250\n\n[auth]\naccess_id = \"ops@example.com\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = InssBatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.engine.record_interval_ms, 250);
        assert_eq!(config.auth.access_id, "ops@example.com");
        // Untouched sections keep their defaults.
        assert_eq!(config.engine.max_batches, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = InssBatchConfig::load(Some("/nonexistent/inss-batch.toml"));
        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
