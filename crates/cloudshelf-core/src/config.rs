//! Client configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default REST endpoint of the backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Configuration for talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[builder(default = "10_000")]
    pub timeout_ms: u64,

    /// Delay before re-fetching instances after a start/stop, in milliseconds.
    #[builder(default = "2_000")]
    pub refetch_delay_ms: u64,
}

impl ClientConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.base_url {
            if url.trim().is_empty() {
                return Err("Base URL cannot be empty".to_string());
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Base URL must be http(s): {url}"));
            }
        }
        if self.timeout_ms == Some(0) {
            return Err("Timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

impl ClientConfig {
    /// Create a new config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Create a config for a base URL with default timings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Base URL with any trailing slash removed.
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before the follow-up instance fetch.
    pub fn refetch_delay(&self) -> Duration {
        Duration::from_millis(self.refetch_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            refetch_delay_ms: 2_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .base_url("https://example.test/api/")
            .timeout_ms(500u64)
            .build()
            .unwrap();

        assert_eq!(config.api_root(), "https://example.test/api");
        assert_eq!(config.timeout(), Duration::from_millis(500));
        assert_eq!(config.refetch_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_config_builder_rejects_bad_url() {
        assert!(ClientConfig::builder().base_url("ftp://x").build().is_err());
        assert!(ClientConfig::builder().base_url("  ").build().is_err());
        assert!(ClientConfig::builder().timeout_ms(0u64).build().is_err());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://10.0.0.5:5000/api"}"#).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:5000/api");
        assert_eq!(config.timeout_ms, 10_000);
    }
}
