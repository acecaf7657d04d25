//! Client options and how they are loaded.
//!
//! Options come from code (`ClientOptions::default()` plus the builder
//! methods) or from a TOML file. Missing keys fall back to the defaults, so an
//! empty file is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::FetcherError;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:3000";

/// Long enough that a normal request never hits it. Callers that need a
/// tighter bound should set `timeout_secs` or wrap the call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Base URL of the fetcher service.
    pub service_url: String,
    /// Skip the liveness probe in `FetcherClient::new`.
    pub skip_heartbeat: bool,
    /// Per-request timeout handed to the transport.
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            skip_heartbeat: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientOptions {
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    pub fn with_skip_heartbeat(mut self, skip: bool) -> Self {
        self.skip_heartbeat = skip;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, FetcherError> {
        toml::from_str(content).map_err(|e| FetcherError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FetcherError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| FetcherError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let options = ClientOptions::default();
        assert_eq!(options.service_url, "http://127.0.0.1:3000");
        assert!(!options.skip_heartbeat);
        assert_eq!(options.timeout(), Duration::from_secs(500));
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(ClientOptions::from_toml_str("").unwrap(), ClientOptions::default());
    }

    #[test]
    fn toml_overrides_fields() {
        let options = ClientOptions::from_toml_str(
            "service_url = \"http://www.test-url.com\"\nskip_heartbeat = true\n",
        )
        .unwrap();
        assert_eq!(options.service_url, "http://www.test-url.com");
        assert!(options.skip_heartbeat);
        assert_eq!(options.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ClientOptions::from_toml_str("skip_heartbeat = \"maybe\"").unwrap_err();
        assert!(matches!(err, FetcherError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join(format!("dor-fetcher-{}.toml", std::process::id()));
        fs::write(&path, "timeout_secs = 30\n").unwrap();
        let options = ClientOptions::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(options.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn load_missing_file_is_a_config_error() {
        let err = ClientOptions::load("/nonexistent/dor-fetcher.toml").unwrap_err();
        assert!(matches!(err, FetcherError::Config(_)));
    }

    #[test]
    fn builder_methods() {
        let options = ClientOptions::default()
            .with_service_url("http://fetcher.example.edu")
            .with_skip_heartbeat(true)
            .with_timeout_secs(10);
        assert_eq!(options.service_url, "http://fetcher.example.edu");
        assert!(options.skip_heartbeat);
        assert_eq!(options.timeout_secs, 10);
    }
}
