//! Receiver configuration

use crate::credentials::CredentialPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Private control namespace shared with the companion sender
pub const DEFAULT_NAMESPACE: &str = "urn:x-cast:com.formula1.player.caf";

/// Default origin of the content-resolution service
pub const DEFAULT_RESOLUTION_ORIGIN: &str = "https://f1tv.formula1.com";

/// Path markers of origins that already serve chunked HLS/DASH segments
pub const DEFAULT_CHUNKED_PATH_MARKERS: [&str; 4] = ["/hls/", "/dash/", "/cmaf/", "/chunked/"];

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Origin of the content-resolution service
    pub resolution_origin: Url,
    /// Extra headers merged into every resolution call
    pub extra_headers: HashMap<String, String>,
    /// Upper bound on a resolution call in milliseconds
    pub resolution_timeout_ms: u64,
    /// Locator substrings that keep the engine's default segment container
    pub chunked_path_markers: Vec<String>,
    /// Credential directives installed on every load
    pub credential_policy: CredentialPolicy,
    /// Control channel namespace
    pub namespace: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            resolution_origin: Url::parse(DEFAULT_RESOLUTION_ORIGIN)
                .expect("Default resolution origin is a valid URL"),
            extra_headers: HashMap::new(),
            resolution_timeout_ms: 10_000,
            chunked_path_markers: DEFAULT_CHUNKED_PATH_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            credential_policy: CredentialPolicy::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ReceiverConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ReceiverConfig = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Point resolution calls at another origin
    pub fn with_resolution_origin(mut self, origin: Url) -> Self {
        self.resolution_origin = origin;
        self
    }

    /// Add an extra header for resolution calls
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.extra_headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.resolution_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "resolution_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.chunked_path_markers.iter().any(|m| m.is_empty()) {
            return Err(Error::InvalidConfig(
                "chunked_path_markers must not contain empty entries".into(),
            ));
        }
        if !self.namespace.starts_with("urn:x-cast:") {
            return Err(Error::InvalidConfig(format!(
                "namespace {} must start with urn:x-cast:",
                self.namespace
            )));
        }
        Ok(())
    }
}
