//! Configuration types for IONOS DNS synchronisation
//!
//! This module defines the configuration structures used by the client,
//! the transports and the driver binary.

use serde::{Deserialize, Serialize};

/// Production base URL of the IONOS DNS API
pub const DEFAULT_BASE_URL: &str = "https://api.hosting.ionos.com/dns/v1";

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Provider client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// IONOS API key ("<prefix>.<secret>")
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Base URL the request paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (in seconds), enforced by the transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration for the production API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate the client configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("IONOS API key cannot be empty"));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }

        Ok(())
    }
}

/// Configuration of one engine invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Provider client settings
    pub client: ClientConfig,

    /// Compute outcomes without issuing mutating calls
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.client.validate()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ionos-dns/{}", env!("CARGO_PKG_VERSION"))
}
