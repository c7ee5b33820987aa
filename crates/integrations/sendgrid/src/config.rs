use serde::{Deserialize, Serialize};

/// Configuration for the SendGrid-compatible backend.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SendGridConfig {
    /// API key sent as a bearer token. An empty key is rejected when the
    /// backend connects.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the API. Override this for testing against a mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "https://api.sendgrid.com".to_owned()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl SendGridConfig {
    /// Create a configuration with the given API key and the public API
    /// base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_base_url() {
        let config = SendGridConfig::new("SG.key");
        assert_eq!(config.api_base_url, "https://api.sendgrid.com");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn with_custom_api_base_url() {
        let config = SendGridConfig::new("SG.key").with_api_base_url("http://localhost:9999");
        assert_eq!(config.api_base_url, "http://localhost:9999");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = SendGridConfig::new("SG.test-placeholder-value");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"), "api_key must be redacted");
        assert!(
            !debug.contains("test-placeholder-value"),
            "api_key must not appear in debug output"
        );
    }
}
