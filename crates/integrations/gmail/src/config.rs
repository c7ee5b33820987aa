use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the Gmail-compatible backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    /// Path to the OAuth client secrets JSON (`installed` or `web` client).
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Path to the persisted token blob.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Base URL of the mail API. Override this for testing against a mock
    /// server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How long to wait for the token file lock before giving up.
    #[serde(default = "default_lock_timeout_seconds")]
    pub lock_timeout_seconds: u64,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_api_base_url() -> String {
    "https://gmail.googleapis.com".to_owned()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_lock_timeout_seconds() -> u64 {
    10
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout_seconds(),
            lock_timeout_seconds: default_lock_timeout_seconds(),
        }
    }
}

impl GmailConfig {
    /// Create a configuration for the given client secrets and token files.
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            ..Self::default()
        }
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override how long to wait for the token file lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_seconds = timeout.as_secs();
        self
    }

    pub(crate) fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_seconds)
    }

    pub(crate) fn send_url(&self) -> String {
        format!(
            "{}/gmail/v1/users/me/messages/send",
            self.api_base_url.trim_end_matches('/')
        )
    }
}
