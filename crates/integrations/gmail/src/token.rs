use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CredentialError;
use crate::secrets::GMAIL_SEND_SCOPE;

/// Access tokens this many seconds from expiry are treated as already
/// expired.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Token blob persisted between runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl StoredToken {
    /// Build a token from an endpoint response.
    ///
    /// Refresh responses usually omit the refresh token, so `previous_refresh`
    /// is kept when the response carries none.
    pub(crate) fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = response.scope.map_or_else(
            || vec![GMAIL_SEND_SCOPE.to_owned()],
            |s| s.split_whitespace().map(str::to_owned).collect(),
        );
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|secs| now + TimeDelta::seconds(secs)),
            scopes,
        }
    }

    /// Whether the access token is unusable at `now`. Tokens without an
    /// expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now + TimeDelta::seconds(EXPIRY_SKEW_SECONDS))
    }

    /// Read the token file. A missing file is `Ok(None)`.
    pub async fn load(path: &Path) -> Result<Option<Self>, CredentialError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no token file");
                return Ok(None);
            }
            Err(e) => return Err(CredentialError::io(path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CredentialError::InvalidToken(format!("{}: {e}", path.display())))
    }

    /// Write the token file atomically: the blob goes to a sibling temp file
    /// which is then renamed over the target.
    ///
    /// Callers must hold the token lock.
    pub async fn save(&self, path: &Path) -> Result<(), CredentialError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CredentialError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| CredentialError::InvalidToken(e.to_string()))?;
        let tmp = sibling(path, ".tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CredentialError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CredentialError::io(path, e))?;

        debug!(path = %path.display(), "token file written");
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
