use std::path::PathBuf;
use std::time::Duration;

use inkwell_provider::DeliveryError;
use thiserror::Error;

/// Failures in the credential lifecycle: loading client secrets, reading or
/// writing the token file, refreshing, and exchanging authorization codes.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A credential file could not be read or written.
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The client secrets file is not a valid `installed`/`web` client.
    #[error("invalid client secrets: {0}")]
    InvalidSecrets(String),

    /// The persisted token blob could not be parsed.
    #[error("invalid token file: {0}")]
    InvalidToken(String),

    /// The token endpoint refused to refresh the access token.
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// The token endpoint refused the authorization code.
    #[error("authorization code exchange failed: {0}")]
    Exchange(String),

    /// Another process held the token lock for longer than allowed.
    #[error("timed out after {waited:?} waiting for token lock '{}'", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl CredentialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<CredentialError> for DeliveryError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::LockTimeout { waited, .. } => DeliveryError::Timeout(waited),
            CredentialError::Refresh(_)
            | CredentialError::Exchange(_)
            | CredentialError::InvalidToken(_) => DeliveryError::Authentication(err.to_string()),
            CredentialError::Io { .. }
            | CredentialError::InvalidSecrets(_)
            | CredentialError::Client(_) => DeliveryError::Configuration(err.to_string()),
        }
    }
}

/// Errors raised while talking to the mail API.
#[derive(Debug, Error)]
pub enum GmailError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Gmail API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Credential resolution failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<GmailError> for DeliveryError {
    fn from(err: GmailError) -> Self {
        match err {
            GmailError::Http(e) if e.is_timeout() => {
                DeliveryError::Connection(format!("Gmail request timed out: {e}"))
            }
            GmailError::Http(e) => DeliveryError::Connection(e.to_string()),
            GmailError::Api { status: 401, body } => {
                DeliveryError::Authentication(format!("access token rejected: {body}"))
            }
            GmailError::Api { status: 429, .. } => DeliveryError::RateLimited,
            GmailError::Api { status, body } => DeliveryError::Api { status, body },
            GmailError::Credential(e) => e.into(),
        }
    }
}
