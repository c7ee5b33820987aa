use std::path::Path;

use serde::Deserialize;

use crate::error::CredentialError;

/// OAuth scope that allows sending mail and nothing else.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/";

/// OAuth client registration loaded from a client secrets file.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_owned()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_owned()
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .field("redirect_uris", &self.redirect_uris)
            .finish()
    }
}

/// The secrets file wraps the client in an `installed` or `web` key.
#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Read and parse a client secrets file.
    pub async fn load(path: &Path) -> Result<Self, CredentialError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CredentialError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Parse client secrets from JSON.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| CredentialError::InvalidSecrets(e.to_string()))?;
        file.installed.or(file.web).ok_or_else(|| {
            CredentialError::InvalidSecrets("expected an 'installed' or 'web' client".into())
        })
    }

    /// Redirect URI registered for the client, falling back to the local
    /// loopback address.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map_or(DEFAULT_REDIRECT_URI, String::as_str)
    }

    /// Build the consent URL for the send-only scope.
    ///
    /// `access_type=offline` together with `prompt=consent` makes the
    /// provider return a refresh token on every exchange.
    pub fn authorization_url(&self) -> Result<String, CredentialError> {
        let query = serde_urlencoded::to_string([
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri()),
            ("response_type", "code"),
            ("scope", GMAIL_SEND_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ])
        .map_err(|e| CredentialError::InvalidSecrets(e.to_string()))?;

        let separator = if self.auth_uri.contains('?') { '&' } else { '?' };
        Ok(format!("{}{separator}{query}", self.auth_uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = r#"{
        "installed": {
            "client_id": "1234.apps.example.com",
            "client_secret": "shh",
            "auth_uri": "https://accounts.example.com/o/oauth2/auth",
            "token_uri": "https://oauth2.example.com/token",
            "redirect_uris": ["http://localhost"]
        }
    }"#;

    #[test]
    fn parse_installed_client() {
        let secrets = ClientSecrets::from_json(INSTALLED).unwrap();
        assert_eq!(secrets.client_id, "1234.apps.example.com");
        assert_eq!(secrets.token_uri, "https://oauth2.example.com/token");
        assert_eq!(secrets.redirect_uri(), "http://localhost");
    }

    #[test]
    fn parse_web_client_with_defaults() {
        let secrets =
            ClientSecrets::from_json(r#"{"web": {"client_id": "id", "client_secret": "s"}}"#)
                .unwrap();
        assert_eq!(secrets.token_uri, "https://oauth2.googleapis.com/token");
        assert_eq!(secrets.redirect_uri(), "http://localhost:8080/");
    }

    #[test]
    fn reject_unknown_shape() {
        let err = ClientSecrets::from_json(r#"{"service_account": {}}"#).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidSecrets(_)));
    }

    #[test]
    fn authorization_url_carries_offline_consent() {
        let url = ClientSecrets::from_json(INSTALLED)
            .unwrap()
            .authorization_url()
            .unwrap();
        assert!(url.starts_with("https://accounts.example.com/o/oauth2/auth?client_id=1234.apps.example.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.send"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn debug_redacts_client_secret() {
        let secrets = ClientSecrets::from_json(INSTALLED).unwrap();
        let debug = format!("{secrets:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("shh"));
    }
}
