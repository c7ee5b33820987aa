use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};

use crate::config::GmailConfig;
use crate::error::CredentialError;
use crate::lock::TokenLock;
use crate::secrets::ClientSecrets;
use crate::token::{StoredToken, TokenResponse};

/// A usable access token.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl From<&StoredToken> for Credential {
    fn from(token: &StoredToken) -> Self {
        Self::new(token.access_token.clone(), token.expires_at)
    }
}

/// Outcome of a non-blocking credential load.
#[derive(Debug, Clone)]
pub enum CredentialState {
    Ready(Credential),
    /// No usable token; an operator must open `authorize_url` and pass the
    /// returned code to [`CredentialStore::complete_authorization`].
    NeedsAuthorization { authorize_url: String },
}

/// Reads, refreshes and persists the token file for one client.
///
/// There is no in-process cache: every load goes back to disk.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    config: GmailConfig,
    http: Client,
}

impl CredentialStore {
    pub fn new(config: GmailConfig) -> Result<Self, CredentialError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CredentialError::Client(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GmailConfig {
        &self.config
    }

    /// HTTP client shared with the backend.
    pub fn http_client(&self) -> &Client {
        &self.http
    }

    fn lock(&self) -> TokenLock {
        TokenLock::for_token(&self.config.token_path)
    }

    async fn secrets(&self) -> Result<ClientSecrets, CredentialError> {
        ClientSecrets::load(&self.config.credentials_path).await
    }

    /// Consent URL for the send-only scope.
    pub async fn authorization_url(&self) -> Result<String, CredentialError> {
        self.secrets().await?.authorization_url()
    }

    /// Resolve a credential without any interactive step.
    ///
    /// A valid token is returned as-is. An expired token with a refresh
    /// token is refreshed under the token lock and written back. Anything
    /// else yields [`CredentialState::NeedsAuthorization`].
    #[instrument(skip(self), fields(token_path = %self.config.token_path.display()))]
    pub async fn try_load_credential(&self) -> Result<CredentialState, CredentialError> {
        match StoredToken::load(&self.config.token_path).await? {
            Some(token) if !token.is_expired(Utc::now()) => {
                debug!("stored access token is valid");
                return Ok(CredentialState::Ready(Credential::from(&token)));
            }
            Some(token) if token.refresh_token.is_some() => {}
            _ => return self.needs_authorization().await,
        }

        let _guard = self.lock().acquire(self.config.lock_timeout()).await?;

        // Another process may have refreshed while we waited.
        let Some(token) = StoredToken::load(&self.config.token_path).await? else {
            return self.needs_authorization().await;
        };
        if !token.is_expired(Utc::now()) {
            debug!("token refreshed by another holder");
            return Ok(CredentialState::Ready(Credential::from(&token)));
        }
        let Some(refresh_token) = token.refresh_token else {
            return self.needs_authorization().await;
        };

        let secrets = self.secrets().await?;
        let response = self
            .request_token(
                &secrets,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token.as_str()),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                ],
            )
            .await
            .map_err(CredentialError::Refresh)?;

        let refreshed = StoredToken::from_response(response, Some(refresh_token), Utc::now());
        refreshed.save(&self.config.token_path).await?;
        info!("access token refreshed");

        Ok(CredentialState::Ready(Credential::from(&refreshed)))
    }

    /// Exchange an authorization code for tokens and persist them.
    #[instrument(skip(self, code))]
    pub async fn complete_authorization(&self, code: &str) -> Result<Credential, CredentialError> {
        let secrets = self.secrets().await?;
        let response = self
            .request_token(
                &secrets,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code.trim()),
                    ("redirect_uri", secrets.redirect_uri()),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                ],
            )
            .await
            .map_err(CredentialError::Exchange)?;

        let token = StoredToken::from_response(response, None, Utc::now());
        if token.refresh_token.is_none() {
            warn!("token endpoint returned no refresh token; re-authorization will be needed on expiry");
        }

        let _guard = self.lock().acquire(self.config.lock_timeout()).await?;
        token.save(&self.config.token_path).await?;
        info!("authorization completed and token persisted");

        Ok(Credential::from(&token))
    }

    async fn needs_authorization(&self) -> Result<CredentialState, CredentialError> {
        let authorize_url = self.authorization_url().await?;
        info!("no usable token; operator authorization required");
        Ok(CredentialState::NeedsAuthorization { authorize_url })
    }

    async fn request_token(
        &self,
        secrets: &ClientSecrets,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, String> {
        let body = serde_urlencoded::to_string(form).map_err(|e| e.to_string())?;

        let response = self
            .http
            .post(&secrets.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {body}", status.as_u16()));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| format!("invalid token response: {e}"))
    }
}
