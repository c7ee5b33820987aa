use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::Utc;
use inkwell_core::Message;
use inkwell_provider::mime::{self, BccHeader};
use inkwell_provider::{DeliveryError, EmailBackend, ProviderKind};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::GmailConfig;
use crate::credential::{Credential, CredentialState, CredentialStore};
use crate::error::GmailError;

/// Body of `users/me/messages/send`.
#[derive(Debug, Serialize)]
struct RawMessage {
    raw: String,
}

/// Backend that submits base64url-encoded MIME messages to a Gmail-compatible
/// API.
pub struct GmailBackend {
    config: GmailConfig,
    client: Client,
    credential: Credential,
}

impl std::fmt::Debug for GmailBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailBackend")
            .field("config", &self.config)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl GmailBackend {
    /// Resolve a credential from the token file and build a backend.
    ///
    /// Never prompts: without a usable token this fails with
    /// [`DeliveryError::AuthenticationRequired`].
    #[instrument(skip_all, fields(provider = "gmail"))]
    pub async fn connect(config: GmailConfig) -> Result<Self, DeliveryError> {
        let store = CredentialStore::new(config.clone())?;

        match store.try_load_credential().await? {
            CredentialState::Ready(credential) => {
                debug!("Gmail credential ready");
                Ok(Self::with_credential(
                    config,
                    store.http_client().clone(),
                    credential,
                ))
            }
            CredentialState::NeedsAuthorization { authorize_url } => {
                warn!(%authorize_url, "Gmail backend needs operator authorization");
                Err(DeliveryError::AuthenticationRequired { authorize_url })
            }
        }
    }

    /// Create a backend with an already-resolved credential.
    pub fn with_credential(config: GmailConfig, client: Client, credential: Credential) -> Self {
        Self {
            config,
            client,
            credential,
        }
    }

    async fn send_one(&self, message: &Message) -> Result<(), DeliveryError> {
        let rendered = mime::render(message, BccHeader::Keep)?;
        let body = RawMessage {
            raw: URL_SAFE.encode(rendered.formatted()),
        };

        let response = self
            .client
            .post(self.config.send_url())
            .bearer_auth(self.credential.access_token())
            .json(&body)
            .send()
            .await
            .map_err(GmailError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Gmail API rejected message");
            return Err(GmailError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(())
    }
}

impl EmailBackend for GmailBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gmail
    }

    #[instrument(skip(self, messages), fields(provider = "gmail", count = messages.len()))]
    async fn send(&self, messages: &[Message]) -> Result<usize, DeliveryError> {
        let mut sent = 0;
        for message in messages {
            debug!(subject = %message.subject(), "sending email via Gmail API");
            if let Err(e) = self.send_one(message).await {
                if sent > 0 {
                    warn!(accepted = sent, "Gmail batch aborted after partial delivery");
                }
                return Err(e);
            }
            sent += 1;
        }

        info!(sent, "email sent successfully via Gmail API");
        Ok(sent)
    }

    /// The send-only scope grants no read endpoint to query, so health is
    /// the credential resolved at connect still being unexpired.
    async fn health_check(&self) -> Result<(), DeliveryError> {
        match self.credential.expires_at() {
            Some(expires_at) if expires_at <= Utc::now() => Err(DeliveryError::Authentication(
                format!("access token expired at {expires_at}"),
            )),
            _ => Ok(()),
        }
    }
}
