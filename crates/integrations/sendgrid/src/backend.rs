use std::time::Duration;

use inkwell_core::Message;
use inkwell_provider::{DeliveryError, EmailBackend, ProviderKind};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::SendGridConfig;
use crate::error::SendGridError;
use crate::types::SendGridMailRequest;

/// Backend that delivers through a SendGrid-compatible v3 mail send API.
pub struct SendGridBackend {
    config: SendGridConfig,
    client: Client,
}

impl std::fmt::Debug for SendGridBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SendGridBackend {
    /// Create a backend, failing fast when no API key is configured.
    pub fn connect(config: SendGridConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeliveryError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(config, client)
    }

    /// Create a backend with a custom HTTP client.
    pub fn with_client(config: SendGridConfig, client: Client) -> Result<Self, DeliveryError> {
        if config.api_key.trim().is_empty() {
            return Err(
                SendGridError::Configuration("SENDGRID_API_KEY not configured".into()).into(),
            );
        }
        Ok(Self { config, client })
    }

    fn mail_send_url(&self) -> String {
        format!("{}/v3/mail/send", self.config.api_base_url.trim_end_matches('/'))
    }

    fn scopes_url(&self) -> String {
        format!("{}/v3/scopes", self.config.api_base_url.trim_end_matches('/'))
    }

    async fn send_one(&self, message: &Message) -> Result<(), SendGridError> {
        let request = SendGridMailRequest::from(message);

        let response = self
            .client
            .post(self.mail_send_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "SendGrid API rejected message");
            return Err(SendGridError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl EmailBackend for SendGridBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SendGrid
    }

    #[instrument(skip(self, messages), fields(provider = "sendgrid", count = messages.len()))]
    async fn send(&self, messages: &[Message]) -> Result<usize, DeliveryError> {
        let mut sent = 0;
        for message in messages {
            debug!(subject = %message.subject(), "sending email via SendGrid");
            if let Err(e) = self.send_one(message).await {
                if sent > 0 {
                    warn!(accepted = sent, "SendGrid batch aborted after partial delivery");
                }
                return Err(e.into());
            }
            sent += 1;
        }

        info!(sent, "email sent successfully via SendGrid");
        Ok(sent)
    }

    #[instrument(skip(self), fields(provider = "sendgrid"))]
    async fn health_check(&self) -> Result<(), DeliveryError> {
        debug!("performing SendGrid health check via scopes lookup");

        let response = self
            .client
            .get(self.scopes_url())
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(SendGridError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendGridError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!("SendGrid health check passed");
        Ok(())
    }
}
