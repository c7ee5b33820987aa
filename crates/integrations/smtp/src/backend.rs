use std::time::Duration;

use inkwell_core::Message;
use inkwell_provider::mime::{self, BccHeader};
use inkwell_provider::{DeliveryError, EmailBackend, ProviderKind};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{SmtpConfig, SmtpSecurity};

/// SMTP relay delivery backend using `lettre`.
pub struct SmtpBackend {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpBackend")
            .field("config", &self.config)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpBackend {
    /// Build a backend for the configured relay.
    ///
    /// No socket is opened here; `lettre` connects lazily on the first send.
    pub fn connect(config: SmtpConfig) -> Result<Self, DeliveryError> {
        let transport = build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a `SmtpBackend` with a pre-built transport (for testing).
    pub fn with_transport(config: SmtpConfig, transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { config, transport }
    }

    async fn send_one(&self, message: &Message) -> Result<(), DeliveryError> {
        let rendered = mime::render(message, BccHeader::Strip)?;

        self.transport.send(rendered).await.map_err(|e| {
            error!(error = %e, host = %self.config.host, "SMTP send failed");
            map_smtp_error(&e)
        })?;
        Ok(())
    }
}

impl EmailBackend for SmtpBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Smtp
    }

    #[instrument(skip(self, messages), fields(provider = "smtp", count = messages.len()))]
    async fn send(&self, messages: &[Message]) -> Result<usize, DeliveryError> {
        let mut sent = 0;
        for message in messages {
            debug!(subject = %message.subject(), "sending email via SMTP");
            if let Err(e) = self.send_one(message).await {
                if sent > 0 {
                    warn!(accepted = sent, "SMTP batch aborted after partial delivery");
                }
                return Err(e);
            }
            sent += 1;
        }

        info!(sent, host = %self.config.host, "email sent successfully via SMTP");
        Ok(sent)
    }

    async fn health_check(&self) -> Result<(), DeliveryError> {
        debug!("performing SMTP health check");
        let connected = self.transport.test_connection().await.map_err(|e| {
            error!(error = %e, "SMTP health check failed");
            DeliveryError::Connection(format!("SMTP health check failed: {e}"))
        })?;
        if !connected {
            return Err(DeliveryError::Connection(
                "SMTP server did not accept the connection".into(),
            ));
        }
        info!("SMTP health check passed");
        Ok(())
    }
}

/// Build an async SMTP transport from the given configuration.
fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
    if config.host.trim().is_empty() {
        return Err(DeliveryError::Configuration("SMTP host is not set".into()));
    }

    let builder = match config.security()? {
        SmtpSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| DeliveryError::Configuration(format!("SMTP TLS relay error: {e}")))?,
        SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Configuration(format!("SMTP STARTTLS relay error: {e}")))?,
        SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
    };

    let builder = builder
        .port(config.port)
        .timeout(Some(Duration::from_secs(config.timeout_seconds)));

    let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder.credentials(Credentials::new(user.clone(), pass.clone()))
    } else {
        builder
    };

    Ok(builder.build())
}

/// Map a lettre SMTP error to a [`DeliveryError`].
///
/// Network failures, transient replies and authentication rejections are
/// transient (another provider or a later attempt may work). Other permanent
/// replies mean the server refused this message.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> DeliveryError {
    let message = error.to_string();

    if error.is_permanent() && !is_auth_rejection(error) {
        DeliveryError::Rejected(format!("permanent SMTP error: {message}"))
    } else if error.is_transient() {
        DeliveryError::Connection(format!("transient SMTP error: {message}"))
    } else {
        DeliveryError::Connection(format!("SMTP error: {message}"))
    }
}

fn is_auth_rejection(error: &lettre::transport::smtp::Error) -> bool {
    error
        .status()
        .is_some_and(|code| matches!(code.to_string().as_str(), "530" | "534" | "535"))
}
