use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use inkwell_core::{Message, ValidationError};
use inkwell_gmail::{Credential, CredentialState, CredentialStore};
use inkwell_provider::{DeliveryError, DynEmailBackend, ProviderKind, UnknownProviderError};
use tracing::{debug, error, info, instrument, warn};

use crate::config::MailerConfig;
use crate::error::MailerError;
use crate::outcome::{
    DeliveryResult, FailedAttempt, FailoverExhausted, ProviderHealth, ProviderTestResult,
};
use crate::registry::ProviderRegistry;

const TEST_SUBJECT: &str = "Email system test";
const TEST_BODY: &str =
    "This is a test message sent to verify that the email configuration works.";

/// Orchestration knobs for [`EmailManager`].
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Upper bound on one provider attempt (connect + send).
    pub attempt_timeout: Duration,
    /// How many providers diagnostics exercise at once.
    pub max_concurrent_tests: usize,
    /// Sender of diagnostic messages.
    pub default_from: String,
    /// Recipient of [`EmailManager::test_all_providers`] messages.
    pub test_recipient: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            max_concurrent_tests: 4,
            default_from: "webmaster@localhost".to_owned(),
            test_recipient: "webmaster@localhost".to_owned(),
        }
    }
}

/// Which provider a single send should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendTarget {
    /// Walk the fallback order.
    #[default]
    Auto,
    /// Exactly this provider, no fallback.
    Provider(ProviderKind),
}

impl FromStr for SendTarget {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Provider)
        }
    }
}

impl fmt::Display for SendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Provider(kind) => kind.fmt(f),
        }
    }
}

/// Sends mail through the registered providers with failover.
///
/// Built once at startup and shared by reference. Each send obtains fresh
/// connections from the registry and drops them when done.
pub struct EmailManager {
    registry: ProviderRegistry,
    primary: ProviderKind,
    fallback_order: Vec<ProviderKind>,
    settings: ManagerSettings,
    authorization: Option<CredentialStore>,
}

impl fmt::Debug for EmailManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailManager")
            .field("primary", &self.primary)
            .field("fallback_order", &self.fallback_order)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EmailManager {
    /// Create a manager whose fallback order is `primary` followed by the
    /// other registered providers by priority.
    pub fn new(
        registry: ProviderRegistry,
        primary: ProviderKind,
        settings: ManagerSettings,
    ) -> Result<Self, MailerError> {
        if !registry.contains(primary) {
            return Err(MailerError::PrimaryNotRegistered(primary));
        }

        let fallback_order = std::iter::once(primary)
            .chain(registry.default_order().into_iter().filter(|k| *k != primary))
            .collect();

        Ok(Self {
            registry,
            primary,
            fallback_order,
            settings,
            authorization: None,
        })
    }

    /// Build the registry, settings and authorization store from `config`.
    pub fn from_config(config: &MailerConfig) -> Result<Self, MailerError> {
        let manager = Self::new(
            ProviderRegistry::from_config(config),
            config.primary_provider,
            config.manager_settings(),
        )?;
        let store = CredentialStore::new(config.gmail.clone())?;
        Ok(manager.with_authorization(store))
    }

    /// Attach the credential store used by the authorization operations.
    #[must_use]
    pub fn with_authorization(mut self, store: CredentialStore) -> Self {
        self.authorization = Some(store);
        self
    }

    pub fn primary(&self) -> ProviderKind {
        self.primary
    }

    pub fn fallback_order(&self) -> &[ProviderKind] {
        &self.fallback_order
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Connect to `provider`, or to the primary when `None`.
    pub async fn get_connection(
        &self,
        provider: Option<ProviderKind>,
    ) -> Result<Box<dyn DynEmailBackend>, DeliveryError> {
        let kind = provider.unwrap_or(self.primary);
        let descriptor = self.registry.resolve(kind)?;
        debug!(provider = %kind, "connecting to email provider");
        descriptor.connector.connect().await
    }

    /// One bounded attempt: connect, send, and treat zero accepted as failure.
    async fn attempt(&self, kind: ProviderKind, messages: &[Message]) -> Result<usize, DeliveryError> {
        let limit = self.settings.attempt_timeout;
        let work = async {
            let connection = self.get_connection(Some(kind)).await?;
            match connection.send(messages).await? {
                0 => Err(DeliveryError::ZeroAccepted),
                sent => Ok(sent),
            }
        };

        tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(DeliveryError::Timeout(limit)))
    }

    /// Try providers one at a time until one accepts `message`.
    ///
    /// `order` overrides the fallback order; `None` or an empty slice uses
    /// [`fallback_order`](Self::fallback_order). Every failure is recorded
    /// and the next provider is tried regardless of the error kind.
    #[instrument(skip(self, message, order), fields(subject = %message.subject()))]
    pub async fn send_with_fallback(
        &self,
        message: &Message,
        order: Option<&[ProviderKind]>,
    ) -> Result<DeliveryResult, FailoverExhausted> {
        let order = match order {
            Some(order) if !order.is_empty() => order,
            _ => self.fallback_order.as_slice(),
        };

        let mut errors = Vec::new();
        for (index, &provider) in order.iter().enumerate() {
            info!(
                %provider,
                attempt = index + 1,
                remaining = order.len() - index,
                "trying email provider"
            );

            match self.attempt(provider, std::slice::from_ref(message)).await {
                Ok(sent_count) => {
                    info!(%provider, sent_count, failed = errors.len(), "email sent");
                    return Ok(DeliveryResult {
                        provider,
                        sent_count,
                        errors,
                    });
                }
                Err(error) => {
                    warn!(
                        %provider,
                        %error,
                        transient = error.is_transient(),
                        "email provider failed"
                    );
                    errors.push(FailedAttempt { provider, error });
                }
            }
        }

        error!(attempts = errors.len(), "all email providers failed");
        let last = errors.pop().unwrap_or_else(|| FailedAttempt {
            provider: self.primary,
            error: DeliveryError::NotFound("empty fallback order".into()),
        });
        Err(FailoverExhausted::new(errors, last))
    }

    /// Send through exactly one provider, with no fallback.
    #[instrument(skip(self, message), fields(subject = %message.subject()))]
    pub async fn send_via(
        &self,
        provider: ProviderKind,
        message: &Message,
    ) -> Result<DeliveryResult, DeliveryError> {
        let sent_count = self.attempt(provider, std::slice::from_ref(message)).await?;
        info!(%provider, sent_count, "email sent");
        Ok(DeliveryResult {
            provider,
            sent_count,
            errors: Vec::new(),
        })
    }

    /// The fixed diagnostic message addressed to `recipient`.
    pub fn test_message(&self, recipient: &str) -> Result<Message, ValidationError> {
        Message::builder(self.settings.default_from.as_str())
            .to(recipient)
            .subject(TEST_SUBJECT)
            .text(TEST_BODY)
            .build()
    }

    /// Send the diagnostic message to `recipient`, either through the
    /// fallback order or through one provider.
    pub async fn send_test_email(
        &self,
        recipient: &str,
        target: SendTarget,
    ) -> Result<DeliveryResult, MailerError> {
        let message = self.test_message(recipient)?;
        match target {
            SendTarget::Auto => Ok(self.send_with_fallback(&message, None).await?),
            SendTarget::Provider(kind) => Ok(self.send_via(kind, &message).await?),
        }
    }

    /// Send the diagnostic message through every registered provider.
    ///
    /// Providers run concurrently, bounded by
    /// [`ManagerSettings::max_concurrent_tests`]. Every provider gets an
    /// entry; one provider's failure never affects another's.
    #[instrument(skip(self))]
    pub async fn test_all_providers(&self) -> BTreeMap<ProviderKind, ProviderTestResult> {
        let message = match self.test_message(&self.settings.test_recipient) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "invalid test message");
                let result = ProviderTestResult::from_outcome(Err(DeliveryError::Malformed(
                    e.to_string(),
                )));
                return self.registry.kinds().map(|k| (k, result.clone())).collect();
            }
        };

        let message = &message;
        stream::iter(self.registry.kinds())
            .map(|kind| async move {
                let result = ProviderTestResult::from_outcome(
                    self.attempt(kind, std::slice::from_ref(message)).await,
                );
                info!(provider = %kind, status = %result.status, "provider test finished");
                (kind, result)
            })
            .buffer_unordered(self.settings.max_concurrent_tests.max(1))
            .collect()
            .await
    }

    /// Connect to every registered provider and run its health check,
    /// without sending mail.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> BTreeMap<ProviderKind, ProviderHealth> {
        let limit = self.settings.attempt_timeout;
        stream::iter(self.registry.kinds())
            .map(|kind| async move {
                let check = async {
                    let connection = self.get_connection(Some(kind)).await?;
                    connection.health_check().await
                };
                let outcome = tokio::time::timeout(limit, check)
                    .await
                    .unwrap_or(Err(DeliveryError::Timeout(limit)));
                (kind, ProviderHealth::from(outcome))
            })
            .buffer_unordered(self.settings.max_concurrent_tests.max(1))
            .collect()
            .await
    }

    fn credential_store(&self) -> Result<&CredentialStore, MailerError> {
        self.authorization
            .as_ref()
            .ok_or(MailerError::AuthorizationUnavailable)
    }

    /// Consent URL for the token-authenticated provider.
    pub async fn authorization_url(&self) -> Result<String, MailerError> {
        Ok(self.credential_store()?.authorization_url().await?)
    }

    /// Exchange an operator-supplied authorization code and persist the
    /// resulting tokens.
    pub async fn complete_authorization(&self, code: &str) -> Result<Credential, MailerError> {
        Ok(self.credential_store()?.complete_authorization(code).await?)
    }

    /// Load the token provider's credential without any interactive step.
    pub async fn try_load_credential(&self) -> Result<CredentialState, MailerError> {
        Ok(self.credential_store()?.try_load_credential().await?)
    }
}
