use inkwell_core::ValidationError;
use inkwell_gmail::CredentialError;
use inkwell_provider::{DeliveryError, ProviderKind};
use thiserror::Error;

use crate::config::ConfigError;
use crate::outcome::FailoverExhausted;

/// Errors surfaced by [`EmailManager`](crate::EmailManager) operations.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured primary provider has no registry entry.
    #[error("primary provider '{0}' is not registered")]
    PrimaryNotRegistered(ProviderKind),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Failover(#[from] FailoverExhausted),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Authorization was requested but no token-authenticated provider is
    /// configured.
    #[error("no token-authenticated provider is configured")]
    AuthorizationUnavailable,
}
