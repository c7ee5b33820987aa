use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while connecting to or sending through a provider.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The requested provider is not registered.
    #[error("provider not registered: {0}")]
    NotFound(String),

    /// The provider refused the message permanently.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// The attempt did not finish within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The provider rejected the request due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// The message could not be converted into the provider's wire format.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The provider's HTTP API answered with an unexpected status.
    #[error("API error: HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Credentials were rejected or could not be refreshed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider has no usable credential and an operator must authorize
    /// it out of band.
    #[error("authorization required: visit {authorize_url}")]
    AuthenticationRequired {
        /// Consent URL the operator should open.
        authorize_url: String,
    },

    /// The provider returned without error but accepted nothing.
    #[error("provider accepted 0 messages")]
    ZeroAccepted,
}

impl DeliveryError {
    /// Returns `true` if the failure may resolve on retry or on a different
    /// provider.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A provider name that does not match any known provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown email provider: {0}")]
pub struct UnknownProviderError(pub String);

impl From<UnknownProviderError> for DeliveryError {
    fn from(err: UnknownProviderError) -> Self {
        DeliveryError::NotFound(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(DeliveryError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(DeliveryError::Connection("reset".into()).is_transient());
        assert!(DeliveryError::RateLimited.is_transient());
        assert!(
            DeliveryError::Api {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn permanent_errors() {
        assert!(!DeliveryError::NotFound("x".into()).is_transient());
        assert!(!DeliveryError::Rejected("x".into()).is_transient());
        assert!(!DeliveryError::Configuration("x".into()).is_transient());
        assert!(!DeliveryError::Malformed("x".into()).is_transient());
        assert!(!DeliveryError::Authentication("x".into()).is_transient());
        assert!(!DeliveryError::ZeroAccepted.is_transient());
        assert!(
            !DeliveryError::Api {
                status: 400,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !DeliveryError::AuthenticationRequired {
                authorize_url: "https://example.com".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn error_display() {
        let err = DeliveryError::NotFound("gmail".into());
        assert_eq!(err.to_string(), "provider not registered: gmail");

        let err = DeliveryError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "timeout after 500ms");

        let err = DeliveryError::Api {
            status: 401,
            body: r#"{"errors":[]}"#.into(),
        };
        assert_eq!(err.to_string(), r#"API error: HTTP 401: {"errors":[]}"#);

        let err = UnknownProviderError("MAILCHIMP".into());
        assert_eq!(err.to_string(), "unknown email provider: MAILCHIMP");
    }
}
