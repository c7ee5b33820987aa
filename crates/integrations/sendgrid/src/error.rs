use inkwell_provider::DeliveryError;
use thiserror::Error;

/// Errors specific to the SendGrid backend.
///
/// These are internal errors that get converted into [`DeliveryError`] at
/// the backend boundary.
#[derive(Debug, Error)]
pub enum SendGridError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status other than 200/202.
    #[error("SendGrid API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The backend is missing required configuration.
    #[error("{0}")]
    Configuration(String),
}

impl From<SendGridError> for DeliveryError {
    fn from(err: SendGridError) -> Self {
        match err {
            SendGridError::Http(e) if e.is_timeout() => {
                DeliveryError::Connection(format!("SendGrid request timed out: {e}"))
            }
            SendGridError::Http(e) => DeliveryError::Connection(e.to_string()),
            SendGridError::Api { status, body } => DeliveryError::Api { status, body },
            SendGridError::Configuration(msg) => DeliveryError::Configuration(msg),
        }
    }
}
