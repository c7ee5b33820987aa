use thiserror::Error;

/// Errors raised while constructing a [`Message`](crate::Message).
///
/// Validation failures are never retried and never reach a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The message has no `To` recipients.
    #[error("message must have at least one recipient")]
    NoRecipients,

    /// An address failed syntactic validation.
    #[error("invalid {field} address '{value}': {reason}")]
    InvalidAddress {
        /// Which header the address belongs to (`from`, `to`, `cc`, `bcc`).
        field: &'static str,
        /// The rejected input.
        value: String,
        /// Why the address was rejected.
        reason: &'static str,
    },
}
