//! Gmail-compatible delivery backend for Inkwell.
//!
//! Messages are rendered to MIME, base64url-encoded and submitted as a single
//! `raw` payload to `users/me/messages/send`, authenticated with an access
//! token from a persisted token file.
//!
//! # Credential lifecycle
//!
//! Every [`GmailBackend::connect`] re-reads the token file. A valid access
//! token is used as-is. An expired one is refreshed with the stored refresh
//! token while holding an exclusive `<token path>.lock` file, and the new
//! token is written back atomically. When no usable token exists, connecting
//! fails with [`DeliveryError::AuthenticationRequired`] carrying the consent
//! URL; an operator completes the flow with
//! [`CredentialStore::complete_authorization`].
//!
//! [`DeliveryError::AuthenticationRequired`]: inkwell_provider::DeliveryError::AuthenticationRequired

pub mod backend;
pub mod config;
pub mod credential;
pub mod error;
pub mod lock;
pub mod secrets;
pub mod token;

#[cfg(test)]
mod testing;

pub use backend::GmailBackend;
pub use config::GmailConfig;
pub use credential::{Credential, CredentialState, CredentialStore};
pub use error::{CredentialError, GmailError};
pub use secrets::{ClientSecrets, GMAIL_SEND_SCOPE};
pub use token::StoredToken;
