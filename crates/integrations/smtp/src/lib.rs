//! SMTP relay backend for Inkwell.
//!
//! Renders each [`Message`](inkwell_core::Message) as a MIME message and
//! hands it to an SMTP server through `lettre`. Supports implicit TLS (SSL,
//! port 465), STARTTLS, and plaintext relays.

pub mod backend;
pub mod config;

pub use backend::SmtpBackend;
pub use config::{SmtpConfig, SmtpSecurity};
