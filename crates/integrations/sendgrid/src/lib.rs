//! SendGrid-compatible HTTP API backend for Inkwell.
//!
//! Each [`Message`](inkwell_core::Message) is mapped onto the
//! [v3 mail send](https://www.twilio.com/docs/sendgrid/api-reference/mail-send/mail-send)
//! JSON shape and POSTed with a bearer API key, one request per message.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use inkwell_sendgrid::{SendGridBackend, SendGridConfig};
//!
//! let config = SendGridConfig::new("SG.xxxxx");
//! let backend = SendGridBackend::connect(config).unwrap();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod types;

pub use backend::SendGridBackend;
pub use config::SendGridConfig;
pub use error::SendGridError;
pub use types::SendGridMailRequest;
