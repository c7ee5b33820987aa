//! Provider registry and failover orchestration.
//!
//! [`EmailManager`] owns a [`ProviderRegistry`] and a primary provider. It
//! sends through one provider at a time in fallback order until one accepts
//! the message, and offers diagnostics that exercise every provider
//! concurrently.
//!
//! ```no_run
//! use inkwell_mailer::{EmailManager, MailerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MailerConfig::from_env()?;
//! let manager = EmailManager::from_config(&config)?;
//! let message = manager.test_message("reader@example.com")?;
//! let result = manager.send_with_fallback(&message, None).await?;
//! println!("sent via {}", result.provider);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod outcome;
pub mod registry;

pub use config::{ConfigError, MailerConfig};
pub use error::MailerError;
pub use manager::{EmailManager, ManagerSettings, SendTarget};
pub use outcome::{
    DeliveryResult, FailedAttempt, FailoverExhausted, HealthStatus, ProviderHealth,
    ProviderTestResult, TestStatus,
};
pub use registry::{ConfiguredConnector, ProviderDescriptor, ProviderRegistry, ProviderRegistryBuilder};
