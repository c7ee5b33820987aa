use std::fmt;

use inkwell_provider::{DeliveryError, ProviderKind};
use serde::Serialize;

/// One provider that was tried and failed.
#[derive(Debug)]
pub struct FailedAttempt {
    pub provider: ProviderKind,
    pub error: DeliveryError,
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

/// A successful delivery.
#[derive(Debug)]
pub struct DeliveryResult {
    /// Provider that accepted the message.
    pub provider: ProviderKind,
    /// Messages the provider accepted.
    pub sent_count: usize,
    /// Providers tried before `provider`, in order.
    pub errors: Vec<FailedAttempt>,
}

/// Every provider in the fallback order failed.
///
/// Holds at least one attempt, so [`last`](Self::last) always has a value.
#[derive(Debug)]
pub struct FailoverExhausted {
    earlier: Vec<FailedAttempt>,
    last: FailedAttempt,
}

impl FailoverExhausted {
    pub fn new(earlier: Vec<FailedAttempt>, last: FailedAttempt) -> Self {
        Self { earlier, last }
    }

    /// Returns `None` when `attempts` is empty.
    pub fn from_attempts(mut attempts: Vec<FailedAttempt>) -> Option<Self> {
        let last = attempts.pop()?;
        Some(Self::new(attempts, last))
    }

    /// The final provider attempted and its error.
    pub fn last(&self) -> &FailedAttempt {
        &self.last
    }

    /// All attempts in the order they were made.
    pub fn attempts(&self) -> impl Iterator<Item = &FailedAttempt> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }

    pub fn len(&self) -> usize {
        self.earlier.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_attempts(self) -> Vec<FailedAttempt> {
        let mut attempts = self.earlier;
        attempts.push(self.last);
        attempts
    }
}

impl fmt::Display for FailoverExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all {} email provider attempt(s) failed; last: {}",
            self.len(),
            self.last
        )
    }
}

impl std::error::Error for FailoverExhausted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last.error)
    }
}

/// Outcome class for one provider in a diagnostic run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The provider accepted the test message.
    Success,
    /// The provider answered but accepted nothing.
    Failed,
    /// Connecting or sending raised an error.
    Error,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        })
    }
}

/// Result of sending the test message through one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderTestResult {
    pub status: TestStatus,
    pub message: String,
}

impl ProviderTestResult {
    pub(crate) fn from_outcome(outcome: Result<usize, DeliveryError>) -> Self {
        match outcome {
            Ok(sent) => Self {
                status: TestStatus::Success,
                message: format!("Sent {sent} messages"),
            },
            Err(DeliveryError::ZeroAccepted) => Self {
                status: TestStatus::Failed,
                message: "Sent 0 messages".to_owned(),
            },
            Err(e) => Self {
                status: TestStatus::Error,
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
}

/// Result of connecting to one provider and running its health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<(), DeliveryError>> for ProviderHealth {
    fn from(outcome: Result<(), DeliveryError>) -> Self {
        match outcome {
            Ok(()) => Self {
                status: HealthStatus::Healthy,
                message: None,
            },
            Err(e) => Self {
                status: HealthStatus::Error,
                message: Some(e.to_string()),
            },
        }
    }
}
