use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use inkwell_gmail::{GmailBackend, GmailConfig};
use inkwell_provider::{
    Connector, DeliveryError, DynEmailBackend, ProviderKind, UnknownProviderError,
};
use inkwell_sendgrid::{SendGridBackend, SendGridConfig};
use inkwell_smtp::{SmtpBackend, SmtpConfig};

use crate::config::MailerConfig;

/// A registered provider: its priority and the factory that connects to it.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    /// Lower is tried earlier when no explicit order is given.
    pub priority: u32,
    pub connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Static table of providers, fixed once built.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderKind, ProviderDescriptor>,
}

/// Builder for [`ProviderRegistry`]. Registering a kind twice replaces the
/// earlier entry.
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    providers: BTreeMap<ProviderKind, ProviderDescriptor>,
}

impl ProviderRegistryBuilder {
    /// Register a provider at its default priority.
    #[must_use]
    pub fn register(self, kind: ProviderKind, connector: impl Connector + 'static) -> Self {
        self.register_with_priority(kind, kind.default_priority(), connector)
    }

    #[must_use]
    pub fn register_with_priority(
        mut self,
        kind: ProviderKind,
        priority: u32,
        connector: impl Connector + 'static,
    ) -> Self {
        self.providers.insert(
            kind,
            ProviderDescriptor {
                kind,
                priority,
                connector: Arc::new(connector),
            },
        );
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Registry with every provider kind, each connecting with its section
    /// of `config`.
    pub fn from_config(config: &MailerConfig) -> Self {
        ProviderKind::ALL
            .into_iter()
            .fold(Self::builder(), |builder, kind| {
                builder.register(kind, ConfiguredConnector::for_kind(kind, config))
            })
            .build()
    }

    /// Look up a provider by kind.
    pub fn resolve(&self, kind: ProviderKind) -> Result<&ProviderDescriptor, UnknownProviderError> {
        self.providers
            .get(&kind)
            .ok_or_else(|| UnknownProviderError(kind.to_string()))
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.providers.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered kinds sorted by ascending priority; ties keep declaration
    /// order.
    pub fn default_order(&self) -> Vec<ProviderKind> {
        let mut descriptors: Vec<_> = self.providers.values().collect();
        descriptors.sort_by_key(|d| (d.priority, d.kind));
        descriptors.into_iter().map(|d| d.kind).collect()
    }
}

/// Connector that builds the real backend for one provider from its
/// configuration section.
#[derive(Debug, Clone)]
pub enum ConfiguredConnector {
    Gmail(GmailConfig),
    Smtp(SmtpConfig),
    SendGrid(SendGridConfig),
}

impl ConfiguredConnector {
    pub fn for_kind(kind: ProviderKind, config: &MailerConfig) -> Self {
        match kind {
            ProviderKind::Gmail => Self::Gmail(config.gmail.clone()),
            ProviderKind::Smtp => Self::Smtp(config.smtp.clone()),
            ProviderKind::SendGrid => Self::SendGrid(config.sendgrid.clone()),
        }
    }
}

#[async_trait]
impl Connector for ConfiguredConnector {
    async fn connect(&self) -> Result<Box<dyn DynEmailBackend>, DeliveryError> {
        match self {
            Self::Gmail(config) => Ok(Box::new(GmailBackend::connect(config.clone()).await?)),
            Self::Smtp(config) => Ok(Box::new(SmtpBackend::connect(config.clone())?)),
            Self::SendGrid(config) => Ok(Box::new(SendGridBackend::connect(config.clone())?)),
        }
    }
}
