#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::Message;
use inkwell_mailer::{EmailManager, ManagerSettings, ProviderRegistry};
use inkwell_provider::{Connector, DeliveryError, DynEmailBackend, ProviderKind};

// -- Scripted provider ----------------------------------------------------

/// What a scripted provider does when asked to connect and send.
#[derive(Debug, Clone)]
pub enum Script {
    /// Accept this many messages.
    Accept(usize),
    /// Connect fine, fail every send.
    FailSend,
    /// Fail while connecting.
    FailConnect,
    /// Connect fine, then never finish sending.
    Hang,
}

/// Counts connections and sends across clones.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    connects: Arc<AtomicUsize>,
    sends: Arc<AtomicUsize>,
}

impl Calls {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

pub struct ScriptedConnector {
    kind: ProviderKind,
    script: Script,
    calls: Calls,
}

struct ScriptedBackend {
    kind: ProviderKind,
    script: Script,
    calls: Calls,
}

#[async_trait]
impl DynEmailBackend for ScriptedBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn send(&self, _messages: &[Message]) -> Result<usize, DeliveryError> {
        self.calls.sends.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Accept(n) => Ok(n),
            Script::FailSend => Err(DeliveryError::Connection(format!("{} send refused", self.kind))),
            Script::FailConnect => unreachable!("connect fails first"),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(1)
            }
        }
    }

    async fn health_check(&self) -> Result<(), DeliveryError> {
        match self.script {
            Script::FailSend => Err(DeliveryError::Authentication("bad key".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn DynEmailBackend>, DeliveryError> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        if let Script::FailConnect = self.script {
            return Err(DeliveryError::Configuration(format!(
                "{} is not configured",
                self.kind
            )));
        }
        Ok(Box::new(ScriptedBackend {
            kind: self.kind,
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }
}

// -- Helpers --------------------------------------------------------------

/// A registry of scripted providers plus per-provider call counters.
pub struct Harness {
    pub registry: ProviderRegistry,
    calls: Vec<(ProviderKind, Calls)>,
}

impl Harness {
    pub fn new(scripts: &[(ProviderKind, Script)]) -> Self {
        let mut builder = ProviderRegistry::builder();
        let mut calls = Vec::new();
        for (kind, script) in scripts {
            let counter = Calls::default();
            builder = builder.register(
                *kind,
                ScriptedConnector {
                    kind: *kind,
                    script: script.clone(),
                    calls: counter.clone(),
                },
            );
            calls.push((*kind, counter));
        }
        Self {
            registry: builder.build(),
            calls,
        }
    }

    pub fn calls(&self, kind: ProviderKind) -> Calls {
        self.calls
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| c.clone())
            .unwrap()
    }

    pub fn manager(&self, primary: ProviderKind) -> EmailManager {
        self.manager_with(primary, settings())
    }

    pub fn manager_with(&self, primary: ProviderKind, settings: ManagerSettings) -> EmailManager {
        EmailManager::new(self.registry.clone(), primary, settings).unwrap()
    }
}

pub fn settings() -> ManagerSettings {
    ManagerSettings {
        attempt_timeout: Duration::from_secs(5),
        max_concurrent_tests: 4,
        default_from: "noreply@blog.example".into(),
        test_recipient: "ops@blog.example".into(),
    }
}

pub fn message() -> Message {
    Message::builder("noreply@blog.example")
        .to("reader@example.com")
        .subject("Someone replied to your comment")
        .html("<p>Reply</p>")
        .build()
        .unwrap()
}
