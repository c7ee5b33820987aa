use async_trait::async_trait;
use inkwell_core::Message;

use crate::error::DeliveryError;
use crate::kind::ProviderKind;

/// Strongly-typed delivery backend with native `async fn`.
///
/// A backend value is a live connection to one provider: constructing it may
/// authenticate or open sockets, and dropping it releases them. This trait is
/// **not** object-safe; use [`DynEmailBackend`] for dynamic dispatch. Every
/// `EmailBackend` implements `DynEmailBackend` via a blanket implementation.
pub trait EmailBackend: Send + Sync {
    /// Which provider this backend talks to.
    fn kind(&self) -> ProviderKind;

    /// Deliver `messages` in order and return how many the provider accepted.
    ///
    /// A single message is either fully submitted or not at all. The first
    /// failing message aborts the batch.
    fn send(
        &self,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<usize, DeliveryError>> + Send;

    /// Verify the provider is reachable and the credentials are accepted,
    /// without sending mail.
    fn health_check(&self) -> impl std::future::Future<Output = Result<(), DeliveryError>> + Send;
}

/// Object-safe backend trait for use behind `Box<dyn DynEmailBackend>`.
///
/// You generally should not implement this trait directly -- implement
/// [`EmailBackend`] and rely on the blanket implementation.
#[async_trait]
pub trait DynEmailBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn send(&self, messages: &[Message]) -> Result<usize, DeliveryError>;

    async fn health_check(&self) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: EmailBackend + Sync> DynEmailBackend for T {
    fn kind(&self) -> ProviderKind {
        EmailBackend::kind(self)
    }

    async fn send(&self, messages: &[Message]) -> Result<usize, DeliveryError> {
        EmailBackend::send(self, messages).await
    }

    async fn health_check(&self) -> Result<(), DeliveryError> {
        EmailBackend::health_check(self).await
    }
}
