use async_trait::async_trait;

use crate::backend::DynEmailBackend;
use crate::error::DeliveryError;

/// Factory that produces a backend bound to one provider's credentials.
///
/// Connecting may authenticate or open sockets. The returned backend is an
/// owned value that the caller drops once it is done sending.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DynEmailBackend>, DeliveryError>;
}
