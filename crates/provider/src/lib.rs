pub mod backend;
pub mod connector;
pub mod error;
pub mod kind;

#[cfg(feature = "mime")]
pub mod mime;

#[cfg(feature = "testing")]
pub mod testing;

pub use backend::{DynEmailBackend, EmailBackend};
pub use connector::Connector;
pub use error::{DeliveryError, UnknownProviderError};
pub use kind::ProviderKind;
