pub mod address;
pub mod attachment;
pub mod error;
pub mod message;

pub use address::EmailAddress;
pub use attachment::Attachment;
pub use error::ValidationError;
pub use message::{ContentKind, Message, MessageBuilder};
