/// A file attached to an outgoing [`Message`](crate::Message).
///
/// The content is held as raw bytes; each backend applies its own transfer
/// encoding (base64 MIME part, base64 JSON field) when building its wire
/// representation.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename presented to the recipient.
    pub filename: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// MIME content type (e.g. `"application/pdf"`).
    pub content_type: String,
}

impl Attachment {
    /// Create an attachment from its parts.
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the attachment has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// Attachments can be large; never dump their content into logs.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.content.len())
            .finish()
    }
}
