use crate::address::EmailAddress;
use crate::attachment::Attachment;
use crate::error::ValidationError;

/// How the body of a [`Message`] is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `text/plain` body.
    #[default]
    Plain,
    /// `text/html` body.
    Html,
}

impl ContentKind {
    /// The MIME subtype used for the body part (`"plain"` or `"html"`).
    pub fn subtype(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Html => "html",
        }
    }

    /// The full MIME type of the body part.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// A provider-agnostic, validated email message.
///
/// Messages are immutable once built. Backends read them and derive their
/// own wire representation (MIME, JSON); nothing mutates a `Message` after
/// [`MessageBuilder::build`] returns it.
///
/// # Examples
///
/// ```
/// use inkwell_core::{ContentKind, Message};
///
/// let message = Message::builder("noreply@blog.example")
///     .to("reader@example.com")
///     .subject("Someone replied to your comment")
///     .html("<p>Go take a look.</p>")
///     .build()
///     .unwrap();
///
/// assert_eq!(message.content_kind(), ContentKind::Html);
/// assert_eq!(message.to().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: EmailAddress,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    bcc: Vec<EmailAddress>,
    subject: String,
    body: String,
    content_kind: ContentKind,
    attachments: Vec<Attachment>,
}

#[deny(missing_docs)]
impl Message {
    /// Start building a message from the given sender.
    pub fn builder(from: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            from: from.into(),
            ..MessageBuilder::default()
        }
    }

    /// Validated sender address.
    pub fn from(&self) -> &EmailAddress {
        &self.from
    }

    /// `To` recipients, in the order they were added.
    pub fn to(&self) -> &[EmailAddress] {
        &self.to
    }

    /// `Cc` recipients.
    pub fn cc(&self) -> &[EmailAddress] {
        &self.cc
    }

    /// `Bcc` recipients.
    pub fn bcc(&self) -> &[EmailAddress] {
        &self.bcc
    }

    /// Subject line, possibly empty.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Body text, interpreted according to [`content_kind`](Self::content_kind).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the body is plain text or HTML.
    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    /// File attachments, in the order they were added.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Every envelope recipient: `to`, then `cc`, then `bcc`.
    ///
    /// ```
    /// use inkwell_core::Message;
    ///
    /// let message = Message::builder("noreply@blog.example")
    ///     .to("reader@example.com")
    ///     .bcc("archive@blog.example")
    ///     .cc("editor@blog.example")
    ///     .build()
    ///     .unwrap();
    ///
    /// let recipients: Vec<_> = message.recipients().map(ToString::to_string).collect();
    /// assert_eq!(
    ///     recipients,
    ///     ["reader@example.com", "editor@blog.example", "archive@blog.example"]
    /// );
    /// assert!(message.subject().is_empty());
    /// assert!(message.attachments().is_empty());
    /// ```
    pub fn recipients(&self) -> impl Iterator<Item = &EmailAddress> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }
}

/// Builder for [`Message`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: String,
    body: String,
    content_kind: ContentKind,
    attachments: Vec<Attachment>,
}

#[deny(missing_docs)]
impl MessageBuilder {
    /// Add a `To` recipient.
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Add a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a `Bcc` recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Set the subject line.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set a plain-text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.content_kind = ContentKind::Plain;
        self
    }

    /// Set an HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.content_kind = ContentKind::Html;
        self
    }

    /// Set the body with an explicit content kind.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>, kind: ContentKind) -> Self {
        self.body = body.into();
        self.content_kind = kind;
        self
    }

    /// Append a file attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Validate every address and produce the immutable [`Message`].
    ///
    /// Fails with [`ValidationError::NoRecipients`] when no `To` address was
    /// given, regardless of `cc`/`bcc`.
    pub fn build(self) -> Result<Message, ValidationError> {
        if self.to.is_empty() {
            return Err(ValidationError::NoRecipients);
        }

        Ok(Message {
            from: parse_field("from", &self.from)?,
            to: parse_all("to", &self.to)?,
            cc: parse_all("cc", &self.cc)?,
            bcc: parse_all("bcc", &self.bcc)?,
            subject: self.subject,
            body: self.body,
            content_kind: self.content_kind,
            attachments: self.attachments,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<EmailAddress, ValidationError> {
    EmailAddress::parse(value).map_err(|reason| ValidationError::InvalidAddress {
        field,
        value: value.to_owned(),
        reason,
    })
}

fn parse_all(field: &'static str, values: &[String]) -> Result<Vec<EmailAddress>, ValidationError> {
    values.iter().map(|v| parse_field(field, v)).collect()
}
