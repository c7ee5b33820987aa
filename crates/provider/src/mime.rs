//! MIME rendering shared by the backends that transmit RFC 5322 messages
//! (the SMTP relay and the token-authenticated webmail API).

use inkwell_core::{ContentKind, EmailAddress, Message};
use lettre::Address;
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};

use crate::error::DeliveryError;

/// Whether the rendered message keeps its `Bcc` header.
///
/// SMTP relays take recipients from the envelope, so the header is stripped.
/// Webmail APIs that accept a raw message derive recipients from the headers
/// and need it kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BccHeader {
    Strip,
    Keep,
}

/// Render a [`Message`] as a `multipart/mixed` MIME message.
///
/// The first part is the body (`text/plain` or `text/html` per the message's
/// [`ContentKind`]); each attachment follows as a base64-encoded part with a
/// `Content-Disposition: attachment; filename=...` header.
pub fn render(message: &Message, bcc: BccHeader) -> Result<lettre::Message, DeliveryError> {
    let mut builder = lettre::Message::builder()
        .from(to_mailbox(message.from())?)
        .subject(message.subject());

    for addr in message.to() {
        builder = builder.to(to_mailbox(addr)?);
    }
    for addr in message.cc() {
        builder = builder.cc(to_mailbox(addr)?);
    }
    for addr in message.bcc() {
        builder = builder.bcc(to_mailbox(addr)?);
    }
    if bcc == BccHeader::Keep {
        builder = builder.keep_bcc();
    }

    let content_type = match message.content_kind() {
        ContentKind::Plain => ContentType::TEXT_PLAIN,
        ContentKind::Html => ContentType::TEXT_HTML,
    };
    let mut parts = MultiPart::mixed().singlepart(
        SinglePart::builder()
            .header(content_type)
            .body(message.body().to_owned()),
    );

    for attachment in message.attachments() {
        let mime = ContentType::parse(&attachment.content_type).map_err(|e| {
            DeliveryError::Malformed(format!(
                "invalid content type '{}' for attachment '{}': {e}",
                attachment.content_type, attachment.filename
            ))
        })?;
        let body = Body::new_with_encoding(attachment.content.clone(), ContentTransferEncoding::Base64)
            .map_err(|_| {
                DeliveryError::Malformed(format!(
                    "failed to encode attachment '{}'",
                    attachment.filename
                ))
            })?;
        parts = parts.singlepart(Attachment::new(attachment.filename.clone()).body(body, mime));
    }

    builder
        .multipart(parts)
        .map_err(|e| DeliveryError::Malformed(format!("failed to build email: {e}")))
}

/// Convert a validated address into a `lettre` mailbox.
///
/// `lettre` is stricter than [`EmailAddress`] validation (it checks the
/// domain grammar), so this can still fail.
pub fn to_mailbox(addr: &EmailAddress) -> Result<Mailbox, DeliveryError> {
    let address: Address = addr
        .address()
        .parse()
        .map_err(|e| DeliveryError::Malformed(format!("invalid address '{addr}': {e}")))?;
    Ok(Mailbox::new(addr.name().map(str::to_owned), address))
}

#[cfg(test)]
mod tests {
    use inkwell_core::Attachment as MessageAttachment;

    use super::*;

    fn message() -> inkwell_core::MessageBuilder {
        Message::builder("Blog <noreply@blog.example>")
            .to("reader@example.com")
            .cc("editor@example.com")
            .bcc("audit@example.com")
            .subject("New reply")
    }

    fn formatted(message: &lettre::Message) -> String {
        String::from_utf8(message.formatted()).unwrap()
    }

    #[test]
    fn plain_body_is_rendered_as_text_plain() {
        let msg = message().text("Hello there").build().unwrap();
        let raw = formatted(&render(&msg, BccHeader::Strip).unwrap());
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("Hello there"));
        assert!(raw.contains("Subject: New reply"));
    }

    #[test]
    fn html_body_is_rendered_as_text_html() {
        let msg = message().html("<p>Hi</p>").build().unwrap();
        let raw = formatted(&render(&msg, BccHeader::Strip).unwrap());
        assert!(raw.contains("text/html"));
        assert!(!raw.contains("text/plain"));
    }

    #[test]
    fn bcc_header_policy() {
        let msg = message().text("x").build().unwrap();

        let stripped = formatted(&render(&msg, BccHeader::Strip).unwrap());
        assert!(!stripped.contains("audit@example.com"));

        let kept = formatted(&render(&msg, BccHeader::Keep).unwrap());
        assert!(kept.contains("Bcc: audit@example.com"));
    }

    #[test]
    fn envelope_includes_every_recipient() {
        let msg = message().text("x").build().unwrap();
        let rendered = render(&msg, BccHeader::Strip).unwrap();
        let recipients: Vec<String> = rendered
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            recipients,
            vec![
                "reader@example.com",
                "editor@example.com",
                "audit@example.com"
            ]
        );
    }

    #[test]
    fn attachments_are_base64_parts() {
        let msg = message()
            .text("see attached")
            .attach(MessageAttachment::new(
                "notes.txt",
                "attachment body",
                "text/plain",
            ))
            .build()
            .unwrap();
        let raw = formatted(&render(&msg, BccHeader::Strip).unwrap());
        assert!(raw.contains("Content-Disposition: attachment; filename=\"notes.txt\""));
        assert!(raw.contains("Content-Transfer-Encoding: base64"));
        // base64("attachment body")
        assert!(raw.contains("YXR0YWNobWVudCBib2R5"));
    }

    #[test]
    fn invalid_attachment_content_type_is_malformed() {
        let msg = message()
            .text("x")
            .attach(MessageAttachment::new("a.bin", vec![0u8], "not a mime type"))
            .build()
            .unwrap();
        let err = render(&msg, BccHeader::Strip).unwrap_err();
        assert!(matches!(err, DeliveryError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn display_name_is_preserved() {
        let msg = message().text("x").build().unwrap();
        let raw = formatted(&render(&msg, BccHeader::Strip).unwrap());
        assert!(raw.contains("From: Blog <noreply@blog.example>"));
    }
}
