use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use inkwell_core::{EmailAddress, Message};
use serde::Serialize;

/// JSON body for `POST /v3/mail/send`.
#[derive(Debug, Clone, Serialize)]
pub struct SendGridMailRequest {
    pub personalizations: Vec<Personalization>,
    pub from: SendGridAddress,
    pub subject: String,
    pub content: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SendGridAttachment>,
}

/// Recipient block. All recipients share one personalization so that every
/// address sees the same message.
#[derive(Debug, Clone, Serialize)]
pub struct Personalization {
    pub to: Vec<SendGridAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<SendGridAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<SendGridAddress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendGridAddress {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    /// `text/plain` or `text/html`.
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendGridAttachment {
    /// Base64-encoded file content.
    pub content: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub disposition: String,
}

impl From<&EmailAddress> for SendGridAddress {
    fn from(addr: &EmailAddress) -> Self {
        Self {
            email: addr.address().to_owned(),
            name: addr.name().map(str::to_owned),
        }
    }
}

impl From<&Message> for SendGridMailRequest {
    fn from(message: &Message) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: addresses(message.to()),
                cc: addresses(message.cc()),
                bcc: addresses(message.bcc()),
            }],
            from: message.from().into(),
            subject: message.subject().to_owned(),
            content: vec![Content {
                content_type: message.content_kind().mime_type().to_owned(),
                value: message.body().to_owned(),
            }],
            attachments: message
                .attachments()
                .iter()
                .map(|a| SendGridAttachment {
                    content: STANDARD.encode(&a.content),
                    filename: a.filename.clone(),
                    content_type: a.content_type.clone(),
                    disposition: "attachment".to_owned(),
                })
                .collect(),
        }
    }
}

fn addresses(addrs: &[EmailAddress]) -> Vec<SendGridAddress> {
    addrs.iter().map(SendGridAddress::from).collect()
}

#[cfg(test)]
mod tests {
    use inkwell_core::Attachment;

    use super::*;

    #[test]
    fn html_message_maps_to_request() {
        let message = Message::builder("Blog <noreply@blog.example>")
            .to("reader@example.com")
            .cc("editor@example.com")
            .subject("Password reset")
            .html("<a href=\"#\">reset</a>")
            .attach(Attachment::new("hello.txt", "Hello World", "text/plain"))
            .build()
            .unwrap();

        let json = serde_json::to_value(SendGridMailRequest::from(&message)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "personalizations": [{
                    "to": [{"email": "reader@example.com"}],
                    "cc": [{"email": "editor@example.com"}]
                }],
                "from": {"email": "noreply@blog.example", "name": "Blog"},
                "subject": "Password reset",
                "content": [{"type": "text/html", "value": "<a href=\"#\">reset</a>"}],
                "attachments": [{
                    "content": "SGVsbG8gV29ybGQ=",
                    "filename": "hello.txt",
                    "type": "text/plain",
                    "disposition": "attachment"
                }]
            })
        );
    }

    #[test]
    fn plain_message_omits_empty_sections() {
        let message = Message::builder("noreply@blog.example")
            .to("reader@example.com")
            .subject("Hi")
            .text("plain")
            .build()
            .unwrap();

        let json = serde_json::to_value(SendGridMailRequest::from(&message)).unwrap();
        assert_eq!(json["content"][0]["type"], "text/plain");
        assert!(json.get("attachments").is_none());
        assert!(json["personalizations"][0].get("cc").is_none());
        assert!(json["personalizations"][0].get("bcc").is_none());
    }
}
