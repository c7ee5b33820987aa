use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use inkwell_core::{Attachment, Message};
use inkwell_mailer::{DeliveryResult, EmailManager, FailoverExhausted, MailerError, SendTarget};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Sender address. Defaults to the configured `DEFAULT_FROM_EMAIL`.
    #[arg(long)]
    pub from: Option<String>,
    /// Recipient (repeatable).
    #[arg(long, required = true)]
    pub to: Vec<String>,
    /// Carbon-copy recipient (repeatable).
    #[arg(long)]
    pub cc: Vec<String>,
    /// Blind-copy recipient (repeatable).
    #[arg(long)]
    pub bcc: Vec<String>,
    #[arg(long)]
    pub subject: String,
    /// Body text, or @file to read it from a file.
    #[arg(long)]
    pub body: String,
    /// Send the body as HTML.
    #[arg(long)]
    pub html: bool,
    /// File to attach (repeatable).
    #[arg(long)]
    pub attach: Vec<PathBuf>,
    /// `auto` for the fallback order, or a provider name.
    #[arg(long, default_value = "auto")]
    pub provider: SendTarget,
}

#[derive(Args, Debug)]
pub struct TestEmailArgs {
    /// Recipient of the test message.
    pub recipient: String,
    /// `auto` for the fallback order, or a provider name.
    #[arg(long, default_value = "auto")]
    pub provider: SendTarget,
}

pub async fn run(
    manager: &EmailManager,
    args: &SendArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let message = build_message(manager, args).await?;

    let outcome = match args.provider {
        SendTarget::Auto => manager
            .send_with_fallback(&message, None)
            .await
            .map_err(MailerError::from),
        SendTarget::Provider(kind) => manager
            .send_via(kind, &message)
            .await
            .map_err(MailerError::from),
    };
    report(outcome, format)
}

pub async fn run_test_email(
    manager: &EmailManager,
    args: &TestEmailArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let outcome = manager
        .send_test_email(&args.recipient, args.provider)
        .await;
    report(outcome, format)
}

async fn build_message(manager: &EmailManager, args: &SendArgs) -> anyhow::Result<Message> {
    let from = args
        .from
        .clone()
        .unwrap_or_else(|| manager.settings().default_from.clone());

    let body = match args.body.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading body from {path}"))?,
        None => args.body.clone(),
    };

    let mut builder = Message::builder(from).subject(&args.subject);
    builder = if args.html {
        builder.html(body)
    } else {
        builder.text(body)
    };
    for to in &args.to {
        builder = builder.to(to);
    }
    for cc in &args.cc {
        builder = builder.cc(cc);
    }
    for bcc in &args.bcc {
        builder = builder.bcc(bcc);
    }
    for path in &args.attach {
        builder = builder.attach(read_attachment(path).await?);
    }

    Ok(builder.build()?)
}

async fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading attachment {}", path.display()))?;
    let filename = path
        .file_name()
        .map_or_else(|| "attachment".to_owned(), |n| n.to_string_lossy().into_owned());
    Ok(Attachment::new(filename, content, content_type_for(path)))
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("csv") => "text/csv",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn report(outcome: Result<DeliveryResult, MailerError>, format: &OutputFormat) -> anyhow::Result<()> {
    match outcome {
        Ok(result) => {
            match format {
                OutputFormat::Json => {
                    let failed: Vec<_> = result
                        .errors
                        .iter()
                        .map(|a| serde_json::json!({"provider": a.provider, "error": a.error.to_string()}))
                        .collect();
                    let json = serde_json::json!({
                        "provider": result.provider,
                        "sent_count": result.sent_count,
                        "errors": failed,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Text => {
                    for attempt in &result.errors {
                        println!("  [ERR] {attempt}");
                    }
                    println!(
                        "Sent {} message(s) via {}.",
                        result.sent_count, result.provider
                    );
                }
            }
            Ok(())
        }
        Err(MailerError::Failover(exhausted)) => {
            report_exhausted(&exhausted, format)?;
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn report_exhausted(exhausted: &FailoverExhausted, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let attempts: Vec<_> = exhausted
                .attempts()
                .map(|a| serde_json::json!({"provider": a.provider, "error": a.error.to_string()}))
                .collect();
            let json = serde_json::json!({"error": exhausted.to_string(), "attempts": attempts});
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            for attempt in exhausted.attempts() {
                eprintln!("  [ERR] {attempt}");
            }
            eprintln!("{exhausted}");
        }
    }
    Ok(())
}
