use clap::{Args, Subcommand};
use inkwell_gmail::{Credential, CredentialState};
use inkwell_mailer::EmailManager;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    #[command(subcommand)]
    pub command: AuthorizeCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthorizeCommand {
    /// Print the consent URL to open in a browser.
    Url,
    /// Exchange the authorization code shown after consent.
    Complete {
        /// Code copied from the consent page redirect.
        code: String,
    },
    /// Show whether a usable credential is stored.
    Status,
}

pub async fn run(
    manager: &EmailManager,
    args: &AuthorizeArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        AuthorizeCommand::Url => {
            let url = manager.authorization_url().await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"authorize_url": url}));
                }
                OutputFormat::Text => {
                    println!("Open this URL, grant access, then run `inkwell authorize complete <code>`:");
                    println!("{url}");
                }
            }
        }
        AuthorizeCommand::Complete { code } => {
            let credential = manager.complete_authorization(code).await?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "status": "authorized",
                        "expires_at": credential.expires_at().map(|t| t.to_rfc3339()),
                    });
                    println!("{json}");
                }
                OutputFormat::Text => {
                    println!("Authorized. Access token {}.", expiry(&credential));
                }
            }
        }
        AuthorizeCommand::Status => match manager.try_load_credential().await? {
            CredentialState::Ready(credential) => match format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "status": "ready",
                        "expires_at": credential.expires_at().map(|t| t.to_rfc3339()),
                    });
                    println!("{json}");
                }
                OutputFormat::Text => {
                    println!("Credential ready, {}.", expiry(&credential));
                }
            },
            CredentialState::NeedsAuthorization { authorize_url } => {
                match format {
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "status": "needs_authorization",
                            "authorize_url": authorize_url,
                        });
                        println!("{json}");
                    }
                    OutputFormat::Text => {
                        eprintln!("No usable credential. Authorize at:");
                        eprintln!("{authorize_url}");
                    }
                }
                std::process::exit(1);
            }
        },
    }
    Ok(())
}

fn expiry(credential: &Credential) -> String {
    match credential.expires_at() {
        Some(at) => format!("valid until {}", at.to_rfc3339()),
        None => "has no recorded expiry".to_owned(),
    }
}
