//! Inkwell CLI
//!
//! Send mail, run provider diagnostics and authorize the token-based
//! provider from the command line.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inkwell_mailer::{EmailManager, MailerConfig};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Deliver blog notification email through the configured providers.
#[derive(Parser, Debug)]
#[command(name = "inkwell", version, about)]
struct Cli {
    /// TOML configuration file. Environment variables are used when omitted.
    #[arg(long, env = "INKWELL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a message, falling back across providers.
    Send(commands::send::SendArgs),
    /// Send a test message through every provider.
    TestProviders,
    /// Send the test message to one address.
    TestEmail(commands::send::TestEmailArgs),
    /// Check each provider's connection without sending.
    Health,
    /// List registered providers in fallback order.
    Providers,
    /// Authorize the token-based provider.
    Authorize(commands::authorize::AuthorizeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = MailerConfig::load(cli.config.as_deref())?;
    let manager = EmailManager::from_config(&config)?;
    debug!(
        primary = %manager.primary(),
        providers = manager.registry().len(),
        "email manager ready"
    );

    match cli.command {
        Command::Send(args) => commands::send::run(&manager, &args, &cli.format).await,
        Command::TestProviders => commands::diagnostics::test_providers(&manager, &cli.format).await,
        Command::TestEmail(args) => {
            commands::send::run_test_email(&manager, &args, &cli.format).await
        }
        Command::Health => commands::diagnostics::health(&manager, &cli.format).await,
        Command::Providers => commands::diagnostics::providers(&manager, &cli.format),
        Command::Authorize(args) => commands::authorize::run(&manager, &args, &cli.format).await,
    }
}
