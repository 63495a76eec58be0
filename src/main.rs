//! leadchat - conversation client CLI
//!
#![doc = "Main entry point for the leadchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leadchat::cli::{Cli, Commands};
use leadchat::commands;
use leadchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command.clone() {
        Commands::Chat { no_init } => {
            tracing::info!("Starting interactive chat mode");
            commands::chat::run_chat(config, &cli, no_init).await?;
            Ok(())
        }
        Commands::Send { message } => {
            tracing::debug!("Sending one-shot message");
            commands::send::run_send(config, &cli, &message).await?;
            Ok(())
        }
        Commands::Handoff {
            source,
            data,
            print_only,
        } => {
            tracing::info!("Replaying WhatsApp handoff with source {}", source);
            commands::handoff::run_handoff(config, &cli, &source, &data, print_only).await?;
            Ok(())
        }
        Commands::Session { command } => {
            commands::session::handle_session(config, &cli, command)?;
            Ok(())
        }
        Commands::Status => {
            commands::status::show_status(config, &cli).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so that command output on stdout stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "leadchat=debug"
    } else {
        "leadchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
