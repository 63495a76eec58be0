//! Command-line interface definition for leadchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot turns, the WhatsApp
//! handoff, and session maintenance.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// leadchat - conversation client for the lead-intake service
///
/// Relays messages to the remote conversation API and hands users over
/// to WhatsApp after pre-authorizing the handoff.
#[derive(Parser, Debug, Clone)]
#[command(name = "leadchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Conversation service base URL (takes precedence over every other source)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Session file used to persist the session identifier
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Deliver bot messages immediately instead of simulating typing
    #[arg(long)]
    pub no_typing_delay: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for leadchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with the conversation service
    Chat {
        /// Skip the start call and rely on the static greeting
        #[arg(long)]
        no_init: bool,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,
    },

    /// Pre-authorize a WhatsApp handoff and open the redirect
    Handoff {
        /// Trigger tag reported to the service
        #[arg(short, long, default_value = "debug_test")]
        source: String,

        /// Extra user data as key=value pairs
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Print the redirect URL instead of opening a browser
        #[arg(long)]
        print_only: bool,
    },

    /// Inspect or reset the persisted session
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Query the WhatsApp service status endpoint
    Status,
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show the persisted session identifier and base URL override
    Show,

    /// Remove the persisted session identifier
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
