/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`    - Interactive chat with the conversation service
- `send`    - Send one message and print the reply
- `handoff` - Pre-authorize and redirect to WhatsApp
- `session` - Show or clear the persisted session
- `status`  - Query the WhatsApp service status

Handlers share one wiring step, [`Runtime::build`], which resolves the base
URL and assembles the client, the handoff trigger and the session store.
*/

use crate::api::{ConversationApi, HttpConversationApi};
use crate::cli::Cli;
use crate::client::ConversationClient;
use crate::config::{resolve_base_url, Config};
use crate::error::Result;
use crate::handoff::{HandoffTrigger, Navigator, PrintNavigator, SystemBrowser};
use crate::presentation::PresentationSurface;
use crate::session::id::is_placeholder;
use crate::session::{FileSessionStore, SessionStore};
use std::sync::Arc;

// Special commands parser for the chat debug surface
pub mod special_commands;

/// Wired components for one command invocation
pub struct Runtime {
    pub api: Arc<dyn ConversationApi>,
    pub store: Arc<dyn SessionStore>,
    pub client: ConversationClient,
    pub trigger: HandoffTrigger,
}

impl Runtime {
    /// Assemble the runtime from configuration
    ///
    /// The base URL is resolved from the CLI flag, the environment, the
    /// persisted override and the configured default, in that order.
    pub fn build(
        config: &Config,
        cli: &Cli,
        surface: Arc<dyn PresentationSurface>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let store = open_store(config)?;
        let base_url = resolved_base_url(config, cli, store.as_ref());
        Self::with_store(config, &base_url, store, surface, navigator)
    }

    /// Assemble the runtime around an existing store and base URL
    pub fn with_store(
        config: &Config,
        base_url: &str,
        store: Arc<dyn SessionStore>,
        surface: Arc<dyn PresentationSurface>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let api: Arc<dyn ConversationApi> =
            Arc::new(HttpConversationApi::new(base_url, config.api.timeout_seconds)?);

        let client =
            ConversationClient::new(api.clone(), store.clone(), surface, config.chat.clone());
        let trigger = HandoffTrigger::new(api.clone(), navigator, config.handoff.clone());

        Ok(Self {
            api,
            store,
            client,
            trigger,
        })
    }
}

/// Open the configured session store
pub fn open_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match &config.storage.session_file {
        Some(path) => Arc::new(FileSessionStore::with_path(path)),
        None => Arc::new(FileSessionStore::new()?),
    };
    Ok(store)
}

/// Resolve the base URL, consulting the store for a persisted override
pub fn resolved_base_url(config: &Config, cli: &Cli, store: &dyn SessionStore) -> String {
    let mut sources = config.base_url_sources(cli);
    sources.persisted = store.base_url_override().unwrap_or_else(|e| {
        tracing::warn!("Failed to read base URL override: {:#}", e);
        None
    });
    let base_url = resolve_base_url(&sources);
    tracing::debug!(base_url = %base_url, "Resolved base URL");
    base_url
}

/// Render a session identifier, marking local placeholders
pub fn describe_session(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if is_placeholder(id) => format!("{} (provisional)", id),
        Some(id) => id.to_string(),
        None => "(none)".to_string(),
    }
}

fn navigator_for(print_only: bool) -> Arc<dyn Navigator> {
    if print_only {
        Arc::new(PrintNavigator)
    } else {
        Arc::new(SystemBrowser)
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Shows the static greeting, optionally opens a session with the
    //! service, then runs a readline loop that routes special commands to
    //! the debug surface and everything else to the conversation client.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::presentation::TerminalSurface;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `cli` - Parsed CLI, for base URL resolution
    /// * `no_init` - Skip the start call
    pub async fn run_chat(config: Config, cli: &Cli, no_init: bool) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let surface = Arc::new(TerminalSurface::new());
        let runtime = Runtime::build(&config, cli, surface.clone(), navigator_for(false))?;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&runtime);
        surface.show_bot_message(&config.chat.static_greeting);

        if config.chat.initialize_on_start && !no_init {
            runtime.client.initialize_session().await;
        }

        loop {
            let prompt = format!("{} ", "you>".cyan().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    };

                    if command == SpecialCommand::Exit {
                        break;
                    }
                    if command == SpecialCommand::None {
                        runtime.client.send_turn(trimmed).await;
                        continue;
                    }
                    handle_special_command(&runtime, command).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        runtime.client.shutdown();
        surface.detach();
        println!("Até logo!");
        Ok(())
    }

    /// Execute a debug-surface command
    pub(crate) async fn handle_special_command(runtime: &Runtime, command: SpecialCommand) {
        match command {
            SpecialCommand::SetBaseUrl(url) => match runtime.client.set_base_url(&url) {
                Ok(()) => println!("Base URL set to {}\n", runtime.client.base_url()),
                Err(e) => eprintln!("{}\n", format!("Error: {:#}", e).red()),
            },
            SpecialCommand::ShowBaseUrl => println!("{}\n", runtime.client.base_url()),
            SpecialCommand::ClearSession => {
                runtime.client.clear_session();
                println!("Session cleared\n");
            }
            SpecialCommand::Restart => {
                if runtime.client.initialize_session().await.is_none() {
                    println!("{}\n", "Service did not assign a session".yellow());
                }
            }
            SpecialCommand::Handoff(source) => {
                let authorized = runtime
                    .trigger
                    .pre_authorize_and_redirect(source, serde_json::Map::new())
                    .await;
                println!("Handoff pre-authorized: {}\n", authorized);
            }
            SpecialCommand::SetContact(number) => {
                match runtime.trigger.set_contact_number(&number) {
                    Ok(()) => println!("Contact set to {}\n", runtime.trigger.contact_number()),
                    Err(e) => eprintln!("{}\n", format!("Error: {:#}", e).red()),
                }
            }
            SpecialCommand::ShowStatus => print_status(runtime),
            SpecialCommand::ServiceStatus => match runtime.api.service_status().await {
                Ok(status) => println!(
                    "{}\n",
                    serde_json::to_string_pretty(&status).unwrap_or_default()
                ),
                Err(e) => eprintln!("{}\n", format!("Service unavailable: {:#}", e).red()),
            },
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn print_welcome_banner(runtime: &Runtime) {
        println!();
        println!("{}", "leadchat".bold());
        println!("Service: {}", runtime.client.base_url().cyan());
        println!("Type '/help' for commands, '/exit' to leave.\n");
    }

    fn print_status(runtime: &Runtime) {
        let session = runtime.client.session_id();
        println!("Session:  {}", describe_session(session.as_deref()));
        println!("Base URL: {}", runtime.client.base_url());
        println!("Contact:  {}", runtime.trigger.contact_number());
        println!("Flags:    {}", runtime.client.flags());
        if let Some(response_type) = runtime.client.last_response_type() {
            println!("Last:     {}", response_type);
        }
        println!();
    }
}

// One-shot message handler
pub mod send {
    //! Sends one turn and prints the bot reply.

    use super::*;
    use crate::client::TurnOutcome;
    use crate::presentation::BufferedSurface;

    /// Send `message` and print whatever the bot displayed
    pub async fn run_send(config: Config, cli: &Cli, message: &str) -> Result<()> {
        let surface = Arc::new(BufferedSurface::new());
        let runtime = Runtime::build(&config, cli, surface.clone(), navigator_for(true))?;

        match runtime.client.send_turn(message).await {
            None => tracing::warn!("Nothing to send: message is blank"),
            Some(TurnOutcome::Fallback { session_id }) => {
                tracing::warn!(session_id = %session_id, "Service unavailable, showed fallback");
            }
            Some(TurnOutcome::Reply { session_id, .. }) => {
                tracing::debug!(session_id = %session_id, "Turn completed");
            }
        }

        for text in surface.take_messages() {
            println!("{}", text);
        }
        Ok(())
    }
}

// Handoff command handler
pub mod handoff {
    //! Replays the WhatsApp handoff from the command line.

    use super::*;
    use crate::api::types::HandoffSource;
    use crate::error::LeadchatError;
    use crate::handoff::parse_user_data;
    use crate::presentation::BufferedSurface;

    /// Pre-authorize with `source` and open (or print) the redirect
    pub async fn run_handoff(
        config: Config,
        cli: &Cli,
        source: &str,
        data: &[String],
        print_only: bool,
    ) -> Result<()> {
        let source = HandoffSource::parse_str(source).map_err(LeadchatError::Config)?;
        let user_data = parse_user_data(data)?;

        let runtime = Runtime::build(
            &config,
            cli,
            Arc::new(BufferedSurface::new()),
            navigator_for(print_only),
        )?;

        let authorized = runtime
            .trigger
            .pre_authorize_and_redirect(source, user_data)
            .await;
        tracing::info!(authorized, source = %source, "Handoff finished");
        Ok(())
    }
}

// Session maintenance handler
pub mod session {
    //! Shows or clears the persisted session.

    use super::*;
    use crate::cli::SessionCommand;

    /// Run a session subcommand
    ///
    /// Only the session store is opened; the conversation service is never
    /// contacted.
    pub fn handle_session(config: Config, cli: &Cli, command: SessionCommand) -> Result<()> {
        let store = open_store(&config)?;

        match command {
            SessionCommand::Show => {
                let state = store.load()?;
                println!(
                    "session_id: {}",
                    describe_session(state.session_id.as_deref())
                );
                println!(
                    "base_url_override: {}",
                    state.base_url_override.as_deref().unwrap_or("(none)")
                );
                println!(
                    "base_url: {}",
                    resolved_base_url(&config, cli, store.as_ref())
                );
            }
            SessionCommand::Clear => {
                store.clear_session_id()?;
                tracing::info!("Conversation session cleared");
                println!("Session cleared");
            }
        }
        Ok(())
    }
}

// Service status handler
pub mod status {
    //! Prints the WhatsApp service status.

    use super::*;
    use crate::presentation::BufferedSurface;

    /// Query and print the status endpoint
    pub async fn show_status(config: Config, cli: &Cli) -> Result<()> {
        let runtime = Runtime::build(
            &config,
            cli,
            Arc::new(BufferedSurface::new()),
            navigator_for(true),
        )?;
        let status = runtime.api.service_status().await?;
        println!("{}", serde_json::to_string_pretty(&status)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::chat::handle_special_command;
    use super::special_commands::SpecialCommand;
    use super::*;
    use crate::handoff::RecordingNavigator;
    use crate::presentation::BufferedSurface;
    use crate::session::MemorySessionStore;
    use clap::Parser;
    use serial_test::serial;

    fn runtime(navigator: Arc<RecordingNavigator>) -> (Runtime, Arc<MemorySessionStore>) {
        let mut config = Config::default();
        config.chat.typing_delay_ms = 0;
        let store = Arc::new(MemorySessionStore::new());
        let runtime = Runtime::with_store(
            &config,
            "http://127.0.0.1:9",
            store.clone(),
            Arc::new(BufferedSurface::new()),
            navigator,
        )
        .unwrap();
        (runtime, store)
    }

    #[test]
    fn test_describe_session_marks_placeholders() {
        assert_eq!(describe_session(None), "(none)");
        assert_eq!(describe_session(Some("sess-1")), "sess-1");
        assert_eq!(
            describe_session(Some("web_1700000000000")),
            "web_1700000000000 (provisional)"
        );
    }

    #[test]
    #[serial]
    fn test_resolved_base_url_uses_persisted_override() {
        std::env::remove_var(crate::config::BASE_URL_ENV);
        let config = Config::default();
        let cli = Cli::try_parse_from(["leadchat", "session", "show"]).unwrap();
        let store = MemorySessionStore::new();
        store.set_base_url_override("http://saved:9000").unwrap();

        assert_eq!(resolved_base_url(&config, &cli, &store), "http://saved:9000");

        let cli =
            Cli::try_parse_from(["leadchat", "--base-url", "http://flag:1/", "session", "show"])
                .unwrap();
        assert_eq!(resolved_base_url(&config, &cli, &store), "http://flag:1");
    }

    #[tokio::test]
    async fn test_set_base_url_command_persists() {
        let (runtime, store) = runtime(Arc::new(RecordingNavigator::new()));
        handle_special_command(
            &runtime,
            SpecialCommand::SetBaseUrl("http://localhost:9999".into()),
        )
        .await;
        assert_eq!(runtime.client.base_url(), "http://localhost:9999");
        assert_eq!(runtime.api.base_url(), "http://localhost:9999");
        assert_eq!(
            store.base_url_override().unwrap().as_deref(),
            Some("http://localhost:9999")
        );
    }

    #[tokio::test]
    async fn test_clear_command() {
        let (runtime, store) = runtime(Arc::new(RecordingNavigator::new()));
        store.set_session_id("sess-1").unwrap();
        handle_special_command(&runtime, SpecialCommand::ClearSession).await;
        assert_eq!(store.session_id().unwrap(), None);
    }

    #[tokio::test]
    async fn test_handoff_command_redirects_when_service_unreachable() {
        let navigator = Arc::new(RecordingNavigator::new());
        let (runtime, _) = runtime(navigator.clone());
        handle_special_command(
            &runtime,
            SpecialCommand::Handoff(crate::api::types::HandoffSource::DebugTest),
        )
        .await;
        assert_eq!(navigator.opened().len(), 1);
    }
}
