//! Special commands parser for interactive chat mode
//!
//! Special commands form the debug surface of the chat: they change the
//! base URL, reset the session, replay the handoff and show state, rather
//! than being sent to the conversation service.
//!
//! Commands are prefixed with `/` and are case-insensitive; arguments keep
//! their original case.

use crate::api::types::HandoffSource;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Point the client at another base URL
    SetBaseUrl(String),

    /// Show the current base URL
    ShowBaseUrl,

    /// Forget the persisted session
    ClearSession,

    /// Call the start endpoint again
    Restart,

    /// Pre-authorize and redirect to WhatsApp
    Handoff(HandoffSource),

    /// Change the WhatsApp contact number
    SetContact(String),

    /// Show session, flags and base URL
    ShowStatus,

    /// Query the service status endpoint
    ServiceStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send as a chat message
    None,
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use leadchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::ClearSession);
/// assert_eq!(parse_special_command("Olá").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" && lower != "sair" {
        return Ok(SpecialCommand::None);
    }

    let (head, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match head.as_str() {
        "/baseurl" | "/base-url" => {
            if arg.is_empty() {
                Ok(SpecialCommand::ShowBaseUrl)
            } else {
                Ok(SpecialCommand::SetBaseUrl(arg.to_string()))
            }
        }

        "/clear" | "/reset" => Ok(SpecialCommand::ClearSession),
        "/restart" => Ok(SpecialCommand::Restart),

        "/handoff" | "/whatsapp" => {
            if arg.is_empty() {
                return Ok(SpecialCommand::Handoff(HandoffSource::DebugTest));
            }
            HandoffSource::parse_str(arg)
                .map(SpecialCommand::Handoff)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/handoff".to_string(),
                    arg: arg.to_string(),
                })
        }

        "/contact" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/contact".to_string(),
                    usage: "/contact <phone number>".to_string(),
                })
            } else {
                Ok(SpecialCommand::SetContact(arg.to_string()))
            }
        }

        "/status" => Ok(SpecialCommand::ShowStatus),
        "/service" => Ok(SpecialCommand::ServiceStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" | "sair" => Ok(SpecialCommand::Exit),

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Print the special command reference
pub fn print_help() {
    println!(
        r#"
Special commands:

  /baseurl [url]         Show or change the service base URL (persisted)
  /clear                 Forget the current session
  /restart               Ask the service for a new session
  /handoff [source]      Pre-authorize and open WhatsApp
                         (whatsapp_button, floating_button, chat_header,
                          chat_completion, debug_test)
  /contact <number>      Change the WhatsApp contact number
  /status                Show session, flags and base URL
  /service               Query the WhatsApp service status
  /help                  Show this help
  /exit                  Leave the chat (also: exit, quit, sair)

Anything else is sent to the assistant.
"#
    );
}
