//! leadchat - conversation client library
//!
//! This library relays user messages to a remote lead-intake conversation
//! service and hands users over to WhatsApp after a best-effort
//! pre-authorization.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP boundary with the conversation service and response normalization
//! - `client`: Session-aware turn exchange with fallback behavior
//! - `handoff`: WhatsApp pre-authorization and redirect
//! - `presentation`: Surfaces bot messages are rendered on
//! - `session`: Durable session identifier storage and id generation
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use leadchat::{Config, ConversationClient};
//! use leadchat::api::HttpConversationApi;
//! use leadchat::presentation::TerminalSurface;
//! use leadchat::session::FileSessionStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = ConversationClient::new(
//!         Arc::new(HttpConversationApi::new(&config.api.base_url, config.api.timeout_seconds)?),
//!         Arc::new(FileSessionStore::new()?),
//!         Arc::new(TerminalSurface::new()),
//!         config.chat.clone(),
//!     );
//!     client.send_turn("Olá").await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod handoff;
pub mod presentation;
pub mod session;

// Re-export commonly used types
pub use client::{ConversationClient, TurnOutcome};
pub use config::Config;
pub use error::{LeadchatError, Result};
pub use handoff::{build_redirect_url, HandoffTrigger};
