//! Conversation service boundary
//!
//! [`ConversationApi`] is the seam between the client logic and the remote
//! service. Concrete implementations live in submodules:
//!
//! - [`http::HttpConversationApi`] -- `reqwest` client with a per-request
//!   timeout.
//! - [`fake::FakeConversationApi`] -- scripted in-process fake (cfg(test)
//!   only).
//!
//! Implementations report every failure (transport, status, body) as an
//! error; deciding what the user sees is the caller's job.

use async_trait::async_trait;

use crate::error::Result;

pub mod http;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use http::HttpConversationApi;
pub use types::{
    AuthorizationAck, AuthorizationRequest, ConversationFlags, HandoffSource, ServiceStatus,
    SessionStart, TurnRequest, TurnResult,
};

/// Path of the session start endpoint
pub const START_PATH: &str = "/api/v1/conversation/start";
/// Path of the turn endpoint
pub const RESPOND_PATH: &str = "/api/v1/conversation/respond";
/// Path of the handoff pre-authorization endpoint
pub const AUTHORIZE_PATH: &str = "/api/v1/whatsapp/authorize";
/// Path of the WhatsApp service status endpoint
pub const STATUS_PATH: &str = "/api/v1/whatsapp/status";

/// Operations offered by the remote conversation service
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Open a conversation (`POST /api/v1/conversation/start`, no body)
    async fn start_conversation(&self) -> Result<SessionStart>;

    /// Exchange one turn (`POST /api/v1/conversation/respond`)
    async fn respond(&self, request: &TurnRequest) -> Result<TurnResult>;

    /// Record a handoff intent (`POST /api/v1/whatsapp/authorize`)
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizationAck>;

    /// Query the WhatsApp service status (`GET /api/v1/whatsapp/status`)
    async fn service_status(&self) -> Result<ServiceStatus>;

    /// Base URL requests are currently sent to
    fn base_url(&self) -> String;

    /// Point subsequent requests at a different base URL
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an http(s) URL.
    fn set_base_url(&self, base_url: &str) -> Result<()>;
}
