//! Conversation client
//!
//! [`ConversationClient`] owns the conversation session and exchanges turns
//! with the remote service. Backend failures never reach the caller: a turn
//! always ends with exactly one bot message, either the service reply or the
//! configured apology, delivered after the simulated typing delay.

use crate::api::types::{ConversationFlags, TurnRequest, TurnResult};
use crate::api::ConversationApi;
use crate::config::ChatConfig;
use crate::error::Result;
use crate::presentation::PresentationSurface;
use crate::session::id::{now_millis, placeholder_session_id};
use crate::session::SessionStore;

use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a non-empty turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The service answered; `text` is what was displayed
    Reply {
        /// Displayed text (reply or empty-reply placeholder)
        text: String,
        /// Session the turn was sent under
        session_id: String,
    },
    /// The turn failed and the apology was displayed
    Fallback {
        /// Session the turn was sent under
        session_id: String,
    },
}

impl TurnOutcome {
    /// Whether the service produced the reply
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply { .. })
    }
}

/// Client for one conversation session
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use leadchat::api::HttpConversationApi;
/// use leadchat::client::ConversationClient;
/// use leadchat::config::ChatConfig;
/// use leadchat::presentation::TerminalSurface;
/// use leadchat::session::MemorySessionStore;
///
/// # async fn example() -> leadchat::error::Result<()> {
/// let client = ConversationClient::new(
///     Arc::new(HttpConversationApi::new("http://localhost:8000", 15)?),
///     Arc::new(MemorySessionStore::new()),
///     Arc::new(TerminalSurface::new()),
///     ChatConfig::default(),
/// );
/// client.initialize_session().await;
/// client.send_turn("Olá").await;
/// # Ok(())
/// # }
/// ```
pub struct ConversationClient {
    api: Arc<dyn ConversationApi>,
    store: Arc<dyn SessionStore>,
    surface: Arc<dyn PresentationSurface>,
    settings: ChatConfig,
    flags: RwLock<ConversationFlags>,
    last_response_type: RwLock<Option<String>>,
    shutdown: CancellationToken,
}

impl ConversationClient {
    /// Create a client from its collaborators
    pub fn new(
        api: Arc<dyn ConversationApi>,
        store: Arc<dyn SessionStore>,
        surface: Arc<dyn PresentationSurface>,
        settings: ChatConfig,
    ) -> Self {
        Self {
            api,
            store,
            surface,
            settings,
            flags: RwLock::new(ConversationFlags::default()),
            last_response_type: RwLock::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Call the start endpoint and adopt the session it assigns
    ///
    /// On success the returned identifier replaces any stored one and the
    /// greeting, if present, is displayed. Failures are logged only: the
    /// static greeting is already on screen.
    ///
    /// Returns the adopted session identifier.
    pub async fn initialize_session(&self) -> Option<String> {
        let start = match self.api.start_conversation().await {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!("Conversation start failed: {:#}", e);
                return None;
            }
        };

        if let Some(session_id) = &start.session_id {
            self.persist_session_id(session_id);
            tracing::info!(session_id = %session_id, "Conversation session initialized");
        } else {
            tracing::debug!("Start response carried no session_id");
        }

        if let Some(greeting) = &start.greeting {
            self.surface.show_bot_message(greeting);
        }

        start.session_id
    }

    /// Send one user message and display the reply
    ///
    /// Blank input is ignored: no request, no message, `None`. Otherwise
    /// exactly one request is issued and exactly one bot message is
    /// delivered. Errors never propagate; they turn into the apology.
    pub async fn send_turn(&self, user_text: &str) -> Option<TurnOutcome> {
        let message = user_text.trim();
        if message.is_empty() {
            return None;
        }

        let session_id = self.current_or_placeholder_session();
        let request = TurnRequest {
            message: message.to_string(),
            session_id: session_id.clone(),
        };

        match self.api.respond(&request).await {
            Ok(result) => {
                let text = self.apply_turn_result(result);
                self.deliver(&text).await;
                Some(TurnOutcome::Reply { text, session_id })
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, "Turn failed: {:#}", e);
                self.deliver(&self.settings.fallback_message).await;
                Some(TurnOutcome::Fallback { session_id })
            }
        }
    }

    /// Forget the persisted session; the next turn gets a fresh placeholder
    pub fn clear_session(&self) {
        match self.store.clear_session_id() {
            Ok(()) => tracing::info!("Conversation session cleared"),
            Err(e) => tracing::warn!("Failed to clear session: {:#}", e),
        }
        if let Ok(mut flags) = self.flags.write() {
            *flags = ConversationFlags::default();
        }
        if let Ok(mut response_type) = self.last_response_type.write() {
            *response_type = None;
        }
    }

    /// Persisted session identifier, if any
    pub fn session_id(&self) -> Option<String> {
        self.store.session_id().unwrap_or_else(|e| {
            tracing::warn!("Failed to read session: {:#}", e);
            None
        })
    }

    /// Conversation flags accumulated from the turns so far
    pub fn flags(&self) -> ConversationFlags {
        self.flags
            .read()
            .map(|flags| flags.clone())
            .unwrap_or_default()
    }

    /// `response_type` of the latest reply
    pub fn last_response_type(&self) -> Option<String> {
        self.last_response_type
            .read()
            .map(|value| value.clone())
            .unwrap_or_default()
    }

    /// Base URL turns are sent to
    pub fn base_url(&self) -> String {
        self.api.base_url()
    }

    /// Point the client at another service and remember the choice
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not a valid http(s) URL. A failure to
    /// persist the override is logged, not returned.
    pub fn set_base_url(&self, base_url: &str) -> Result<()> {
        self.api.set_base_url(base_url)?;
        let applied = self.api.base_url();
        if let Err(e) = self.store.set_base_url_override(&applied) {
            tracing::warn!("Failed to persist base URL override: {:#}", e);
        }
        Ok(())
    }

    /// Cancel pending deliveries
    ///
    /// Any turn still waiting out its typing delay returns without
    /// rendering.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn current_or_placeholder_session(&self) -> String {
        if let Some(session_id) = self.session_id().filter(|id| !id.trim().is_empty()) {
            return session_id;
        }
        let placeholder = placeholder_session_id(now_millis());
        tracing::debug!(session_id = %placeholder, "No stored session, adopting placeholder");
        self.persist_session_id(&placeholder);
        placeholder
    }

    fn persist_session_id(&self, session_id: &str) {
        if let Err(e) = self.store.set_session_id(session_id) {
            tracing::warn!("Failed to persist session id: {:#}", e);
        }
    }

    /// Record session and flags from a reply, returning the text to display
    fn apply_turn_result(&self, result: TurnResult) -> String {
        if let Some(session_id) = &result.session_id {
            self.persist_session_id(session_id);
        }

        if let Ok(mut flags) = self.flags.write() {
            flags.merge(&result.flags);
        }
        if let Ok(mut response_type) = self.last_response_type.write() {
            *response_type = result.response_type.clone();
        }

        if result.flags.phone_collected == Some(true) {
            tracing::info!(
                phone = result.flags.phone_number.as_deref().unwrap_or("-"),
                "Service confirmed phone collection"
            );
        }

        result.message.unwrap_or_else(|| {
            tracing::debug!("Reply carried no text, showing placeholder");
            self.settings.empty_reply_message.clone()
        })
    }

    /// Show the typing indicator, wait, then render unless torn down
    async fn deliver(&self, text: &str) -> bool {
        self.surface.show_typing();

        let delay = Duration::from_millis(self.settings.typing_delay_ms);
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::debug!("Client shut down, dropping pending message");
                    return false;
                }
            }
        }

        if self.shutdown.is_cancelled() || !self.surface.is_attached() {
            tracing::debug!("Surface detached, dropping pending message");
            return false;
        }

        self.surface.show_bot_message(text);
        true
    }
}
