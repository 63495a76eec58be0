//! Wire types for the conversation service and their normalization
//!
//! The service is loose about field names: a turn reply may arrive as
//! `response`, `reply` or `question`, and the start greeting as `question`
//! or `response`. The raw shapes stay private to this module's parsing
//! helpers; the rest of the crate only sees [`TurnResult`] and
//! [`SessionStart`].

use crate::error::{LeadchatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for `POST /api/v1/conversation/respond`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRequest {
    /// User message, already trimmed
    pub message: String,
    /// Session the turn belongs to
    pub session_id: String,
}

/// Raw body of `POST /api/v1/conversation/start`
#[derive(Debug, Default, Deserialize)]
pub struct RawStartResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Normalized result of a start call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStart {
    /// Identifier assigned by the service
    pub session_id: Option<String>,
    /// Opening question to display, if any
    pub greeting: Option<String>,
}

/// Raw body of `POST /api/v1/conversation/respond`
#[derive(Debug, Default, Deserialize)]
pub struct RawTurnResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub current_step: Option<u32>,
    #[serde(default)]
    pub flow_completed: Option<bool>,
    #[serde(default)]
    pub collecting_phone: Option<bool>,
    #[serde(default)]
    pub phone_collected: Option<bool>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub ai_mode: Option<bool>,
}

/// Conversation progress reported by the service
///
/// Every field is optional on the wire; absent flags keep their previous
/// value when merged with [`ConversationFlags::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationFlags {
    pub flow_completed: Option<bool>,
    pub collecting_phone: Option<bool>,
    pub phone_collected: Option<bool>,
    pub phone_number: Option<String>,
    pub ai_mode: Option<bool>,
    pub current_step: Option<u32>,
}

impl ConversationFlags {
    /// Overlay the fields present in `update`
    pub fn merge(&mut self, update: &ConversationFlags) {
        if update.flow_completed.is_some() {
            self.flow_completed = update.flow_completed;
        }
        if update.collecting_phone.is_some() {
            self.collecting_phone = update.collecting_phone;
        }
        if update.phone_collected.is_some() {
            self.phone_collected = update.phone_collected;
        }
        if update.phone_number.is_some() {
            self.phone_number = update.phone_number.clone();
        }
        if update.ai_mode.is_some() {
            self.ai_mode = update.ai_mode;
        }
        if update.current_step.is_some() {
            self.current_step = update.current_step;
        }
    }
}

impl fmt::Display for ConversationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        write!(
            f,
            "step={} flow_completed={} collecting_phone={} phone_collected={} phone={} ai_mode={}",
            show(&self.current_step),
            show(&self.flow_completed),
            show(&self.collecting_phone),
            show(&self.phone_collected),
            show(&self.phone_number),
            show(&self.ai_mode),
        )
    }
}

/// Normalized result of a conversation turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnResult {
    /// Identifier returned by the service, possibly rotated
    pub session_id: Option<String>,
    /// Reply text; `None` when the service produced nothing to show
    pub message: Option<String>,
    /// Service-side classification (`structured_question`, `phone_collected`, ...)
    pub response_type: Option<String>,
    /// Progress flags
    pub flags: ConversationFlags,
}

/// Take the first candidate with non-blank text
fn first_non_empty(candidates: [Option<String>; 3]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map a raw turn body onto [`TurnResult`]
///
/// Reply precedence is `response`, then `reply`, then `question`; blank
/// strings count as absent.
///
/// # Examples
///
/// ```
/// use leadchat::api::types::normalize_turn_response;
///
/// let raw = serde_json::from_str(r#"{"reply":"A","question":"B"}"#).unwrap();
/// assert_eq!(normalize_turn_response(raw).message.as_deref(), Some("A"));
/// ```
pub fn normalize_turn_response(raw: RawTurnResponse) -> TurnResult {
    TurnResult {
        session_id: non_empty(raw.session_id),
        message: first_non_empty([raw.response, raw.reply, raw.question]),
        response_type: non_empty(raw.response_type),
        flags: ConversationFlags {
            flow_completed: raw.flow_completed,
            collecting_phone: raw.collecting_phone,
            phone_collected: raw.phone_collected,
            phone_number: non_empty(raw.phone_number),
            ai_mode: raw.ai_mode,
            current_step: raw.current_step,
        },
    }
}

/// Map a raw start body onto [`SessionStart`]
pub fn normalize_start_response(raw: RawStartResponse) -> SessionStart {
    SessionStart {
        session_id: non_empty(raw.session_id),
        greeting: first_non_empty([raw.question, raw.response, None]),
    }
}

/// Parse a turn body
///
/// # Errors
///
/// Returns [`LeadchatError::MalformedResponse`] when the body is not a JSON
/// object of the expected shape.
pub fn parse_turn_body(body: &str) -> Result<TurnResult> {
    let raw: RawTurnResponse = serde_json::from_str(body)
        .map_err(|e| LeadchatError::MalformedResponse(format!("turn response: {}", e)))?;
    Ok(normalize_turn_response(raw))
}

/// Parse a start body
///
/// # Errors
///
/// Returns [`LeadchatError::MalformedResponse`] when the body is not a JSON
/// object of the expected shape.
pub fn parse_start_body(body: &str) -> Result<SessionStart> {
    let raw: RawStartResponse = serde_json::from_str(body)
        .map_err(|e| LeadchatError::MalformedResponse(format!("start response: {}", e)))?;
    Ok(normalize_start_response(raw))
}

/// UI trigger that initiated a handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandoffSource {
    /// Generic WhatsApp button
    #[default]
    WhatsappButton,
    /// Floating action button
    FloatingButton,
    /// Button in the chat header
    ChatHeader,
    /// Offered after the intake flow completes
    ChatCompletion,
    /// Synthetic trigger from the debug surface
    DebugTest,
}

impl HandoffSource {
    /// Wire name of the source tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsappButton => "whatsapp_button",
            Self::FloatingButton => "floating_button",
            Self::ChatHeader => "chat_header",
            Self::ChatCompletion => "chat_completion",
            Self::DebugTest => "debug_test",
        }
    }

    /// Parse a source tag
    ///
    /// # Examples
    ///
    /// ```
    /// use leadchat::api::types::HandoffSource;
    ///
    /// assert_eq!(HandoffSource::parse_str("Floating_Button").unwrap(), HandoffSource::FloatingButton);
    /// assert!(HandoffSource::parse_str("banner").is_err());
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "whatsapp_button" => Ok(Self::WhatsappButton),
            "floating_button" => Ok(Self::FloatingButton),
            "chat_header" => Ok(Self::ChatHeader),
            "chat_completion" => Ok(Self::ChatCompletion),
            "debug_test" => Ok(Self::DebugTest),
            other => Err(format!("Unknown handoff source: {}", other)),
        }
    }
}

impl fmt::Display for HandoffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `POST /api/v1/whatsapp/authorize`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizationRequest {
    /// Fresh `whatsapp_` identifier
    pub session_id: String,
    /// Always serialized; `null` until the phone is known
    pub phone_number: Option<String>,
    /// Trigger tag
    pub source: HandoffSource,
    /// Caller data merged with client context
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

/// Body returned by the authorize endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub whatsapp_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/v1/whatsapp/status`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Any other reported fields
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}
