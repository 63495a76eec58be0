//! Scripted in-process fake of the conversation service
//!
//! Responses are queued per endpoint and consumed in order; an empty queue
//! yields a transport error. Every request is recorded so tests can assert
//! on what the client sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::types::{
    AuthorizationAck, AuthorizationRequest, ServiceStatus, SessionStart, TurnRequest, TurnResult,
};
use crate::api::ConversationApi;
use crate::error::{LeadchatError, Result};

type Scripted<T> = Mutex<VecDeque<std::result::Result<T, LeadchatError>>>;

/// Fake [`ConversationApi`] for unit tests
#[derive(Default)]
pub struct FakeConversationApi {
    starts: Scripted<SessionStart>,
    turns: Scripted<TurnResult>,
    authorizations: Scripted<AuthorizationAck>,
    sent_turns: Mutex<Vec<TurnRequest>>,
    sent_authorizations: Mutex<Vec<AuthorizationRequest>>,
    start_calls: Mutex<usize>,
    base_url: Mutex<String>,
}

impl FakeConversationApi {
    pub fn new() -> Self {
        Self {
            base_url: Mutex::new("http://fake.local".to_string()),
            ..Default::default()
        }
    }

    pub fn push_start(&self, result: std::result::Result<SessionStart, LeadchatError>) {
        self.starts.lock().unwrap().push_back(result);
    }

    pub fn push_turn(&self, result: std::result::Result<TurnResult, LeadchatError>) {
        self.turns.lock().unwrap().push_back(result);
    }

    pub fn push_reply(&self, session_id: Option<&str>, message: Option<&str>) {
        self.push_turn(Ok(TurnResult {
            session_id: session_id.map(str::to_string),
            message: message.map(str::to_string),
            ..Default::default()
        }));
    }

    pub fn push_authorization(&self, result: std::result::Result<AuthorizationAck, LeadchatError>) {
        self.authorizations.lock().unwrap().push_back(result);
    }

    pub fn sent_turns(&self) -> Vec<TurnRequest> {
        self.sent_turns.lock().unwrap().clone()
    }

    pub fn sent_authorizations(&self) -> Vec<AuthorizationRequest> {
        self.sent_authorizations.lock().unwrap().clone()
    }

    pub fn start_calls(&self) -> usize {
        *self.start_calls.lock().unwrap()
    }

    fn next<T>(queue: &Scripted<T>, what: &str) -> Result<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LeadchatError::Transport(format!("no scripted {}", what))))
            .map_err(Into::into)
    }
}

#[async_trait]
impl ConversationApi for FakeConversationApi {
    async fn start_conversation(&self) -> Result<SessionStart> {
        *self.start_calls.lock().unwrap() += 1;
        Self::next(&self.starts, "start")
    }

    async fn respond(&self, request: &TurnRequest) -> Result<TurnResult> {
        self.sent_turns.lock().unwrap().push(request.clone());
        Self::next(&self.turns, "turn")
    }

    async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizationAck> {
        self.sent_authorizations.lock().unwrap().push(request.clone());
        Self::next(&self.authorizations, "authorization")
    }

    async fn service_status(&self) -> Result<ServiceStatus> {
        Ok(ServiceStatus {
            service: Some("fake".to_string()),
            status: Some("ok".to_string()),
            ..Default::default()
        })
    }

    fn base_url(&self) -> String {
        self.base_url.lock().unwrap().clone()
    }

    fn set_base_url(&self, base_url: &str) -> Result<()> {
        let normalized = crate::config::normalize_base_url(base_url)?;
        *self.base_url.lock().unwrap() = normalized;
        Ok(())
    }
}
