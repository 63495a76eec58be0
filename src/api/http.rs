//! HTTP implementation of [`ConversationApi`]
//!
//! Every request carries the client-wide timeout configured at construction.
//! Non-success statuses are reported without reading the body.

use crate::api::types::{
    parse_start_body, parse_turn_body, AuthorizationAck, AuthorizationRequest, ServiceStatus,
    SessionStart, TurnRequest, TurnResult,
};
use crate::api::{ConversationApi, AUTHORIZE_PATH, RESPOND_PATH, START_PATH, STATUS_PATH};
use crate::config::normalize_base_url;
use crate::error::{LeadchatError, Result};

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// `reqwest` backed conversation service client
///
/// The base URL sits behind a lock so it can be changed at runtime through
/// [`ConversationApi::set_base_url`]; clones share it.
///
/// # Examples
///
/// ```
/// use leadchat::api::{ConversationApi, HttpConversationApi};
///
/// let api = HttpConversationApi::new("http://localhost:8000/", 15).unwrap();
/// assert_eq!(api.base_url(), "http://localhost:8000");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConversationApi {
    client: Client,
    base_url: Arc<RwLock<String>>,
    timeout_seconds: u64,
}

impl HttpConversationApi {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("leadchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LeadchatError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized conversation API client: base_url={}, timeout={}s",
            base_url,
            timeout_seconds
        );

        Ok(Self {
            client,
            base_url: Arc::new(RwLock::new(base_url)),
            timeout_seconds,
        })
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        let base = self
            .base_url
            .read()
            .map_err(|_| LeadchatError::Config("Failed to acquire read lock on base URL".into()))?;
        Ok(format!("{}{}", base, path))
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> LeadchatError {
        if e.is_timeout() {
            tracing::warn!("Request to {} timed out after {}s", url, self.timeout_seconds);
            LeadchatError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            tracing::warn!("Request to {} failed: {}", url, e);
            LeadchatError::Transport(format!("Failed to reach {}: {}", url, e))
        }
    }

    /// Reject non-success statuses and return the body text
    async fn success_body(&self, url: &str, response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} returned status {}", url, status);
            return Err(LeadchatError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| self.map_send_error(url, e).into())
    }
}

#[async_trait]
impl ConversationApi for HttpConversationApi {
    async fn start_conversation(&self) -> Result<SessionStart> {
        let url = self.endpoint(START_PATH)?;
        tracing::debug!("Starting conversation: {}", url);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let body = self.success_body(&url, response).await?;
        parse_start_body(&body)
    }

    async fn respond(&self, request: &TurnRequest) -> Result<TurnResult> {
        let url = self.endpoint(RESPOND_PATH)?;
        tracing::debug!(session_id = %request.session_id, "Sending turn to {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let body = self.success_body(&url, response).await?;
        parse_turn_body(&body)
    }

    async fn authorize(&self, request: &AuthorizationRequest) -> Result<AuthorizationAck> {
        let url = self.endpoint(AUTHORIZE_PATH)?;
        tracing::debug!(
            session_id = %request.session_id,
            source = %request.source,
            "Pre-authorizing handoff at {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let body = self.success_body(&url, response).await?;
        if body.trim().is_empty() {
            return Ok(AuthorizationAck::default());
        }
        serde_json::from_str(&body).map_err(|e| {
            LeadchatError::MalformedResponse(format!("authorize response: {}", e)).into()
        })
    }

    async fn service_status(&self) -> Result<ServiceStatus> {
        let url = self.endpoint(STATUS_PATH)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let body = self.success_body(&url, response).await?;
        serde_json::from_str(&body)
            .map_err(|e| LeadchatError::MalformedResponse(format!("status response: {}", e)).into())
    }

    fn base_url(&self) -> String {
        self.base_url
            .read()
            .map(|base| base.clone())
            .unwrap_or_default()
    }

    fn set_base_url(&self, base_url: &str) -> Result<()> {
        let normalized = normalize_base_url(base_url)?;
        let mut guard = self
            .base_url
            .write()
            .map_err(|_| LeadchatError::Config("Failed to acquire write lock on base URL".into()))?;
        tracing::info!("Base URL changed: {} -> {}", *guard, normalized);
        *guard = normalized;
        Ok(())
    }
}
