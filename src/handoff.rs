//! WhatsApp handoff: best-effort pre-authorization plus unconditional redirect
//!
//! A handoff is two independent steps. [`HandoffTrigger::attempt_pre_authorization`]
//! tells the service a user is about to move to WhatsApp; its outcome is
//! only logged. [`build_redirect_url`] is pure and always produces the
//! `wa.me` link that the [`Navigator`] then opens.

use crate::api::types::{AuthorizationAck, AuthorizationRequest, HandoffSource};
use crate::api::ConversationApi;
use crate::config::HandoffConfig;
use crate::error::{LeadchatError, Result};
use crate::session::id::{handoff_session_id, now_millis};

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, RwLock};
use url::Url;

const WHATSAPP_BASE: &str = "https://wa.me/";

/// Commercial contact number, digits only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactNumber(String);

impl ContactNumber {
    /// Parse a phone number, tolerating `+`, spaces, dashes and parentheses
    ///
    /// # Examples
    ///
    /// ```
    /// use leadchat::handoff::ContactNumber;
    ///
    /// let number = ContactNumber::parse("+55 (11) 91836-8812").unwrap();
    /// assert_eq!(number.as_str(), "5511918368812");
    /// assert!(ContactNumber::parse("12345").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, '+' | ' ' | '-' | '(' | ')'))
            .collect();

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(LeadchatError::InvalidContact(raw.to_string()).into());
        }
        if !(10..=15).contains(&digits.len()) {
            return Err(LeadchatError::InvalidContact(format!(
                "{} (expected 10 to 15 digits)",
                raw
            ))
            .into());
        }
        Ok(Self(digits))
    }

    /// Digits as used in the `wa.me` path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Build the WhatsApp deep link for the configured contact and greeting
///
/// # Errors
///
/// Returns error if the contact number is invalid.
///
/// # Examples
///
/// ```
/// use leadchat::config::HandoffConfig;
/// use leadchat::handoff::build_redirect_url;
///
/// let config = HandoffConfig {
///     contact_number: "5511918368812".to_string(),
///     greeting_message: "Olá! Preciso de ajuda".to_string(),
///     ..HandoffConfig::default()
/// };
/// let url = build_redirect_url(&config).unwrap();
/// assert_eq!(url.as_str(), "https://wa.me/5511918368812?text=Ol%C3%A1%21+Preciso+de+ajuda");
/// ```
pub fn build_redirect_url(config: &HandoffConfig) -> Result<Url> {
    let contact = ContactNumber::parse(&config.contact_number)?;
    let mut url = Url::parse(WHATSAPP_BASE)?.join(contact.as_str())?;
    url.query_pairs_mut()
        .append_pair("text", &config.greeting_message);
    Ok(url)
}

/// Opens the redirect target
pub trait Navigator: Send + Sync {
    /// Open `url` in a new context
    fn open(&self, url: &Url) -> Result<()>;
}

/// Opens URLs with the platform browser launcher
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open(&self, url: &Url) -> Result<()> {
        #[cfg(target_os = "macos")]
        let launcher = Some("open");
        #[cfg(target_os = "linux")]
        let launcher = Some("xdg-open");
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        let launcher: Option<&str> = None;

        println!("Opening WhatsApp: {}", url);
        match launcher {
            Some(program) => {
                std::process::Command::new(program)
                    .arg(url.as_str())
                    .spawn()
                    .map_err(|e| LeadchatError::Navigation(format!("{}: {}", program, e)))?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Prints the URL instead of opening it
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn open(&self, url: &Url) -> Result<()> {
        println!("{}", url);
        Ok(())
    }
}

/// Records opened URLs; handy for scripted runs and tests
#[derive(Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far
    pub fn opened(&self) -> Vec<Url> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn open(&self, url: &Url) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| LeadchatError::Navigation("recorder lock poisoned".into()))?
            .push(url.clone());
        Ok(())
    }
}

/// Pre-authorizes handoffs and redirects to WhatsApp
pub struct HandoffTrigger {
    api: Arc<dyn ConversationApi>,
    navigator: Arc<dyn Navigator>,
    config: RwLock<HandoffConfig>,
}

impl HandoffTrigger {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        navigator: Arc<dyn Navigator>,
        config: HandoffConfig,
    ) -> Self {
        Self {
            api,
            navigator,
            config: RwLock::new(config),
        }
    }

    fn config(&self) -> HandoffConfig {
        self.config
            .read()
            .map(|config| config.clone())
            .unwrap_or_default()
    }

    /// Change the commercial contact used for subsequent redirects
    ///
    /// # Errors
    ///
    /// Returns error if the number is invalid; the previous contact is kept.
    pub fn set_contact_number(&self, number: &str) -> Result<()> {
        let contact = ContactNumber::parse(number)?;
        let mut config = self
            .config
            .write()
            .map_err(|_| LeadchatError::Config("Failed to acquire write lock on handoff".into()))?;
        tracing::info!(
            "Contact number changed: {} -> {}",
            config.contact_number,
            contact.as_str()
        );
        config.contact_number = contact.as_str().to_string();
        Ok(())
    }

    /// Current contact number
    pub fn contact_number(&self) -> String {
        self.config().contact_number
    }

    /// Build the authorization payload for a fresh handoff identifier
    ///
    /// Client context keys (`page_url`, `timestamp`, `user_agent`,
    /// `referrer`) overwrite caller keys of the same name.
    pub fn build_request(
        &self,
        source: HandoffSource,
        user_data: Map<String, Value>,
    ) -> AuthorizationRequest {
        let config = self.config();
        let mut data = user_data;
        data.insert("page_url".into(), Value::String(config.page_url.clone()));
        data.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
        data.insert(
            "user_agent".into(),
            Value::String(format!(
                "leadchat/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            )),
        );
        data.insert(
            "referrer".into(),
            Value::String(
                config
                    .referrer
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| "direct".to_string()),
            ),
        );

        AuthorizationRequest {
            session_id: handoff_session_id(now_millis(), &mut rand::rng()),
            phone_number: None,
            source,
            user_data: data,
        }
    }

    /// Send one pre-authorization; never retried
    pub async fn attempt_pre_authorization(
        &self,
        source: HandoffSource,
        user_data: Map<String, Value>,
    ) -> Result<AuthorizationAck> {
        let request = self.build_request(source, user_data);
        tracing::info!(
            session_id = %request.session_id,
            source = %source,
            "Pre-authorizing WhatsApp handoff"
        );
        self.api.authorize(&request).await
    }

    /// Pre-authorize, then redirect regardless of the outcome
    ///
    /// Returns whether the pre-authorization succeeded. The value is for
    /// diagnostics; the redirect has already happened either way.
    pub async fn pre_authorize_and_redirect(
        &self,
        source: HandoffSource,
        user_data: Map<String, Value>,
    ) -> bool {
        let authorized = match self.attempt_pre_authorization(source, user_data).await {
            Ok(ack) => {
                tracing::info!(
                    status = ack.status.as_deref().unwrap_or("-"),
                    "Handoff pre-authorized"
                );
                true
            }
            Err(e) => {
                // The service keeps no record of this handoff.
                tracing::warn!(
                    authorization_recorded = false,
                    "Handoff pre-authorization failed: {:#}",
                    e
                );
                false
            }
        };

        match build_redirect_url(&self.config()) {
            Ok(url) => {
                if let Err(e) = self.navigator.open(&url) {
                    tracing::error!("Failed to open {}: {:#}", url, e);
                }
            }
            Err(e) => tracing::error!("Failed to build WhatsApp redirect: {:#}", e),
        }

        authorized
    }
}

/// Parse `key=value` pairs into a user data map
///
/// # Errors
///
/// Returns error for entries without `=` or with an empty key.
pub fn parse_user_data(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut data = Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            LeadchatError::Config(format!("Expected key=value, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(LeadchatError::Config(format!("Empty key in '{}'", pair)).into());
        }
        data.insert(key.to_string(), Value::String(value.trim().to_string()));
    }
    Ok(data)
}
