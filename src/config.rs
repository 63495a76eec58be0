//! Configuration management for leadchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Base URL selection follows its own precedence chain, see
//! [`resolve_base_url`].

use crate::error::{LeadchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted for the conversation service base URL
pub const BASE_URL_ENV: &str = "LEADCHAT_BASE_URL";

/// Main configuration structure for leadchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Conversation service connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat behavior (typing delay, fallback texts)
    #[serde(default)]
    pub chat: ChatConfig,
    /// WhatsApp handoff settings
    #[serde(default)]
    pub handoff: HandoffConfig,
    /// Session persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Conversation service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Built-in base URL, used when no override is present
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to every request (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Simulated typing delay before each bot message (milliseconds)
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Message shown when a turn fails for any reason
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Message shown when the service answered without any reply text
    #[serde(default = "default_empty_reply_message")]
    pub empty_reply_message: String,

    /// Static greeting shown before the service is contacted
    #[serde(default = "default_static_greeting")]
    pub static_greeting: String,

    /// Call the start endpoint when an interactive chat opens
    #[serde(default = "default_initialize_on_start")]
    pub initialize_on_start: bool,
}

fn default_typing_delay_ms() -> u64 {
    2000
}

fn default_fallback_message() -> String {
    "Desculpe, ocorreu um erro ao processar sua mensagem. Por favor, tente novamente em instantes."
        .to_string()
}

fn default_empty_reply_message() -> String {
    "Desculpe, não consegui gerar uma resposta.".to_string()
}

fn default_static_greeting() -> String {
    "Olá! Sou o assistente virtual do escritório. Como posso ajudá-lo?".to_string()
}

fn default_initialize_on_start() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay_ms(),
            fallback_message: default_fallback_message(),
            empty_reply_message: default_empty_reply_message(),
            static_greeting: default_static_greeting(),
            initialize_on_start: default_initialize_on_start(),
        }
    }
}

/// WhatsApp handoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Commercial contact number the redirect points at
    #[serde(default = "default_contact_number")]
    pub contact_number: String,

    /// Message pre-filled in the WhatsApp conversation
    #[serde(default = "default_greeting_message")]
    pub greeting_message: String,

    /// Reported as `page_url` in the pre-authorization context
    #[serde(default = "default_page_url")]
    pub page_url: String,

    /// Reported as `referrer`; `"direct"` when unset
    #[serde(default)]
    pub referrer: Option<String>,
}

fn default_contact_number() -> String {
    "5511918368812".to_string()
}

fn default_greeting_message() -> String {
    "Olá! Gostaria de falar com um advogado sobre o meu caso.".to_string()
}

fn default_page_url() -> String {
    "cli://leadchat".to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            contact_number: default_contact_number(),
            greeting_message: default_greeting_message(),
            page_url: default_page_url(),
            referrer: None,
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Explicit session file; the platform data directory is used when unset
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

/// Candidate base URLs, in the order they are consulted
///
/// Mirrors the precedence of the hosted widget: an explicit attribute,
/// then a request-scoped parameter, then a previously persisted override,
/// then the built-in default.
#[derive(Debug, Clone, Default)]
pub struct BaseUrlSources {
    /// `--base-url` flag
    pub explicit: Option<String>,
    /// `LEADCHAT_BASE_URL` environment variable
    pub environment: Option<String>,
    /// Override persisted in the session store
    pub persisted: Option<String>,
    /// Configured default
    pub default: String,
}

/// Pick the first present, non-blank base URL
///
/// # Examples
///
/// ```
/// use leadchat::config::{resolve_base_url, BaseUrlSources};
///
/// let sources = BaseUrlSources {
///     explicit: None,
///     environment: Some("http://env:9000".to_string()),
///     persisted: Some("http://saved:9000".to_string()),
///     default: "http://localhost:8000".to_string(),
/// };
/// assert_eq!(resolve_base_url(&sources), "http://env:9000");
/// ```
pub fn resolve_base_url(sources: &BaseUrlSources) -> String {
    [
        sources.explicit.as_deref(),
        sources.environment.as_deref(),
        sources.persisted.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|candidate| !candidate.is_empty())
    .unwrap_or(sources.default.trim())
    .trim_end_matches('/')
    .to_string()
}

/// Validate a base URL and return it normalized without a trailing slash
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| LeadchatError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LeadchatError::InvalidUrl(format!(
            "{}: scheme must be http or https",
            trimmed
        ))
        .into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LeadchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| LeadchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(timeout) = std::env::var("LEADCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid LEADCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(delay) = std::env::var("LEADCHAT_TYPING_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.chat.typing_delay_ms = value;
            } else {
                tracing::warn!("Invalid LEADCHAT_TYPING_DELAY_MS: {}", delay);
            }
        }

        if let Ok(number) = std::env::var("LEADCHAT_CONTACT_NUMBER") {
            tracing::debug!(contact = %number, "Env override: LEADCHAT_CONTACT_NUMBER");
            self.handoff.contact_number = number;
        }

        if let Ok(path) = std::env::var("LEADCHAT_SESSION_FILE") {
            tracing::debug!(path = %path, "Env override: LEADCHAT_SESSION_FILE");
            self.storage.session_file = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.session_file {
            self.storage.session_file = Some(path.clone());
        }
        if cli.no_typing_delay {
            self.chat.typing_delay_ms = 0;
        }
    }

    /// Gather the base URL candidates known before the session store is opened
    pub fn base_url_sources(&self, cli: &crate::cli::Cli) -> BaseUrlSources {
        BaseUrlSources {
            explicit: cli.base_url.clone(),
            environment: std::env::var(BASE_URL_ENV).ok(),
            persisted: None,
            default: self.api.base_url.clone(),
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range or malformed
    pub fn validate(&self) -> Result<()> {
        normalize_base_url(&self.api.base_url)
            .map_err(|e| LeadchatError::Config(format!("api.base_url: {}", e)))?;

        if self.api.timeout_seconds == 0 {
            return Err(
                LeadchatError::Config("api.timeout_seconds must be greater than 0".into()).into(),
            );
        }

        if self.api.timeout_seconds > 300 {
            return Err(LeadchatError::Config(
                "api.timeout_seconds must be at most 300".to_string(),
            )
            .into());
        }

        if self.chat.typing_delay_ms > 60_000 {
            return Err(LeadchatError::Config(
                "chat.typing_delay_ms must be at most 60000".to_string(),
            )
            .into());
        }

        if self.chat.fallback_message.trim().is_empty() {
            return Err(
                LeadchatError::Config("chat.fallback_message cannot be empty".into()).into(),
            );
        }

        crate::handoff::ContactNumber::parse(&self.handoff.contact_number)
            .map_err(|e| LeadchatError::Config(format!("handoff.contact_number: {}", e)))?;

        Ok(())
    }
}
