//! Error types for leadchat
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for leadchat operations
///
/// Covers configuration loading, the HTTP boundary with the conversation
/// service, session persistence, and handoff navigation. The conversation
/// client never lets these escape to its caller; they are logged and turned
/// into user-facing fallback messages.
#[derive(Error, Debug)]
pub enum LeadchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/transport failure reaching the conversation service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {seconds}s")]
    Timeout {
        /// The configured timeout in seconds
        seconds: u64,
    },

    /// The service answered with a non-success HTTP status
    #[error("Unexpected HTTP status: {status}")]
    Status {
        /// HTTP status code returned by the service
        status: u16,
    },

    /// The response body did not match the expected contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A base URL or redirect URL was rejected
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A commercial contact number was rejected
    #[error("Invalid contact number: {0}")]
    InvalidContact(String),

    /// Opening the redirect target failed
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Interactive line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for leadchat operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// [`LeadchatError`] stays recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
