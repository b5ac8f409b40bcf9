/*
[INPUT]:  Error sources (HTTP, API, serialization, tokens, wallet, storage)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Sandwatch auth client
#[derive(Error, Debug)]
pub enum SandwatchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// No wallet is connected
    #[error("user is disconnected")]
    NotConnected,

    /// A sign-in attempt is already waiting on the wallet
    #[error("sign-in already in progress")]
    SignInInProgress,

    /// Wallet refused or failed to sign
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Pending operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Stored token does not have the expected structure
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Refresh-token exchange failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Token store I/O failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SandwatchError {
    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            SandwatchError::NotConnected
            | SandwatchError::MalformedToken(_)
            | SandwatchError::RefreshFailed(_) => true,
            SandwatchError::Api { code, .. } => *code == 401 || *code == 403,
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        SandwatchError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Sandwatch operations
pub type Result<T> = std::result::Result<T, SandwatchError>;
