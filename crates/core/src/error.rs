//! Error types for the aulabot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all aulabot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation history errors ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    // --- Configuration errors ---
    #[error("{message}")]
    Config { message: String },

    #[error("No provider found for model: {0}")]
    UnknownModel(String),

    #[error("Unknown agent type: {0}")]
    UnknownAgent(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session exceeded its deadline of {secs}s")]
    DeadlineExceeded { secs: u64 },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a configuration error from anything printable.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means a capability was invoked while unconfigured.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::Provider(ProviderError::NotConfigured(_))
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// True for failures of the remote call itself (as opposed to a missing credential).
    pub fn is_upstream(&self) -> bool {
        !matches!(self, ProviderError::NotConfigured(_))
    }

    /// Map a transport error, keeping timeouts distinguishable.
    pub fn from_transport(err: &dyn std::fmt::Display, is_timeout: bool) -> Self {
        if is_timeout {
            ProviderError::Timeout(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{tool} failed: {message}")]
    Upstream { tool: String, message: String },
}

impl ToolError {
    pub fn upstream(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
