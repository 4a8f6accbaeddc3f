//! Error types for parley.

use thiserror::Error;

/// Primary error type for all parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Decision error: {0}")]
    Decision(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification used by retry and recovery policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Decision,
    Connection,
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Contract,
    Server,
    Api,
    Store,
    Configuration,
    Serialization,
    Io,
    Cancelled,
}

impl ParleyError {
    /// Create an API error from an HTTP status and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Decision(_) => ErrorCategory::Decision,
            Self::Connection(_) => ErrorCategory::Connection,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::ContractViolation(_) => ErrorCategory::Contract,
            Self::Network(_) => ErrorCategory::Network,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Io,
            Self::Store(_) => ErrorCategory::Store,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether this error is worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        match self.category() {
            ErrorCategory::RateLimit
            | ErrorCategory::Network
            | ErrorCategory::Timeout
            | ErrorCategory::Server => true,
            ErrorCategory::Api => matches!(self, Self::Api { status: 408, .. }),
            _ => false,
        }
    }

    /// Whether this error should cost one participant turn rather than the
    /// whole run: the orchestrator continues as if the participant produced
    /// no output.
    pub fn is_turn_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Connection | ErrorCategory::Timeout
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
