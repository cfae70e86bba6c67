//! Error types for the chat assistant.

use thiserror::Error;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat assistant errors.
///
/// Every backend failure is resolved to one of these kinds before it reaches
/// the UI layer; raw transport errors never escape the invoker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Backend is temporarily out of capacity. Retried internally.
    #[error("Assistant is overloaded")]
    Overloaded,

    /// Overload persisted through every retry attempt
    #[error("Assistant is still overloaded after {attempts} attempts, please try again shortly")]
    RetryExhausted { attempts: u32 },

    /// Daily chat allowance is used up
    #[error("Daily chat limit reached, come back tomorrow")]
    QuotaExceeded,

    /// Network or timeout failure
    #[error("Could not reach the assistant: {0}")]
    Transient(String),

    /// Malformed or unexpected response
    #[error("Unexpected assistant response: {0}")]
    Fatal(String),

    /// No assistant endpoint configured
    #[error("Assistant not configured. Set VITRINE_CHAT_ENDPOINT or add .vitrine/settings.json")]
    NotConfigured,

    /// HTTP client could not be set up
    #[error("HTTP client error: {0}")]
    Client(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChatError {
    /// Whether the user can simply send again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Overloaded | Self::RetryExhausted { .. } | Self::Transient(_) | Self::Fatal(_)
        )
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
