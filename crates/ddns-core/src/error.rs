//! Error types for the DDNS updater
//!
//! Every failure a cycle can hit maps onto one of these variants. None of
//! them is fatal to the process: the engine logs the error and waits for the
//! next tick.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing; no network call was made
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport, request construction or body read failure
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The echo endpoint returned something that is not an IPv4 address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The provider accepted the exchange but reported a logical failure
    #[error("Provider error ({provider}): {}", format_messages(.messages))]
    Provider {
        /// Provider name
        provider: String,
        /// Messages reported by the provider, in order
        messages: Vec<String>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a provider error from the provider's own messages
    pub fn provider<I, S>(provider: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Provider {
            provider: provider.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// True for missing or invalid settings
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// True for transport and decoding failures
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Json(_))
    }

    /// True when the provider rejected the update
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

fn format_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no error details returned".to_string()
    } else {
        messages.join("; ")
    }
}
