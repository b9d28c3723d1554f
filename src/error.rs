//! Error types for Griot.

use thiserror::Error;

/// Library-level error type for Griot operations.
#[derive(Error, Debug)]
pub enum GriotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Context document error: {0}")]
    Context(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Failure of a language-model backend call.
///
/// Every variant is fatal for the call that produced it. Streaming calls
/// never return this type; they report it once through the terminal event.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} API error: {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} reported an error: {message}")]
    Backend {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl ProviderError {
    /// Classify a reqwest failure, separating timeouts from other transport errors.
    pub fn from_reqwest(provider: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Transport { provider, source }
        }
    }
}

/// Result type alias for Griot operations.
pub type Result<T> = std::result::Result<T, GriotError>;
