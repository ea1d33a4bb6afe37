//! Error types for Kino Receiver

use thiserror::Error;

/// Result type alias for receiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Receiver error types
#[derive(Error, Debug)]
pub enum Error {
    // Locator errors
    #[error("Malformed legacy locator: {0}")]
    MalformedLocator(#[from] serde_json::Error),

    #[error("Legacy locator carries neither an hls nor a dash variant")]
    EmptyLocator,

    #[error("Load request carries no content locator")]
    MissingLocator,

    // Resolution service errors
    #[error("Content resolution failed with status {status}")]
    ResolutionFailed { status: String },

    #[error("Content resolution timed out after {timeout_ms}ms")]
    ResolutionTimeout { timeout_ms: u64 },

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // Control channel errors
    #[error("Invalid control message: {0}")]
    InvalidMessage(String),

    #[error("Analytics adapter failed: {0}")]
    Analytics(#[source] anyhow::Error),

    // Pipeline errors
    #[error("Invalid load stage transition: {from} -> {to}")]
    InvalidStageTransition { from: String, to: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a control message error
    pub fn message(msg: impl Into<String>) -> Self {
        Error::InvalidMessage(msg.into())
    }

    /// Returns true if the load can continue with the original request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ResolutionFailed { .. }
                | Error::ResolutionTimeout { .. }
                | Error::Network(_)
        )
    }

    /// Returns the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MalformedLocator(_) => "MALFORMED_LOCATOR",
            Error::EmptyLocator => "EMPTY_LOCATOR",
            Error::MissingLocator => "MISSING_LOCATOR",
            Error::ResolutionFailed { .. } => "RESOLUTION_FAILED",
            Error::ResolutionTimeout { .. } => "RESOLUTION_TIMEOUT",
            Error::Network(_) => "NETWORK",
            Error::InvalidMessage(_) => "INVALID_MESSAGE",
            Error::Analytics(_) => "ANALYTICS",
            Error::InvalidStageTransition { .. } => "INVALID_STAGE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
