//! Error types for the content script
//!
//! Nothing here is fatal: every error is logged at the boundary that sees it
//! and the lifecycle falls back to a retryable state.

use thiserror::Error;

/// Failure reported by the host page or browser API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipError {
    /// The locator timed out before the selector matched
    #[error("Element {selector} not found within {timeout_ms}ms")]
    NotFound { selector: String, timeout_ms: u32 },

    /// No media element on the page when a toggle was requested
    #[error("Video element not found")]
    MediaUnavailable,

    /// Anything else that went wrong while binding the control
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// The host refused to enter or leave picture-in-picture
    #[error("Failed to toggle PiP: {0}")]
    ModeRequest(HostError),

    /// Settings could not be read from or written to the store
    #[error("Settings unavailable: {0}")]
    Settings(HostError),

    /// An inbound message could not be decoded
    #[error("Invalid message: {0}")]
    Message(String),

    /// Configuration override could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type using PipError
pub type Result<T> = std::result::Result<T, PipError>;
