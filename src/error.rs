//! Error types for hitscope
//!
//! Structured error handling using thiserror. Dashboard sections render
//! errors through `user_message` and keep their last-good data on screen.

use thiserror::Error;

/// Main error type for hitscope operations
#[derive(Error, Debug)]
pub enum StatsError {
    /// Transport failure or non-2xx status from the stats service
    #[error("Stats service request failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    /// Response body missing or mis-shaping the expected bin/count arrays
    #[error("Malformed stats response: {0}")]
    MalformedResponse(String),

    /// Invalid base URL or other configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for hitscope operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// UI-friendly error message formatting
impl StatsError {
    /// Get a user-friendly error message suitable for displaying in UI
    pub fn user_message(&self) -> String {
        match self {
            StatsError::NetworkFailure(e) => format!("Stats service unreachable: {}", e),
            StatsError::MalformedResponse(msg) => format!("Unexpected response: {}", msg),
            StatsError::Config(msg) => format!("Config error: {}", msg),
        }
    }

    /// Get a short title for the error (for section headers)
    pub fn title(&self) -> &'static str {
        match self {
            StatsError::NetworkFailure(_) => "Network Error",
            StatsError::MalformedResponse(_) => "Bad Response",
            StatsError::Config(_) => "Configuration Error",
        }
    }
}
