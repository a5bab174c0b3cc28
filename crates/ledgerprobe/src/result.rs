//! Result and error types for LedgerProbe.

use thiserror::Error;

/// Result type for LedgerProbe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a session
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A locator never satisfied its wait condition.
    ///
    /// Covers both "not rendered yet" and "never going to render": the
    /// remote UI offers no signal that separates the two.
    #[error("Element {locator} not ready after {timeout_ms}ms")]
    ElementNotReady {
        /// Locator that was waited on
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Protocol misuse, e.g. reading dialog text with no dialog open
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// An action was attempted while a native dialog was still open
    #[error("Unresolved dialog blocks further actions: {text:?}")]
    UnresolvedDialog {
        /// Text of the blocking dialog
        text: String,
    },

    /// Cross-view verification used all attempts without a match
    #[error("No row matched {query} after {attempts} attempt(s)")]
    VerificationExhausted {
        /// Rendered query
        query: String,
        /// Attempts performed
        attempts: u32,
    },

    /// Raw driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an invalid-state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether a caller may translate this error into a verdict instead of aborting.
    ///
    /// A missing element can mean "feature correctly absent" and an exhausted
    /// verification is a negative answer, not a crash.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ElementNotReady { .. } | Self::VerificationExhausted { .. }
        )
    }

    /// Whether this error stems from an open dialog
    #[must_use]
    pub const fn is_dialog_block(&self) -> bool {
        matches!(self, Self::UnresolvedDialog { .. })
    }
}
