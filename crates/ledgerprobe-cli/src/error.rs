//! CLI errors and their exit-facing messages

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the binary
pub type CliResult<T> = Result<T, CliError>;

/// Anything that ends a `ledgerprobe` invocation unsuccessfully
#[derive(Debug, Error)]
pub enum CliError {
    /// A config file could not be loaded or failed validation
    #[error("Configuration error: {path}: {reason}")]
    Config {
        /// File that was being loaded
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Flags that parse individually but make no sense together
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The run summary could not be serialized
    #[error("Cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),

    /// At least one scenario ended with a failing verdict
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed {
        /// Scenarios that failed
        failed: usize,
        /// Scenarios that ran
        total: usize,
    },

    /// Filesystem or runtime failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Library failure outside any single scenario
    #[error("Probe error: {0}")]
    Probe(#[from] ledgerprobe::ProbeError),
}

impl CliError {
    /// Config failure for the file at `path`
    #[must_use]
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Conflicting or unusable flags
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether the run itself worked and only scenario verdicts failed
    #[must_use]
    pub const fn is_verdict_failure(&self) -> bool {
        matches!(self, Self::ScenariosFailed { .. })
    }
}
