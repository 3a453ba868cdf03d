//! Error type shared by the stage collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Raw failure of a stage collaborator, before the generator wraps it.
#[derive(Debug, Error)]
pub enum StageError {
    /// Required setting missing (API key, webhook, binary path).
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Nothing suitable was found (e.g. no matching image).
    #[error("Not found: {0}")]
    NotFound(String),

    /// External binary not found.
    #[error("Executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// External process exited unsuccessfully.
    #[error("Process failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Expected output file is missing after the stage ran.
    #[error("Output not created: {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job was cancelled while the stage ran.
    #[error("operation cancelled")]
    Cancelled,

    /// Anything else (used by test doubles and panics).
    #[error("{0}")]
    Other(String),
}

impl StageError {
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StageError::Api {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 429 - rate limited");
        assert_eq!(StageError::Cancelled.to_string(), "operation cancelled");
        assert_eq!(
            StageError::process_failed("exit code 1", None).to_string(),
            "Process failed: exit code 1"
        );
    }
}
