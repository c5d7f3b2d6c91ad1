//! Error types for the worker invocation channel.

use std::time::Duration;

use pensionbot_core::error::PensionbotError;

/// Errors from a single worker invocation.
///
/// The `Display` text of `Failed` is the worker's own diagnostic output, so
/// callers that surface errors verbatim show what the worker printed.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to start worker: {0}")]
    Spawn(String),
    #[error("{detail}")]
    Failed {
        /// Exit code, or `None` when the process was terminated by a signal.
        status: Option<i32>,
        /// Collected stderr, or a synthesized message when stderr was empty.
        detail: String,
    },
    #[error("worker timed out after {0:?}")]
    Timeout(Duration),
    #[error("worker I/O error: {0}")]
    Io(String),
}

impl From<WorkerError> for PensionbotError {
    fn from(err: WorkerError) -> Self {
        PensionbotError::Worker(err.to_string())
    }
}
