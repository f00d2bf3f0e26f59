//! Controller error types.

use ammsim_quote::QuoteError;
use thiserror::Error;

use crate::state::Readiness;

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Form cannot be submitted yet.
    #[error("Not ready to submit: {0}")]
    NotReady(Readiness),

    /// The form is locked by a pending submission.
    #[error("Submission in progress")]
    Submitting,

    /// Quote-level failure.
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

impl SyncError {
    /// Get error code for display and logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::NotReady(_) => "NOT_READY",
            SyncError::Submitting => "SUBMITTING",
            SyncError::Quote(e) => e.error_code(),
        }
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, SyncError>;
