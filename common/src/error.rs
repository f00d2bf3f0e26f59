//! Error types shared by the AMMSim crates.

use thiserror::Error;

/// Errors raised while parsing amounts or building a token registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Amount is not a finite, non-negative decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Two registry entries share a symbol.
    #[error("Duplicate token symbol: {0}")]
    DuplicateToken(String),

    /// Registry definition could not be read.
    #[error("Invalid token registry: {0}")]
    InvalidRegistry(String),
}

impl CommonError {
    /// Get error code for display and logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            CommonError::InvalidAmount(_) => "INVALID_AMOUNT",
            CommonError::DuplicateToken(_) => "DUPLICATE_TOKEN",
            CommonError::InvalidRegistry(_) => "INVALID_REGISTRY",
        }
    }
}

/// Result type alias for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;
