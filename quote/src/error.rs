//! Quote engine error types.

use ammsim_common::{CommonError, TokenPair};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while quoting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Amount is non-numeric, negative or out of range.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A token is not selected or not registered.
    #[error("Missing token: {0}")]
    MissingToken(String),

    /// No rate is registered for the pair. Recovered by the engine.
    #[error("Rate not available for {0}")]
    RateUnavailable(TokenPair),

    /// Rate table entry is not strictly positive.
    #[error("Invalid rate {rate} for {pair}")]
    InvalidRate { pair: TokenPair, rate: Decimal },

    /// Rate table definition could not be read.
    #[error("Invalid rate table: {0}")]
    InvalidRateTable(String),

    /// Redeem percentage outside 0..=100.
    #[error("Invalid percentage: {0}")]
    InvalidPercent(Decimal),
}

impl QuoteError {
    /// Get error code for display and logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            QuoteError::InvalidAmount(_) => "INVALID_AMOUNT",
            QuoteError::MissingToken(_) => "MISSING_TOKEN",
            QuoteError::RateUnavailable(_) => "RATE_UNAVAILABLE",
            QuoteError::InvalidRate { .. } => "INVALID_RATE",
            QuoteError::InvalidRateTable(_) => "INVALID_RATE_TABLE",
            QuoteError::InvalidPercent(_) => "INVALID_PERCENT",
        }
    }
}

impl From<CommonError> for QuoteError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidAmount(msg) => QuoteError::InvalidAmount(msg),
            other => QuoteError::MissingToken(other.to_string()),
        }
    }
}

/// Result type for quote operations.
pub type Result<T> = std::result::Result<T, QuoteError>;
