//! Token pairs and the two sides of a linked amount form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two linked amount fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The "you send" field.
    From,
    /// The "you receive" field.
    To,
}

impl Side {
    /// Get the opposite side.
    pub fn other(self) -> Self {
        match self {
            Side::From => Side::To,
            Side::To => Side::From,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::From => write!(f, "from"),
            Side::To => write!(f, "to"),
        }
    }
}

/// An ordered pair of token symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Token being converted.
    pub base: String,
    /// Token the rate is expressed in.
    pub quote: String,
}

impl TokenPair {
    /// Create a new pair; symbols are normalized to upper case.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    /// Check whether the pair is already in canonical (sorted) orientation.
    pub fn is_canonical(&self) -> bool {
        self.base <= self.quote
    }

    /// Get the pair in canonical orientation.
    pub fn canonical(&self) -> Self {
        if self.is_canonical() {
            self.clone()
        } else {
            self.inverse()
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
