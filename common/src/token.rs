//! Tokens and the immutable token registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::amount::{display_precision, DEFAULT_DISPLAY_DECIMALS, MAX_DISPLAY_DECIMALS};
use crate::error::{CommonError, Result};

/// A tradable token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Stable identifier.
    pub id: String,
    /// Ticker symbol (upper case).
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Mock on-chain address.
    #[serde(default)]
    pub address: String,
    /// Declared decimal precision.
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Display color.
    #[serde(default)]
    pub color: Option<String>,
}

impl Token {
    /// Create a new token.
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: Option<u32>,
    ) -> Self {
        let symbol = symbol.into().to_uppercase();
        Self {
            id: id.into(),
            address: format!("0x{}_ADDRESS", symbol),
            symbol,
            name: name.into(),
            decimals,
            color: None,
        }
    }

    /// Set the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Fractional digits used when displaying amounts of this token.
    pub fn display_decimals(&self) -> u32 {
        display_precision(self.decimals, MAX_DISPLAY_DECIMALS, DEFAULT_DISPLAY_DECIMALS)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Immutable set of known tokens, looked up by symbol.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
    by_symbol: HashMap<String, usize>,
}

impl TokenRegistry {
    /// Default "from" token of the mock registry.
    pub const DEFAULT_FROM_SYMBOL: &'static str = "SUI";
    /// Default "to" token of the mock registry.
    pub const DEFAULT_TO_SYMBOL: &'static str = "USDC";

    /// Build a registry, rejecting duplicate symbols.
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        let mut by_symbol = HashMap::with_capacity(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            let key = token.symbol.to_uppercase();
            if by_symbol.insert(key.clone(), idx).is_some() {
                return Err(CommonError::DuplicateToken(key));
            }
        }
        Ok(Self { tokens, by_symbol })
    }

    /// Built-in registry of mock tokens.
    pub fn mock() -> Self {
        let tokens = vec![
            Token::new("sui", "SUI", "Sui", Some(9)).with_color("hsl(var(--primary))"),
            Token::new("btc", "BTC", "Bitcoin", Some(8)).with_color("hsl(39, 100%, 50%)"),
            Token::new("eth", "ETH", "Ethereum", Some(18)).with_color("hsl(220, 50%, 60%)"),
            Token::new("usdc", "USDC", "USD Coin", Some(6)).with_color("hsl(206, 80%, 52%)"),
            Token::new("usdt", "USDT", "Tether", Some(6)).with_color("hsl(145, 58%, 45%)"),
            Token::new("dai", "DAI", "Dai", Some(18)).with_color("hsl(30, 90%, 55%)"),
        ];
        // Symbols above are distinct.
        let by_symbol = tokens
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.symbol.clone(), idx))
            .collect();
        Self { tokens, by_symbol }
    }

    /// Load a registry from a JSON array of tokens.
    pub fn from_json(json: &str) -> Result<Self> {
        let tokens: Vec<Token> = serde_json::from_str(json)
            .map_err(|e| CommonError::InvalidRegistry(e.to_string()))?;
        let tokens = tokens
            .into_iter()
            .map(|mut t| {
                t.symbol = t.symbol.to_uppercase();
                t
            })
            .collect();
        Self::new(tokens)
    }

    /// Look up a token by symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<&Token> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(|&idx| &self.tokens[idx])
    }

    /// Check if a symbol is registered.
    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// All tokens in registration order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Default pair of the form, when both defaults are registered.
    pub fn default_pair(&self) -> (Option<&Token>, Option<&Token>) {
        (
            self.get(Self::DEFAULT_FROM_SYMBOL),
            self.get(Self::DEFAULT_TO_SYMBOL),
        )
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_registry_lookup() {
        let registry = TokenRegistry::mock();

        assert_eq!(registry.len(), 6);
        assert_eq!(registry.get("usdc").unwrap().decimals, Some(6));
        assert_eq!(registry.get("ETH").unwrap().display_decimals(), 8);
        assert!(registry.get("DOGE").is_none());

        let (from, to) = registry.default_pair();
        assert_eq!(from.unwrap().symbol, "SUI");
        assert_eq!(to.unwrap().symbol, "USDC");
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let result = TokenRegistry::new(vec![
            Token::new("a", "AAA", "A", Some(2)),
            Token::new("b", "aaa", "B", Some(2)),
        ]);

        assert_eq!(result.unwrap_err(), CommonError::DuplicateToken("AAA".to_string()));
    }

    #[test]
    fn test_registry_from_json() {
        let json = r#"[
            {"id": "sui", "symbol": "sui", "name": "Sui", "decimals": 9},
            {"id": "foo", "symbol": "FOO", "name": "Foo"}
        ]"#;
        let registry = TokenRegistry::from_json(json).unwrap();

        assert_eq!(registry.get("SUI").unwrap().decimals, Some(9));
        assert_eq!(registry.get("foo").unwrap().display_decimals(), 4);
        assert!(matches!(
            TokenRegistry::from_json("{not json"),
            Err(CommonError::InvalidRegistry(_))
        ));
    }
}
