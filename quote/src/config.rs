//! Quote engine configuration.

use std::collections::HashMap;

use ammsim_common::{DEFAULT_DISPLAY_DECIMALS, MAX_DISPLAY_DECIMALS};
use rust_decimal::Decimal;

/// Configuration for the quote engine.
#[derive(Debug, Clone)]
pub struct QuoteEngineConfig {
    /// Upper bound on fractional digits of a counter amount.
    pub max_display_decimals: u32,
    /// Fractional digits for tokens without declared decimals.
    pub default_decimals: u32,
    /// Mock existing pool liquidity for tokens without an override.
    pub default_liquidity: Decimal,
    /// Per-symbol mock pool liquidity.
    pub liquidity_overrides: HashMap<String, Decimal>,
}

impl Default for QuoteEngineConfig {
    fn default() -> Self {
        Self {
            max_display_decimals: MAX_DISPLAY_DECIMALS,
            default_decimals: DEFAULT_DISPLAY_DECIMALS,
            default_liquidity: Decimal::from(10_000),
            liquidity_overrides: HashMap::new(),
        }
    }
}

impl QuoteEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(max) = std::env::var("AMMSIM_MAX_DISPLAY_DECIMALS") {
            if let Ok(max) = max.parse() {
                config.max_display_decimals = max;
            }
        }

        if let Ok(default) = std::env::var("AMMSIM_DEFAULT_DECIMALS") {
            if let Ok(default) = default.parse() {
                config.default_decimals = default;
            }
        }

        if let Ok(liquidity) = std::env::var("AMMSIM_DEFAULT_LIQUIDITY") {
            if let Ok(liquidity) = liquidity.parse() {
                config.default_liquidity = liquidity;
            }
        }

        config
    }

    /// Override the mock liquidity for one token.
    pub fn with_liquidity(mut self, symbol: &str, liquidity: Decimal) -> Self {
        self.liquidity_overrides
            .insert(symbol.to_uppercase(), liquidity);
        self
    }

    /// Mock pool liquidity for a token.
    pub fn liquidity_for(&self, symbol: &str) -> Decimal {
        self.liquidity_overrides
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default_liquidity)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_display_decimals > 28 {
            return Err("Max display decimals cannot exceed 28".to_string());
        }

        if self.default_decimals > self.max_display_decimals {
            return Err("Default decimals cannot exceed max display decimals".to_string());
        }

        if self.default_liquidity.is_sign_negative() {
            return Err("Default liquidity cannot be negative".to_string());
        }

        if let Some((symbol, _)) = self
            .liquidity_overrides
            .iter()
            .find(|(_, l)| l.is_sign_negative())
        {
            return Err(format!("Liquidity for {} cannot be negative", symbol));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = QuoteEngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.liquidity_for("SUI"), dec!(10000));
    }

    #[test]
    fn test_liquidity_override() {
        let config = QuoteEngineConfig::default().with_liquidity("eth", dec!(250));
        assert_eq!(config.liquidity_for("ETH"), dec!(250));
        assert_eq!(config.liquidity_for("BTC"), dec!(10000));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = QuoteEngineConfig::default();
        config.default_decimals = 12;
        assert!(config.validate().is_err());

        let config = QuoteEngineConfig::default().with_liquidity("SUI", dec!(-1));
        assert!(config.validate().is_err());
    }
}
