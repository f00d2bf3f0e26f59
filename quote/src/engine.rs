//! Quote engine implementation.

use std::sync::Arc;

use ammsim_common::{display_precision, format_amount, AmountInput, Side, Token, TokenPair, TokenRegistry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::QuoteEngineConfig;
use crate::error::{QuoteError, Result};
use crate::liquidity::pool_share_estimate;
use crate::rates::RateTable;

/// Which form a quote is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteContext {
    /// Token swap form.
    #[default]
    Swap,
    /// Add-liquidity form; quotes carry a pool share estimate.
    AddLiquidity,
}

/// Request to quote the counter amount of a linked pair of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Symbol selected on the "from" side.
    pub from: Option<String>,
    /// Symbol selected on the "to" side.
    pub to: Option<String>,
    /// Raw amount of the driving side.
    pub amount: String,
    /// Side the amount was entered on.
    pub driving_side: Side,
    /// Form the quote is for.
    pub context: QuoteContext,
}

impl QuoteRequest {
    /// Create a new swap quote request.
    pub fn new(
        from: Option<&str>,
        to: Option<&str>,
        amount: impl Into<String>,
        driving_side: Side,
    ) -> Self {
        Self {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            amount: amount.into(),
            driving_side,
            context: QuoteContext::Swap,
        }
    }

    /// Quote for a specific form.
    pub fn with_context(mut self, context: QuoteContext) -> Self {
        self.context = context;
        self
    }
}

/// Result of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Rendered amount of the non-driving side; empty when there is no input.
    pub counter_amount: String,
    /// Percentage of the pool the driving amount would represent.
    pub pool_share_estimate: Option<Decimal>,
    /// Set when the result was superseded by a newer request.
    pub is_stale: bool,
    /// Whether the rate came from the fallback generator.
    pub used_fallback_rate: bool,
    /// Effective driving-to-counter rate.
    pub rate: Option<Decimal>,
}

impl QuoteResult {
    /// Result for "no input yet".
    pub fn empty() -> Self {
        Self {
            counter_amount: String::new(),
            pool_share_estimate: None,
            is_stale: false,
            used_fallback_rate: false,
            rate: None,
        }
    }

    /// Mark the result as superseded.
    pub fn into_stale(mut self) -> Self {
        self.is_stale = true;
        self
    }

    /// Check if the result carries no counter amount.
    pub fn is_empty(&self) -> bool {
        self.counter_amount.is_empty()
    }
}

/// Converts an amount on one side of a token pair into the other side.
pub struct QuoteEngine {
    registry: Arc<TokenRegistry>,
    rates: RateTable,
    config: QuoteEngineConfig,
}

impl QuoteEngine {
    /// Create a new quote engine.
    pub fn new(registry: Arc<TokenRegistry>, rates: RateTable, config: QuoteEngineConfig) -> Self {
        Self {
            registry,
            rates,
            config,
        }
    }

    /// Engine over the mock registry and mock rates.
    pub fn mock() -> Self {
        Self::new(
            Arc::new(TokenRegistry::mock()),
            RateTable::mock(),
            QuoteEngineConfig::default(),
        )
    }

    /// Compute the counter amount for a request.
    #[instrument(skip(self), fields(
        from = ?request.from,
        to = ?request.to,
        side = %request.driving_side
    ))]
    pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResult> {
        let from = self.resolve_token(request.from.as_deref(), Side::From)?;
        let to = self.resolve_token(request.to.as_deref(), Side::To)?;

        let amount = match AmountInput::parse(&request.amount)? {
            AmountInput::Empty => return Ok(QuoteResult::empty()),
            AmountInput::Positive(value) => value,
        };

        let resolved = self.rates.resolve(&TokenPair::new(&from.symbol, &to.symbol));
        let (driving, counter, rate) = match request.driving_side {
            Side::From => (from, to, resolved.rate),
            Side::To => {
                let inverted = Decimal::ONE
                    .checked_div(resolved.rate)
                    .ok_or(QuoteError::InvalidRate {
                        pair: resolved.pair.clone(),
                        rate: resolved.rate,
                    })?;
                (to, from, inverted)
            }
        };

        let counter_value = amount.checked_mul(rate).ok_or_else(|| {
            QuoteError::InvalidAmount(format!("{} is out of range", request.amount.trim()))
        })?;
        let counter_amount = format_amount(counter_value, self.display_decimals(counter));

        let pool_share = match request.context {
            QuoteContext::AddLiquidity => {
                pool_share_estimate(amount, self.config.liquidity_for(&driving.symbol))
            }
            QuoteContext::Swap => None,
        };

        debug!(
            counter = %counter.symbol,
            counter_amount = %counter_amount,
            fallback = resolved.used_fallback,
            "Quote computed"
        );

        Ok(QuoteResult {
            counter_amount,
            pool_share_estimate: pool_share,
            is_stale: false,
            used_fallback_rate: resolved.used_fallback,
            rate: Some(rate),
        })
    }

    /// Fractional digits displayed for a token under this engine's policy.
    pub fn display_decimals(&self, token: &Token) -> u32 {
        display_precision(
            token.decimals,
            self.config.max_display_decimals,
            self.config.default_decimals,
        )
    }

    /// Get the token registry.
    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    /// Get the rate table.
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &QuoteEngineConfig {
        &self.config
    }

    fn resolve_token(&self, symbol: Option<&str>, side: Side) -> Result<&Token> {
        let symbol = symbol
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| QuoteError::MissingToken(format!("no {} token selected", side)))?;

        self.registry
            .get(symbol.trim())
            .ok_or_else(|| QuoteError::MissingToken(format!("unknown token {}", symbol)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ammsim_common::{fractional_digits, MAX_DISPLAY_DECIMALS};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn quote(engine: &QuoteEngine, from: &str, to: &str, amount: &str, side: Side) -> QuoteResult {
        engine
            .quote(&QuoteRequest::new(Some(from), Some(to), amount, side))
            .unwrap()
    }

    #[test]
    fn test_quote_from_side() {
        let engine = QuoteEngine::mock();
        let result = quote(&engine, "SUI", "USDC", "100", Side::From);

        assert_eq!(result.counter_amount, "120.000000");
        assert_eq!(result.rate, Some(dec!(1.2)));
        assert!(!result.used_fallback_rate);
        assert!(!result.is_stale);
        assert!(result.pool_share_estimate.is_none());
    }

    #[test]
    fn test_quote_to_side_inverts_rate() {
        let engine = QuoteEngine::mock();
        let result = quote(&engine, "SUI", "USDC", "120", Side::To);

        // Counter token is SUI: 9 decimals, capped at 8.
        assert_eq!(result.counter_amount, "100.00000000");
    }

    #[test]
    fn test_round_trip_on_mock_rate() {
        let engine = QuoteEngine::mock();
        let forward = quote(&engine, "SUI", "USDC", "100", Side::From);
        let back = quote(&engine, "SUI", "USDC", &forward.counter_amount, Side::To);

        assert_eq!(Decimal::from_str(&back.counter_amount).unwrap(), dec!(100));
    }

    #[test]
    fn test_empty_and_zero_amounts() {
        let engine = QuoteEngine::mock();

        for amount in ["", "0", "  ", "0.00"] {
            let result = quote(&engine, "SUI", "USDC", amount, Side::From);
            assert_eq!(result, QuoteResult::empty());
        }
    }

    #[test]
    fn test_invalid_amount() {
        let engine = QuoteEngine::mock();

        for amount in ["abc", "-1", "1..2"] {
            let result = engine.quote(&QuoteRequest::new(Some("SUI"), Some("USDC"), amount, Side::From));
            assert!(matches!(result, Err(QuoteError::InvalidAmount(_))), "{}", amount);
        }
    }

    #[test]
    fn test_overflow_is_invalid_amount() {
        let engine = QuoteEngine::mock();
        let result = engine.quote(&QuoteRequest::new(
            Some("USDC"),
            Some("BTC"),
            "70000000000000000000000000000",
            Side::To,
        ));

        assert!(matches!(result, Err(QuoteError::InvalidAmount(_))));
    }

    #[test]
    fn test_missing_token() {
        let engine = QuoteEngine::mock();

        let none = engine.quote(&QuoteRequest::new(None, Some("USDC"), "1", Side::From));
        assert!(matches!(none, Err(QuoteError::MissingToken(_))));

        let unknown = engine.quote(&QuoteRequest::new(Some("SUI"), Some("DOGE"), "1", Side::From));
        assert!(matches!(unknown, Err(QuoteError::MissingToken(_))));
    }

    #[test]
    fn test_fallback_rate_is_flagged() {
        let engine = QuoteEngine::mock();
        let first = quote(&engine, "BTC", "DAI", "2", Side::From);
        let second = quote(&engine, "BTC", "DAI", "2", Side::From);

        assert!(first.used_fallback_rate);
        assert_eq!(first, second);
    }

    #[test]
    fn test_pool_share_for_add_liquidity() {
        let engine = QuoteEngine::mock();
        let request = QuoteRequest::new(Some("SUI"), Some("USDC"), "10000", Side::From)
            .with_context(QuoteContext::AddLiquidity);

        let result = engine.quote(&request).unwrap();

        assert_eq!(result.counter_amount, "12000.000000");
        assert_eq!(result.pool_share_estimate, Some(dec!(50.00)));
    }

    #[test]
    fn test_pool_share_uses_driving_token_liquidity() {
        let engine = QuoteEngine::new(
            Arc::new(TokenRegistry::mock()),
            RateTable::mock(),
            QuoteEngineConfig::default().with_liquidity("USDC", dec!(300)),
        );
        let request = QuoteRequest::new(Some("SUI"), Some("USDC"), "100", Side::To)
            .with_context(QuoteContext::AddLiquidity);

        let result = engine.quote(&request).unwrap();

        assert_eq!(result.pool_share_estimate, Some(dec!(25)));
    }

    #[test]
    fn test_undeclared_decimals_default_to_four() {
        let registry = TokenRegistry::new(vec![
            Token::new("a", "AAA", "A", None),
            Token::new("b", "BBB", "B", Some(0)),
        ])
        .unwrap();
        let rates = RateTable::new().with_rate("AAA", "BBB", dec!(3)).unwrap();
        let engine = QuoteEngine::new(Arc::new(registry), rates, QuoteEngineConfig::default());

        assert_eq!(quote(&engine, "AAA", "BBB", "1.5", Side::From).counter_amount, "5");
        assert_eq!(quote(&engine, "AAA", "BBB", "1", Side::To).counter_amount, "0.3333");
    }

    proptest! {
        #[test]
        fn prop_counter_precision_is_bounded(
            from_idx in 0usize..6,
            to_idx in 0usize..6,
            units in 1u64..1_000_000_000_000,
            side_is_from in any::<bool>(),
        ) {
            let engine = QuoteEngine::mock();
            let tokens = engine.registry().tokens();
            let from = &tokens[from_idx];
            let to = &tokens[to_idx];
            let side = if side_is_from { Side::From } else { Side::To };
            let amount = Decimal::new(units as i64, 4).to_string();

            let result = quote(&engine, &from.symbol, &to.symbol, &amount, side);
            let counter = if side_is_from { to } else { from };
            let bound = counter.decimals.unwrap_or(4).min(MAX_DISPLAY_DECIMALS) as usize;

            prop_assert!(fractional_digits(&result.counter_amount) <= bound);
        }

        #[test]
        fn prop_round_trip_within_one_unit(
            units in 1u64..10_000_000_000,
            rate_units in 10_000i64..50_000_000,
        ) {
            let registry = TokenRegistry::new(vec![
                Token::new("a", "AAA", "A", Some(4)),
                Token::new("b", "BBB", "B", Some(4)),
            ])
            .unwrap();
            let rates = RateTable::new()
                .with_rate("AAA", "BBB", Decimal::new(rate_units, 4))
                .unwrap();
            let engine = QuoteEngine::new(Arc::new(registry), rates, QuoteEngineConfig::default());
            let x = Decimal::new(units as i64, 4);

            let forward = quote(&engine, "AAA", "BBB", &x.to_string(), Side::From);
            let back = quote(&engine, "AAA", "BBB", &forward.counter_amount, Side::To);
            let back = Decimal::from_str(&back.counter_amount).unwrap();

            prop_assert!(!forward.used_fallback_rate);
            prop_assert!((back - x).abs() <= dec!(0.0001));
        }

        #[test]
        fn prop_round_trip_on_reciprocal_orientation(units in 1u64..10_000_000_000_000) {
            let engine = QuoteEngine::mock();
            let x = Decimal::new(units as i64, 6);

            let forward = quote(&engine, "USDC", "SUI", &x.to_string(), Side::From);
            let back = quote(&engine, "USDC", "SUI", &forward.counter_amount, Side::To);
            let back = Decimal::from_str(&back.counter_amount).unwrap();

            prop_assert!(!forward.used_fallback_rate);
            prop_assert_eq!(fractional_digits(&forward.counter_amount), 8);
            prop_assert!((back - x).abs() <= dec!(0.000001));
        }
    }
}
