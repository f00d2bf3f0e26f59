//! Liquidity provision math: pool share estimates and removal previews.

use ammsim_common::{format_amount, Token, TokenRegistry};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::engine::QuoteEngine;
use crate::error::{QuoteError, Result};

/// Share of a pool that adding `amount` on top of `liquidity` would represent.
///
/// Single-sided constant-product dilution, `a / (L + a) * 100`, rounded to
/// two decimal places. `None` when both inputs are zero.
pub fn pool_share_estimate(amount: Decimal, liquidity: Decimal) -> Option<Decimal> {
    let total = liquidity.checked_add(amount)?;
    if total.is_zero() {
        return None;
    }
    let share = amount.checked_div(total)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(share.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// A liquidity provider's position in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    /// Pool identifier.
    pub pool_id: String,
    /// First token symbol.
    pub token_a: String,
    /// Second token symbol.
    pub token_b: String,
    /// LP tokens held.
    pub lp_amount: Decimal,
    /// Amount of token A backing the position.
    pub token_a_pooled: Decimal,
    /// Amount of token B backing the position.
    pub token_b_pooled: Decimal,
}

impl LiquidityPosition {
    /// Create a new position.
    pub fn new(
        pool_id: impl Into<String>,
        token_a: &str,
        token_b: &str,
        lp_amount: Decimal,
        token_a_pooled: Decimal,
        token_b_pooled: Decimal,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            token_a: token_a.to_uppercase(),
            token_b: token_b.to_uppercase(),
            lp_amount,
            token_a_pooled,
            token_b_pooled,
        }
    }

    /// Built-in mock positions.
    pub fn mock_positions() -> Vec<Self> {
        vec![
            Self::new(
                "pool1",
                "SUI",
                "USDC",
                Decimal::new(1_505, 1),
                Decimal::from(100),
                Decimal::from(120),
            ),
            Self::new(
                "pool2",
                "ETH",
                "USDT",
                Decimal::new(252, 1),
                Decimal::new(5, 1),
                Decimal::from(1_500),
            ),
        ]
    }

    /// Pair label, e.g. `SUI/USDC`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.token_a, self.token_b)
    }
}

/// Amounts received when redeeming part of a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalPreview {
    /// Pool identifier.
    pub pool_id: String,
    /// Redeemed percentage.
    pub percent: Decimal,
    /// LP tokens burned.
    pub lp_burned: Decimal,
    /// Rendered amount of token A received.
    pub token_a_received: String,
    /// Rendered amount of token B received.
    pub token_b_received: String,
}

/// Preview redeeming `percent` of a position, rendered under the engine's
/// display precision.
pub fn preview_removal(
    position: &LiquidityPosition,
    percent: Decimal,
    engine: &QuoteEngine,
) -> Result<RemovalPreview> {
    if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
        return Err(QuoteError::InvalidPercent(percent));
    }

    let token_a = lookup(engine.registry(), &position.token_a)?;
    let token_b = lookup(engine.registry(), &position.token_b)?;
    let fraction = percent / Decimal::ONE_HUNDRED;

    Ok(RemovalPreview {
        pool_id: position.pool_id.clone(),
        percent,
        lp_burned: position.lp_amount * fraction,
        token_a_received: format_amount(
            position.token_a_pooled * fraction,
            engine.display_decimals(token_a),
        ),
        token_b_received: format_amount(
            position.token_b_pooled * fraction,
            engine.display_decimals(token_b),
        ),
    })
}

fn lookup<'a>(registry: &'a TokenRegistry, symbol: &str) -> Result<&'a Token> {
    registry
        .get(symbol)
        .ok_or_else(|| QuoteError::MissingToken(format!("unknown token {}", symbol)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuoteEngineConfig;
    use crate::rates::RateTable;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn test_pool_share_estimate() {
        assert_eq!(pool_share_estimate(dec!(10000), dec!(10000)), Some(dec!(50)));
        assert_eq!(pool_share_estimate(dec!(1), dec!(10000)), Some(dec!(0.01)));
        assert_eq!(pool_share_estimate(dec!(5), dec!(0)), Some(dec!(100)));
        assert_eq!(pool_share_estimate(dec!(0), dec!(0)), None);
    }

    #[test]
    fn test_preview_half_removal() {
        let engine = QuoteEngine::mock();
        let position = &LiquidityPosition::mock_positions()[0];

        let preview = preview_removal(position, dec!(50), &engine).unwrap();

        assert_eq!(preview.lp_burned, dec!(75.25));
        assert_eq!(preview.token_a_received, "50.00000000");
        assert_eq!(preview.token_b_received, "60.000000");
    }

    #[test]
    fn test_preview_bounds() {
        let engine = QuoteEngine::mock();
        let position = &LiquidityPosition::mock_positions()[1];

        let none = preview_removal(position, dec!(0), &engine).unwrap();
        assert_eq!(none.token_a_received, "0.00000000");

        let all = preview_removal(position, dec!(100), &engine).unwrap();
        assert_eq!(all.token_b_received, "1500.000000");

        assert!(matches!(
            preview_removal(position, dec!(100.5), &engine),
            Err(QuoteError::InvalidPercent(_))
        ));
        assert!(preview_removal(position, dec!(-1), &engine).is_err());
    }

    #[test]
    fn test_preview_unknown_token() {
        let position = LiquidityPosition::new("x", "FOO", "USDC", dec!(1), dec!(1), dec!(1));
        assert!(matches!(
            preview_removal(&position, dec!(10), &QuoteEngine::mock()),
            Err(QuoteError::MissingToken(_))
        ));
    }

    #[test]
    fn test_preview_follows_engine_precision() {
        let config = QuoteEngineConfig {
            max_display_decimals: 2,
            ..QuoteEngineConfig::default()
        };
        let engine = QuoteEngine::new(Arc::new(TokenRegistry::mock()), RateTable::mock(), config);
        let position = &LiquidityPosition::mock_positions()[0];

        let preview = preview_removal(position, dec!(50), &engine).unwrap();

        assert_eq!(preview.token_a_received, "50.00");
        assert_eq!(preview.token_b_received, "60.00");
    }
}
