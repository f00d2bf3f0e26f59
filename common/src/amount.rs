//! Amount parsing and display precision.
//!
//! Amounts travel between the form fields and the engine as decimal strings.
//! Parsing folds "nothing entered yet" (empty or zero) into a single
//! [`AmountInput::Empty`] case so callers never have to special-case it.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::{CommonError, Result};

/// Upper bound on displayed fractional digits, whatever the token declares.
pub const MAX_DISPLAY_DECIMALS: u32 = 8;

/// Fractional digits used for tokens that declare no precision.
pub const DEFAULT_DISPLAY_DECIMALS: u32 = 4;

/// A parsed amount field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountInput {
    /// Empty or zero: no input yet.
    Empty,
    /// A strictly positive amount.
    Positive(Decimal),
}

impl AmountInput {
    /// Parse a raw field value.
    ///
    /// Accepts plain (`"12.5"`, `".5"`) and scientific (`"1.5e3"`) notation.
    /// Negative or non-numeric input is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(AmountInput::Empty);
        }

        let value = if trimmed.contains(['e', 'E']) {
            Decimal::from_scientific(trimmed)
        } else {
            Decimal::from_str(trimmed)
        }
        .map_err(|_| CommonError::InvalidAmount(format!("'{}' is not a number", trimmed)))?;

        if value.is_zero() {
            return Ok(AmountInput::Empty);
        }
        if value.is_sign_negative() {
            return Err(CommonError::InvalidAmount(format!(
                "'{}' is negative",
                trimmed
            )));
        }

        Ok(AmountInput::Positive(value))
    }

    /// Get the positive value, if any.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            AmountInput::Empty => None,
            AmountInput::Positive(v) => Some(*v),
        }
    }

    /// Check if nothing was entered.
    pub fn is_empty(&self) -> bool {
        matches!(self, AmountInput::Empty)
    }
}

/// Number of fractional digits to display for a token declaring `decimals`.
pub fn display_precision(decimals: Option<u32>, max: u32, default: u32) -> u32 {
    decimals.unwrap_or(default).min(max)
}

/// Round half away from zero and render with exactly `dp` fractional digits.
pub fn format_amount(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Number of fractional digits in a rendered amount.
pub fn fractional_digits(rendered: &str) -> usize {
    rendered
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_empty_and_zero() {
        assert_eq!(AmountInput::parse("").unwrap(), AmountInput::Empty);
        assert_eq!(AmountInput::parse("   ").unwrap(), AmountInput::Empty);
        assert_eq!(AmountInput::parse("0").unwrap(), AmountInput::Empty);
        assert_eq!(AmountInput::parse("0.000").unwrap(), AmountInput::Empty);
        assert_eq!(AmountInput::parse("-0").unwrap(), AmountInput::Empty);
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(
            AmountInput::parse("12.5").unwrap(),
            AmountInput::Positive(dec!(12.5))
        );
        assert_eq!(
            AmountInput::parse(" 100 ").unwrap().value(),
            Some(dec!(100))
        );
        assert_eq!(
            AmountInput::parse("1.5e3").unwrap().value(),
            Some(dec!(1500))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            AmountInput::parse("abc"),
            Err(CommonError::InvalidAmount(_))
        ));
        assert!(matches!(
            AmountInput::parse("-5"),
            Err(CommonError::InvalidAmount(_))
        ));
        assert!(AmountInput::parse("NaN").is_err());
        assert!(AmountInput::parse("inf").is_err());
        assert!(AmountInput::parse("1.2.3").is_err());
    }

    #[test]
    fn test_display_precision() {
        assert_eq!(display_precision(Some(18), MAX_DISPLAY_DECIMALS, DEFAULT_DISPLAY_DECIMALS), 8);
        assert_eq!(display_precision(Some(6), MAX_DISPLAY_DECIMALS, DEFAULT_DISPLAY_DECIMALS), 6);
        assert_eq!(display_precision(Some(0), MAX_DISPLAY_DECIMALS, DEFAULT_DISPLAY_DECIMALS), 0);
        assert_eq!(display_precision(None, MAX_DISPLAY_DECIMALS, DEFAULT_DISPLAY_DECIMALS), 4);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(120), 6), "120.000000");
        assert_eq!(format_amount(dec!(1.23456789), 4), "1.2346");
        assert_eq!(format_amount(dec!(0.00005), 4), "0.0001");
        assert_eq!(format_amount(dec!(2.5), 0), "3");
        assert_eq!(fractional_digits("1.2346"), 4);
        assert_eq!(fractional_digits("3"), 0);
    }
}
