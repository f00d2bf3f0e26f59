//! Controller state definitions.

use ammsim_common::{AmountInput, Side};
use ammsim_quote::{QuoteContext, QuoteError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Phase of the linked-field state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncPhase {
    /// Nothing requested yet, or the form was reset.
    Idle,
    /// A quote driven from the given side is in flight.
    Computing(Side),
    /// The latest request has been applied.
    Settled,
    /// A submission is being confirmed; the form is locked.
    Submitting,
}

impl SyncPhase {
    /// Check if a quote is in flight.
    pub fn is_calculating(&self) -> bool {
        matches!(self, SyncPhase::Computing(_))
    }
}

/// Why the submit affordance is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    /// One or both tokens are not selected.
    SelectTokens,
    /// One or both amounts are empty.
    EnterAmounts,
    /// An amount is malformed or the last quote failed.
    InvalidAmounts,
    /// A quote is in flight.
    Calculating,
    /// A submission is being confirmed.
    Submitting,
    /// Form can be submitted.
    Ready,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Readiness::SelectTokens => "Select Tokens",
            Readiness::EnterAmounts => "Enter Amounts",
            Readiness::InvalidAmounts => "Enter Valid Amounts",
            Readiness::Calculating => "Calculating...",
            Readiness::Submitting => "Submitting...",
            Readiness::Ready => "Ready",
        };
        write!(f, "{}", label)
    }
}

/// State published to subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteSnapshot {
    /// Highest request sequence number issued so far.
    pub seq: u64,
    /// State machine phase.
    pub phase: SyncPhase,
    /// Form being driven.
    pub context: QuoteContext,
    /// Symbol selected on the "from" side.
    pub from_token: Option<String>,
    /// Symbol selected on the "to" side.
    pub to_token: Option<String>,
    /// Raw "from" field.
    pub amount_from: String,
    /// Raw "to" field.
    pub amount_to: String,
    /// Side the user last edited.
    pub driving_side: Option<Side>,
    /// Share of pool for liquidity adds.
    pub pool_share_estimate: Option<Decimal>,
    /// Whether the applied quote used a fallback rate.
    pub used_fallback_rate: bool,
    /// Error of the last applied quote.
    #[serde(skip)]
    pub last_error: Option<QuoteError>,
}

impl QuoteSnapshot {
    pub(crate) fn new(
        context: QuoteContext,
        from_token: Option<String>,
        to_token: Option<String>,
    ) -> Self {
        Self {
            seq: 0,
            phase: SyncPhase::Idle,
            context,
            from_token,
            to_token,
            amount_from: String::new(),
            amount_to: String::new(),
            driving_side: None,
            pool_share_estimate: None,
            used_fallback_rate: false,
            last_error: None,
        }
    }

    /// Check if a quote is in flight.
    pub fn is_calculating(&self) -> bool {
        self.phase.is_calculating()
    }

    /// Get the raw amount of a side.
    pub fn amount(&self, side: Side) -> &str {
        match side {
            Side::From => &self.amount_from,
            Side::To => &self.amount_to,
        }
    }

    pub(crate) fn amount_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::From => &mut self.amount_from,
            Side::To => &mut self.amount_to,
        }
    }

    /// Get the token selected on a side.
    pub fn token(&self, side: Side) -> Option<&str> {
        match side {
            Side::From => self.from_token.as_deref(),
            Side::To => self.to_token.as_deref(),
        }
    }

    pub(crate) fn token_mut(&mut self, side: Side) -> &mut Option<String> {
        match side {
            Side::From => &mut self.from_token,
            Side::To => &mut self.to_token,
        }
    }

    /// Evaluate whether the form can be submitted.
    pub fn readiness(&self) -> Readiness {
        if self.phase == SyncPhase::Submitting {
            return Readiness::Submitting;
        }
        if self.from_token.is_none() || self.to_token.is_none() {
            return Readiness::SelectTokens;
        }
        if self.is_calculating() {
            return Readiness::Calculating;
        }
        if self.last_error.is_some() {
            return Readiness::InvalidAmounts;
        }
        if self.amount_from.trim().is_empty() || self.amount_to.trim().is_empty() {
            return Readiness::EnterAmounts;
        }

        let positive = |raw: &str| matches!(AmountInput::parse(raw), Ok(AmountInput::Positive(_)));
        if !positive(&self.amount_from) || !positive(&self.amount_to) {
            return Readiness::InvalidAmounts;
        }

        Readiness::Ready
    }

    /// Check if the submit affordance is enabled.
    pub fn can_submit(&self) -> bool {
        self.readiness() == Readiness::Ready
    }
}

/// Controller counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Requests issued.
    pub issued: u64,
    /// Results applied.
    pub applied: u64,
    /// Results dropped because a newer request existed.
    pub discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(from: &str, to: &str) -> QuoteSnapshot {
        let mut snap = QuoteSnapshot::new(
            QuoteContext::Swap,
            Some("SUI".to_string()),
            Some("USDC".to_string()),
        );
        snap.amount_from = from.to_string();
        snap.amount_to = to.to_string();
        snap
    }

    #[test]
    fn test_readiness() {
        assert_eq!(snapshot("", "").readiness(), Readiness::EnterAmounts);
        assert_eq!(snapshot("1", "1.2").readiness(), Readiness::Ready);
        assert_eq!(snapshot("0", "1.2").readiness(), Readiness::InvalidAmounts);

        let mut calculating = snapshot("1", "1.2");
        calculating.phase = SyncPhase::Computing(Side::From);
        assert_eq!(calculating.readiness(), Readiness::Calculating);

        let mut submitting = snapshot("1", "1.2");
        submitting.phase = SyncPhase::Submitting;
        assert_eq!(submitting.readiness(), Readiness::Submitting);
        assert!(!submitting.is_calculating());

        let mut no_token = snapshot("1", "1.2");
        no_token.to_token = None;
        assert_eq!(no_token.readiness(), Readiness::SelectTokens);
        assert!(!no_token.can_submit());
    }
}
