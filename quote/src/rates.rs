//! Exchange rate table and deterministic fallback rates.
//!
//! The table keeps one entry per unordered token pair and derives the other
//! orientation as the reciprocal, so `rate(B→A) = 1 / rate(A→B)` holds for
//! every pair by construction rather than by convention.

use std::collections::HashMap;

use ammsim_common::TokenPair;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{QuoteError, Result};

/// Stored rate in the orientation it was registered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Pair the rate was registered for.
    #[serde(flatten)]
    pub pair: TokenPair,
    /// Units of `pair.quote` per unit of `pair.base`.
    pub rate: Decimal,
}

/// A rate looked up for a specific orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRate {
    /// Requested orientation.
    pub pair: TokenPair,
    /// Units of `pair.quote` per unit of `pair.base`.
    pub rate: Decimal,
    /// Whether the rate came from the fallback generator.
    pub used_fallback: bool,
}

/// Read-only mapping from token pairs to positive exchange rates.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    entries: HashMap<TokenPair, RateEntry>,
}

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of mock rates for the built-in registry.
    pub fn mock() -> Self {
        let mut table = Self::new();
        for (base, quote, rate) in [
            ("SUI", "USDC", Decimal::new(12, 1)),
            ("SUI", "USDT", Decimal::new(12, 1)),
            ("ETH", "USDC", Decimal::from(3_000)),
            ("BTC", "USDC", Decimal::from(60_000)),
            ("USDC", "USDT", Decimal::ONE),
            ("DAI", "USDC", Decimal::ONE),
        ] {
            table.entries.insert(
                TokenPair::new(base, quote).canonical(),
                RateEntry {
                    pair: TokenPair::new(base, quote),
                    rate,
                },
            );
        }
        table
    }

    /// Load a table from a JSON array of `{"base", "quote", "rate"}` entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<RateEntry> = serde_json::from_str(json)
            .map_err(|e| QuoteError::InvalidRateTable(e.to_string()))?;

        let mut table = Self::new();
        for entry in entries {
            table.insert(TokenPair::new(entry.pair.base, entry.pair.quote), entry.rate)?;
        }
        Ok(table)
    }

    /// Register a rate; replaces any rate registered for either orientation.
    pub fn insert(&mut self, pair: TokenPair, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(QuoteError::InvalidRate { pair, rate });
        }
        self.entries
            .insert(pair.canonical(), RateEntry { pair, rate });
        Ok(())
    }

    /// Builder form of [`RateTable::insert`].
    pub fn with_rate(mut self, base: &str, quote: &str, rate: Decimal) -> Result<Self> {
        self.insert(TokenPair::new(base, quote), rate)?;
        Ok(self)
    }

    /// Look up the registered rate for a pair, deriving the inverse if needed.
    pub fn get(&self, pair: &TokenPair) -> Option<Decimal> {
        if pair.base == pair.quote {
            return Some(Decimal::ONE);
        }

        let entry = self.entries.get(&pair.canonical())?;
        if entry.pair == *pair {
            Some(entry.rate)
        } else {
            Decimal::ONE.checked_div(entry.rate)
        }
    }

    /// Look up a rate, falling back to a deterministic placeholder.
    pub fn resolve(&self, pair: &TokenPair) -> ResolvedRate {
        match self.get(pair) {
            Some(rate) => {
                debug!(pair = %pair, rate = %rate, "Using registered rate");
                ResolvedRate {
                    pair: pair.clone(),
                    rate,
                    used_fallback: false,
                }
            }
            None => {
                let rate = fallback_rate(pair);
                warn!(
                    error = %QuoteError::RateUnavailable(pair.clone()),
                    rate = %rate,
                    "Using fallback rate"
                );
                ResolvedRate {
                    pair: pair.clone(),
                    rate,
                    used_fallback: true,
                }
            }
        }
    }

    /// Check whether a rate is registered for either orientation.
    pub fn contains(&self, pair: &TokenPair) -> bool {
        self.entries.contains_key(&pair.canonical())
    }

    /// Registered entries, sorted by canonical pair.
    pub fn entries(&self) -> Vec<RateEntry> {
        let mut entries: Vec<RateEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.pair.canonical().to_string().cmp(&b.pair.canonical().to_string()));
        entries
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no rates are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deterministic placeholder rate for a pair without a registered rate.
///
/// Seeded from SHA-256 of the canonical pair, so both orientations agree and
/// the rate in canonical orientation lies in `[0.5, 2.5)` with four decimals.
pub fn fallback_rate(pair: &TokenPair) -> Decimal {
    if pair.base == pair.quote {
        return Decimal::ONE;
    }

    let canonical = pair.canonical();
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    let bucket = u64::from_be_bytes(seed) % 20_000;
    let rate = Decimal::new(5_000 + bucket as i64, 4);

    if pair.is_canonical() {
        rate
    } else {
        Decimal::ONE / rate
    }
}
