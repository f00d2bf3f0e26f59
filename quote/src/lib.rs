//! AMMSim Quote Engine
//!
//! Converts an amount entered on one side of a token pair into the linked
//! amount on the other side.
//!
//! # Features
//!
//! - Rate table with reciprocal rates derived by construction
//! - Deterministic fallback rates for pairs without a registered rate
//! - Display rounding capped at eight fractional digits
//! - Pool share estimates and liquidity removal previews
//! - Mock market statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use ammsim_common::Side;
//! use ammsim_quote::{QuoteEngine, QuoteRequest};
//!
//! let engine = QuoteEngine::mock();
//! let result = engine.quote(&QuoteRequest::new(Some("SUI"), Some("USDC"), "100", Side::From))?;
//! assert_eq!(result.counter_amount, "120.000000");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod liquidity;
pub mod market;
pub mod rates;

pub use config::QuoteEngineConfig;
pub use engine::{QuoteContext, QuoteEngine, QuoteRequest, QuoteResult};
pub use error::QuoteError;
pub use liquidity::{pool_share_estimate, preview_removal, LiquidityPosition, RemovalPreview};
pub use market::{HistoricalDataPoint, MarketData, MarketDataProvider, MockMarketDataProvider};
pub use rates::{fallback_rate, RateEntry, RateTable, ResolvedRate};
