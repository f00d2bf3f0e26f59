//! Market data providers.

use async_trait::async_trait;
use ammsim_common::TokenPair;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Current market statistics for a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    /// Price of the base token in quote tokens.
    pub token_price: Decimal,
    /// Total value locked in the pool.
    pub liquidity_pool_size: Decimal,
    /// Trading volume.
    pub trading_volume: Decimal,
}

/// One point of a price/volume history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
}

/// Source of market statistics.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get current statistics for a pair.
    async fn market_data(&self, pair: &TokenPair) -> Result<MarketData>;

    /// Get history for a pair between `start` and `end`, oldest first.
    async fn historical_data(
        &self,
        pair: &TokenPair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalDataPoint>>;
}

/// Provider returning fixed stub statistics.
pub struct MockMarketDataProvider {
    name: String,
    overrides: DashMap<TokenPair, MarketData>,
}

impl MockMarketDataProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: DashMap::new(),
        }
    }

    /// Set statistics for a pair.
    pub fn set_market_data(&self, pair: TokenPair, data: MarketData) {
        self.overrides.insert(pair, data);
    }

    fn stub() -> MarketData {
        MarketData {
            token_price: Decimal::new(123, 2),
            liquidity_pool_size: Decimal::from(1_000_000),
            trading_volume: Decimal::from(50_000),
        }
    }
}

impl Default for MockMarketDataProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn market_data(&self, pair: &TokenPair) -> Result<MarketData> {
        let data = self
            .overrides
            .get(pair)
            .map(|d| d.clone())
            .unwrap_or_else(Self::stub);
        debug!(provider = %self.name, pair = %pair, price = %data.token_price, "Market data");
        Ok(data)
    }

    async fn historical_data(
        &self,
        pair: &TokenPair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalDataPoint>> {
        let now = Utc::now();
        let points = [
            (3, Decimal::new(120, 2), Decimal::from(35_000)),
            (2, Decimal::new(121, 2), Decimal::from(40_000)),
            (1, Decimal::new(122, 2), Decimal::from(45_000)),
        ];

        let history: Vec<HistoricalDataPoint> = points
            .into_iter()
            .map(|(hours_ago, price, volume)| HistoricalDataPoint {
                timestamp: now - Duration::hours(hours_ago),
                price,
                volume,
            })
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .collect();

        debug!(provider = %self.name, pair = %pair, points = history.len(), "Historical data");
        Ok(history)
    }
}
