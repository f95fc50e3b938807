//! The market data seam consumed by the strategy engine

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{OptionChain, UnderlyingSnapshot};

use crate::Result;

/// Source of underlying snapshots and option chains
///
/// Implementations must be safe to call concurrently; the screener issues
/// many chain requests in parallel.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Spot, fundamentals and `history_days` calendar days of daily closes
    async fn underlying(&self, symbol: &str, history_days: u32) -> Result<UnderlyingSnapshot>;

    /// Listed expirations as `YYYY-MM-DD` strings
    async fn expirations(&self, symbol: &str) -> Result<Vec<String>>;

    /// Puts and calls for one expiration
    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain>;
}
