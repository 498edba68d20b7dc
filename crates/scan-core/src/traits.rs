use async_trait::async_trait;
use crate::{NewsItem, ScanError, StockSnapshot};

/// Source of point-in-time snapshots for a watchlist.
///
/// Implementations return at most one snapshot per requested symbol; order is
/// not significant.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider identity recorded in diagnostics and the report
    fn name(&self) -> &str;

    async fn get_snapshots(&self, symbols: &[String]) -> Result<Vec<StockSnapshot>, ScanError>;
}

/// Source of raw headlines for a watchlist. Zero items is a valid answer.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ScanError>;
}
