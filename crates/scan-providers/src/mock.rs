use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use scan_core::{MarketDataProvider, NewsItem, NewsProvider, ScanError, StockSnapshot};

/// Deterministic snapshots that step through valuation and momentum by watchlist position
pub struct MockMarketDataProvider {
    as_of: DateTime<Utc>,
}

impl MockMarketDataProvider {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self { as_of }
    }
}

impl Default for MockMarketDataProvider {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_snapshots(&self, symbols: &[String]) -> Result<Vec<StockSnapshot>, ScanError> {
        Ok(symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let i = i as f64;
                StockSnapshot {
                    symbol: symbol.clone(),
                    name: format!("{symbol}_NAME"),
                    price: 3.0 + i * 1.6,
                    pe_ttm: Some(10.0 + i * 6.0),
                    pb: Some(1.0 + i * 0.3),
                    roe: Some(7.0 + i * 2.0),
                    revenue_yoy: Some(5.0 + i * 3.0),
                    pct_chg_20d: Some(-2.0 + i * 1.5),
                    volume_ratio: Some(1.0 + i * 0.2),
                    timestamp: self.as_of,
                }
            })
            .collect())
    }
}

/// One headline per symbol, alternating good and bad news, an hour apart
pub struct MockNewsProvider {
    as_of: DateTime<Utc>,
}

impl MockNewsProvider {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self { as_of }
    }
}

impl Default for MockNewsProvider {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl NewsProvider for MockNewsProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ScanError> {
        Ok(symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                let title = if i % 2 == 0 {
                    format!("{symbol} announcement: signs major new order, earnings growth expected")
                } else {
                    format!("{symbol} announcement: major shareholder plans stake sale")
                };
                NewsItem {
                    symbol: symbol.clone(),
                    title,
                    source: "mock".to_string(),
                    published_at: self.as_of - Duration::hours(i as i64),
                }
            })
            .collect())
    }
}

/// News source used when no feed is configured
#[derive(Default)]
pub struct NullNewsProvider;

#[async_trait]
impl NewsProvider for NullNewsProvider {
    fn name(&self) -> &str {
        "none"
    }

    async fn get_news(&self, _symbols: &[String]) -> Result<Vec<NewsItem>, ScanError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("60000{i}")).collect()
    }

    #[tokio::test]
    async fn test_mock_snapshots_one_per_symbol() {
        let provider = MockMarketDataProvider::default();
        let snaps = provider.get_snapshots(&symbols(4)).await.unwrap();
        assert_eq!(snaps.len(), 4);
        assert_eq!(snaps[0].symbol, "600000");
        assert_eq!(snaps[0].pe_ttm, Some(10.0));
        assert_eq!(snaps[2].pe_ttm, Some(22.0));
    }

    #[tokio::test]
    async fn test_mock_news_alternates() {
        let provider = MockNewsProvider::default();
        let news = provider.get_news(&symbols(2)).await.unwrap();
        assert!(news[0].title.contains("new order"));
        assert!(news[1].title.contains("stake sale"));
        assert_eq!(news[0].published_at - news[1].published_at, Duration::hours(1));
    }

    #[tokio::test]
    async fn test_null_news_is_empty() {
        let news = NullNewsProvider.get_news(&symbols(3)).await.unwrap();
        assert!(news.is_empty());
    }
}
