//! Reference market-data and news collaborators plus the factory that picks one by name.

use scan_core::{MarketDataProvider, NewsProvider, ScanError};
use std::sync::Arc;

pub mod file;
pub mod mock;

pub use file::{JsonMarketDataProvider, JsonNewsProvider};
pub use mock::{MockMarketDataProvider, MockNewsProvider, NullNewsProvider};

const JSON_PREFIX: &str = "json:";

/// `mock` or `json:<path>`
pub fn build_market_provider(kind: &str) -> Result<Arc<dyn MarketDataProvider>, ScanError> {
    let kind = kind.trim();
    if let Some(path) = kind.strip_prefix(JSON_PREFIX) {
        return Ok(Arc::new(JsonMarketDataProvider::new(path)));
    }
    match kind.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockMarketDataProvider::default())),
        other => Err(ScanError::InvalidPolicy(format!("unsupported market provider: {other}"))),
    }
}

/// `auto`, `mock`, `none` or `json:<path>`.
///
/// `auto` pairs mock news with the mock market provider and no news with anything else.
pub fn build_news_provider(kind: &str, market_kind: &str) -> Result<Arc<dyn NewsProvider>, ScanError> {
    let kind = kind.trim();
    if let Some(path) = kind.strip_prefix(JSON_PREFIX) {
        return Ok(Arc::new(JsonNewsProvider::new(path)));
    }

    let mut mode = kind.to_lowercase();
    if mode == "auto" {
        mode = if market_kind.trim().eq_ignore_ascii_case("mock") {
            "mock".to_string()
        } else {
            "none".to_string()
        };
    }

    match mode.as_str() {
        "mock" => Ok(Arc::new(MockNewsProvider::default())),
        "none" => Ok(Arc::new(NullNewsProvider)),
        other => Err(ScanError::InvalidPolicy(format!("unsupported news provider: {other}"))),
    }
}
