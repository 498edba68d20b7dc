use async_trait::async_trait;
use scan_core::{MarketDataProvider, NewsItem, NewsProvider, ScanError, StockSnapshot};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

/// Snapshots from a JSON array on disk, filtered to the requested symbols
pub struct JsonMarketDataProvider {
    path: PathBuf,
    label: String,
}

impl JsonMarketDataProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("json:{}", path.display());
        Self { path, label }
    }
}

#[async_trait]
impl MarketDataProvider for JsonMarketDataProvider {
    fn name(&self) -> &str {
        &self.label
    }

    async fn get_snapshots(&self, symbols: &[String]) -> Result<Vec<StockSnapshot>, ScanError> {
        let all: Vec<StockSnapshot> = read_json_array(&self.path).await.map_err(ScanError::MarketData)?;
        let wanted: HashSet<&str> = symbols.iter().map(String::as_str).collect();

        // At most one snapshot per symbol; the first entry in the file wins
        let mut seen: HashSet<String> = HashSet::new();
        let snapshots: Vec<StockSnapshot> = all
            .into_iter()
            .filter(|s| wanted.contains(s.symbol.as_str()) && seen.insert(s.symbol.clone()))
            .collect();

        if snapshots.len() < wanted.len() {
            tracing::warn!(
                "{}: {} of {} requested symbols have no snapshot",
                self.label,
                wanted.len() - snapshots.len(),
                wanted.len()
            );
        }
        Ok(snapshots)
    }
}

/// Headlines from a JSON array on disk, filtered to the requested symbols
pub struct JsonNewsProvider {
    path: PathBuf,
    label: String,
}

impl JsonNewsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("json:{}", path.display());
        Self { path, label }
    }
}

#[async_trait]
impl NewsProvider for JsonNewsProvider {
    fn name(&self) -> &str {
        &self.label
    }

    async fn get_news(&self, symbols: &[String]) -> Result<Vec<NewsItem>, ScanError> {
        let all: Vec<NewsItem> = read_json_array(&self.path).await.map_err(ScanError::NewsData)?;
        let wanted: HashSet<&str> = symbols.iter().map(String::as_str).collect();
        Ok(all.into_iter().filter(|n| wanted.contains(n.symbol.as_str())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scan-providers-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_json_snapshots_filtered_and_deduplicated() {
        let ts = Utc::now().to_rfc3339();
        let body = format!(
            r#"[
                {{"symbol": "600000", "name": "A", "price": 9.5, "pe_ttm": 8.0, "timestamp": "{ts}"}},
                {{"symbol": "600000", "name": "A dup", "price": 9.9, "timestamp": "{ts}"}},
                {{"symbol": "600001", "name": "B", "price": 4.0, "timestamp": "{ts}"}}
            ]"#
        );
        let path = scratch_file("snapshots.json", &body);
        let provider = JsonMarketDataProvider::new(&path);

        let snaps = provider.get_snapshots(&["600000".to_string()]).await.unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].name, "A");
        assert_eq!(snaps[0].pb, None);
        assert!(provider.name().starts_with("json:"));
    }

    #[tokio::test]
    async fn test_missing_file_is_market_data_error() {
        let provider = JsonMarketDataProvider::new("/nonexistent/snapshots.json");
        let result = provider.get_snapshots(&["600000".to_string()]).await;
        assert!(matches!(result, Err(ScanError::MarketData(_))));
    }

    #[tokio::test]
    async fn test_malformed_news_is_news_error() {
        let path = scratch_file("bad_news.json", "{ not json");
        let result = JsonNewsProvider::new(&path).get_news(&["600000".to_string()]).await;
        assert!(matches!(result, Err(ScanError::NewsData(_))));
    }
}
