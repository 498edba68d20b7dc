use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time fundamentals and quote for one security
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub pe_ttm: Option<f64>,
    #[serde(default)]
    pub pb: Option<f64>,
    /// Return on equity, percent
    #[serde(default)]
    pub roe: Option<f64>,
    /// Revenue growth year over year, percent
    #[serde(default)]
    pub revenue_yoy: Option<f64>,
    #[serde(default)]
    pub pct_chg_20d: Option<f64>,
    #[serde(default)]
    pub volume_ratio: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One raw headline for a security
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub symbol: String,
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// Polarity assigned to a classified headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Event category a headline is classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EarningsGrowth,
    NewOrder,
    Buyback,
    Innovation,
    PolicySupport,
    ShareholderReduction,
    EarningsDrop,
    ComplianceRisk,
    DelistOrDefault,
    Neutral,
}

impl EventType {
    /// Short tag used in news summaries
    pub fn tag(&self) -> &'static str {
        match self {
            EventType::EarningsGrowth => "earnings growth",
            EventType::NewOrder => "new order",
            EventType::Buyback => "buyback",
            EventType::Innovation => "innovation",
            EventType::PolicySupport => "policy support",
            EventType::ShareholderReduction => "shareholder reduction",
            EventType::EarningsDrop => "earnings drop",
            EventType::ComplianceRisk => "compliance risk",
            EventType::DelistOrDefault => "delist or default",
            EventType::Neutral => "neutral news",
        }
    }

    /// Scales an event's impact on the symbol score. Decisive events weigh more.
    pub fn impact_multiplier(&self) -> f64 {
        match self {
            EventType::EarningsGrowth => 1.1,
            EventType::NewOrder => 1.0,
            EventType::Buyback => 1.0,
            EventType::Innovation => 0.9,
            EventType::PolicySupport => 0.85,
            EventType::ShareholderReduction => 1.05,
            EventType::EarningsDrop => 1.1,
            EventType::ComplianceRisk => 1.15,
            EventType::DelistOrDefault => 1.25,
            EventType::Neutral => 0.4,
        }
    }
}

/// Classified, weighted interpretation of one deduplicated headline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEvent {
    pub symbol: String,
    pub title: String,
    pub event_type: EventType,
    pub sentiment: Sentiment,
    /// 0.1 to 1.0
    pub confidence: f64,
    /// 0.05 to 1.0
    pub decay_weight: f64,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// Aggregated news sentiment for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolNewsSignal {
    pub symbol: String,
    pub score: f64, // 0 to 100
    pub event_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub summary: String,
}

/// Final scan output for one security, as produced by the ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    pub total_score: f64,
    pub valuation_score: f64,
    pub quality_score: f64,
    pub catalyst_score: f64,
    pub trend_score: f64,
    pub risk_penalty: f64,
    pub entry_price: f64,
    pub reason: String,
    pub risk_note: String,
    pub regime_adjustment: f64,
    pub news_score: f64,
    pub news_event_count: usize,
    pub news_summary: String,
    pub generated_at: DateTime<Utc>,
}

impl Recommendation {
    /// Attach an allocation, producing a new value and leaving the ranked record untouched
    pub fn with_allocation(&self, weight: f64, execution_note: impl Into<String>) -> AllocatedRecommendation {
        AllocatedRecommendation {
            recommendation: self.clone(),
            suggested_weight: Some(weight),
            execution_note: Some(execution_note.into()),
        }
    }
}

/// Recommendation plus the allocator's position sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedRecommendation {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    /// Fraction of portfolio; `None` when allocation never ran
    #[serde(default)]
    pub suggested_weight: Option<f64>,
    #[serde(default)]
    pub execution_note: Option<String>,
}

impl AllocatedRecommendation {
    /// Ranked but never sized
    pub fn unallocated(recommendation: Recommendation) -> Self {
        Self {
            recommendation,
            suggested_weight: None,
            execution_note: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.recommendation.symbol
    }
}

/// Market-wide adjustment applied identically to every candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSignal {
    pub label: String,
    pub adjustment: f64,
    /// (advancers - decliners) / sampled, -1.0 to 1.0
    pub breadth: f64,
    pub avg_pct_chg_20d: f64,
    pub sample_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recommendation() -> Recommendation {
        Recommendation {
            symbol: "600519".to_string(),
            name: "Kweichow Moutai".to_string(),
            total_score: 61.2,
            valuation_score: 70.0,
            quality_score: 64.0,
            catalyst_score: 50.0,
            trend_score: 55.0,
            risk_penalty: 0.0,
            entry_price: 1500.0,
            reason: "test".to_string(),
            risk_note: "no significant risk".to_string(),
            regime_adjustment: 0.0,
            news_score: 50.0,
            news_event_count: 0,
            news_summary: "no significant news event".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_type_serializes_snake_case() {
        let json = serde_json::to_string(&EventType::DelistOrDefault).unwrap();
        assert_eq!(json, "\"delist_or_default\"");
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
    }

    #[test]
    fn test_with_allocation_leaves_original_untouched() {
        let rec = sample_recommendation();
        let allocated = rec.with_allocation(0.16, "stop loss 8%");
        assert_eq!(allocated.suggested_weight, Some(0.16));
        assert_eq!(allocated.symbol(), "600519");
        assert_eq!(rec.total_score, allocated.recommendation.total_score);
    }

    #[test]
    fn test_allocated_recommendation_flattens() {
        let allocated = sample_recommendation().with_allocation(0.2, "note");
        let value = serde_json::to_value(&allocated).unwrap();
        assert_eq!(value["symbol"], "600519");
        assert_eq!(value["suggested_weight"], 0.2);
        assert_eq!(value["execution_note"], "note");
    }

    #[test]
    fn test_decisive_events_weigh_more() {
        assert!(EventType::DelistOrDefault.impact_multiplier() > EventType::PolicySupport.impact_multiplier());
        assert!(EventType::EarningsGrowth.impact_multiplier() > EventType::Neutral.impact_multiplier());
    }
}
