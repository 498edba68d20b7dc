//! Ordered classification tables for headlines.
//!
//! Rules are data: each entry is a keyword set, the event it maps to and a base
//! strength. Negative rules are evaluated before positive ones and the first
//! match wins.

use scan_core::{EventType, Sentiment};

pub struct EventRule {
    pub keywords: &'static [&'static str],
    pub event_type: EventType,
    pub strength: f64,
}

impl EventRule {
    fn matches(&self, title_lower: &str) -> bool {
        self.keywords.iter().any(|kw| title_lower.contains(kw))
    }
}

pub const NEGATIVE_RULES: &[EventRule] = &[
    EventRule {
        keywords: &["减持", "清仓", "stake sale", "sells stake", "reduces stake", "insider selling"],
        event_type: EventType::ShareholderReduction,
        strength: 1.0,
    },
    EventRule {
        keywords: &["亏损", "预亏", "下滑", "net loss", "profit warning", "earnings decline", "revenue decline"],
        event_type: EventType::EarningsDrop,
        strength: 1.0,
    },
    EventRule {
        keywords: &["诉讼", "处罚", "调查", "lawsuit", "litigation", "penalty", "investigation", "probe"],
        event_type: EventType::ComplianceRisk,
        strength: 0.9,
    },
    EventRule {
        keywords: &["退市", "违约", "暴雷", "delist", "default", "bankruptcy"],
        event_type: EventType::DelistOrDefault,
        strength: 1.1,
    },
];

pub const POSITIVE_RULES: &[EventRule] = &[
    EventRule {
        keywords: &["业绩预增", "净利增长", "利润增长", "profit growth", "earnings growth", "record profit", "earnings beat"],
        event_type: EventType::EarningsGrowth,
        strength: 1.0,
    },
    EventRule {
        keywords: &["中标", "订单", "签约", "new order", "wins contract", "contract award"],
        event_type: EventType::NewOrder,
        strength: 0.8,
    },
    EventRule {
        keywords: &["回购", "增持", "buyback", "repurchase", "raises stake"],
        event_type: EventType::Buyback,
        strength: 0.9,
    },
    EventRule {
        keywords: &["新品", "新产品", "技术突破", "new product", "breakthrough", "product launch"],
        event_type: EventType::Innovation,
        strength: 0.7,
    },
    EventRule {
        keywords: &["政策支持", "补贴", "放开", "policy support", "subsidy", "deregulation"],
        event_type: EventType::PolicySupport,
        strength: 0.7,
    },
];

/// Strength assigned to headlines no rule recognises
pub const NEUTRAL_STRENGTH: f64 = 0.2;

/// Per-source reliability; unknown sources fall back to `UNKNOWN_SOURCE_WEIGHT`
const SOURCE_WEIGHTS: &[(&str, f64)] = &[("akshare", 0.9), ("mock", 0.6)];

pub const UNKNOWN_SOURCE_WEIGHT: f64 = 0.5;

/// Classify a headline into (event type, sentiment, base strength)
pub fn classify_title(title: &str) -> (EventType, Sentiment, f64) {
    let lower = title.to_lowercase();

    if let Some(rule) = NEGATIVE_RULES.iter().find(|r| r.matches(&lower)) {
        return (rule.event_type, Sentiment::Negative, rule.strength);
    }
    if let Some(rule) = POSITIVE_RULES.iter().find(|r| r.matches(&lower)) {
        return (rule.event_type, Sentiment::Positive, rule.strength);
    }
    (EventType::Neutral, Sentiment::Neutral, NEUTRAL_STRENGTH)
}

pub fn source_weight(source: &str) -> f64 {
    let source = source.trim().to_lowercase();
    SOURCE_WEIGHTS
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, w)| *w)
        .unwrap_or(UNKNOWN_SOURCE_WEIGHT)
}
