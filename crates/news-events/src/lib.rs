//! News event extraction: deduplicate headlines, classify them against the rule
//! tables, weight them by source reliability and age, and fold them into one
//! 0-100 sentiment signal per symbol.

use chrono::{DateTime, Utc};
use scan_core::{
    clamp_score, clamp_to, round_to, NewsEvent, NewsItem, NewsPolicy, Sentiment, SymbolNewsSignal,
    NEUTRAL_SCORE,
};
use std::collections::{BTreeMap, HashSet};

pub mod rules;
pub use rules::{classify_title, source_weight, EventRule, NEGATIVE_RULES, POSITIVE_RULES};

/// Lower bound on the age decay so stale news never vanishes entirely
pub const MIN_DECAY_WEIGHT: f64 = 0.05;

pub const NO_NEWS_SUMMARY: &str = "no significant news event";

const SUMMARY_TAG_LIMIT: usize = 4;

/// Case-folded title with whitespace and punctuation removed
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// Drop repeated (symbol, normalized title) pairs, keeping the first occurrence
pub fn deduplicate_news(news: &[NewsItem]) -> Vec<NewsItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(news.len());

    for item in news {
        let key = (item.symbol.clone(), normalize_title(&item.title));
        if seen.insert(key) {
            out.push(item.clone());
        }
    }

    out
}

/// Exponential half-life decay of a headline's weight, floored at `MIN_DECAY_WEIGHT`.
/// Future-dated items count as age zero.
pub fn time_decay_weight(published_at: DateTime<Utc>, now: DateTime<Utc>, half_life_hours: f64) -> f64 {
    let age_hours = ((now - published_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    let lambda = std::f64::consts::LN_2 / half_life_hours;
    (-lambda * age_hours).exp().max(MIN_DECAY_WEIGHT)
}

pub struct NewsEventEngine {
    half_life_hours: f64,
    impact_scale: f64,
}

impl NewsEventEngine {
    pub fn new(half_life_hours: f64, impact_scale: f64) -> Self {
        Self {
            half_life_hours,
            impact_scale,
        }
    }

    pub fn from_policy(policy: &NewsPolicy) -> Self {
        Self::new(policy.event_half_life_hours, policy.event_impact_scale)
    }

    /// Deduplicate and classify every headline, evaluated as of `now`
    pub fn extract_events(&self, news: &[NewsItem], now: DateTime<Utc>) -> Vec<NewsEvent> {
        let deduped = deduplicate_news(news);
        if deduped.len() < news.len() {
            tracing::debug!("Dropped {} duplicate headlines", news.len() - deduped.len());
        }

        deduped
            .into_iter()
            .map(|item| {
                let (event_type, sentiment, strength) = classify_title(&item.title);
                let confidence = clamp_to(strength * source_weight(&item.source), 0.1, 1.0);
                let decay_weight = time_decay_weight(item.published_at, now, self.half_life_hours);

                NewsEvent {
                    symbol: item.symbol,
                    title: item.title,
                    event_type,
                    sentiment,
                    confidence: round_to(confidence, 4),
                    decay_weight: round_to(decay_weight, 4),
                    source: item.source,
                    published_at: item.published_at,
                }
            })
            .collect()
    }

    /// One signal per symbol that has at least one surviving headline
    pub fn build_signals(&self, news: &[NewsItem], now: DateTime<Utc>) -> BTreeMap<String, SymbolNewsSignal> {
        let events = self.extract_events(news, now);

        let mut by_symbol: BTreeMap<String, Vec<NewsEvent>> = BTreeMap::new();
        for event in events {
            by_symbol.entry(event.symbol.clone()).or_default().push(event);
        }

        let signals: BTreeMap<String, SymbolNewsSignal> = by_symbol
            .into_iter()
            .map(|(symbol, events)| {
                let signal = self.aggregate(&symbol, &events);
                (symbol, signal)
            })
            .collect();

        tracing::info!(
            "Built news signals for {} symbols from {} headlines",
            signals.len(),
            news.len()
        );
        signals
    }

    fn aggregate(&self, symbol: &str, events: &[NewsEvent]) -> SymbolNewsSignal {
        let mut score = NEUTRAL_SCORE;
        let mut positive_count = 0;
        let mut negative_count = 0;
        let mut neutral_count = 0;
        let mut tags: Vec<String> = Vec::new();

        for event in events {
            let impact = self.impact_scale
                * event.confidence
                * event.decay_weight
                * event.event_type.impact_multiplier();
            let tag = event.event_type.tag();

            match event.sentiment {
                Sentiment::Positive => {
                    score += impact;
                    positive_count += 1;
                    tags.push(format!("+{tag}"));
                }
                Sentiment::Negative => {
                    score -= impact;
                    negative_count += 1;
                    tags.push(format!("-{tag}"));
                }
                Sentiment::Neutral => {
                    neutral_count += 1;
                    tags.push(tag.to_string());
                }
            }
        }

        let summary = if tags.is_empty() {
            NO_NEWS_SUMMARY.to_string()
        } else {
            tags.into_iter().take(SUMMARY_TAG_LIMIT).collect::<Vec<_>>().join(", ")
        };

        SymbolNewsSignal {
            symbol: symbol.to_string(),
            score: round_to(clamp_score(score), 2),
            event_count: events.len(),
            positive_count,
            negative_count,
            neutral_count,
            summary,
        }
    }
}

impl Default for NewsEventEngine {
    fn default() -> Self {
        Self::from_policy(&NewsPolicy::default())
    }
}
