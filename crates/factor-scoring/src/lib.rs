//! Per-security factor scores. Every score is a pure function of one snapshot
//! (plus that symbol's raw headlines for the keyword and risk factors) and lands
//! in `[0, 100]`. The market regime signal in [`regime`] is the only cross-security
//! input.

use scan_core::{clamp_score, round_to, NewsItem, StockSnapshot, Thresholds, NEUTRAL_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod regime;
pub use regime::market_regime_signal;

const POSITIVE_KEYWORDS: &[&str] = &[
    "中标", "回购", "增长", "业绩预增", "新产品", "政策支持",
    "contract", "buyback", "growth", "new product", "policy support",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "减持", "诉讼", "亏损", "处罚", "退市", "违约",
    "stake sale", "lawsuit", "net loss", "penalty", "delist", "default",
];

const RISK_KEYWORDS: &[&str] = &[
    "减持", "诉讼", "处罚", "退市", "违约",
    "stake sale", "lawsuit", "litigation", "penalty", "delist", "default",
];

const POSITIVE_KEYWORD_BUMP: f64 = 12.0;
const NEGATIVE_KEYWORD_BUMP: f64 = 18.0;

pub const NO_RISK_NOTE: &str = "no significant risk";

/// Low PE and low PB score high. Missing fields count as neutral-favorable (70).
pub fn valuation_score(s: &StockSnapshot) -> f64 {
    let pe_part = s.pe_ttm.map(|pe| clamp_score(100.0 - pe)).unwrap_or(70.0);
    let pb_part = s.pb.map(|pb| clamp_score(100.0 - pb * 25.0)).unwrap_or(70.0);
    round_to(pe_part * 0.6 + pb_part * 0.4, 2)
}

/// ROE and revenue growth. Missing fields count as neutral (50).
pub fn quality_score(s: &StockSnapshot) -> f64 {
    let roe_part = s.roe.map(|roe| clamp_score(roe * 4.0)).unwrap_or(50.0);
    let rev_part = s
        .revenue_yoy
        .map(|growth| clamp_score(50.0 + growth * 2.0))
        .unwrap_or(50.0);
    round_to(roe_part * 0.6 + rev_part * 0.4, 2)
}

/// 20-day momentum plus a volume-ratio kicker
pub fn trend_score(s: &StockSnapshot) -> f64 {
    let chg = s.pct_chg_20d.unwrap_or(0.0);
    let vol = s.volume_ratio.unwrap_or(1.0);
    round_to(clamp_score(50.0 + chg * 3.0 + (vol - 1.0) * 15.0), 2)
}

/// Keyword catalyst score per symbol, starting at 50.
///
/// Each distinct keyword counts once per headline; the running score is clamped
/// after every headline. Symbols without headlines are absent.
pub fn keyword_catalyst_scores(news: &[NewsItem]) -> BTreeMap<String, f64> {
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();

    for item in news {
        let title = item.title.to_lowercase();
        let score = scores.entry(item.symbol.clone()).or_insert(NEUTRAL_SCORE);

        let positive_hits = POSITIVE_KEYWORDS.iter().filter(|kw| title.contains(*kw)).count();
        let negative_hits = NEGATIVE_KEYWORDS.iter().filter(|kw| title.contains(*kw)).count();

        *score = clamp_score(
            *score + positive_hits as f64 * POSITIVE_KEYWORD_BUMP
                - negative_hits as f64 * NEGATIVE_KEYWORD_BUMP,
        );
    }

    scores.into_iter().map(|(k, v)| (k, round_to(v, 2))).collect()
}

/// Additive risk penalty and a note listing every triggered rule
pub fn risk_penalty(s: &StockSnapshot, symbol_news: &[&NewsItem], thresholds: &Thresholds) -> (f64, String) {
    let mut penalty = 0.0;
    let mut notes: Vec<&str> = Vec::new();

    if s.price < thresholds.min_price {
        penalty += 15.0;
        notes.push("low price volatility risk");
    }
    if s.pe_ttm.is_some_and(|pe| pe > thresholds.max_pe) {
        penalty += 15.0;
        notes.push("valuation too high");
    }
    if s.roe.is_some_and(|roe| roe < thresholds.min_roe) {
        penalty += 20.0;
        notes.push("weak profitability");
    }

    // One-time charge, however many headlines match
    let risky_news = symbol_news.iter().any(|n| {
        let title = n.title.to_lowercase();
        RISK_KEYWORDS.iter().any(|kw| title.contains(kw))
    });
    if risky_news {
        penalty += 20.0;
        notes.push("negative news catalyst");
    }

    let note = if notes.is_empty() {
        NO_RISK_NOTE.to_string()
    } else {
        notes.join("; ")
    };

    (round_to(clamp_score(penalty), 2), note)
}

/// Snapshot-only factor scores for one security
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScores {
    pub valuation: f64,
    pub quality: f64,
    pub trend: f64,
    pub risk_penalty: f64,
    pub risk_note: String,
}

pub struct FactorScoringEngine {
    thresholds: Thresholds,
}

impl FactorScoringEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(&self, snapshot: &StockSnapshot, symbol_news: &[&NewsItem]) -> FactorScores {
        let (risk_penalty, risk_note) = risk_penalty(snapshot, symbol_news, &self.thresholds);
        FactorScores {
            valuation: valuation_score(snapshot),
            quality: quality_score(snapshot),
            trend: trend_score(snapshot),
            risk_penalty,
            risk_note,
        }
    }
}

impl Default for FactorScoringEngine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
