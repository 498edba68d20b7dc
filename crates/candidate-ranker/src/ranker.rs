use chrono::{DateTime, Utc};
use factor_scoring::{keyword_catalyst_scores, market_regime_signal, FactorScoringEngine};
use news_events::{NewsEventEngine, NO_NEWS_SUMMARY};
use scan_core::{
    round_to, NewsItem, Recommendation, RegimeSignal, ScanConfig, ScanError, StockSnapshot,
    SymbolNewsSignal, NEUTRAL_SCORE,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::fusion::fuse_catalyst;

/// Why a scored candidate was dropped. Expected filtering, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    RiskTooHigh,
    ScoreTooLow,
    MomentumTooExtended,
}

/// Ranked candidates plus the context needed for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub recommendations: Vec<Recommendation>,
    pub regime: RegimeSignal,
    pub evaluated: usize,
    pub passed_filters: usize,
    pub news_signals: usize,
    pub news_events: usize,
}

pub struct CandidateRanker {
    config: ScanConfig,
    news_engine: NewsEventEngine,
    factor_engine: FactorScoringEngine,
}

impl CandidateRanker {
    pub fn new(config: ScanConfig) -> Self {
        let news_engine = NewsEventEngine::from_policy(&config.news);
        let factor_engine = FactorScoringEngine::new(config.thresholds.clone());
        Self {
            config,
            news_engine,
            factor_engine,
        }
    }

    /// Score every snapshot, drop excluded candidates, sort and keep the top `topn`.
    ///
    /// Ties on total score are broken by symbol so the order never depends on
    /// provider ordering.
    pub fn rank(
        &self,
        snapshots: &[StockSnapshot],
        news: &[NewsItem],
        topn: usize,
        now: DateTime<Utc>,
    ) -> Result<RankingOutcome, ScanError> {
        for s in snapshots {
            validate_snapshot(s)?;
        }

        let mut news_by_symbol: HashMap<&str, Vec<&NewsItem>> = HashMap::new();
        for item in news {
            news_by_symbol.entry(item.symbol.as_str()).or_default().push(item);
        }

        let keyword_scores = keyword_catalyst_scores(news);
        let signals = self.news_engine.build_signals(news, now);
        let regime = market_regime_signal(snapshots, &self.config.regime);

        let mut recommendations = Vec::new();
        for s in snapshots {
            let keyword_score = keyword_scores.get(&s.symbol).copied().unwrap_or(NEUTRAL_SCORE);
            let symbol_news = news_by_symbol.get(s.symbol.as_str()).map(Vec::as_slice).unwrap_or(&[]);

            let (rec, raw_total) =
                self.evaluate(s, keyword_score, signals.get(&s.symbol), symbol_news, &regime, now);

            if let Some(reason) = self.exclusion(&rec, raw_total, s) {
                tracing::debug!("Excluded {} ({:?}, total {:.2})", s.symbol, reason, rec.total_score);
                continue;
            }
            recommendations.push(rec);
        }

        let passed_filters = recommendations.len();

        recommendations.sort_by(|a, b| {
            b.total_score
                .partial_cmp(&a.total_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        recommendations.truncate(topn);

        tracing::info!(
            "Ranking complete: {}/{} candidates passed filters, returning top {}",
            passed_filters,
            snapshots.len(),
            recommendations.len()
        );

        Ok(RankingOutcome {
            recommendations,
            regime,
            evaluated: snapshots.len(),
            passed_filters,
            news_signals: signals.len(),
            news_events: signals.values().map(|s| s.event_count).sum(),
        })
    }

    /// Full score for one snapshot, before any exclusion filter.
    /// A missing news signal counts as neutral (score 50, no events).
    pub fn score_candidate(
        &self,
        snapshot: &StockSnapshot,
        keyword_score: f64,
        signal: Option<&SymbolNewsSignal>,
        symbol_news: &[&NewsItem],
        regime: &RegimeSignal,
        now: DateTime<Utc>,
    ) -> Recommendation {
        self.evaluate(snapshot, keyword_score, signal, symbol_news, regime, now).0
    }

    /// Recommendation plus the unrounded total the inclusion filter compares
    fn evaluate(
        &self,
        snapshot: &StockSnapshot,
        keyword_score: f64,
        signal: Option<&SymbolNewsSignal>,
        symbol_news: &[&NewsItem],
        regime: &RegimeSignal,
        now: DateTime<Utc>,
    ) -> (Recommendation, f64) {
        let factors = self.factor_engine.score(snapshot, symbol_news);

        let news_score = signal.map(|sig| sig.score).unwrap_or(NEUTRAL_SCORE);
        let event_count = signal.map(|sig| sig.event_count).unwrap_or(0);
        let fusion = fuse_catalyst(keyword_score, news_score, event_count, &self.config.news);

        let w = &self.config.weights;
        let total = factors.valuation * w.valuation
            + factors.quality * w.quality
            + fusion.score * w.catalyst
            + factors.trend * w.trend
            - factors.risk_penalty
            + regime.adjustment;

        let reason = format!(
            "valuation {} quality {} catalyst {} trend {} news {} fusion(k{:.2}/n{:.2}) regime {} {:+.1}",
            factors.valuation,
            factors.quality,
            fusion.score,
            factors.trend,
            news_score,
            fusion.keyword_weight,
            fusion.structured_weight,
            regime.label,
            regime.adjustment,
        );

        let rec = Recommendation {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            total_score: round_to(total, 2),
            valuation_score: factors.valuation,
            quality_score: factors.quality,
            catalyst_score: fusion.score,
            trend_score: factors.trend,
            risk_penalty: factors.risk_penalty,
            entry_price: snapshot.price,
            reason,
            risk_note: factors.risk_note,
            regime_adjustment: regime.adjustment,
            news_score,
            news_event_count: event_count,
            news_summary: signal
                .map(|sig| sig.summary.clone())
                .unwrap_or_else(|| NO_NEWS_SUMMARY.to_string()),
            generated_at: now,
        };
        (rec, total)
    }

    fn exclusion(&self, rec: &Recommendation, raw_total: f64, snapshot: &StockSnapshot) -> Option<Exclusion> {
        let t = &self.config.thresholds;
        if rec.risk_penalty > t.max_risk_penalty {
            return Some(Exclusion::RiskTooHigh);
        }
        if raw_total < t.min_total_score {
            return Some(Exclusion::ScoreTooLow);
        }
        if snapshot.pct_chg_20d.is_some_and(|chg| chg > t.max_20d_chg_for_entry) {
            return Some(Exclusion::MomentumTooExtended);
        }
        None
    }
}

fn validate_snapshot(s: &StockSnapshot) -> Result<(), ScanError> {
    if !s.price.is_finite() {
        return Err(ScanError::InvalidData(format!("{}: non-finite price", s.symbol)));
    }
    let optional = [
        ("pe_ttm", s.pe_ttm),
        ("pb", s.pb),
        ("roe", s.roe),
        ("revenue_yoy", s.revenue_yoy),
        ("pct_chg_20d", s.pct_chg_20d),
        ("volume_ratio", s.volume_ratio),
    ];
    for (field, value) in optional {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(ScanError::InvalidData(format!("{}: non-finite {}", s.symbol, field)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn snapshot(symbol: &str) -> StockSnapshot {
        StockSnapshot {
            symbol: symbol.to_string(),
            name: format!("{symbol} Co"),
            price: 10.0,
            pe_ttm: Some(10.0),
            pb: None,
            roe: Some(10.0),
            revenue_yoy: None,
            pct_chg_20d: Some(0.0),
            volume_ratio: None,
            timestamp: now(),
        }
    }

    fn news(symbol: &str, title: &str) -> NewsItem {
        NewsItem {
            symbol: symbol.to_string(),
            title: title.to_string(),
            source: "akshare".to_string(),
            published_at: now() - Duration::hours(2),
        }
    }

    fn neutral_regime() -> RegimeSignal {
        RegimeSignal {
            label: "neutral".to_string(),
            adjustment: 0.0,
            breadth: 0.0,
            avg_pct_chg_20d: 0.0,
            sample_size: 1,
        }
    }

    #[test]
    fn test_single_favorable_security_is_selected() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let outcome = ranker.rank(&[snapshot("000001")], &[], 1, now()).unwrap();
        assert_eq!(outcome.recommendations.len(), 1);

        let rec = &outcome.recommendations[0];
        // 82 * 0.30 + 44 * 0.25 + 50 * 0.25 + 50 * 0.20
        assert_relative_eq!(rec.total_score, 58.1, epsilon = 1e-9);
        assert_eq!(rec.news_score, 50.0);
        assert_eq!(rec.news_event_count, 0);
        assert_eq!(rec.news_summary, NO_NEWS_SUMMARY);
        assert!(rec.reason.contains("fusion(k0.65/n0.35)"));
    }

    #[test]
    fn test_delisting_news_lowers_fused_catalyst() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let item = news("000001", "Exchange warns of possible delisting");
        let signals = NewsEventEngine::default().build_signals(std::slice::from_ref(&item), now());
        let keyword = keyword_catalyst_scores(std::slice::from_ref(&item));

        let with_news = ranker.score_candidate(
            &snapshot("000001"),
            keyword["000001"],
            signals.get("000001"),
            &[&item],
            &neutral_regime(),
            now(),
        );
        let without_news = ranker.score_candidate(
            &snapshot("000002"),
            NEUTRAL_SCORE,
            None,
            &[],
            &neutral_regime(),
            now(),
        );

        assert!(with_news.catalyst_score < without_news.catalyst_score);
        assert!(with_news.news_score < 50.0);
        assert_eq!(with_news.news_event_count, 1);
        assert_eq!(with_news.risk_note, "negative news catalyst");
    }

    #[test]
    fn test_exclusion_filters() {
        let ranker = CandidateRanker::new(ScanConfig::default());

        let risky = StockSnapshot { price: 1.0, roe: Some(1.0), ..snapshot("000001") };
        let weak = StockSnapshot { pe_ttm: Some(70.0), roe: Some(4.0), ..snapshot("000002") };
        let chased = StockSnapshot { pct_chg_20d: Some(30.0), ..snapshot("000003") };
        let fine = snapshot("000004");

        let outcome = ranker.rank(&[risky, weak, chased, fine], &[], 10, now()).unwrap();
        let symbols: Vec<&str> = outcome.recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["000004"]);
        assert_eq!(outcome.evaluated, 4);
        assert_eq!(outcome.passed_filters, 1);
    }

    #[test]
    fn test_results_respect_thresholds_and_topn() {
        let config = ScanConfig::default();
        let ranker = CandidateRanker::new(config.clone());
        let snapshots: Vec<StockSnapshot> = (0..12)
            .map(|i| StockSnapshot {
                pe_ttm: Some(5.0 + i as f64 * 4.0),
                roe: Some(2.0 + i as f64),
                pct_chg_20d: Some(-6.0 + i as f64 * 3.0),
                price: 1.0 + i as f64,
                ..snapshot(&format!("0000{i:02}"))
            })
            .collect();

        let outcome = ranker.rank(&snapshots, &[], 3, now()).unwrap();
        assert!(!outcome.recommendations.is_empty());
        assert!(outcome.recommendations.len() <= 3);
        for rec in &outcome.recommendations {
            assert!(rec.risk_penalty <= config.thresholds.max_risk_penalty);
            assert!(rec.total_score >= config.thresholds.min_total_score);
            let chg = snapshots.iter().find(|s| s.symbol == rec.symbol).and_then(|s| s.pct_chg_20d);
            assert!(chg.unwrap_or(0.0) <= config.thresholds.max_20d_chg_for_entry);
        }
        for pair in outcome.recommendations.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn test_min_total_compares_unrounded_total() {
        // trend 50.03 lifts the raw total to 58.106, displayed as 58.11
        let s = StockSnapshot { volume_ratio: Some(1.002), ..snapshot("000001") };

        let mut config = ScanConfig::default();
        config.thresholds.min_total_score = 58.11;
        let outcome = CandidateRanker::new(config.clone()).rank(std::slice::from_ref(&s), &[], 5, now()).unwrap();
        assert!(outcome.recommendations.is_empty());

        config.thresholds.min_total_score = 58.1;
        let outcome = CandidateRanker::new(config).rank(&[s], &[], 5, now()).unwrap();
        assert_eq!(outcome.recommendations.len(), 1);
        assert_relative_eq!(outcome.recommendations[0].total_score, 58.11, epsilon = 1e-9);
    }

    #[test]
    fn test_ties_broken_by_symbol() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let outcome = ranker
            .rank(&[snapshot("000009"), snapshot("000003"), snapshot("000005")], &[], 5, now())
            .unwrap();
        let symbols: Vec<&str> = outcome.recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["000003", "000005", "000009"]);
    }

    #[test]
    fn test_regime_adjustment_applies_to_all() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let up = |symbol: &str| StockSnapshot { pct_chg_20d: Some(5.0), ..snapshot(symbol) };
        let outcome = ranker.rank(&[up("000001"), up("000002")], &[], 5, now()).unwrap();
        assert_eq!(outcome.regime.label, "risk_on");
        for rec in &outcome.recommendations {
            assert_eq!(rec.regime_adjustment, 3.0);
            assert!(rec.reason.contains("regime risk_on +3.0"));
        }
    }

    #[test]
    fn test_non_finite_snapshot_is_rejected() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let bad = StockSnapshot { pb: Some(f64::NAN), ..snapshot("000001") };
        let result = ranker.rank(&[bad], &[], 5, now());
        assert!(matches!(result, Err(ScanError::InvalidData(_))));
    }

    #[test]
    fn test_topn_zero_returns_nothing() {
        let ranker = CandidateRanker::new(ScanConfig::default());
        let outcome = ranker.rank(&[snapshot("000001")], &[], 0, now()).unwrap();
        assert!(outcome.recommendations.is_empty());
        assert_eq!(outcome.passed_filters, 1);
    }
}
