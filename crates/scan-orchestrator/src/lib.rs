//! Staged scan pipeline: market data, news, ranking, allocation.
//!
//! Each stage appends a [`StageDiagnostic`]. Collaborator failures stop at the
//! stage boundary and surface only through the report's status and diagnostics.

use candidate_ranker::CandidateRanker;
use chrono::{DateTime, Utc};
use position_allocator::PositionAllocator;
use scan_core::{
    AllocatedRecommendation, MarketDataProvider, NewsItem, NewsProvider, ScanConfig, StockSnapshot,
};
use serde_json::json;
use std::sync::Arc;

pub mod diagnostics;
pub mod report;

pub use diagnostics::{RunStatus, Stage, StageDiagnostic, StageStatus};
pub use report::{write_report, ScanReport};

use diagnostics::StageTimer;

pub struct ScanPipeline {
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsProvider>,
    config: ScanConfig,
}

/// Report under construction. Owned by one `run` call only.
struct RunState {
    report: ScanReport,
}

impl RunState {
    fn record(&mut self, diagnostic: StageDiagnostic) {
        let stage = diagnostic.stage;
        let status = self.report.status.absorb(stage, diagnostic.status);
        if status == RunStatus::Failed && self.report.failed_stage.is_none() {
            self.report.failed_stage = Some(stage);
        }
        self.report.status = status;
        self.report.diagnostics.push(diagnostic);
    }
}

impl ScanPipeline {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsProvider>,
        config: ScanConfig,
    ) -> Self {
        Self { market, news, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run one scan over `watchlist`, keeping at most `topn` recommendations.
    ///
    /// Never returns an error: a failed market-data, ranking or allocation stage
    /// ends the run with `RunStatus::Failed`, a failed news fetch degrades it.
    pub async fn run(&self, watchlist: &[String], topn: usize, now: DateTime<Utc>) -> ScanReport {
        tracing::info!(
            "Starting scan of {} symbols (topn {}, market {}, news {})",
            watchlist.len(),
            topn,
            self.market.name(),
            self.news.name()
        );

        let mut state = RunState {
            report: ScanReport {
                generated_at: now,
                status: RunStatus::Ok,
                failed_stage: None,
                watchlist_size: watchlist.len(),
                topn,
                market_provider: self.market.name().to_string(),
                news_provider: self.news.name().to_string(),
                policy: self.config.clone(),
                regime: None,
                diagnostics: Vec::new(),
                recommendations: Vec::new(),
            },
        };

        let snapshots = match self.fetch_snapshots(watchlist, &mut state).await {
            Some(snapshots) => snapshots,
            None => return self.finish(state),
        };

        let news = self.fetch_news(watchlist, &mut state).await;

        let ranked = {
            let timer = StageTimer::start(Stage::Ranking);
            let ranking = self.config.validate_scoring().and_then(|()| {
                CandidateRanker::new(self.config.clone()).rank(&snapshots, &news, topn, now)
            });
            match ranking {
                Ok(outcome) => {
                    state.record(timer.ok(
                        format!(
                            "{} of {} candidates passed filters, kept {}",
                            outcome.passed_filters,
                            outcome.evaluated,
                            outcome.recommendations.len()
                        ),
                        json!({
                            "evaluated": outcome.evaluated,
                            "passed_filters": outcome.passed_filters,
                            "selected": outcome.recommendations.len(),
                            "news_signals": outcome.news_signals,
                            "news_events": outcome.news_events,
                            "regime": outcome.regime.label,
                            "regime_adjustment": outcome.regime.adjustment,
                        }),
                    ));
                    state.report.regime = Some(outcome.regime);
                    outcome.recommendations
                }
                Err(e) => {
                    state.record(timer.failed(e, None, json!({ "snapshots": snapshots.len() })));
                    return self.finish(state);
                }
            }
        };

        let timer = StageTimer::start(Stage::Allocation);
        match PositionAllocator::new(self.config.portfolio.clone()) {
            Ok(allocator) => {
                let allocated = allocator.allocate(&ranked);
                let summary = allocator.summarize(&allocated);
                state.record(timer.ok(
                    format!(
                        "{} positions, {:.2}% invested",
                        summary.positions,
                        summary.invested_ratio * 100.0
                    ),
                    json!({
                        "positions": summary.positions,
                        "per_position_weight": summary.per_position_weight,
                        "invested_ratio": summary.invested_ratio,
                        "cash_ratio": summary.cash_ratio,
                    }),
                ));
                state.report.recommendations = allocated;
            }
            Err(e) => {
                state.record(timer.failed(e, None, json!({ "ranked": ranked.len() })));
                // Ranked output survives unsized
                state.report.recommendations = ranked
                    .into_iter()
                    .map(AllocatedRecommendation::unallocated)
                    .collect();
            }
        }

        self.finish(state)
    }

    async fn fetch_snapshots(
        &self,
        watchlist: &[String],
        state: &mut RunState,
    ) -> Option<Vec<StockSnapshot>> {
        let timer = StageTimer::start(Stage::MarketData);
        match self.market.get_snapshots(watchlist).await {
            Ok(snapshots) => {
                state.record(timer.ok(
                    format!("{} snapshots for {} symbols", snapshots.len(), watchlist.len()),
                    json!({
                        "provider": self.market.name(),
                        "requested": watchlist.len(),
                        "received": snapshots.len(),
                    }),
                ));
                Some(snapshots)
            }
            Err(e) => {
                state.record(timer.failed(
                    e,
                    None,
                    json!({ "provider": self.market.name(), "requested": watchlist.len() }),
                ));
                None
            }
        }
    }

    /// News failure is absorbed: the run continues without news
    async fn fetch_news(&self, watchlist: &[String], state: &mut RunState) -> Vec<NewsItem> {
        let timer = StageTimer::start(Stage::NewsData);
        match self.news.get_news(watchlist).await {
            Ok(items) => {
                state.record(timer.ok(
                    format!("{} news items", items.len()),
                    json!({ "provider": self.news.name(), "items": items.len() }),
                ));
                items
            }
            Err(e) => {
                state.record(timer.failed(
                    e,
                    Some("continuing without news; neutral news scores applied".to_string()),
                    json!({ "provider": self.news.name(), "items": 0 }),
                ));
                Vec::new()
            }
        }
    }

    fn finish(&self, state: RunState) -> ScanReport {
        let report = state.report;
        match report.status {
            RunStatus::Failed => tracing::error!(
                "Scan failed at stage {}",
                report.failed_stage.map(|s| s.as_str()).unwrap_or("unknown")
            ),
            status => tracing::info!(
                "Scan finished ({:?}) with {} recommendations",
                status,
                report.recommendations.len()
            ),
        }
        report
    }
}
