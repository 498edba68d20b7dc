//! scan-runner: run one watchlist scan and write the report.
//!
//! Usage:
//!   cargo run -p scan-runner -- --watchlist watchlist.txt
//!   cargo run -p scan-runner -- --watchlist watchlist.txt --topn 3 --output-dir reports
//!   cargo run -p scan-runner -- --watchlist watchlist.txt --market-provider json:data/snapshots.json --news-provider none

use anyhow::{Context, Result};
use chrono::Utc;
use scan_core::ScanConfig;
use scan_orchestrator::{write_report, ScanPipeline};
use scan_providers::{build_market_provider, build_news_provider};
use std::path::{Path, PathBuf};

const DEFAULT_MARKET_PROVIDER: &str = "mock";
const DEFAULT_NEWS_PROVIDER: &str = "auto";
const DEFAULT_OUTPUT_DIR: &str = "reports";

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// One symbol per line; blank lines and `#` comments are skipped, repeats keep the first
fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for line in raw.lines() {
        let symbol = line.trim();
        if symbol.is_empty() || symbol.starts_with('#') {
            continue;
        }
        if !symbols.iter().any(|s| s == symbol) {
            symbols.push(symbol.to_string());
        }
    }
    symbols
}

async fn read_watchlist(path: &Path) -> Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read watchlist {}", path.display()))?;
    Ok(parse_watchlist(&raw))
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  scan-runner --watchlist FILE [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --topn N               Recommendations to keep (default: portfolio max_positions)");
    eprintln!("  --market-provider K    mock | json:PATH (default: {})", DEFAULT_MARKET_PROVIDER);
    eprintln!("  --news-provider K      auto | mock | none | json:PATH (default: {})", DEFAULT_NEWS_PROVIDER);
    eprintln!("  --output-dir DIR       Report directory (default: {})", DEFAULT_OUTPUT_DIR);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(watchlist_path) = arg_value(&args, "--watchlist") else {
        print_usage();
        std::process::exit(1);
    };

    let config = ScanConfig::from_env().context("invalid scan configuration")?;

    let topn: usize = match arg_value(&args, "--topn") {
        Some(v) => v.parse().with_context(|| format!("invalid --topn value: {v}"))?,
        None => config.portfolio.max_positions,
    };
    let market_kind = arg_value(&args, "--market-provider").unwrap_or(DEFAULT_MARKET_PROVIDER);
    let news_kind = arg_value(&args, "--news-provider").unwrap_or(DEFAULT_NEWS_PROVIDER);
    let output_dir = PathBuf::from(arg_value(&args, "--output-dir").unwrap_or(DEFAULT_OUTPUT_DIR));

    let watchlist = read_watchlist(Path::new(watchlist_path)).await?;
    if watchlist.is_empty() {
        anyhow::bail!("watchlist {} contains no symbols", watchlist_path);
    }
    tracing::info!("Loaded {} symbols from {}", watchlist.len(), watchlist_path);

    let market = build_market_provider(market_kind)?;
    let news = build_news_provider(news_kind, market_kind)?;

    let pipeline = ScanPipeline::new(market, news, config);
    let report = pipeline.run(&watchlist, topn, Utc::now()).await;

    for diag in &report.diagnostics {
        tracing::info!(
            "[{}] {:?} in {:.1}ms {}{}",
            diag.stage,
            diag.status,
            diag.duration_ms,
            diag.detail.as_deref().unwrap_or(""),
            diag.error.as_deref().map(|e| format!(" error: {e}")).unwrap_or_default()
        );
    }

    for (rank, rec) in report.recommendations.iter().enumerate() {
        let r = &rec.recommendation;
        tracing::info!(
            "#{} {} {} total {:.2} weight {} | {} | risk: {} | news: {}",
            rank + 1,
            r.symbol,
            r.name,
            r.total_score,
            rec.suggested_weight
                .map(|w| format!("{:.2}%", w * 100.0))
                .unwrap_or_else(|| "-".to_string()),
            r.reason,
            r.risk_note,
            r.news_summary
        );
    }

    let path = write_report(&report, &output_dir).await?;
    println!("{}", path.display());

    if report.is_failed() {
        tracing::error!("Scan failed; see diagnostics in {}", path.display());
        std::process::exit(1);
    }
    Ok(())
}
