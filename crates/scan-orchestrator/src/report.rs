use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scan_core::{AllocatedRecommendation, RegimeSignal, ScanConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::diagnostics::{RunStatus, Stage, StageDiagnostic};

/// Everything a front end needs from one scan. Check `status` before trusting `recommendations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    pub failed_stage: Option<Stage>,
    pub watchlist_size: usize,
    pub topn: usize,
    pub market_provider: String,
    pub news_provider: String,
    /// Policy values in force for this run
    pub policy: ScanConfig,
    pub regime: Option<RegimeSignal>,
    pub diagnostics: Vec<StageDiagnostic>,
    pub recommendations: Vec<AllocatedRecommendation>,
}

impl ScanReport {
    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }

    pub fn diagnostic(&self, stage: Stage) -> Option<&StageDiagnostic> {
        self.diagnostics.iter().find(|d| d.stage == stage)
    }

    pub fn file_name(&self) -> String {
        format!("scan_{}.json", self.generated_at.format("%Y%m%d_%H%M%S"))
    }
}

/// Write the report as pretty JSON into `output_dir`, creating it if needed
pub async fn write_report(report: &ScanReport, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let path = output_dir.join(report.file_name());
    let body = serde_json::to_string_pretty(report).context("failed to serialize scan report")?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!("Scan report written to {}", path.display());
    Ok(path)
}
