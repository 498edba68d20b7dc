use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    MarketData,
    NewsData,
    Ranking,
    Allocation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::MarketData => "market_data",
            Stage::NewsData => "news_data",
            Stage::Ranking => "ranking",
            Stage::Allocation => "allocation",
        }
    }

    /// Whether a failure here can be absorbed with a substitute result
    pub fn is_degradable(&self) -> bool {
        matches!(self, Stage::NewsData)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    Warning,
    Error,
}

/// Overall outcome of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Degraded,
    Failed,
}

impl RunStatus {
    /// Fold a stage outcome into the run status. `Failed` is terminal.
    pub fn absorb(self, stage: Stage, status: StageStatus) -> RunStatus {
        match (self, status) {
            (RunStatus::Failed, _) => RunStatus::Failed,
            (_, StageStatus::Ok) => self,
            (_, StageStatus::Warning) => RunStatus::Degraded,
            (_, StageStatus::Error) if stage.is_degradable() => RunStatus::Degraded,
            (_, StageStatus::Error) => RunStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostic {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Times one stage and turns its outcome into a diagnostic record
pub(crate) struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        tracing::debug!("Stage {} started", stage);
        Self {
            stage,
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() * 1_000_000.0).round() / 1_000.0
    }

    pub fn ok(self, detail: impl Into<String>, metadata: serde_json::Value) -> StageDiagnostic {
        let detail = detail.into();
        tracing::info!("Stage {} ok: {}", self.stage, detail);
        StageDiagnostic {
            stage: self.stage,
            status: StageStatus::Ok,
            duration_ms: self.elapsed_ms(),
            detail: Some(detail),
            error: None,
            metadata,
        }
    }

    /// Degradable stages report a warning with the substitution they made, fatal ones an error
    pub fn failed(
        self,
        error: impl fmt::Display,
        detail: Option<String>,
        metadata: serde_json::Value,
    ) -> StageDiagnostic {
        let status = if self.stage.is_degradable() {
            tracing::warn!("Stage {} degraded: {}", self.stage, error);
            StageStatus::Warning
        } else {
            tracing::error!("Stage {} failed: {}", self.stage, error);
            StageStatus::Error
        };
        StageDiagnostic {
            stage: self.stage,
            status,
            duration_ms: self.elapsed_ms(),
            detail,
            error: Some(error.to_string()),
            metadata,
        }
    }
}
