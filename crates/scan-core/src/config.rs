use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::ScanError;

/// Factor weights for the total score (conventionally sum to 1.0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub valuation: f64, // 0.30
    pub quality: f64,   // 0.25
    pub catalyst: f64,  // 0.25
    pub trend: f64,     // 0.20
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            valuation: 0.30,
            quality: 0.25,
            catalyst: 0.25,
            trend: 0.20,
        }
    }
}

/// Risk rules and inclusion filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Below this price the penny-stock penalty applies
    pub min_price: f64,
    /// Below this ROE the profitability penalty applies
    pub min_roe: f64,
    /// Above this PE the valuation penalty applies
    pub max_pe: f64,
    /// Candidates with a larger risk penalty are dropped
    pub max_risk_penalty: f64,
    pub min_total_score: f64,
    /// Momentum-chasing guard on the 20-day change, percent
    pub max_20d_chg_for_entry: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_price: 2.0,
            min_roe: 3.0,
            max_pe: 80.0,
            max_risk_penalty: 30.0,
            min_total_score: 55.0,
            max_20d_chg_for_entry: 25.0,
        }
    }
}

/// Structured news event extraction and fusion policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPolicy {
    pub event_half_life_hours: f64,
    pub event_impact_scale: f64,
    pub structured_weight_base: f64,
    pub structured_weight_step: f64,
    pub structured_weight_max: f64,
    /// Keyword weight used when a symbol has no news events at all
    pub keyword_weight_base: f64,
}

impl Default for NewsPolicy {
    fn default() -> Self {
        Self {
            event_half_life_hours: 36.0,
            event_impact_scale: 18.0,
            structured_weight_base: 0.35,
            structured_weight_step: 0.10,
            structured_weight_max: 0.70,
            keyword_weight_base: 0.65,
        }
    }
}

/// Market breadth regime policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimePolicy {
    pub breadth_threshold: f64,
    pub risk_on_adjustment: f64,
    pub risk_off_adjustment: f64,
    /// Snapshots with a known 20-day change required before a regime is called
    pub min_samples: usize,
}

impl Default for RegimePolicy {
    fn default() -> Self {
        Self {
            breadth_threshold: 0.30,
            risk_on_adjustment: 3.0,
            risk_off_adjustment: -5.0,
            min_samples: 1,
        }
    }
}

/// Model portfolio construction policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPolicy {
    pub max_positions: usize,
    pub cash_buffer_ratio: f64,
    pub max_position_ratio: f64,
    pub stop_loss_ratio: f64,
    pub take_profit_ratio: f64,
    pub trailing_stop_ratio: f64,
}

impl Default for PortfolioPolicy {
    fn default() -> Self {
        Self {
            max_positions: 5,
            cash_buffer_ratio: 0.20,
            max_position_ratio: 0.30,
            stop_loss_ratio: 0.08,
            take_profit_ratio: 0.20,
            trailing_stop_ratio: 0.10,
        }
    }
}

/// Every weight, threshold and policy value a scan reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub weights: ScoreWeights,
    pub thresholds: Thresholds,
    pub news: NewsPolicy,
    pub regime: RegimePolicy,
    pub portfolio: PortfolioPolicy,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => {
            tracing::debug!("{} overridden from environment: {}", key, raw);
            raw.trim()
                .parse()
                .with_context(|| format!("{key} is not a valid value: {raw}"))
        }
        Err(_) => Ok(default),
    }
}

impl ScanConfig {
    /// Defaults overridden by `ALPHA_*` environment variables
    pub fn from_env() -> Result<Self> {
        let d = Self::default();

        let config = Self {
            weights: ScoreWeights {
                valuation: env_or("ALPHA_WEIGHT_VALUATION", d.weights.valuation)?,
                quality: env_or("ALPHA_WEIGHT_QUALITY", d.weights.quality)?,
                catalyst: env_or("ALPHA_WEIGHT_CATALYST", d.weights.catalyst)?,
                trend: env_or("ALPHA_WEIGHT_TREND", d.weights.trend)?,
            },
            thresholds: Thresholds {
                min_price: env_or("ALPHA_MIN_PRICE", d.thresholds.min_price)?,
                min_roe: env_or("ALPHA_MIN_ROE", d.thresholds.min_roe)?,
                max_pe: env_or("ALPHA_MAX_PE", d.thresholds.max_pe)?,
                max_risk_penalty: env_or("ALPHA_MAX_RISK_PENALTY", d.thresholds.max_risk_penalty)?,
                min_total_score: env_or("ALPHA_MIN_TOTAL_SCORE", d.thresholds.min_total_score)?,
                max_20d_chg_for_entry: env_or("ALPHA_MAX_20D_CHG", d.thresholds.max_20d_chg_for_entry)?,
            },
            news: NewsPolicy {
                event_half_life_hours: env_or("ALPHA_NEWS_HALF_LIFE_HOURS", d.news.event_half_life_hours)?,
                event_impact_scale: env_or("ALPHA_NEWS_IMPACT_SCALE", d.news.event_impact_scale)?,
                structured_weight_base: env_or("ALPHA_NEWS_STRUCTURED_BASE", d.news.structured_weight_base)?,
                structured_weight_step: env_or("ALPHA_NEWS_STRUCTURED_STEP", d.news.structured_weight_step)?,
                structured_weight_max: env_or("ALPHA_NEWS_STRUCTURED_MAX", d.news.structured_weight_max)?,
                keyword_weight_base: env_or("ALPHA_NEWS_KEYWORD_BASE", d.news.keyword_weight_base)?,
            },
            regime: RegimePolicy {
                breadth_threshold: env_or("ALPHA_REGIME_BREADTH", d.regime.breadth_threshold)?,
                risk_on_adjustment: env_or("ALPHA_REGIME_RISK_ON", d.regime.risk_on_adjustment)?,
                risk_off_adjustment: env_or("ALPHA_REGIME_RISK_OFF", d.regime.risk_off_adjustment)?,
                min_samples: env_or("ALPHA_REGIME_MIN_SAMPLES", d.regime.min_samples)?,
            },
            portfolio: PortfolioPolicy {
                max_positions: env_or("ALPHA_MAX_POSITIONS", d.portfolio.max_positions)?,
                cash_buffer_ratio: env_or("ALPHA_CASH_BUFFER", d.portfolio.cash_buffer_ratio)?,
                max_position_ratio: env_or("ALPHA_MAX_POSITION_RATIO", d.portfolio.max_position_ratio)?,
                stop_loss_ratio: env_or("ALPHA_STOP_LOSS", d.portfolio.stop_loss_ratio)?,
                take_profit_ratio: env_or("ALPHA_TAKE_PROFIT", d.portfolio.take_profit_ratio)?,
                trailing_stop_ratio: env_or("ALPHA_TRAILING_STOP", d.portfolio.trailing_stop_ratio)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Full check: scoring policy plus portfolio policy
    pub fn validate(&self) -> Result<(), ScanError> {
        self.validate_scoring()?;
        self.portfolio.validate()
    }

    /// Weights, thresholds, news and regime policy. Everything ranking depends on.
    pub fn validate_scoring(&self) -> Result<(), ScanError> {
        let w = &self.weights;
        for (name, value) in [
            ("weights.valuation", w.valuation),
            ("weights.quality", w.quality),
            ("weights.catalyst", w.catalyst),
            ("weights.trend", w.trend),
            ("thresholds.max_risk_penalty", self.thresholds.max_risk_penalty),
            ("thresholds.min_total_score", self.thresholds.min_total_score),
            ("thresholds.max_20d_chg_for_entry", self.thresholds.max_20d_chg_for_entry),
            ("news.event_impact_scale", self.news.event_impact_scale),
            ("regime.risk_on_adjustment", self.regime.risk_on_adjustment),
            ("regime.risk_off_adjustment", self.regime.risk_off_adjustment),
        ] {
            if !value.is_finite() {
                return Err(ScanError::InvalidPolicy(format!("{name} must be finite")));
            }
        }

        if !(self.news.event_half_life_hours > 0.0) {
            return Err(ScanError::InvalidPolicy(
                "news.event_half_life_hours must be > 0".to_string(),
            ));
        }

        for (name, value) in [
            ("news.structured_weight_base", self.news.structured_weight_base),
            ("news.structured_weight_step", self.news.structured_weight_step),
            ("news.structured_weight_max", self.news.structured_weight_max),
            ("news.keyword_weight_base", self.news.keyword_weight_base),
            ("regime.breadth_threshold", self.regime.breadth_threshold),
        ] {
            check_unit_ratio(name, value)?;
        }

        Ok(())
    }
}

impl PortfolioPolicy {
    /// Bounds shared by config validation and the allocator
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_positions == 0 {
            return Err(ScanError::InvalidPolicy(
                "portfolio.max_positions must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.cash_buffer_ratio) {
            return Err(ScanError::InvalidPolicy(format!(
                "portfolio.cash_buffer_ratio must be >= 0 and < 1, got {}",
                self.cash_buffer_ratio
            )));
        }
        if !(self.max_position_ratio > 0.0 && self.max_position_ratio <= 1.0) {
            return Err(ScanError::InvalidPolicy(format!(
                "portfolio.max_position_ratio must be > 0 and <= 1, got {}",
                self.max_position_ratio
            )));
        }
        for (name, value) in [
            ("portfolio.stop_loss_ratio", self.stop_loss_ratio),
            ("portfolio.take_profit_ratio", self.take_profit_ratio),
            ("portfolio.trailing_stop_ratio", self.trailing_stop_ratio),
        ] {
            check_unit_ratio(name, value)?;
        }
        Ok(())
    }
}

fn check_unit_ratio(name: &str, value: f64) -> Result<(), ScanError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScanError::InvalidPolicy(format!(
            "{name} must be between 0 and 1, got {value}"
        )));
    }
    Ok(())
}
