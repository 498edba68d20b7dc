//! Market regime from cross-sectional breadth of the current scan.

use scan_core::{round_to, RegimePolicy, RegimeSignal, StockSnapshot};

pub const RISK_ON: &str = "risk_on";
pub const RISK_OFF: &str = "risk_off";
pub const NEUTRAL: &str = "neutral";
pub const UNKNOWN: &str = "unknown";

/// Classify the scan's breadth into a single adjustment shared by every candidate
pub fn market_regime_signal(snapshots: &[StockSnapshot], policy: &RegimePolicy) -> RegimeSignal {
    let changes: Vec<f64> = snapshots
        .iter()
        .filter_map(|s| s.pct_chg_20d)
        .filter(|c| c.is_finite())
        .collect();

    if changes.is_empty() || changes.len() < policy.min_samples {
        return RegimeSignal {
            label: UNKNOWN.to_string(),
            adjustment: 0.0,
            breadth: 0.0,
            avg_pct_chg_20d: 0.0,
            sample_size: changes.len(),
        };
    }

    let advancers = changes.iter().filter(|c| **c > 0.0).count() as f64;
    let decliners = changes.iter().filter(|c| **c < 0.0).count() as f64;
    let sampled = changes.len() as f64;
    let breadth = (advancers - decliners) / sampled;
    let avg = changes.iter().sum::<f64>() / sampled;

    let (label, adjustment) = if breadth >= policy.breadth_threshold {
        (RISK_ON, policy.risk_on_adjustment)
    } else if breadth <= -policy.breadth_threshold {
        (RISK_OFF, policy.risk_off_adjustment)
    } else {
        (NEUTRAL, 0.0)
    };

    tracing::info!(
        "Market regime {} (breadth {:.2}, avg 20d change {:.2}%, {} samples)",
        label,
        breadth,
        avg,
        changes.len()
    );

    RegimeSignal {
        label: label.to_string(),
        adjustment,
        breadth: round_to(breadth, 4),
        avg_pct_chg_20d: round_to(avg, 2),
        sample_size: changes.len(),
    }
}
