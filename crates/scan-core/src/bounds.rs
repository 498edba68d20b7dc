//! Shared bounding and rounding helpers for 0-100 scores.

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Neutral midpoint used whenever a score has no evidence either way.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Clamp `value` into `[low, high]`. NaN collapses to `low`.
pub fn clamp_to(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        return low;
    }
    value.max(low).min(high)
}

/// Clamp into the default score range `[0, 100]`.
pub fn clamp_score(value: f64) -> f64 {
    clamp_to(value, SCORE_MIN, SCORE_MAX)
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
