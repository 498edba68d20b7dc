//! Sample-size dependent blend of the keyword and structured news scores.

use scan_core::{clamp_score, round_to, NewsPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalystFusion {
    pub score: f64,
    pub keyword_weight: f64,
    pub structured_weight: f64,
}

/// Blend the keyword catalyst with the structured news score.
///
/// The structured weight grows by `structured_weight_step` per event up to
/// `structured_weight_max`. A symbol with no events uses the fixed base weights
/// so the neutral default news score is not over-weighted.
pub fn fuse_catalyst(keyword_score: f64, news_score: f64, event_count: usize, policy: &NewsPolicy) -> CatalystFusion {
    let (keyword_weight, structured_weight) = if event_count == 0 {
        (policy.keyword_weight_base, policy.structured_weight_base)
    } else {
        let structured = policy
            .structured_weight_max
            .min(policy.structured_weight_base + event_count as f64 * policy.structured_weight_step);
        ((1.0 - structured).max(0.0), structured)
    };

    CatalystFusion {
        score: round_to(clamp_score(keyword_score * keyword_weight + news_score * structured_weight), 2),
        keyword_weight,
        structured_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_no_events_uses_base_weights() {
        let policy = NewsPolicy {
            keyword_weight_base: 0.5,
            ..NewsPolicy::default()
        };
        let fused = fuse_catalyst(50.0, 50.0, 0, &policy);
        assert_relative_eq!(fused.keyword_weight, 0.5);
        assert_relative_eq!(fused.structured_weight, 0.35);
        // 50 * 0.5 + 50 * 0.35
        assert_relative_eq!(fused.score, 42.5);
    }

    #[test]
    fn test_structured_weight_grows_with_events() {
        let policy = NewsPolicy::default();
        let one = fuse_catalyst(60.0, 80.0, 1, &policy);
        assert_relative_eq!(one.structured_weight, 0.45, epsilon = 1e-9);
        assert_relative_eq!(one.keyword_weight, 0.55, epsilon = 1e-9);
        assert_relative_eq!(one.score, 69.0, epsilon = 1e-9);

        let two = fuse_catalyst(60.0, 80.0, 2, &policy);
        assert!(two.structured_weight > one.structured_weight);
    }

    #[test]
    fn test_structured_weight_is_capped() {
        let policy = NewsPolicy::default();
        let fused = fuse_catalyst(40.0, 90.0, 50, &policy);
        assert_relative_eq!(fused.structured_weight, 0.70);
        assert_relative_eq!(fused.keyword_weight, 0.30, epsilon = 1e-9);
    }
}
