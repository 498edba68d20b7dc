use scan_core::{round_to, AllocatedRecommendation, PortfolioPolicy, Recommendation, ScanError};
use serde::{Deserialize, Serialize};

/// Equal-weight position sizing inside the investable sleeve
///
/// Every selected candidate gets the same fraction:
///   weight = min((1 - cash_buffer_ratio) / count, max_position_ratio)
/// When the cap binds, the remainder stays in cash rather than being
/// redistributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAllocator {
    policy: PortfolioPolicy,
}

/// Totals of an allocation, for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub positions: usize,
    pub per_position_weight: f64,
    pub invested_ratio: f64,
    pub cash_ratio: f64,
}

impl PositionAllocator {
    pub fn new(policy: PortfolioPolicy) -> Result<Self, ScanError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// Informational exit plan attached to every position. Not enforced here.
    pub fn execution_note(&self) -> String {
        format!(
            "stop loss {}% / take profit {}% / trailing stop {}%",
            (self.policy.stop_loss_ratio * 100.0).round() as i64,
            (self.policy.take_profit_ratio * 100.0).round() as i64,
            (self.policy.trailing_stop_ratio * 100.0).round() as i64,
        )
    }

    /// Size an already-ranked list. Re-truncates to `max_positions`; empty in, empty out.
    pub fn allocate(&self, ranked: &[Recommendation]) -> Vec<AllocatedRecommendation> {
        if ranked.is_empty() {
            return Vec::new();
        }

        let selected = &ranked[..ranked.len().min(self.policy.max_positions)];
        let investable_ratio = 1.0 - self.policy.cash_buffer_ratio;
        let per_position = (investable_ratio / selected.len() as f64).min(self.policy.max_position_ratio);
        let weight = floor_weight(per_position);
        let note = self.execution_note();

        tracing::info!(
            "Allocated {} positions at {:.2}% each (cash buffer {:.0}%)",
            selected.len(),
            weight * 100.0,
            self.policy.cash_buffer_ratio * 100.0
        );

        selected
            .iter()
            .map(|rec| rec.with_allocation(weight, note.clone()))
            .collect()
    }

    pub fn summarize(&self, allocated: &[AllocatedRecommendation]) -> AllocationSummary {
        let invested: f64 = allocated.iter().filter_map(|a| a.suggested_weight).sum();
        AllocationSummary {
            positions: allocated.len(),
            per_position_weight: allocated.first().and_then(|a| a.suggested_weight).unwrap_or(0.0),
            invested_ratio: round_to(invested, 4),
            cash_ratio: round_to(1.0 - invested, 4),
        }
    }
}

/// Truncate to 4 decimals so rounding can never push the total past the investable sleeve
fn floor_weight(weight: f64) -> f64 {
    ((weight * 10_000.0) + 1e-9).floor() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;
    use scan_core::ScanConfig;

    fn rec(symbol: &str, total: f64) -> Recommendation {
        Recommendation {
            symbol: symbol.to_string(),
            name: format!("{symbol} Co"),
            total_score: total,
            valuation_score: 80.0,
            quality_score: 60.0,
            catalyst_score: 50.0,
            trend_score: 50.0,
            risk_penalty: 0.0,
            entry_price: 10.0,
            reason: String::new(),
            risk_note: "no significant risk".to_string(),
            regime_adjustment: 0.0,
            news_score: 50.0,
            news_event_count: 0,
            news_summary: "no significant news event".to_string(),
            generated_at: Utc::now(),
        }
    }

    fn recs(n: usize) -> Vec<Recommendation> {
        (0..n).map(|i| rec(&format!("00000{i}"), 70.0 - i as f64)).collect()
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let allocator = PositionAllocator::new(PortfolioPolicy::default()).unwrap();
        assert!(allocator.allocate(&[]).is_empty());
    }

    #[test]
    fn test_five_equal_positions() {
        let policy = PortfolioPolicy {
            max_positions: 5,
            cash_buffer_ratio: 0.2,
            max_position_ratio: 0.3,
            ..PortfolioPolicy::default()
        };
        let allocator = PositionAllocator::new(policy).unwrap();
        let allocated = allocator.allocate(&recs(5));
        assert_eq!(allocated.len(), 5);
        for a in &allocated {
            assert_relative_eq!(a.suggested_weight.unwrap(), 0.16, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cap_binds_and_leaves_cash() {
        let allocator = PositionAllocator::new(PortfolioPolicy::default()).unwrap();
        let allocated = allocator.allocate(&recs(2));
        // 0.8 / 2 = 0.4, capped at 0.3
        for a in &allocated {
            assert_relative_eq!(a.suggested_weight.unwrap(), 0.3, epsilon = 1e-9);
        }
        let summary = allocator.summarize(&allocated);
        assert_relative_eq!(summary.invested_ratio, 0.6, epsilon = 1e-9);
        assert_relative_eq!(summary.cash_ratio, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_weights_within_bounds() {
        let policy = PortfolioPolicy::default();
        for n in 1..=9 {
            let allocator = PositionAllocator::new(policy.clone()).unwrap();
            let allocated = allocator.allocate(&recs(n));
            assert!(allocated.len() <= policy.max_positions);
            let total: f64 = allocated.iter().filter_map(|a| a.suggested_weight).sum();
            assert!(total <= 1.0 - policy.cash_buffer_ratio + 1e-6);
            for a in &allocated {
                assert!(a.suggested_weight.unwrap() <= policy.max_position_ratio + 1e-12);
            }
        }
    }

    #[test]
    fn test_truncates_to_max_positions_in_rank_order() {
        let allocator = PositionAllocator::new(PortfolioPolicy { max_positions: 2, ..PortfolioPolicy::default() }).unwrap();
        let allocated = allocator.allocate(&recs(4));
        let symbols: Vec<&str> = allocated.iter().map(|a| a.symbol()).collect();
        assert_eq!(symbols, vec!["000000", "000001"]);
    }

    #[test]
    fn test_execution_note() {
        let allocator = PositionAllocator::new(PortfolioPolicy::default()).unwrap();
        assert_eq!(allocator.execution_note(), "stop loss 8% / take profit 20% / trailing stop 10%");
        let allocated = allocator.allocate(&recs(1));
        assert_eq!(allocated[0].execution_note.as_deref(), Some(allocator.execution_note().as_str()));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let full_cash = PortfolioPolicy { cash_buffer_ratio: 1.0, ..PortfolioPolicy::default() };
        assert!(matches!(PositionAllocator::new(full_cash), Err(ScanError::InvalidPolicy(_))));

        let no_cap = PortfolioPolicy { max_position_ratio: 0.0, ..PortfolioPolicy::default() };
        assert!(PositionAllocator::new(no_cap).is_err());

        let no_slots = PortfolioPolicy { max_positions: 0, ..PortfolioPolicy::default() };
        assert!(PositionAllocator::new(no_slots).is_err());
    }

    #[test]
    fn test_allocator_agrees_with_config_validation() {
        for cash in [0.0, 0.5, 0.99, 1.0, 1.2] {
            let mut config = ScanConfig::default();
            config.portfolio.cash_buffer_ratio = cash;
            assert_eq!(
                config.validate().is_ok(),
                PositionAllocator::new(config.portfolio.clone()).is_ok(),
                "cash buffer {cash}"
            );
        }
    }
}
