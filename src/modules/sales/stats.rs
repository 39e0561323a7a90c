//! Pipeline statistics and funnel

use super::model::{Deal, DealStage};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesStats {
    pub total: usize,
    pub open: usize,
    pub won: usize,
    pub lost: usize,
    /// Sum of open deal values
    pub pipeline_value: f64,
    /// Sum of `value * probability / 100` over open deals
    pub weighted_pipeline: f64,
    pub won_value: f64,
    pub total_value: f64,
    /// `won / (won + lost) * 100`, 0 with no closed deals
    pub win_rate: f64,
    /// Mean value of open deals
    pub avg_deal_size: f64,
}

impl SalesStats {
    pub fn compute(deals: &[Deal]) -> Self {
        let open: Vec<&Deal> = deals.iter().filter(|d| d.status.is_open()).collect();
        let won: Vec<&Deal> = deals
            .iter()
            .filter(|d| d.status == DealStage::ClosedWon)
            .collect();
        let lost = deals
            .iter()
            .filter(|d| d.status == DealStage::ClosedLost)
            .count();

        let pipeline_value: f64 = open.iter().map(|d| d.value).sum();
        let closed = won.len() + lost;

        Self {
            total: deals.len(),
            open: open.len(),
            won: won.len(),
            lost,
            pipeline_value,
            weighted_pipeline: open.iter().map(|d| d.weighted_value()).sum(),
            won_value: won.iter().map(|d| d.value).sum(),
            total_value: deals.iter().map(|d| d.value).sum(),
            win_rate: if closed == 0 {
                0.0
            } else {
                won.len() as f64 / closed as f64 * 100.0
            },
            avg_deal_size: if open.is_empty() {
                0.0
            } else {
                pipeline_value / open.len() as f64
            },
        }
    }
}

/// One bar of the funnel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: DealStage,
    pub count: usize,
    pub amount: f64,
}

/// Count and amount per stage, every stage present, in funnel order
pub fn funnel(deals: &[Deal]) -> Vec<FunnelStage> {
    DealStage::FUNNEL
        .iter()
        .map(|stage| {
            let in_stage = deals.iter().filter(|d| d.status == *stage);
            let (count, amount) = in_stage.fold((0, 0.0), |(n, sum), d| (n + 1, sum + d.value));
            FunnelStage {
                stage: *stage,
                count,
                amount,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sales::model::DealPriority;

    fn deal(stage: DealStage, value: f64, probability: u8) -> Deal {
        Deal::new(
            format!("{} deal", stage),
            stage,
            None,
            "Umbrella".into(),
            None,
            None,
            None,
            value,
            "USD".into(),
            probability,
            DealPriority::Medium,
            None,
            None,
            vec![],
            None,
            None,
            None,
            None,
        )
    }

    fn sample() -> Vec<Deal> {
        vec![
            deal(DealStage::Lead, 1_000.0, 20),
            deal(DealStage::Proposal, 4_000.0, 50),
            deal(DealStage::ClosedWon, 10_000.0, 100),
            deal(DealStage::ClosedWon, 2_000.0, 100),
            deal(DealStage::ClosedLost, 7_000.0, 0),
        ]
    }

    #[test]
    fn test_stats_match_direct_sums() {
        let deals = sample();
        let stats = SalesStats::compute(&deals);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.won, 2);
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.pipeline_value, 5_000.0);
        assert_eq!(stats.weighted_pipeline, 200.0 + 2_000.0);
        assert_eq!(stats.won_value, 12_000.0);
        assert_eq!(stats.total_value, deals.iter().map(|d| d.value).sum::<f64>());
        assert!((stats.win_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.avg_deal_size, 2_500.0);
    }

    #[test]
    fn test_empty_stats_have_no_division_by_zero() {
        let stats = SalesStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.avg_deal_size, 0.0);
    }

    #[test]
    fn test_funnel_covers_every_stage() {
        let deals = sample();
        let funnel = funnel(&deals);

        assert_eq!(funnel.len(), 6);
        assert_eq!(funnel.iter().map(|f| f.count).sum::<usize>(), deals.len());

        let won = funnel.iter().find(|f| f.stage == DealStage::ClosedWon).unwrap();
        assert_eq!(won.count, 2);
        assert_eq!(won.amount, 12_000.0);

        let qualified = funnel.iter().find(|f| f.stage == DealStage::Qualified).unwrap();
        assert_eq!(qualified.count, 0);
    }
}
