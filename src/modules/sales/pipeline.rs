//! Fixed stage table of the sales pipeline
//!
//! ```text
//! lead(20) -> qualified(40) -> proposal(60) -> negotiation(80) -> closed_won(100)
//!                                                               closed_lost(0)
//! ```

use super::model::{Deal, DealStage};
use chrono::Utc;

impl DealStage {
    /// Open stages in pipeline order, followed by the winning stage
    pub const PIPELINE: [DealStage; 5] = [
        DealStage::Lead,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
    ];

    /// Every stage in funnel order
    pub const FUNNEL: [DealStage; 6] = [
        DealStage::Lead,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    /// Successor stage; `None` for terminal stages
    pub fn next(self) -> Option<DealStage> {
        match self {
            DealStage::Lead => Some(DealStage::Qualified),
            DealStage::Qualified => Some(DealStage::Proposal),
            DealStage::Proposal => Some(DealStage::Negotiation),
            DealStage::Negotiation => Some(DealStage::ClosedWon),
            DealStage::ClosedWon | DealStage::ClosedLost => None,
        }
    }

    pub fn default_probability(self) -> u8 {
        match self {
            DealStage::Lead => 20,
            DealStage::Qualified => 40,
            DealStage::Proposal => 60,
            DealStage::Negotiation => 80,
            DealStage::ClosedWon => 100,
            DealStage::ClosedLost => 0,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

/// Move a deal to `stage`, resetting probability and the won/lost stamps
pub fn move_to(deal: &mut Deal, stage: DealStage) {
    let now = Utc::now();
    deal.probability = stage.default_probability();
    match stage {
        DealStage::ClosedWon => {
            deal.won_at = Some(now);
            deal.lost_at = None;
        }
        DealStage::ClosedLost => {
            deal.lost_at = Some(now);
            deal.won_at = None;
        }
        _ => {
            deal.won_at = None;
            deal.lost_at = None;
        }
    }
    deal.set_status(stage);
}

/// Advance one stage. Returns `false` (deal untouched) on a terminal stage.
pub fn advance(deal: &mut Deal) -> bool {
    match deal.status.next() {
        Some(next) => {
            move_to(deal, next);
            true
        }
        None => false,
    }
}
