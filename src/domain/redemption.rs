use super::amount::{Amount, Balance};
use super::identity::{CampaignId, Height, Principal, VoucherId};
use crate::error::{RedemptionError, Result};
use serde::{Deserialize, Serialize};

/// The engine's record of a redeemed voucher.
///
/// Written once, at the end of a successful redemption, and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub voucher_id: VoucherId,
    pub beneficiary: Principal,
    pub outlet: Principal,
    pub amount: Amount,
    /// Ledger height at which the redemption was committed.
    pub timestamp: Height,
    pub campaign_id: CampaignId,
    pub category: String,
    pub redeemed: bool,
}

/// Running totals for one campaign, created on its first redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub campaign_id: CampaignId,
    pub total_amount: Balance,
    pub redemption_count: u64,
}

impl CampaignStats {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            total_amount: Balance::ZERO,
            redemption_count: 0,
        }
    }

    /// Folds one redeemed amount into the totals.
    ///
    /// Leaves the totals untouched and fails if either would overflow.
    pub fn record(&mut self, amount: Amount) -> Result<()> {
        let total_amount = self
            .total_amount
            .checked_add(Balance::from(amount))
            .ok_or_else(|| self.overflow())?;
        let redemption_count = self
            .redemption_count
            .checked_add(1)
            .ok_or_else(|| self.overflow())?;
        self.total_amount = total_amount;
        self.redemption_count = redemption_count;
        Ok(())
    }

    fn overflow(&self) -> RedemptionError {
        RedemptionError::InternalError(
            format!("statistics overflow for campaign {}", self.campaign_id).into(),
        )
    }
}

/// Everything the engine persists locally for one redemption.
///
/// Stores must apply it as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionCommit {
    pub record: RedemptionRecord,
    pub stats: CampaignStats,
    pub total_redemptions: u64,
}

/// Audit event broadcast after every successful redemption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionEvent {
    pub voucher_id: VoucherId,
    pub beneficiary: Principal,
    pub outlet: Principal,
    pub amount: Amount,
}

impl From<&RedemptionRecord> for RedemptionEvent {
    fn from(record: &RedemptionRecord) -> Self {
        Self {
            voucher_id: record.voucher_id,
            beneficiary: record.beneficiary.clone(),
            outlet: record.outlet.clone(),
            amount: record.amount,
        }
    }
}

/// Acknowledgement returned to the beneficiary by a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionReceipt {
    pub voucher_id: VoucherId,
    pub amount: Amount,
    pub fee: Balance,
    pub timestamp: Height,
}
