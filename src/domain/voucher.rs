use super::amount::Balance;
use super::identity::{CampaignId, Height};
use serde::{Deserialize, Serialize};

/// Voucher metadata as reported by the voucher directory.
///
/// `amount` is kept as a raw [`Balance`]: the directory is an external system and
/// the engine validates positivity itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherDetails {
    pub amount: Balance,
    pub expiry: Height,
    pub campaign_id: CampaignId,
    pub category: String,
}

impl VoucherDetails {
    /// A voucher is live strictly before its expiry height.
    pub fn is_expired_at(&self, height: Height) -> bool {
        self.expiry <= height
    }
}

/// Campaign balance as reported by the campaign ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampaignFunds {
    pub available_funds: Balance,
}
