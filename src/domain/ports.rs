//! Capability interfaces the engine is wired with.
//!
//! The collaborator ports model systems the engine does not own; the store port
//! models the engine's own persistence. All are object-safe so they can be swapped
//! for deterministic fakes in tests.

use super::amount::{Amount, Balance};
use super::identity::{CampaignId, Height, Principal, VoucherId};
use super::redemption::{CampaignStats, RedemptionCommit, RedemptionRecord};
use super::voucher::{CampaignFunds, VoucherDetails};
use crate::error::{CollaboratorError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

#[async_trait]
pub trait VoucherDirectory: Send + Sync {
    /// Returns `Ok(None)` when the directory has no such voucher.
    async fn get_details(&self, voucher_id: VoucherId) -> CollaboratorResult<Option<VoucherDetails>>;
    /// Burns the voucher. Irreversible.
    async fn invalidate(&self, voucher_id: VoucherId) -> CollaboratorResult<()>;
}

#[async_trait]
pub trait EligibilityRegistry: Send + Sync {
    async fn is_eligible(&self, beneficiary: &Principal) -> CollaboratorResult<bool>;
}

#[async_trait]
pub trait OutletRegistry: Send + Sync {
    async fn is_approved(&self, outlet: &Principal, category: &str) -> CollaboratorResult<bool>;
}

#[async_trait]
pub trait CampaignLedger: Send + Sync {
    async fn get_campaign(&self, campaign_id: CampaignId) -> CollaboratorResult<Option<CampaignFunds>>;
    /// Debits the campaign and credits `to`.
    async fn transfer(
        &self,
        campaign_id: CampaignId,
        to: &Principal,
        amount: Amount,
    ) -> CollaboratorResult<()>;
}

/// Moves value between principals; used for fee collection.
#[async_trait]
pub trait FeeLedger: Send + Sync {
    async fn transfer(&self, from: &Principal, to: &Principal, amount: Balance) -> CollaboratorResult<()>;
}

/// Source of the current ledger height.
pub trait LedgerClock: Send + Sync {
    fn height(&self) -> Height;
}

/// Persistence for redemption records, campaign statistics and the global counter.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    async fn get_redemption(&self, voucher_id: VoucherId) -> Result<Option<RedemptionRecord>>;
    async fn get_campaign_stats(&self, campaign_id: CampaignId) -> Result<Option<CampaignStats>>;
    async fn all_campaign_stats(&self) -> Result<Vec<CampaignStats>>;
    async fn total_redemptions(&self) -> Result<u64>;
    /// Writes record, statistics and counter as one unit.
    async fn commit(&self, commit: RedemptionCommit) -> Result<()>;
}

pub type RedemptionStoreBox = Box<dyn RedemptionStore>;

/// The full set of external systems a redemption consults.
#[derive(Clone)]
pub struct Collaborators {
    pub vouchers: Arc<dyn VoucherDirectory>,
    pub eligibility: Arc<dyn EligibilityRegistry>,
    pub outlets: Arc<dyn OutletRegistry>,
    pub campaigns: Arc<dyn CampaignLedger>,
    pub fees: Arc<dyn FeeLedger>,
    pub clock: Arc<dyn LedgerClock>,
}
