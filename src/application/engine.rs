use crate::domain::amount::{Amount, Balance};
use crate::domain::config::EngineConfig;
use crate::domain::identity::{CampaignId, Principal, VoucherId};
use crate::domain::ports::{CollaboratorResult, Collaborators, RedemptionStoreBox};
use crate::domain::redemption::{
    CampaignStats, RedemptionCommit, RedemptionEvent, RedemptionReceipt, RedemptionRecord,
};
use crate::error::{RedemptionError, Result};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Owner-mutable settings and the global counter, guarded together.
#[derive(Debug)]
struct Settings {
    fee: Balance,
    rate_ceiling: u64,
    total_redemptions: u64,
}

/// Coordinates voucher redemptions against the external collaborators.
///
/// A single mutex over [`Settings`] is held for the whole of a redemption, so
/// redemptions are applied one at a time and no caller observes a half-applied
/// one. Read queries that only touch the store do not take the lock.
pub struct RedemptionEngine {
    owner: Principal,
    settings: Mutex<Settings>,
    collaborators: Collaborators,
    store: RedemptionStoreBox,
    events: broadcast::Sender<RedemptionEvent>,
}

impl RedemptionEngine {
    /// Creates an engine, restoring the global redemption counter from `store`.
    ///
    /// # Arguments
    ///
    /// * `config` - Owner identity and the initial fee and rate ceiling.
    /// * `collaborators` - The external systems consulted during a redemption.
    /// * `store` - Persistence for records, statistics and the counter.
    pub async fn open(
        config: EngineConfig,
        collaborators: Collaborators,
        store: RedemptionStoreBox,
    ) -> Result<Self> {
        config.validate()?;
        let total_redemptions = store.total_redemptions().await?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            owner = %config.owner,
            fee = %config.fee,
            rate_ceiling = config.rate_ceiling,
            total_redemptions,
            "redemption engine opened"
        );

        Ok(Self {
            owner: config.owner,
            settings: Mutex::new(Settings {
                fee: config.fee,
                rate_ceiling: config.rate_ceiling,
                total_redemptions,
            }),
            collaborators,
            store,
            events,
        })
    }

    /// Subscribes to the audit stream of successful redemptions.
    pub fn subscribe(&self) -> broadcast::Receiver<RedemptionEvent> {
        self.events.subscribe()
    }

    /// Redeems `voucher_id` on behalf of `caller`, paying the voucher amount to `outlet`.
    ///
    /// Checks run in a fixed order and the first failure is returned. Side effects
    /// start only after every check has passed: the voucher is burned, the fee is
    /// collected, the campaign pays the outlet, and only then are the record,
    /// statistics and counter written locally.
    #[tracing::instrument(skip_all, fields(caller = %caller, voucher = %voucher_id, outlet = %outlet))]
    pub async fn redeem(
        &self,
        caller: &Principal,
        voucher_id: VoucherId,
        outlet: &Principal,
    ) -> Result<RedemptionReceipt> {
        let mut settings = self.settings.lock().await;
        let result = self
            .redeem_locked(&mut settings, caller, voucher_id, outlet)
            .await;

        if let Err(e) = &result
            && let Some(code) = e.code()
        {
            warn!(code, "redemption rejected: {}", e);
        }
        result
    }

    async fn redeem_locked(
        &self,
        settings: &mut Settings,
        caller: &Principal,
        voucher_id: VoucherId,
        outlet: &Principal,
    ) -> Result<RedemptionReceipt> {
        let c = &self.collaborators;

        if let Some(record) = self.store.get_redemption(voucher_id).await?
            && record.redeemed
        {
            return Err(RedemptionError::AlreadyRedeemed);
        }

        let details = match c.vouchers.get_details(voucher_id).await {
            Ok(Some(details)) => details,
            Ok(None) => return Err(RedemptionError::InvalidVoucher),
            Err(e) => {
                warn!(error = %e, "voucher directory lookup failed");
                return Err(RedemptionError::InvalidVoucher);
            }
        };

        let height = c.clock.height();
        if details.is_expired_at(height) {
            return Err(RedemptionError::Expired);
        }

        let amount = Amount::try_from(details.amount)?;

        // Cumulative counter, compared before it is incremented.
        if settings.total_redemptions >= settings.rate_ceiling {
            return Err(RedemptionError::RateExceeded);
        }

        require(
            c.eligibility.is_eligible(caller).await,
            RedemptionError::IneligibleBeneficiary,
        )?;
        require(
            c.outlets.is_approved(outlet, &details.category).await,
            RedemptionError::OutletNotApproved,
        )?;
        self.require_funds(details.campaign_id, amount).await?;
        debug!(%amount, campaign = %details.campaign_id, height, "all redemption checks passed");

        // Settled before any external effect; an overflow leaves nothing applied.
        let mut stats = self
            .store
            .get_campaign_stats(details.campaign_id)
            .await?
            .unwrap_or_else(|| CampaignStats::new(details.campaign_id));
        stats.record(amount)?;
        let total_redemptions = settings.total_redemptions + 1;

        c.vouchers.invalidate(voucher_id).await.map_err(|e| {
            error!(error = %e, "voucher invalidation failed");
            RedemptionError::InvalidationRejected(e)
        })?;

        let fee = settings.fee;
        if !fee.is_zero() {
            c.fees.transfer(caller, &self.owner, fee).await.map_err(|e| {
                error!(error = %e, %fee, "fee collection failed after voucher invalidation");
                RedemptionError::FeeTransferRejected(e)
            })?;
        }

        c.campaigns
            .transfer(details.campaign_id, outlet, amount)
            .await
            .map_err(|e| {
                error!(error = %e, %amount, "campaign transfer failed after voucher invalidation");
                RedemptionError::FundTransferRejected(e)
            })?;

        let record = RedemptionRecord {
            voucher_id,
            beneficiary: caller.clone(),
            outlet: outlet.clone(),
            amount,
            timestamp: height,
            campaign_id: details.campaign_id,
            category: details.category,
            redeemed: true,
        };

        let event = RedemptionEvent::from(&record);
        self.store
            .commit(RedemptionCommit {
                record,
                stats,
                total_redemptions,
            })
            .await
            .inspect_err(|e| error!(error = %e, "external effects applied but local commit failed"))?;
        settings.total_redemptions = total_redemptions;

        info!(%amount, %fee, height, total_redemptions, "voucher redeemed");
        // No subscribers is not an error.
        let _ = self.events.send(event);

        Ok(RedemptionReceipt {
            voucher_id,
            amount,
            fee,
            timestamp: height,
        })
    }

    async fn require_funds(&self, campaign_id: CampaignId, amount: Amount) -> Result<()> {
        match self.collaborators.campaigns.get_campaign(campaign_id).await {
            Ok(Some(funds)) if funds.available_funds >= Balance::from(amount) => Ok(()),
            Ok(Some(_)) => Err(RedemptionError::InsufficientFunds),
            Ok(None) => {
                warn!(campaign = %campaign_id, "campaign not found in ledger");
                Err(RedemptionError::InsufficientFunds)
            }
            Err(e) => {
                warn!(campaign = %campaign_id, error = %e, "campaign ledger lookup failed");
                Err(RedemptionError::InsufficientFunds)
            }
        }
    }

    /// Lets the outlet confirm a redemption it received funds for.
    ///
    /// Mutates nothing. Returns the redemption record on success.
    pub async fn confirm_receipt(
        &self,
        caller: &Principal,
        voucher_id: VoucherId,
    ) -> Result<RedemptionRecord> {
        let record = self
            .store
            .get_redemption(voucher_id)
            .await?
            .ok_or(RedemptionError::UnknownVoucher)?;

        if &record.outlet != caller {
            return Err(RedemptionError::NotTheOutlet);
        }
        if !record.redeemed {
            return Err(RedemptionError::NotYetRedeemed);
        }

        debug!(voucher = %voucher_id, outlet = %caller, "receipt confirmed");
        Ok(record)
    }

    pub async fn set_fee(&self, caller: &Principal, new_fee: Balance) -> Result<()> {
        self.ensure_owner(caller)?;
        if new_fee.is_negative() {
            return Err(RedemptionError::InvalidAmount);
        }

        let mut settings = self.settings.lock().await;
        settings.fee = new_fee;
        info!(fee = %new_fee, "fee updated");
        Ok(())
    }

    pub async fn set_rate_ceiling(&self, caller: &Principal, new_ceiling: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        if new_ceiling == 0 {
            return Err(RedemptionError::InvalidAmount);
        }

        let mut settings = self.settings.lock().await;
        settings.rate_ceiling = new_ceiling;
        info!(rate_ceiling = new_ceiling, "rate ceiling updated");
        Ok(())
    }

    fn ensure_owner(&self, caller: &Principal) -> Result<()> {
        if caller == &self.owner {
            Ok(())
        } else {
            warn!(caller = %caller, "configuration change refused");
            Err(RedemptionError::NotAuthorized)
        }
    }

    pub async fn get_redemption(&self, voucher_id: VoucherId) -> Result<Option<RedemptionRecord>> {
        self.store.get_redemption(voucher_id).await
    }

    pub async fn get_campaign_stats(&self, campaign_id: CampaignId) -> Result<Option<CampaignStats>> {
        self.store.get_campaign_stats(campaign_id).await
    }

    /// Statistics for every campaign with at least one redemption, ordered by id.
    pub async fn all_campaign_stats(&self) -> Result<Vec<CampaignStats>> {
        let mut stats = self.store.all_campaign_stats().await?;
        stats.sort_by_key(|s| s.campaign_id);
        Ok(stats)
    }

    pub async fn get_total_redemptions(&self) -> u64 {
        self.settings.lock().await.total_redemptions
    }

    pub async fn get_fee(&self) -> Balance {
        self.settings.lock().await.fee
    }

    pub async fn get_rate_ceiling(&self) -> u64 {
        self.settings.lock().await.rate_ceiling
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }
}

/// Turns a boolean collaborator check into a rejection. Errors count as a failed check.
fn require(outcome: CollaboratorResult<bool>, rejection: RedemptionError) -> Result<()> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(rejection),
        Err(e) => {
            warn!(error = %e, "collaborator check failed");
            Err(rejection)
        }
    }
}
