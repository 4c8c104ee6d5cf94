use crate::domain::amount::{Amount, Balance};
use crate::domain::identity::{CampaignId, Height, Principal, VoucherId};
use crate::domain::ports::{
    CampaignLedger, CollaboratorResult, Collaborators, EligibilityRegistry, FeeLedger,
    LedgerClock, OutletRegistry, RedemptionStore, VoucherDirectory,
};
use crate::domain::redemption::{CampaignStats, RedemptionCommit, RedemptionRecord};
use crate::domain::voucher::{CampaignFunds, VoucherDetails};
use crate::error::{CollaboratorError, RedemptionError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct RedemptionState {
    records: HashMap<VoucherId, RedemptionRecord>,
    stats: HashMap<CampaignId, CampaignStats>,
    total_redemptions: u64,
}

/// A thread-safe in-memory redemption store.
///
/// Record, statistics and counter live behind one `RwLock`, so a commit is applied
/// under a single write guard.
#[derive(Default, Clone)]
pub struct InMemoryRedemptionStore {
    state: Arc<RwLock<RedemptionState>>,
}

impl InMemoryRedemptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RedemptionStore for InMemoryRedemptionStore {
    async fn get_redemption(&self, voucher_id: VoucherId) -> Result<Option<RedemptionRecord>> {
        let state = self.state.read().await;
        Ok(state.records.get(&voucher_id).cloned())
    }

    async fn get_campaign_stats(&self, campaign_id: CampaignId) -> Result<Option<CampaignStats>> {
        let state = self.state.read().await;
        Ok(state.stats.get(&campaign_id).cloned())
    }

    async fn all_campaign_stats(&self) -> Result<Vec<CampaignStats>> {
        let state = self.state.read().await;
        Ok(state.stats.values().cloned().collect())
    }

    async fn total_redemptions(&self) -> Result<u64> {
        Ok(self.state.read().await.total_redemptions)
    }

    async fn commit(&self, commit: RedemptionCommit) -> Result<()> {
        let mut state = self.state.write().await;
        state.records.insert(commit.record.voucher_id, commit.record);
        state.stats.insert(commit.stats.campaign_id, commit.stats);
        state.total_redemptions = commit.total_redemptions;
        Ok(())
    }
}

/// Voucher directory fake. Invalidated vouchers disappear from lookups.
#[derive(Default)]
pub struct InMemoryVoucherDirectory {
    vouchers: RwLock<HashMap<VoucherId, VoucherDetails>>,
    fail_lookups: AtomicBool,
    fail_invalidation: AtomicBool,
}

impl InMemoryVoucherDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, voucher_id: VoucherId, details: VoucherDetails) {
        self.vouchers.write().await.insert(voucher_id, details);
    }

    /// Whether the voucher exists and has not been burned.
    pub async fn is_live(&self, voucher_id: VoucherId) -> bool {
        self.vouchers.read().await.contains_key(&voucher_id)
    }

    /// Makes every subsequent `get_details` call fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `invalidate` call fail.
    pub fn fail_invalidation(&self, fail: bool) {
        self.fail_invalidation.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoucherDirectory for InMemoryVoucherDirectory {
    async fn get_details(&self, voucher_id: VoucherId) -> CollaboratorResult<Option<VoucherDetails>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(offline("voucher directory"));
        }
        Ok(self.vouchers.read().await.get(&voucher_id).cloned())
    }

    async fn invalidate(&self, voucher_id: VoucherId) -> CollaboratorResult<()> {
        if self.fail_invalidation.load(Ordering::SeqCst) {
            return Err(offline("voucher directory"));
        }
        self.vouchers
            .write()
            .await
            .remove(&voucher_id)
            .map(|_| ())
            .ok_or(CollaboratorError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryEligibilityRegistry {
    eligible: RwLock<HashSet<Principal>>,
    fail_lookups: AtomicBool,
}

impl InMemoryEligibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_eligible(&self, beneficiary: Principal, eligible: bool) {
        let mut set = self.eligible.write().await;
        if eligible {
            set.insert(beneficiary);
        } else {
            set.remove(&beneficiary);
        }
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EligibilityRegistry for InMemoryEligibilityRegistry {
    async fn is_eligible(&self, beneficiary: &Principal) -> CollaboratorResult<bool> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(offline("eligibility registry"));
        }
        Ok(self.eligible.read().await.contains(beneficiary))
    }
}

#[derive(Default)]
pub struct InMemoryOutletRegistry {
    approvals: RwLock<HashSet<(Principal, String)>>,
    fail_lookups: AtomicBool,
}

impl InMemoryOutletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn approve(&self, outlet: Principal, category: &str) {
        self.approvals
            .write()
            .await
            .insert((outlet, category.to_string()));
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutletRegistry for InMemoryOutletRegistry {
    async fn is_approved(&self, outlet: &Principal, category: &str) -> CollaboratorResult<bool> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(offline("outlet registry"));
        }
        let approvals = self.approvals.read().await;
        Ok(approvals.contains(&(outlet.clone(), category.to_string())))
    }
}

#[derive(Default)]
struct CampaignBooks {
    funds: HashMap<CampaignId, Balance>,
    credited: HashMap<Principal, Balance>,
}

/// Campaign ledger fake tracking campaign balances and what each recipient received.
#[derive(Default)]
pub struct InMemoryCampaignLedger {
    books: RwLock<CampaignBooks>,
    fail_lookups: AtomicBool,
    fail_transfers: AtomicBool,
}

impl InMemoryCampaignLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the available funds of a campaign, creating it if needed.
    pub async fn fund(&self, campaign_id: CampaignId, available: Balance) {
        self.books.write().await.funds.insert(campaign_id, available);
    }

    pub async fn available(&self, campaign_id: CampaignId) -> Option<Balance> {
        self.books.read().await.funds.get(&campaign_id).copied()
    }

    pub async fn credited(&self, recipient: &Principal) -> Balance {
        self.books
            .read()
            .await
            .credited
            .get(recipient)
            .copied()
            .unwrap_or_default()
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CampaignLedger for InMemoryCampaignLedger {
    async fn get_campaign(&self, campaign_id: CampaignId) -> CollaboratorResult<Option<CampaignFunds>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(offline("campaign ledger"));
        }
        let books = self.books.read().await;
        Ok(books
            .funds
            .get(&campaign_id)
            .map(|&available_funds| CampaignFunds { available_funds }))
    }

    async fn transfer(
        &self,
        campaign_id: CampaignId,
        to: &Principal,
        amount: Amount,
    ) -> CollaboratorResult<()> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(offline("campaign ledger"));
        }

        let amount = Balance::from(amount);
        let mut books = self.books.write().await;
        let available = *books
            .funds
            .get(&campaign_id)
            .ok_or(CollaboratorError::NotFound)?;
        if available < amount {
            return Err(CollaboratorError::Rejected(
                "insufficient campaign funds".to_string(),
            ));
        }
        let received = books.credited.get(to).copied().unwrap_or_default();
        let received = credit(received, amount)?;

        books.funds.insert(campaign_id, available - amount);
        books.credited.insert(to.clone(), received);
        Ok(())
    }
}

/// Principal balances used for fee collection.
#[derive(Default)]
pub struct InMemoryFeeLedger {
    balances: RwLock<HashMap<Principal, Balance>>,
}

impl InMemoryFeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn deposit(&self, principal: Principal, amount: Balance) -> CollaboratorResult<()> {
        let mut balances = self.balances.write().await;
        let held = balances.get(&principal).copied().unwrap_or_default();
        balances.insert(principal, credit(held, amount)?);
        Ok(())
    }

    pub async fn balance(&self, principal: &Principal) -> Balance {
        self.balances
            .read()
            .await
            .get(principal)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeeLedger for InMemoryFeeLedger {
    async fn transfer(&self, from: &Principal, to: &Principal, amount: Balance) -> CollaboratorResult<()> {
        let mut balances = self.balances.write().await;
        let available = balances.get(from).copied().unwrap_or_default();
        if available < amount {
            return Err(CollaboratorError::Rejected(format!(
                "{} holds {}, needs {}",
                from, available, amount
            )));
        }
        if from == to {
            return Ok(());
        }
        let received = credit(balances.get(to).copied().unwrap_or_default(), amount)?;

        *balances.entry(from.clone()).or_default() -= amount;
        balances.insert(to.clone(), received);
        Ok(())
    }
}

fn offline(collaborator: &str) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{} offline", collaborator))
}

fn credit(held: Balance, amount: Balance) -> CollaboratorResult<Balance> {
    held.checked_add(amount)
        .ok_or_else(|| CollaboratorError::Rejected("balance overflow".to_string()))
}

/// A clock whose height is set explicitly. It never moves backwards.
#[derive(Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    pub fn new(height: Height) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Moves the clock to `height`. Setting the current height again is a no-op; a
    /// lower height is refused and leaves the clock where it was.
    pub fn set(&self, height: Height) -> Result<()> {
        self.height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (height >= current).then_some(height)
            })
            .map(|_| ())
            .map_err(|current| {
                RedemptionError::ValidationError(format!(
                    "Height {} is below the current ledger height {}",
                    height, current
                ))
            })
    }
}

impl LedgerClock for ManualClock {
    fn height(&self) -> Height {
        self.height.load(Ordering::SeqCst)
    }
}

/// One in-memory instance of every collaborator, kept typed so callers can seed
/// and inspect them.
#[derive(Clone)]
pub struct InMemoryWorld {
    pub vouchers: Arc<InMemoryVoucherDirectory>,
    pub eligibility: Arc<InMemoryEligibilityRegistry>,
    pub outlets: Arc<InMemoryOutletRegistry>,
    pub campaigns: Arc<InMemoryCampaignLedger>,
    pub fees: Arc<InMemoryFeeLedger>,
    pub clock: Arc<ManualClock>,
}

impl InMemoryWorld {
    pub fn new(height: Height) -> Self {
        Self {
            vouchers: Arc::new(InMemoryVoucherDirectory::new()),
            eligibility: Arc::new(InMemoryEligibilityRegistry::new()),
            outlets: Arc::new(InMemoryOutletRegistry::new()),
            campaigns: Arc::new(InMemoryCampaignLedger::new()),
            fees: Arc::new(InMemoryFeeLedger::new()),
            clock: Arc::new(ManualClock::new(height)),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            vouchers: self.vouchers.clone(),
            eligibility: self.eligibility.clone(),
            outlets: self.outlets.clone(),
            campaigns: self.campaigns.clone(),
            fees: self.fees.clone(),
            clock: self.clock.clone(),
        }
    }
}
