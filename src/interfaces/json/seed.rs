use crate::domain::amount::Balance;
use crate::domain::config::EngineConfig;
use crate::domain::identity::{CampaignId, Height, Principal, VoucherId};
use crate::domain::voucher::VoucherDetails;
use crate::error::{RedemptionError, Result};
use crate::infrastructure::in_memory::InMemoryWorld;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedVoucher {
    pub id: VoucherId,
    pub amount: Balance,
    pub expiry: Height,
    pub campaign_id: CampaignId,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedApproval {
    pub outlet: Principal,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCampaign {
    pub id: CampaignId,
    pub available_funds: Balance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedBalance {
    pub principal: Principal,
    pub amount: Balance,
}

/// Engine configuration plus the initial state of every in-memory collaborator.
///
/// ```json
/// {
///   "config": { "owner": "O", "fee": "100", "rate_ceiling": 10 },
///   "height": 0,
///   "vouchers": [{ "id": 1, "amount": "1000", "expiry": 200, "campaign_id": 1, "category": "food" }],
///   "eligible": ["B"],
///   "approvals": [{ "outlet": "M", "category": "food" }],
///   "campaigns": [{ "id": 1, "available_funds": "10000" }],
///   "balances": [{ "principal": "B", "amount": "500" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Seed {
    pub config: EngineConfig,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub vouchers: Vec<SeedVoucher>,
    #[serde(default)]
    pub eligible: Vec<Principal>,
    #[serde(default)]
    pub approvals: Vec<SeedApproval>,
    #[serde(default)]
    pub campaigns: Vec<SeedCampaign>,
    #[serde(default)]
    pub balances: Vec<SeedBalance>,
}

impl Seed {
    /// Parses and validates a seed document.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let seed: Seed = serde_json::from_reader(source)?;
        seed.config.validate()?;
        Ok(seed)
    }

    /// Builds a fresh in-memory world holding this seed's state.
    pub async fn build_world(&self) -> Result<InMemoryWorld> {
        let world = InMemoryWorld::new(self.height);

        for v in &self.vouchers {
            world
                .vouchers
                .insert(
                    v.id,
                    VoucherDetails {
                        amount: v.amount,
                        expiry: v.expiry,
                        campaign_id: v.campaign_id,
                        category: v.category.clone(),
                    },
                )
                .await;
        }
        for beneficiary in &self.eligible {
            world.eligibility.set_eligible(beneficiary.clone(), true).await;
        }
        for a in &self.approvals {
            world.outlets.approve(a.outlet.clone(), &a.category).await;
        }
        for c in &self.campaigns {
            world.campaigns.fund(c.id, c.available_funds).await;
        }
        for b in &self.balances {
            world
                .fees
                .deposit(b.principal.clone(), b.amount)
                .await
                .map_err(|e| {
                    RedemptionError::ValidationError(format!(
                        "Seed balance for {} cannot be deposited: {}",
                        b.principal, e
                    ))
                })?;
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EligibilityRegistry, LedgerClock, OutletRegistry};
    use rust_decimal_macros::dec;

    const SEED: &str = r#"{
        "config": { "owner": "O", "fee": "100", "rate_ceiling": 10 },
        "height": 100,
        "vouchers": [{ "id": 1, "amount": 1000, "expiry": 200, "campaign_id": 1, "category": "food" }],
        "eligible": ["B"],
        "approvals": [{ "outlet": "M", "category": "food" }],
        "campaigns": [{ "id": 1, "available_funds": "10000" }],
        "balances": [{ "principal": "B", "amount": "500" }]
    }"#;

    #[tokio::test]
    async fn test_seed_builds_world() {
        let seed = Seed::from_reader(SEED.as_bytes()).unwrap();
        assert_eq!(seed.config.fee, Balance::new(dec!(100)));

        let world = seed.build_world().await.unwrap();
        assert_eq!(world.clock.height(), 100);
        assert!(world.vouchers.is_live(VoucherId(1)).await);
        assert!(world.eligibility.is_eligible(&Principal::new("B")).await.unwrap());
        assert!(
            world
                .outlets
                .is_approved(&Principal::new("M"), "food")
                .await
                .unwrap()
        );
        assert_eq!(
            world.campaigns.available(CampaignId(1)).await,
            Some(Balance::new(dec!(10000)))
        );
        assert_eq!(
            world.fees.balance(&Principal::new("B")).await,
            Balance::new(dec!(500))
        );
    }

    #[test]
    fn test_seed_rejects_invalid_config() {
        let result = Seed::from_reader(r#"{"config": {"owner": "O", "rate_ceiling": 0}}"#.as_bytes());
        assert!(matches!(result, Err(RedemptionError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_seed_rejects_overflowing_balances() {
        let max = rust_decimal::Decimal::MAX.to_string();
        let json = format!(
            r#"{{"config": {{"owner": "O", "rate_ceiling": 1}},
                "balances": [{{"principal": "B", "amount": "{max}"}}, {{"principal": "B", "amount": "1"}}]}}"#
        );
        let seed = Seed::from_reader(json.as_bytes()).unwrap();
        assert!(matches!(
            seed.build_world().await,
            Err(RedemptionError::ValidationError(_))
        ));
    }

    #[test]
    fn test_seed_rejects_malformed_json() {
        let result = Seed::from_reader("{".as_bytes());
        assert!(matches!(result, Err(RedemptionError::SerdeError(_))));
    }
}
