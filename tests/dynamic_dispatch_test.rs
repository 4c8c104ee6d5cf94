use rust_decimal_macros::dec;
use std::sync::Arc;
use voucher_redemption::domain::amount::{Amount, Balance};
use voucher_redemption::domain::identity::{CampaignId, Principal, VoucherId};
use voucher_redemption::domain::ports::{RedemptionStore, RedemptionStoreBox};
use voucher_redemption::domain::redemption::{CampaignStats, RedemptionCommit, RedemptionRecord};
use voucher_redemption::error::RedemptionError;
use voucher_redemption::infrastructure::in_memory::InMemoryRedemptionStore;

mod common;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: RedemptionStoreBox = Box::new(InMemoryRedemptionStore::new());
    let amount = Amount::new(dec!(5)).unwrap();
    let mut stats = CampaignStats::new(CampaignId(1));
    stats.record(amount).unwrap();

    // Verify Send + Sync by spawning a task
    let handle = tokio::spawn(async move {
        store
            .commit(RedemptionCommit {
                record: RedemptionRecord {
                    voucher_id: VoucherId(1),
                    beneficiary: Principal::new("B"),
                    outlet: Principal::new("M"),
                    amount,
                    timestamp: 3,
                    campaign_id: CampaignId(1),
                    category: "food".to_string(),
                    redeemed: true,
                },
                stats,
                total_redemptions: 1,
            })
            .await
            .unwrap();
        store.get_redemption(VoucherId(1)).await.unwrap().unwrap()
    });

    let record = handle.await.unwrap();
    assert_eq!(record.voucher_id, VoucherId(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemptions_of_one_voucher() {
    let (engine, world) = common::engine_from_seed(&common::scenario_seed()).await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .redeem(&Principal::new("B"), VoucherId(1), &Principal::new("M"))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, RedemptionError::AlreadyRedeemed)),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(engine.get_total_redemptions().await, 1);
    assert_eq!(world.fees.balance(&Principal::new("B")).await, Balance::new(dec!(400)));
    assert_eq!(
        world.campaigns.credited(&Principal::new("M")).await,
        Balance::new(dec!(1000))
    );
}
