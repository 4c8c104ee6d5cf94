#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;
use voucher_redemption::application::engine::RedemptionEngine;
use voucher_redemption::infrastructure::in_memory::{InMemoryRedemptionStore, InMemoryWorld};
use voucher_redemption::interfaces::json::seed::Seed;

pub const OPERATIONS_HEADER: &str = "op, caller, height, voucher, outlet, value";

/// Campaign 1 holds 10,000; voucher 1 is worth 1,000 of "food" until height 200.
/// B is eligible and holds 500 for fees, M is approved for "food", O owns the
/// engine with a fee of 100.
pub fn scenario_seed() -> Value {
    json!({
        "config": { "owner": "O", "fee": "100", "rate_ceiling": 100 },
        "height": 100,
        "vouchers": [
            { "id": 1, "amount": "1000", "expiry": 200, "campaign_id": 1, "category": "food" }
        ],
        "eligible": ["B"],
        "approvals": [{ "outlet": "M", "category": "food" }],
        "campaigns": [{ "id": 1, "available_funds": "10000" }],
        "balances": [{ "principal": "B", "amount": "500" }]
    })
}

pub async fn engine_from_seed(seed: &Value) -> (RedemptionEngine, InMemoryWorld) {
    let seed = Seed::from_reader(seed.to_string().as_bytes()).expect("Invalid seed");
    let world = seed.build_world().await.expect("Invalid seed state");
    let engine = RedemptionEngine::open(
        seed.config,
        world.collaborators(),
        Box::new(InMemoryRedemptionStore::new()),
    )
    .await
    .expect("Failed to open engine");
    (engine, world)
}

pub fn write_seed(seed: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", seed).unwrap();
    file
}

pub fn write_operations(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", OPERATIONS_HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}
