use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_csv_handling() {
    let seed = common::write_seed(&common::scenario_seed());
    let ops = common::write_operations(&[
        // Unknown operation
        "burn, B, , 1, M,",
        // Non-numeric voucher id
        "redeem, B, , abc, M,",
        // Missing outlet for redeem
        "redeem, B, , 1, ,",
        // Valid redemption
        "redeem, B, , 1, M,",
    ]);

    let mut cmd = Command::new(cargo_bin!("voucher-redemption"));
    cmd.arg(seed.path()).arg(ops.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stderr(predicate::str::contains("Error processing operation"))
        .stdout(predicate::str::contains("1,1000,1"));
}

#[test]
fn test_invalid_seed_config() {
    let mut seed = common::scenario_seed();
    seed["config"]["rate_ceiling"] = serde_json::json!(0);
    let seed = common::write_seed(&seed);
    let ops = common::write_operations(&["redeem, B, , 1, M,"]);

    let mut cmd = Command::new(cargo_bin!("voucher-redemption"));
    cmd.arg(seed.path()).arg(ops.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Rate ceiling must be positive"));
}

#[test]
fn test_no_operations_prints_header_only() {
    let seed = common::write_seed(&common::scenario_seed());
    let ops = common::write_operations(&[]);

    let mut cmd = Command::new(cargo_bin!("voucher-redemption"));
    cmd.arg(seed.path()).arg(ops.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::diff("campaign,total_amount,redemption_count\n"));
}
