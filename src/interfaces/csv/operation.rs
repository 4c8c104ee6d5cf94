use crate::application::engine::RedemptionEngine;
use crate::domain::amount::Balance;
use crate::domain::identity::{Height, Principal, VoucherId};
use crate::error::{RedemptionError, Result};
use crate::infrastructure::in_memory::ManualClock;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Redeem,
    Confirm,
    SetFee,
    SetRateCeiling,
}

/// One row of an operations file.
///
/// `caller` is the authenticated principal issuing the call. `height`, when present,
/// moves the ledger clock before the operation runs; it may not go below the current
/// height.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationType,
    pub caller: Principal,
    pub height: Option<Height>,
    pub voucher: Option<VoucherId>,
    pub outlet: Option<Principal>,
    pub value: Option<Decimal>,
}

impl Operation {
    /// Runs the operation against `engine`.
    pub async fn execute(&self, engine: &RedemptionEngine, clock: &ManualClock) -> Result<()> {
        if let Some(height) = self.height {
            clock.set(height)?;
        }

        match self.op {
            OperationType::Redeem => {
                let outlet = self.outlet.as_ref().ok_or_else(|| missing("redeem", "outlet"))?;
                engine.redeem(&self.caller, self.voucher("redeem")?, outlet).await?;
            }
            OperationType::Confirm => {
                engine
                    .confirm_receipt(&self.caller, self.voucher("confirm")?)
                    .await?;
            }
            OperationType::SetFee => {
                let fee = self.value.ok_or_else(|| missing("set_fee", "value"))?;
                engine.set_fee(&self.caller, Balance::new(fee)).await?;
            }
            OperationType::SetRateCeiling => {
                let value = self
                    .value
                    .ok_or_else(|| missing("set_rate_ceiling", "value"))?;
                let ceiling = value
                    .fract()
                    .is_zero()
                    .then(|| value.to_u64())
                    .flatten()
                    .ok_or_else(|| {
                        RedemptionError::ValidationError(format!(
                            "Rate ceiling must be a whole non-negative number, got {}",
                            value
                        ))
                    })?;
                engine.set_rate_ceiling(&self.caller, ceiling).await?;
            }
        }
        Ok(())
    }

    fn voucher(&self, op: &str) -> Result<VoucherId> {
        self.voucher.ok_or_else(|| missing(op, "voucher"))
    }
}

fn missing(op: &str, field: &str) -> RedemptionError {
    RedemptionError::ValidationError(format!("{} requires a {} column", op, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::EngineConfig;
    use crate::domain::ports::LedgerClock;
    use crate::infrastructure::in_memory::{InMemoryRedemptionStore, InMemoryWorld};
    use rust_decimal_macros::dec;

    async fn engine(world: &InMemoryWorld) -> RedemptionEngine {
        let config = EngineConfig::new(Principal::new("O"), Balance::ZERO, 5).unwrap();
        RedemptionEngine::open(
            config,
            world.collaborators(),
            Box::new(InMemoryRedemptionStore::new()),
        )
        .await
        .unwrap()
    }

    fn op(op: OperationType, caller: &str) -> Operation {
        Operation {
            op,
            caller: Principal::new(caller),
            height: None,
            voucher: None,
            outlet: None,
            value: None,
        }
    }

    #[tokio::test]
    async fn test_height_moves_clock() {
        let world = InMemoryWorld::new(0);
        let engine = engine(&world).await;
        let mut set_fee = op(OperationType::SetFee, "O");
        set_fee.height = Some(77);
        set_fee.value = Some(dec!(3));

        set_fee.execute(&engine, &world.clock).await.unwrap();
        assert_eq!(world.clock.height(), 77);
        assert_eq!(engine.get_fee().await, Balance::new(dec!(3)));
    }

    #[tokio::test]
    async fn test_lower_height_is_refused() {
        let world = InMemoryWorld::new(50);
        let engine = engine(&world).await;
        let mut set_fee = op(OperationType::SetFee, "O");
        set_fee.height = Some(49);
        set_fee.value = Some(dec!(3));

        assert!(matches!(
            set_fee.execute(&engine, &world.clock).await,
            Err(RedemptionError::ValidationError(_))
        ));
        assert_eq!(world.clock.height(), 50);
        assert_eq!(engine.get_fee().await, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_missing_columns_are_validation_errors() {
        let world = InMemoryWorld::new(0);
        let engine = engine(&world).await;

        let mut redeem = op(OperationType::Redeem, "B");
        redeem.voucher = Some(VoucherId(1));
        assert!(matches!(
            redeem.execute(&engine, &world.clock).await,
            Err(RedemptionError::ValidationError(_))
        ));
        assert!(matches!(
            op(OperationType::Confirm, "M").execute(&engine, &world.clock).await,
            Err(RedemptionError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_ceiling_must_be_whole() {
        let world = InMemoryWorld::new(0);
        let engine = engine(&world).await;

        let mut set = op(OperationType::SetRateCeiling, "O");
        set.value = Some(dec!(2.5));
        assert!(matches!(
            set.execute(&engine, &world.clock).await,
            Err(RedemptionError::ValidationError(_))
        ));

        set.value = Some(dec!(9));
        set.execute(&engine, &world.clock).await.unwrap();
        assert_eq!(engine.get_rate_ceiling().await, 9);
    }
}
