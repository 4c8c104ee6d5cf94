use super::amount::Balance;
use super::identity::Principal;
use crate::error::{RedemptionError, Result};
use serde::{Deserialize, Serialize};

/// Initial engine configuration.
///
/// `owner` is fixed for the lifetime of the engine; `fee` and `rate_ceiling` are the
/// starting values of the owner-mutable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub owner: Principal,
    #[serde(default)]
    pub fee: Balance,
    pub rate_ceiling: u64,
}

impl EngineConfig {
    pub fn new(owner: Principal, fee: Balance, rate_ceiling: u64) -> Result<Self> {
        let config = Self {
            owner,
            fee,
            rate_ceiling,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee.is_negative() {
            return Err(RedemptionError::ValidationError(
                "Fee must not be negative".to_string(),
            ));
        }
        if self.rate_ceiling == 0 {
            return Err(RedemptionError::ValidationError(
                "Rate ceiling must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
