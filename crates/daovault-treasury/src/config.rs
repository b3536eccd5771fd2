use crate::error::{Result, TreasuryError};
use serde::{Deserialize, Serialize};

/// Maximum share the owner may direct to themselves.
pub const MAX_WITHDRAW_PERCENT: u8 = 40;

/// Percentage split applied to every distributed balance. The three
/// shares must always sum to 100, and the owner's withdraw share is
/// capped so the community keeps the majority of routed funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    pub burn_percent: u8,
    pub stake_percent: u8,
    pub withdraw_percent: u8,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            burn_percent: 50,
            stake_percent: 10,
            withdraw_percent: 40,
        }
    }
}

impl DistributionConfig {
    pub fn new(burn: u8, stake: u8, withdraw: u8) -> Result<Self> {
        let config = Self {
            burn_percent: burn,
            stake_percent: stake,
            withdraw_percent: withdraw,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.burn_percent as u16 + self.stake_percent as u16 + self.withdraw_percent as u16;
        if sum != 100 || self.withdraw_percent > MAX_WITHDRAW_PERCENT {
            return Err(TreasuryError::InvalidConfig {
                burn: self.burn_percent,
                stake: self.stake_percent,
                withdraw: self.withdraw_percent,
            });
        }
        Ok(())
    }
}
