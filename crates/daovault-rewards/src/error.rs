use daovault_assets::LedgerError;
use daovault_types::TokenAmount;
use thiserror::Error;

/// Reward pool result type
pub type Result<T> = std::result::Result<T, RewardError>;

/// Reward pool errors
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("insufficient staked balance: has {has}, needs {needs}")]
    InsufficientStake { has: TokenAmount, needs: TokenAmount },

    #[error("reward rate is insolvent: would promise {promised}, pool holds {available}")]
    InsolventRewardRate {
        promised: TokenAmount,
        available: TokenAmount,
    },

    #[error("reward accrual arithmetic overflow")]
    AccrualOverflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
