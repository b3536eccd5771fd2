use daovault_assets::{GatewayError, LedgerError};
use daovault_rewards::RewardError;
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use thiserror::Error;

/// Treasury operation result type
pub type Result<T> = std::result::Result<T, TreasuryError>;

/// Treasury and governance errors
#[derive(Debug, Error)]
pub enum TreasuryError {
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    #[error(
        "invalid distribution config: burn {burn} + stake {stake} + withdraw {withdraw} \
         must sum to 100 with withdraw <= 40"
    )]
    InvalidConfig { burn: u8, stake: u8, withdraw: u8 },

    #[error("voter already registered: {0}")]
    AlreadyRegistered(AccountAddress),

    #[error("voter not registered: {0}")]
    NotRegistered(AccountAddress),

    #[error("insufficient majority: tally {tally} does not exceed half supply {half_supply}")]
    InsufficientMajority {
        tally: TokenAmount,
        half_supply: TokenAmount,
    },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("conversion availability check failed for asset {0}")]
    ConversionUnavailable(AssetId),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("reward pool error: {0}")]
    Reward(#[from] RewardError),
}
