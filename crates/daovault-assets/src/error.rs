use daovault_types::{AccountAddress, AssetId, TokenAmount};
use thiserror::Error;

/// Ledger operation result type
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Errors raised by asset-ledger collaborators
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance of {asset} for {address}: has {has}, needs {needs}")]
    InsufficientBalance {
        asset: AssetId,
        address: AccountAddress,
        has: TokenAmount,
        needs: TokenAmount,
    },

    #[error("balance overflow for {0}")]
    BalanceOverflow(AccountAddress),

    #[error("supply of {0} would exceed max supply")]
    SupplyOverflow(AssetId),

    #[error("cannot transfer to the same address: {0}")]
    SelfTransfer(AccountAddress),
}

/// Gateway operation result type
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors raised by the conversion gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no tradeable liquidity for asset {0}")]
    ConversionUnavailable(AssetId),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
