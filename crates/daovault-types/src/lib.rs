//! Shared value types for the daovault treasury and reward pool.

pub mod address;
pub mod amount;
pub mod asset;

pub use address::AccountAddress;
pub use amount::{TokenAmount, TOKEN_BASE_UNIT, TOKEN_DECIMALS};
pub use asset::AssetId;
