use crate::address::AccountAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a fungible asset the treasury can custody: either the
/// host chain's native coin or a token ledger keyed by its contract
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    Native,
    Token(AccountAddress),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => write!(f, "native"),
            AssetId::Token(addr) => write!(f, "token:{}", addr),
        }
    }
}
