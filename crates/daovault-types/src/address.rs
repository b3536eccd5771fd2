use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte account identity on the host ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The irrecoverable burn sink. Tokens sent here are destroyed by
    /// convention: no key exists for this address and nothing in the
    /// system ever transfers out of it.
    pub fn burn_sink() -> Self {
        let mut bytes = [0xDE; 32];
        bytes[0] = 0x00;
        Self(bytes)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}
