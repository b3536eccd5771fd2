use crate::error::{Result, TreasuryError};
use daovault_types::AccountAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Registered voters and their chosen ownership candidates.
///
/// Registration is monotonic: addresses are never removed, and a
/// successful ownership transfer does not clear the registry. Voting
/// power is never stored here; [`transfer_ownership`] reads balances
/// live from the reference-token ledger at decision time.
///
/// [`transfer_ownership`]: crate::controller::TreasuryController::transfer_ownership
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoterRegistry {
    voters: HashMap<AccountAddress, Option<AccountAddress>>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voter with no chosen candidate yet.
    pub fn register(&mut self, voter: AccountAddress) -> Result<()> {
        if self.voters.contains_key(&voter) {
            return Err(TreasuryError::AlreadyRegistered(voter));
        }
        self.voters.insert(voter, None);
        info!(voter = %voter, registered = self.voters.len(), "🗳️ Voter registered");
        Ok(())
    }

    /// Set or overwrite the voter's candidate. Revoting is allowed;
    /// there is no separate unvote.
    pub fn cast_vote(&mut self, voter: AccountAddress, candidate: AccountAddress) -> Result<()> {
        match self.voters.get_mut(&voter) {
            Some(choice) => {
                *choice = Some(candidate);
                info!(voter = %voter, candidate = %candidate, "🗳️ Vote cast");
                Ok(())
            }
            None => Err(TreasuryError::NotRegistered(voter)),
        }
    }

    pub fn is_registered(&self, voter: AccountAddress) -> bool {
        self.voters.contains_key(&voter)
    }

    pub fn vote_of(&self, voter: AccountAddress) -> Option<AccountAddress> {
        self.voters.get(&voter).copied().flatten()
    }

    /// Voters whose current choice is `candidate`. Balances are not
    /// read here; the caller sums them live against the ledger.
    pub fn supporters_of(&self, candidate: AccountAddress) -> Vec<AccountAddress> {
        self.voters
            .iter()
            .filter(|(_, choice)| **choice == Some(candidate))
            .map(|(voter, _)| *voter)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}
