//! Treasury and governance controller.
//!
//! The [`TreasuryController`] custodies deposited assets and, on
//! demand, splits each asset's balance into an owner share, a staking
//! reward share and a burn share per the configured percentages,
//! converting non-reference assets through the gateway along the way.
//! Ownership of the controller itself is decided by reference-token
//! holders: registered voters pick a candidate, and anyone may trigger
//! the transfer once the candidate's live balance tally strictly
//! exceeds half the token supply.

pub mod config;
pub mod controller;
pub mod error;
pub mod voting;

pub use config::{DistributionConfig, MAX_WITHDRAW_PERCENT};
pub use controller::TreasuryController;
pub use error::{Result, TreasuryError};
pub use voting::VoterRegistry;
