//! Time-weighted staking reward pool.
//!
//! The treasury forwards its stake share here and calls
//! [`RewardPool::notify_new_reward`]; depositors interact with the pool
//! directly through stake/withdraw/claim/exit. Rewards stream linearly
//! over a fixed window via a monotone reward-per-token accumulator, so
//! per-account payouts never require iterating all stakers.

pub mod error;
pub mod pool;

pub use error::{Result, RewardError};
pub use pool::{RewardPool, DEFAULT_REWARDS_DURATION_SECS, REWARD_SCALE};
