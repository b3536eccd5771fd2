use crate::error::{Result, RewardError};
use daovault_assets::AssetLedger;
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Fixed-point scale of the reward-per-token accumulator.
pub const REWARD_SCALE: u128 = 1_000_000_000_000_000_000; // 10^18

/// Default streaming window: five years.
pub const DEFAULT_REWARDS_DURATION_SECS: i64 = 5 * 365 * 24 * 3600;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct StakerState {
    staked: TokenAmount,
    reward_per_token_paid: u128,
    accrued: TokenAmount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PoolState {
    total_staked: TokenAmount,
    reward_rate: u64, // reference base units per second
    reward_per_token_stored: u128,
    last_update_time: i64,
    period_finish: i64,
    accounts: HashMap<AccountAddress, StakerState>,
}

/// Streaming reward accumulator. Depositors stake the stake asset and
/// earn the reference token proportionally to stake over time; the
/// treasury feeds new reward budget through [`notify_new_reward`],
/// which restarts the fixed-length streaming window.
///
/// Every mutating call takes an explicit `now` timestamp (unix
/// seconds), which keeps the time-sensitive accrual deterministic
/// under test and lets the host supply its own clock.
///
/// [`notify_new_reward`]: RewardPool::notify_new_reward
pub struct RewardPool {
    ledger: Arc<dyn AssetLedger>,
    pool_address: AccountAddress,
    reference_token: AssetId,
    stake_asset: AssetId,
    rewards_duration: i64,
    owner: AccountAddress,
    rewards_distributor: Arc<RwLock<AccountAddress>>,
    state: Arc<RwLock<PoolState>>,
    backup: Arc<RwLock<Option<PoolState>>>,
}

impl RewardPool {
    pub fn new(
        ledger: Arc<dyn AssetLedger>,
        pool_address: AccountAddress,
        reference_token: AssetId,
        stake_asset: AssetId,
        rewards_duration: i64,
        owner: AccountAddress,
    ) -> Self {
        assert!(rewards_duration > 0, "rewards duration must be positive");
        Self {
            ledger,
            pool_address,
            reference_token,
            stake_asset,
            rewards_duration,
            owner,
            rewards_distributor: Arc::new(RwLock::new(owner)),
            state: Arc::new(RwLock::new(PoolState::default())),
            backup: Arc::new(RwLock::new(None)),
        }
    }

    /// Pool streaming over the standard five-year window.
    pub fn with_default_duration(
        ledger: Arc<dyn AssetLedger>,
        pool_address: AccountAddress,
        reference_token: AssetId,
        stake_asset: AssetId,
        owner: AccountAddress,
    ) -> Self {
        Self::new(
            ledger,
            pool_address,
            reference_token,
            stake_asset,
            DEFAULT_REWARDS_DURATION_SECS,
            owner,
        )
    }

    pub fn pool_address(&self) -> AccountAddress {
        self.pool_address
    }

    pub fn rewards_duration(&self) -> i64 {
        self.rewards_duration
    }

    /// Accumulator value as of `now`, bounded to the active period.
    fn reward_per_token_at(state: &PoolState, now: i64) -> Result<u128> {
        if state.total_staked.is_zero() {
            return Ok(state.reward_per_token_stored);
        }
        let cutoff = now.min(state.period_finish);
        let elapsed = (cutoff - state.last_update_time).max(0) as u128;
        let accrual = elapsed
            .checked_mul(state.reward_rate as u128)
            .and_then(|x| x.checked_mul(REWARD_SCALE))
            .ok_or(RewardError::AccrualOverflow)?
            / state.total_staked.to_base_units() as u128;
        state
            .reward_per_token_stored
            .checked_add(accrual)
            .ok_or(RewardError::AccrualOverflow)
    }

    fn earned_at(entry: &StakerState, reward_per_token: u128) -> Result<TokenAmount> {
        let delta = reward_per_token - entry.reward_per_token_paid; // accumulator is monotone
        let newly_earned = (entry.staked.to_base_units() as u128)
            .checked_mul(delta)
            .ok_or(RewardError::AccrualOverflow)?
            / REWARD_SCALE;
        entry
            .accrued
            .checked_add(TokenAmount::from_base_units(newly_earned as u64))
            .ok_or(RewardError::AccrualOverflow)
    }

    /// Fold elapsed streaming into the global accumulator and, when an
    /// account is given, into that account's accrual checkpoint.
    fn refresh(state: &mut PoolState, account: Option<AccountAddress>, now: i64) -> Result<()> {
        state.reward_per_token_stored = Self::reward_per_token_at(state, now)?;
        state.last_update_time = now;

        if let Some(addr) = account {
            let reward_per_token = state.reward_per_token_stored;
            let entry = state.accounts.entry(addr).or_default();
            entry.accrued = Self::earned_at(entry, reward_per_token)?;
            entry.reward_per_token_paid = reward_per_token;
        }
        Ok(())
    }

    /// Deposit `amount` of the stake asset.
    pub async fn stake(
        &self,
        caller: AccountAddress,
        amount: TokenAmount,
        now: i64,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(RewardError::ZeroAmount);
        }

        let mut state = self.state.write().await;
        Self::refresh(&mut state, Some(caller), now)?;

        // Pull the stake in before crediting it; a failed transfer
        // leaves only the (neutral) accrual refresh behind.
        self.ledger
            .transfer(self.stake_asset, caller, self.pool_address, amount)
            .await?;

        let entry = state.accounts.entry(caller).or_default();
        entry.staked = entry.staked.saturating_add(amount);
        state.total_staked = state.total_staked.saturating_add(amount);

        info!(
            staker = %caller,
            amount = amount.to_tokens(),
            total_staked = state.total_staked.to_tokens(),
            "📥 Stake deposited"
        );
        Ok(())
    }

    /// Withdraw `amount` of the caller's staked balance.
    pub async fn withdraw(
        &self,
        caller: AccountAddress,
        amount: TokenAmount,
        now: i64,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(RewardError::ZeroAmount);
        }

        let mut state = self.state.write().await;
        Self::refresh(&mut state, Some(caller), now)?;

        let staked = state
            .accounts
            .get(&caller)
            .map(|e| e.staked)
            .unwrap_or(TokenAmount::ZERO);
        if amount > staked {
            return Err(RewardError::InsufficientStake {
                has: staked,
                needs: amount,
            });
        }

        self.ledger
            .transfer(self.stake_asset, self.pool_address, caller, amount)
            .await?;

        let entry = state.accounts.entry(caller).or_default();
        entry.staked = entry.staked.saturating_sub(amount);
        state.total_staked = state.total_staked.saturating_sub(amount);

        info!(
            staker = %caller,
            amount = amount.to_tokens(),
            total_staked = state.total_staked.to_tokens(),
            "📤 Stake withdrawn"
        );
        Ok(())
    }

    /// Pay out the caller's accrued reward in the reference token.
    /// Returns the amount paid (zero when nothing has accrued).
    pub async fn get_reward(&self, caller: AccountAddress, now: i64) -> Result<TokenAmount> {
        let mut state = self.state.write().await;
        Self::refresh(&mut state, Some(caller), now)?;

        let reward = state
            .accounts
            .get(&caller)
            .map(|e| e.accrued)
            .unwrap_or(TokenAmount::ZERO);
        if reward.is_zero() {
            return Ok(TokenAmount::ZERO);
        }

        self.ledger
            .transfer(self.reference_token, self.pool_address, caller, reward)
            .await?;

        if let Some(entry) = state.accounts.get_mut(&caller) {
            entry.accrued = TokenAmount::ZERO;
        }

        info!(
            staker = %caller,
            reward = reward.to_tokens(),
            "🎁 Reward claimed"
        );
        Ok(reward)
    }

    /// Withdraw the full staked balance and claim the accrued reward in
    /// one operation. The two payouts ride a ledger transaction: a
    /// failure on either transfer unwinds both, and the pool's own
    /// balances are only touched once the ledger has committed.
    pub async fn exit(&self, caller: AccountAddress, now: i64) -> Result<TokenAmount> {
        let mut state = self.state.write().await;
        Self::refresh(&mut state, Some(caller), now)?;

        let (staked, reward) = state
            .accounts
            .get(&caller)
            .map(|e| (e.staked, e.accrued))
            .unwrap_or((TokenAmount::ZERO, TokenAmount::ZERO));

        self.ledger.begin_transaction().await?;
        if let Err(e) = self.pay_out(caller, staked, reward).await {
            self.ledger.rollback_transaction().await?;
            return Err(e);
        }
        self.ledger.commit_transaction().await?;

        if let Some(entry) = state.accounts.get_mut(&caller) {
            entry.staked = TokenAmount::ZERO;
            entry.accrued = TokenAmount::ZERO;
        }
        state.total_staked = state.total_staked.saturating_sub(staked);

        info!(
            staker = %caller,
            unstaked = staked.to_tokens(),
            reward = reward.to_tokens(),
            "🚪 Exited pool"
        );
        Ok(reward)
    }

    async fn pay_out(
        &self,
        caller: AccountAddress,
        staked: TokenAmount,
        reward: TokenAmount,
    ) -> Result<()> {
        if !staked.is_zero() {
            self.ledger
                .transfer(self.stake_asset, self.pool_address, caller, staked)
                .await?;
        }
        if !reward.is_zero() {
            self.ledger
                .transfer(self.reference_token, self.pool_address, caller, reward)
                .await?;
        }
        Ok(())
    }

    /// Fold a freshly received reward budget into the stream. Only the
    /// configured rewards distributor may call this. Unspent budget of
    /// a still-running period is carried over; the new rate must be
    /// covered by the pool's current reference-token balance.
    ///
    /// All validation happens before any state is written, so a failed
    /// notify leaves the pool untouched.
    pub async fn notify_new_reward(
        &self,
        amount: TokenAmount,
        caller: AccountAddress,
        now: i64,
    ) -> Result<()> {
        if caller != *self.rewards_distributor.read().await {
            return Err(RewardError::Unauthorized);
        }

        let mut state = self.state.write().await;
        let reward_per_token = Self::reward_per_token_at(&state, now)?;

        let leftover: u128 = if now < state.period_finish {
            (state.period_finish - now) as u128 * state.reward_rate as u128
        } else {
            0
        };
        let budget = amount.to_base_units() as u128 + leftover;
        let new_rate = budget / self.rewards_duration as u128;

        let balance = self
            .ledger
            .balance_of(self.reference_token, self.pool_address)
            .await?;
        let promised = new_rate * self.rewards_duration as u128;
        if promised > balance.to_base_units() as u128 {
            return Err(RewardError::InsolventRewardRate {
                promised: TokenAmount::from_base_units(promised.min(u64::MAX as u128) as u64),
                available: balance,
            });
        }

        state.reward_per_token_stored = reward_per_token;
        state.reward_rate = new_rate as u64;
        state.period_finish = now + self.rewards_duration;
        state.last_update_time = now;

        info!(
            amount = amount.to_tokens(),
            carried_over = TokenAmount::from_base_units(leftover.min(u64::MAX as u128) as u64).to_tokens(),
            reward_rate = state.reward_rate,
            period_finish = state.period_finish,
            "🔔 Reward notified"
        );
        Ok(())
    }

    /// Replace the rewards distributor. Pool-owner only.
    pub async fn set_rewards_distributor(
        &self,
        distributor: AccountAddress,
        caller: AccountAddress,
    ) -> Result<()> {
        if caller != self.owner {
            return Err(RewardError::Unauthorized);
        }
        let mut current = self.rewards_distributor.write().await;
        *current = distributor;
        debug!(distributor = %distributor, "Rewards distributor updated");
        Ok(())
    }

    pub async fn rewards_distributor(&self) -> AccountAddress {
        *self.rewards_distributor.read().await
    }

    /// Reward the account would hold if it claimed at `now`.
    pub async fn earned(&self, account: AccountAddress, now: i64) -> Result<TokenAmount> {
        let state = self.state.read().await;
        let reward_per_token = Self::reward_per_token_at(&state, now)?;
        match state.accounts.get(&account) {
            Some(entry) => Self::earned_at(entry, reward_per_token),
            None => Ok(TokenAmount::ZERO),
        }
    }

    pub async fn reward_per_token(&self, now: i64) -> Result<u128> {
        let state = self.state.read().await;
        Self::reward_per_token_at(&state, now)
    }

    pub async fn total_staked(&self) -> TokenAmount {
        self.state.read().await.total_staked
    }

    pub async fn staked_balance(&self, account: AccountAddress) -> TokenAmount {
        self.state
            .read()
            .await
            .accounts
            .get(&account)
            .map(|e| e.staked)
            .unwrap_or(TokenAmount::ZERO)
    }

    pub async fn reward_rate(&self) -> u64 {
        self.state.read().await.reward_rate
    }

    pub async fn period_finish(&self) -> i64 {
        self.state.read().await.period_finish
    }

    /// Snapshot the pool state so a composite operation can roll it
    /// back together with a ledger transaction.
    pub async fn begin_transaction(&self) {
        let state = self.state.read().await;
        let mut backup = self.backup.write().await;
        *backup = Some(state.clone());
    }

    pub async fn commit_transaction(&self) {
        let mut backup = self.backup.write().await;
        *backup = None;
    }

    pub async fn rollback_transaction(&self) {
        let mut backup = self.backup.write().await;
        if let Some(snapshot) = backup.take() {
            let mut state = self.state.write().await;
            *state = snapshot;
            info!("↩️ Reward pool state rolled back");
        }
    }
}
