use crate::config::DistributionConfig;
use crate::error::{Result, TreasuryError};
use crate::voting::VoterRegistry;
use chrono::Utc;
use daovault_assets::{AssetLedger, ConversionGateway};
use daovault_rewards::RewardPool;
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
struct Shares {
    owner: TokenAmount,
    stake: TokenAmount,
    burn: TokenAmount,
}

impl Shares {
    /// Floor the owner and stake shares; the remainder goes to burn so
    /// the three parts always reassemble the full balance exactly.
    fn split(balance: TokenAmount, config: &DistributionConfig) -> Self {
        let owner = balance.percent_floor(config.withdraw_percent);
        let stake = balance.percent_floor(config.stake_percent);
        let burn = balance.saturating_sub(owner).saturating_sub(stake);
        Self { owner, stake, burn }
    }
}

/// Top-level treasury and governance controller.
///
/// Custodies whatever assets are deposited to its address, splits them
/// between the owner, the reward pool and the burn sink on demand, and
/// lets reference-token holders replace the owner through a live-tally
/// majority vote. The reward pool must have this controller configured
/// as its rewards distributor before `distribute` can feed it.
pub struct TreasuryController {
    ledger: Arc<dyn AssetLedger>,
    gateway: Arc<dyn ConversionGateway>,
    reference_token: AssetId,
    treasury_address: AccountAddress,
    burn_sink: AccountAddress,
    owner: Arc<RwLock<AccountAddress>>,
    config: Arc<RwLock<DistributionConfig>>,
    stake_pool: Arc<RwLock<Arc<RewardPool>>>,
    registry: Arc<RwLock<VoterRegistry>>,
}

impl TreasuryController {
    pub fn new(
        ledger: Arc<dyn AssetLedger>,
        gateway: Arc<dyn ConversionGateway>,
        reference_token: AssetId,
        treasury_address: AccountAddress,
        initial_owner: AccountAddress,
        stake_pool: Arc<RewardPool>,
    ) -> Self {
        Self {
            ledger,
            gateway,
            reference_token,
            treasury_address,
            burn_sink: AccountAddress::burn_sink(),
            owner: Arc::new(RwLock::new(initial_owner)),
            config: Arc::new(RwLock::new(DistributionConfig::default())),
            stake_pool: Arc::new(RwLock::new(stake_pool)),
            registry: Arc::new(RwLock::new(VoterRegistry::new())),
        }
    }

    // ---- deposits ------------------------------------------------------

    /// Record an incoming asset transfer into the treasury. Does
    /// nothing beyond the ledger move, so the receive path stays cheap.
    pub async fn deposit_token(
        &self,
        asset: AssetId,
        from: AccountAddress,
        amount: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(TreasuryError::ZeroAmount);
        }
        self.ledger
            .transfer(asset, from, self.treasury_address, amount)
            .await?;
        debug!(asset = %asset, from = %from, amount = amount.to_tokens(), "Treasury deposit");
        Ok(())
    }

    /// The implicit native-coin deposit entry point.
    pub async fn deposit_native(&self, from: AccountAddress, amount: TokenAmount) -> Result<()> {
        self.deposit_token(AssetId::Native, from, amount).await
    }

    // ---- distribution --------------------------------------------------

    /// Split the treasury's balance of each listed asset between the
    /// owner, the reward pool and the burn sink, in list order, as one
    /// all-or-nothing operation: a failure on any asset rolls every
    /// prior asset back too.
    pub async fn distribute(&self, assets: &[AssetId], now: i64) -> Result<()> {
        let pool = self.stake_pool.read().await.clone();
        let config = *self.config.read().await;
        let owner = *self.owner.read().await;

        self.ledger.begin_transaction().await?;
        pool.begin_transaction().await;

        match self
            .distribute_inner(assets, owner, &config, &pool, now)
            .await
        {
            Ok(()) => {
                self.ledger.commit_transaction().await?;
                pool.commit_transaction().await;
                info!(assets = assets.len(), "✅ Distribution committed");
                Ok(())
            }
            Err(e) => {
                self.ledger.rollback_transaction().await?;
                pool.rollback_transaction().await;
                warn!(error = %e, "❌ Distribution rolled back");
                Err(e)
            }
        }
    }

    /// [`distribute`] against the system clock.
    ///
    /// [`distribute`]: TreasuryController::distribute
    pub async fn distribute_now(&self, assets: &[AssetId]) -> Result<()> {
        self.distribute(assets, Utc::now().timestamp()).await
    }

    async fn distribute_inner(
        &self,
        assets: &[AssetId],
        owner: AccountAddress,
        config: &DistributionConfig,
        pool: &RewardPool,
        now: i64,
    ) -> Result<()> {
        for asset in assets {
            let balance = self
                .ledger
                .balance_of(*asset, self.treasury_address)
                .await?;
            if balance.is_zero() {
                debug!(asset = %asset, "Nothing to distribute, skipping");
                continue;
            }
            let shares = Shares::split(balance, config);

            if *asset == self.reference_token {
                // Already the reference token: forward shares as-is.
                self.ledger
                    .transfer(self.reference_token, self.treasury_address, owner, shares.owner)
                    .await?;
                self.forward_stake_and_burn(shares.stake, shares.burn, pool, now)
                    .await?;
            } else if asset.is_native() {
                // Owner is paid in native coin; the community shares
                // are converted separately and forwarded in reference.
                if !self.gateway.has_liquidity(*asset).await {
                    return Err(TreasuryError::ConversionUnavailable(*asset));
                }
                self.ledger
                    .transfer(*asset, self.treasury_address, owner, shares.owner)
                    .await?;
                let stake_out = self
                    .gateway
                    .swap(*asset, shares.stake, self.treasury_address)
                    .await?;
                let burn_out = self
                    .gateway
                    .swap(*asset, shares.burn, self.treasury_address)
                    .await?;
                self.forward_stake_and_burn(stake_out, burn_out, pool, now)
                    .await?;
            } else {
                // Generic asset: owner keeps the asset itself, the
                // combined community share converts in one swap and the
                // output splits stake:burn (remainder to burn).
                if !self.gateway.has_liquidity(*asset).await {
                    return Err(TreasuryError::ConversionUnavailable(*asset));
                }
                self.ledger
                    .transfer(*asset, self.treasury_address, owner, shares.owner)
                    .await?;
                let combined = shares.stake.saturating_add(shares.burn);
                let converted = self
                    .gateway
                    .swap(*asset, combined, self.treasury_address)
                    .await?;
                let community = config.stake_percent as u128 + config.burn_percent as u128;
                let stake_out = TokenAmount::from_base_units(
                    (converted.to_base_units() as u128 * config.stake_percent as u128 / community)
                        as u64,
                );
                let burn_out = converted.saturating_sub(stake_out);
                self.forward_stake_and_burn(stake_out, burn_out, pool, now)
                    .await?;
            }

            info!(
                asset = %asset,
                balance = balance.to_tokens(),
                owner_share = shares.owner.to_tokens(),
                stake_share = shares.stake.to_tokens(),
                burn_share = shares.burn.to_tokens(),
                "📦 Asset distributed"
            );
        }
        Ok(())
    }

    /// Move reference-token shares to the reward pool and the burn
    /// sink, folding the stake share into the pool's reward stream.
    async fn forward_stake_and_burn(
        &self,
        stake_share: TokenAmount,
        burn_share: TokenAmount,
        pool: &RewardPool,
        now: i64,
    ) -> Result<()> {
        self.ledger
            .transfer(
                self.reference_token,
                self.treasury_address,
                pool.pool_address(),
                stake_share,
            )
            .await?;
        pool.notify_new_reward(stake_share, self.treasury_address, now)
            .await?;
        self.ledger
            .transfer(
                self.reference_token,
                self.treasury_address,
                self.burn_sink,
                burn_share,
            )
            .await?;
        Ok(())
    }

    // ---- rescue and configuration -------------------------------------

    /// Pull a stuck asset out to the owner. Refused while the gateway
    /// still has a route for it: convertible assets must go through
    /// [`distribute`] so the fee split applies.
    ///
    /// [`distribute`]: TreasuryController::distribute
    pub async fn rescue_non_convertible_asset(
        &self,
        token: AssetId,
        amount: TokenAmount,
        caller: AccountAddress,
    ) -> Result<()> {
        let owner = *self.owner.read().await;
        if caller != owner {
            return Err(TreasuryError::Unauthorized);
        }
        if self.gateway.has_liquidity(token).await {
            return Err(TreasuryError::ConversionUnavailable(token));
        }
        self.ledger
            .transfer(token, self.treasury_address, owner, amount)
            .await?;
        info!(asset = %token, amount = amount.to_tokens(), "🛟 Non-convertible asset rescued");
        Ok(())
    }

    /// Owner-only atomic overwrite of the percentage split.
    pub async fn update_distribution_percentages(
        &self,
        burn: u8,
        stake: u8,
        withdraw: u8,
        caller: AccountAddress,
    ) -> Result<()> {
        if caller != *self.owner.read().await {
            return Err(TreasuryError::Unauthorized);
        }
        let new_config = DistributionConfig::new(burn, stake, withdraw)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!(burn, stake, withdraw, "⚙️ Distribution percentages updated");
        Ok(())
    }

    /// Owner-only replacement of the reward pool fed by future
    /// distributions. Stake already sitting in the old pool stays
    /// there.
    pub async fn update_stake_pool(
        &self,
        new_pool: Arc<RewardPool>,
        caller: AccountAddress,
    ) -> Result<()> {
        if caller != *self.owner.read().await {
            return Err(TreasuryError::Unauthorized);
        }
        let mut pool = self.stake_pool.write().await;
        info!(
            old = %pool.pool_address(),
            new = %new_pool.pool_address(),
            "⚙️ Stake pool updated"
        );
        *pool = new_pool;
        Ok(())
    }

    // ---- governance ----------------------------------------------------

    pub async fn register_voter(&self, caller: AccountAddress) -> Result<()> {
        let mut registry = self.registry.write().await;
        registry.register(caller)
    }

    pub async fn cast_vote(&self, caller: AccountAddress, candidate: AccountAddress) -> Result<()> {
        let mut registry = self.registry.write().await;
        registry.cast_vote(caller, candidate)
    }

    /// Sum of current reference-token balances of every registered
    /// voter choosing `candidate`, read live from the ledger. A voter
    /// who divested after voting contributes nothing.
    pub async fn tally(&self, candidate: AccountAddress) -> Result<TokenAmount> {
        let supporters = {
            let registry = self.registry.read().await;
            registry.supporters_of(candidate)
        };
        let mut total = TokenAmount::ZERO;
        for voter in supporters {
            let balance = self.ledger.balance_of(self.reference_token, voter).await?;
            total = total.saturating_add(balance);
        }
        Ok(total)
    }

    /// Replace the owner once a strict live majority backs `candidate`.
    /// Callable by anyone; exactly half the supply is not enough. The
    /// registry and standing votes survive the transfer.
    pub async fn transfer_ownership(&self, candidate: AccountAddress) -> Result<()> {
        let tally = self.tally(candidate).await?;
        let half_supply = self.calculate_reference_half_supply().await?;
        if tally <= half_supply {
            return Err(TreasuryError::InsufficientMajority { tally, half_supply });
        }

        let mut owner = self.owner.write().await;
        let previous = *owner;
        *owner = candidate;
        info!(
            previous = %previous,
            new = %candidate,
            tally = tally.to_tokens(),
            "👑 Ownership transferred"
        );
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    pub async fn owner(&self) -> AccountAddress {
        *self.owner.read().await
    }

    pub async fn config(&self) -> DistributionConfig {
        *self.config.read().await
    }

    pub fn burn_sink(&self) -> AccountAddress {
        self.burn_sink
    }

    pub fn reference_token(&self) -> AssetId {
        self.reference_token
    }

    pub fn treasury_address(&self) -> AccountAddress {
        self.treasury_address
    }

    pub async fn stake_pool(&self) -> Arc<RewardPool> {
        self.stake_pool.read().await.clone()
    }

    pub async fn balance(&self, asset: AssetId) -> Result<TokenAmount> {
        Ok(self
            .ledger
            .balance_of(asset, self.treasury_address)
            .await?)
    }

    pub async fn voter_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Half the reference token's total supply, the threshold a live
    /// tally must strictly exceed.
    pub async fn calculate_reference_half_supply(&self) -> Result<TokenAmount> {
        let supply = self.ledger.total_supply(self.reference_token).await?;
        Ok(TokenAmount::from_base_units(supply.to_base_units() / 2))
    }
}
