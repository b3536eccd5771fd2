use crate::error::{LedgerError, LedgerResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Record of a completed transfer, kept for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub asset: AssetId,
    pub from: AccountAddress,
    pub to: AccountAddress,
    pub amount: TokenAmount,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
}

type BalanceMap = HashMap<AssetId, HashMap<AccountAddress, TokenAmount>>;
type SupplyMap = HashMap<AssetId, TokenAmount>;
type LedgerBackup = Option<(BalanceMap, SupplyMap)>;

/// Balance and transfer primitives of the external token ledgers the
/// treasury calls into. `begin_transaction`/`rollback_transaction`
/// provide the all-or-nothing boundary multi-step operations rely on:
/// a rollback restores every balance and supply to the snapshot.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    async fn balance_of(&self, asset: AssetId, address: AccountAddress)
        -> LedgerResult<TokenAmount>;
    async fn total_supply(&self, asset: AssetId) -> LedgerResult<TokenAmount>;

    /// Move `amount` of `asset` between accounts. A zero amount is a
    /// no-op so callers can forward empty shares without branching.
    async fn transfer(
        &self,
        asset: AssetId,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> LedgerResult<()>;

    /// Issue new units of `asset`. Genesis and test path only; capped
    /// at `TokenAmount::MAX_SUPPLY` per asset.
    async fn mint(
        &self,
        asset: AssetId,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> LedgerResult<()>;

    async fn begin_transaction(&self) -> LedgerResult<()>;
    async fn commit_transaction(&self) -> LedgerResult<()>;
    async fn rollback_transaction(&self) -> LedgerResult<()>;

    async fn transaction_history(&self, address: AccountAddress) -> Vec<TransactionRecord>;
}

/// In-memory multi-asset ledger with snapshot transactions.
pub struct MemoryLedger {
    balances: Arc<RwLock<BalanceMap>>,
    supplies: Arc<RwLock<SupplyMap>>,
    backup: Arc<RwLock<LedgerBackup>>,
    history: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            supplies: Arc::new(RwLock::new(HashMap::new())),
            backup: Arc::new(RwLock::new(None)),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn tx_hash(
        asset: AssetId,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
        timestamp: i64,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(format!("{}", asset).as_bytes());
        hasher.update(from.as_bytes());
        hasher.update(to.as_bytes());
        hasher.update(&amount.to_base_units().to_le_bytes());
        hasher.update(&timestamp.to_le_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }
}

#[async_trait]
impl AssetLedger for MemoryLedger {
    async fn balance_of(
        &self,
        asset: AssetId,
        address: AccountAddress,
    ) -> LedgerResult<TokenAmount> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(&asset)
            .and_then(|accounts| accounts.get(&address))
            .copied()
            .unwrap_or(TokenAmount::ZERO))
    }

    async fn total_supply(&self, asset: AssetId) -> LedgerResult<TokenAmount> {
        let supplies = self.supplies.read().await;
        Ok(supplies.get(&asset).copied().unwrap_or(TokenAmount::ZERO))
    }

    async fn transfer(
        &self,
        asset: AssetId,
        from: AccountAddress,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if from == to {
            return Err(LedgerError::SelfTransfer(from));
        }

        let mut balances = self.balances.write().await;
        let accounts = balances.entry(asset).or_default();

        let from_balance = accounts.get(&from).copied().unwrap_or(TokenAmount::ZERO);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                address: from,
                has: from_balance,
                needs: amount,
            });
        }
        let to_balance = accounts.get(&to).copied().unwrap_or(TokenAmount::ZERO);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(to))?;

        accounts.insert(from, from_balance.saturating_sub(amount));
        accounts.insert(to, new_to);
        drop(balances);

        let now = Utc::now();
        let record = TransactionRecord {
            asset,
            from,
            to,
            amount,
            timestamp: now,
            tx_hash: Self::tx_hash(asset, from, to, amount, now.timestamp()),
        };

        info!(
            asset = %asset,
            from = %from,
            to = %to,
            amount = amount.to_tokens(),
            tx_hash = %record.tx_hash,
            "💸 Transfer executed"
        );

        let mut history = self.history.write().await;
        history.push(record);
        Ok(())
    }

    async fn mint(
        &self,
        asset: AssetId,
        to: AccountAddress,
        amount: TokenAmount,
    ) -> LedgerResult<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let mut supplies = self.supplies.write().await;
        let supply = supplies.get(&asset).copied().unwrap_or(TokenAmount::ZERO);
        let new_supply = supply
            .checked_add(amount)
            .filter(|s| *s <= TokenAmount::MAX_SUPPLY)
            .ok_or(LedgerError::SupplyOverflow(asset))?;

        let mut balances = self.balances.write().await;
        let accounts = balances.entry(asset).or_default();
        let balance = accounts.get(&to).copied().unwrap_or(TokenAmount::ZERO);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(to))?;

        supplies.insert(asset, new_supply);
        accounts.insert(to, new_balance);

        info!(
            asset = %asset,
            to = %to,
            amount = amount.to_tokens(),
            total_supply = new_supply.to_tokens(),
            "💰 Minted"
        );
        Ok(())
    }

    async fn begin_transaction(&self) -> LedgerResult<()> {
        let balances = self.balances.read().await;
        let supplies = self.supplies.read().await;

        let mut backup = self.backup.write().await;
        *backup = Some((balances.clone(), supplies.clone()));

        debug!(assets = balances.len(), "📝 Ledger transaction began");
        Ok(())
    }

    async fn commit_transaction(&self) -> LedgerResult<()> {
        let mut backup = self.backup.write().await;
        if backup.take().is_some() {
            debug!("✅ Ledger transaction committed");
        }
        Ok(())
    }

    async fn rollback_transaction(&self) -> LedgerResult<()> {
        let mut backup = self.backup.write().await;
        if let Some((balance_backup, supply_backup)) = backup.take() {
            let mut balances = self.balances.write().await;
            let mut supplies = self.supplies.write().await;
            *balances = balance_backup;
            *supplies = supply_backup;
            info!("↩️ Ledger transaction rolled back");
        }
        Ok(())
    }

    async fn transaction_history(&self, address: AccountAddress) -> Vec<TransactionRecord> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|r| r.from == address || r.to == address)
            .cloned()
            .collect()
    }
}
