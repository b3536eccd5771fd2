use crate::error::{GatewayError, GatewayResult};
use crate::ledger::AssetLedger;
use async_trait::async_trait;
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Conversion surface the treasury consumes: swap an arbitrary asset
/// for the reference token, and probe whether a route with liquidity
/// exists at all.
#[async_trait]
pub trait ConversionGateway: Send + Sync {
    /// Swap `amount_in` of `asset_in` held by `holder` for reference
    /// tokens, credited back to `holder`. Returns the output amount.
    async fn swap(
        &self,
        asset_in: AssetId,
        amount_in: TokenAmount,
        holder: AccountAddress,
    ) -> GatewayResult<TokenAmount>;

    async fn has_liquidity(&self, asset: AssetId) -> bool;
}

/// Fixed-rate gateway over an [`AssetLedger`]: each convertible asset
/// has a rational rate `num/den`, and output is paid from a reserve
/// account that must be funded with reference tokens. Stands in for the
/// AMM router the production deployment would call.
pub struct FixedRateGateway {
    ledger: Arc<dyn AssetLedger>,
    reference_token: AssetId,
    reserve: AccountAddress,
    rates: Arc<RwLock<HashMap<AssetId, (u64, u64)>>>,
}

impl FixedRateGateway {
    pub fn new(
        ledger: Arc<dyn AssetLedger>,
        reference_token: AssetId,
        reserve: AccountAddress,
    ) -> Self {
        Self {
            ledger,
            reference_token,
            reserve,
            rates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a conversion route: 1 unit of `asset` buys `num/den`
    /// units of the reference token.
    pub async fn set_rate(&self, asset: AssetId, num: u64, den: u64) {
        assert!(den > 0, "rate denominator must be positive");
        let mut rates = self.rates.write().await;
        rates.insert(asset, (num, den));
    }

    pub async fn remove_rate(&self, asset: AssetId) {
        let mut rates = self.rates.write().await;
        rates.remove(&asset);
    }

    fn quote(amount_in: TokenAmount, num: u64, den: u64) -> TokenAmount {
        let out = amount_in.to_base_units() as u128 * num as u128 / den as u128;
        TokenAmount::from_base_units(out as u64)
    }
}

#[async_trait]
impl ConversionGateway for FixedRateGateway {
    async fn swap(
        &self,
        asset_in: AssetId,
        amount_in: TokenAmount,
        holder: AccountAddress,
    ) -> GatewayResult<TokenAmount> {
        let (num, den) = {
            let rates = self.rates.read().await;
            *rates
                .get(&asset_in)
                .ok_or(GatewayError::ConversionUnavailable(asset_in))?
        };

        if amount_in.is_zero() {
            return Ok(TokenAmount::ZERO);
        }

        let amount_out = Self::quote(amount_in, num, den);
        let reserve_balance = self
            .ledger
            .balance_of(self.reference_token, self.reserve)
            .await?;
        if reserve_balance < amount_out {
            return Err(GatewayError::ConversionUnavailable(asset_in));
        }

        self.ledger
            .transfer(asset_in, holder, self.reserve, amount_in)
            .await?;
        self.ledger
            .transfer(self.reference_token, self.reserve, holder, amount_out)
            .await?;

        info!(
            asset_in = %asset_in,
            amount_in = amount_in.to_tokens(),
            amount_out = amount_out.to_tokens(),
            holder = %holder,
            "🔄 Swap executed"
        );
        Ok(amount_out)
    }

    async fn has_liquidity(&self, asset: AssetId) -> bool {
        let rates = self.rates.read().await;
        if !rates.contains_key(&asset) {
            return false;
        }
        drop(rates);

        self.ledger
            .balance_of(self.reference_token, self.reserve)
            .await
            .map(|b| !b.is_zero())
            .unwrap_or(false)
    }
}
