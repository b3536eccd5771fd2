use anyhow::Result;
use daovault_assets::{AssetLedger, FixedRateGateway, MemoryLedger};
use daovault_rewards::RewardPool;
use daovault_treasury::{TreasuryController, TreasuryError};
use daovault_types::{AccountAddress, AssetId, TokenAmount};
use std::sync::Arc;

fn addr(byte: u8) -> AccountAddress {
    AccountAddress::from_bytes([byte; 32])
}

fn reference() -> AssetId {
    AssetId::Token(addr(0xC0))
}

fn treasury_addr() -> AccountAddress {
    addr(0xDD)
}

fn owner_addr() -> AccountAddress {
    addr(0xA1)
}

fn pool_addr() -> AccountAddress {
    addr(0xB0)
}

struct Harness {
    ledger: Arc<MemoryLedger>,
    gateway: Arc<FixedRateGateway>,
    controller: TreasuryController,
}

/// Ledger, funded swap reserve, a 100-second reward pool distributing
/// for the treasury, and the controller wired over all three.
async fn setup() -> Result<Harness> {
    let ledger = Arc::new(MemoryLedger::new());
    let reserve = addr(0xF0);
    ledger
        .mint(reference(), reserve, TokenAmount::from_base_units(1_000_000))
        .await?;
    let gateway = Arc::new(FixedRateGateway::new(ledger.clone(), reference(), reserve));

    let pool = Arc::new(RewardPool::new(
        ledger.clone(),
        pool_addr(),
        reference(),
        reference(),
        100,
        owner_addr(),
    ));
    pool.set_rewards_distributor(treasury_addr(), owner_addr())
        .await?;

    let controller = TreasuryController::new(
        ledger.clone(),
        gateway.clone(),
        reference(),
        treasury_addr(),
        owner_addr(),
        pool,
    );
    Ok(Harness {
        ledger,
        gateway,
        controller,
    })
}

#[tokio::test]
async fn test_reference_token_default_split() -> Result<()> {
    let h = setup().await?;
    h.ledger
        .mint(reference(), treasury_addr(), TokenAmount::from_base_units(1_000))
        .await?;

    h.controller.distribute(&[reference()], 0).await?;

    assert_eq!(
        h.ledger.balance_of(reference(), owner_addr()).await?,
        TokenAmount::from_base_units(400)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), pool_addr()).await?,
        TokenAmount::from_base_units(100)
    );
    assert_eq!(
        h.ledger
            .balance_of(reference(), h.controller.burn_sink())
            .await?,
        TokenAmount::from_base_units(500)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), treasury_addr()).await?,
        TokenAmount::ZERO
    );

    // The stake share started a reward stream: 100 units over 100s
    let pool = h.controller.stake_pool().await;
    assert_eq!(pool.reward_rate().await, 1);
    assert_eq!(pool.period_finish().await, 100);
    Ok(())
}

#[tokio::test]
async fn test_rounding_remainder_goes_to_burn() -> Result<()> {
    let h = setup().await?;
    h.ledger
        .mint(reference(), treasury_addr(), TokenAmount::from_base_units(99))
        .await?;

    h.controller.distribute(&[reference()], 0).await?;

    // floor(99*40%)=39, floor(99*10%)=9, remainder 51 burns: sums to 99
    assert_eq!(
        h.ledger.balance_of(reference(), owner_addr()).await?,
        TokenAmount::from_base_units(39)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), pool_addr()).await?,
        TokenAmount::from_base_units(9)
    );
    assert_eq!(
        h.ledger
            .balance_of(reference(), h.controller.burn_sink())
            .await?,
        TokenAmount::from_base_units(51)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), treasury_addr()).await?,
        TokenAmount::ZERO
    );
    Ok(())
}

#[tokio::test]
async fn test_native_asset_converts_community_shares() -> Result<()> {
    let h = setup().await?;
    // 1 native buys 2 reference
    h.gateway.set_rate(AssetId::Native, 2, 1).await;
    h.ledger
        .mint(AssetId::Native, treasury_addr(), TokenAmount::from_base_units(1_000))
        .await?;

    h.controller.distribute(&[AssetId::Native], 0).await?;

    // Owner is paid in native; stake and burn convert at 2:1
    assert_eq!(
        h.ledger.balance_of(AssetId::Native, owner_addr()).await?,
        TokenAmount::from_base_units(400)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), pool_addr()).await?,
        TokenAmount::from_base_units(200)
    );
    assert_eq!(
        h.ledger
            .balance_of(reference(), h.controller.burn_sink())
            .await?,
        TokenAmount::from_base_units(1_000)
    );
    assert_eq!(
        h.ledger.balance_of(AssetId::Native, treasury_addr()).await?,
        TokenAmount::ZERO
    );
    assert_eq!(h.controller.stake_pool().await.reward_rate().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_generic_asset_pays_owner_in_kind() -> Result<()> {
    let h = setup().await?;
    let token = AssetId::Token(addr(0x77));
    h.gateway.set_rate(token, 3, 1).await;
    h.ledger
        .mint(token, treasury_addr(), TokenAmount::from_base_units(1_000))
        .await?;

    h.controller.distribute(&[token], 0).await?;

    // Owner keeps the asset itself; the combined 600 swaps to 1800
    // reference, split 10:50 between stake and burn
    assert_eq!(
        h.ledger.balance_of(token, owner_addr()).await?,
        TokenAmount::from_base_units(400)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), pool_addr()).await?,
        TokenAmount::from_base_units(300)
    );
    assert_eq!(
        h.ledger
            .balance_of(reference(), h.controller.burn_sink())
            .await?,
        TokenAmount::from_base_units(1_500)
    );
    Ok(())
}

#[tokio::test]
async fn test_zero_balance_asset_is_skipped() -> Result<()> {
    let h = setup().await?;
    h.controller.distribute(&[reference()], 0).await?;
    assert_eq!(h.controller.stake_pool().await.reward_rate().await, 0);
    assert_eq!(
        h.ledger.balance_of(reference(), owner_addr()).await?,
        TokenAmount::ZERO
    );
    Ok(())
}

#[tokio::test]
async fn test_batch_distribution_is_atomic() -> Result<()> {
    let h = setup().await?;
    let routeless = AssetId::Token(addr(0x77));
    h.ledger
        .mint(reference(), treasury_addr(), TokenAmount::from_base_units(1_000))
        .await?;
    h.ledger
        .mint(routeless, treasury_addr(), TokenAmount::from_base_units(500))
        .await?;

    // Reference distributes fine, then the routeless asset fails; the
    // whole batch must unwind
    let err = h
        .controller
        .distribute(&[reference(), routeless], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::ConversionUnavailable(_)));

    assert_eq!(
        h.ledger.balance_of(reference(), treasury_addr()).await?,
        TokenAmount::from_base_units(1_000)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), owner_addr()).await?,
        TokenAmount::ZERO
    );
    let pool = h.controller.stake_pool().await;
    assert_eq!(pool.reward_rate().await, 0);
    assert_eq!(pool.period_finish().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_rescue_non_convertible_asset() -> Result<()> {
    let h = setup().await?;
    let stuck = AssetId::Token(addr(0x77));
    h.ledger
        .mint(stuck, treasury_addr(), TokenAmount::from_base_units(500))
        .await?;

    let err = h
        .controller
        .rescue_non_convertible_asset(stuck, TokenAmount::from_base_units(500), addr(0x99))
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::Unauthorized));

    h.controller
        .rescue_non_convertible_asset(stuck, TokenAmount::from_base_units(500), owner_addr())
        .await?;
    assert_eq!(
        h.ledger.balance_of(stuck, owner_addr()).await?,
        TokenAmount::from_base_units(500)
    );

    // An asset with a live route must go through distribute instead
    let convertible = AssetId::Token(addr(0x78));
    h.gateway.set_rate(convertible, 1, 1).await;
    let err = h
        .controller
        .rescue_non_convertible_asset(convertible, TokenAmount::from_base_units(1), owner_addr())
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::ConversionUnavailable(_)));
    Ok(())
}

#[tokio::test]
async fn test_update_distribution_percentages() -> Result<()> {
    let h = setup().await?;

    let err = h
        .controller
        .update_distribution_percentages(40, 20, 40, addr(0x99))
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::Unauthorized));

    let err = h
        .controller
        .update_distribution_percentages(50, 20, 40, owner_addr())
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::InvalidConfig { .. }));

    h.controller
        .update_distribution_percentages(40, 20, 40, owner_addr())
        .await?;

    h.ledger
        .mint(reference(), treasury_addr(), TokenAmount::from_base_units(1_000))
        .await?;
    h.controller.distribute(&[reference()], 0).await?;

    assert_eq!(
        h.ledger.balance_of(reference(), owner_addr()).await?,
        TokenAmount::from_base_units(400)
    );
    assert_eq!(
        h.ledger.balance_of(reference(), pool_addr()).await?,
        TokenAmount::from_base_units(200)
    );
    assert_eq!(
        h.ledger
            .balance_of(reference(), h.controller.burn_sink())
            .await?,
        TokenAmount::from_base_units(400)
    );
    Ok(())
}

#[tokio::test]
async fn test_deposit_paths() -> Result<()> {
    let h = setup().await?;
    let user = addr(0x05);
    h.ledger
        .mint(AssetId::Native, user, TokenAmount::from_base_units(100))
        .await?;

    let err = h
        .controller
        .deposit_native(user, TokenAmount::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, TreasuryError::ZeroAmount));

    h.controller
        .deposit_native(user, TokenAmount::from_base_units(100))
        .await?;
    assert_eq!(
        h.controller.balance(AssetId::Native).await?,
        TokenAmount::from_base_units(100)
    );
    Ok(())
}
