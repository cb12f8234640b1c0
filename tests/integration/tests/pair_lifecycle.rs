//! Pair lifecycle against the in-memory ledger
//!
//! Genesis deposit, a second deposit, partial withdrawal, swaps in both
//! directions and a full withdrawal, with the trader's balances checked
//! at the end.

use coinpair_common::Asset;
use coinpair_integration_tests::{token_id, PairState, TestChain, TRADER};
use coinpair_keeper::OfferIntent;

const NATIVE_FUNDS: u64 = 1_000_000_000;
const TOKEN_FUNDS: u64 = 10_000;

#[tokio::test]
async fn test_full_pair_lifecycle() -> anyhow::Result<()> {
    println!("========================================");
    println!("Pair lifecycle: deposit, swap, withdraw");
    println!("========================================");

    let chain = TestChain::new();
    let token_id = token_id("lifecycle");
    let token = Asset::Token(token_id);
    let pair = chain.bootstrap(token_id, NATIVE_FUNDS, TOKEN_FUNDS).await?;
    let liquidity = chain.liquidity_asset(pair).await?;

    assert!(chain.state(pair).await?.is_empty());

    // Genesis deposit: minted liquidity carries native units
    let offer = chain
        .trader_offer(&[(Asset::Native, 100_001_000), (token, 1000)], &[(liquidity, 1000)])
        .await?;
    let settled = chain.settle(pair, &offer).await?;
    assert_eq!(settled.intent, OfferIntent::DepositLiquidity);
    assert_eq!(chain.state(pair).await?, PairState::new(1000, 100_000_000, 1000));
    println!("  after genesis deposit: {}", chain.state(pair).await?);

    // Deposit at the pool price
    let offer = chain
        .trader_offer(&[(Asset::Native, 400_004_000), (token, 4000)], &[(liquidity, 4000)])
        .await?;
    chain.settle(pair, &offer).await?;
    assert_eq!(chain.state(pair).await?, PairState::new(5000, 500_000_000, 5000));
    assert_eq!(chain.balance(TRADER, liquidity).await, 5000);

    // Partial withdrawal
    let offer = chain
        .trader_offer(&[(liquidity, 800)], &[(Asset::Native, 80_000_800), (token, 800)])
        .await?;
    let settled = chain.settle(pair, &offer).await?;
    assert_eq!(settled.intent, OfferIntent::WithdrawLiquidity);
    assert_eq!(chain.state(pair).await?, PairState::new(4200, 420_000_000, 4200));
    assert_eq!(chain.balance(TRADER, liquidity).await, 4200);

    // Native in, token out
    let offer = chain.trader_offer(&[(Asset::Native, 100_000_000)], &[(token, 803)]).await?;
    let settled = chain.settle(pair, &offer).await?;
    assert_eq!(settled.intent, OfferIntent::SwapNativeForToken);
    assert_eq!(chain.state(pair).await?, PairState::new(4200, 520_000_000, 3397));

    // Token in, native out
    let offer = chain.trader_offer(&[(token, 1000)], &[(Asset::Native, 117_621_867)]).await?;
    let settled = chain.settle(pair, &offer).await?;
    assert_eq!(settled.intent, OfferIntent::SwapTokenForNative);
    assert_eq!(chain.state(pair).await?, PairState::new(4200, 402_378_133, 4397));
    println!("  after swaps: {}", chain.state(pair).await?);

    // Withdraw everything
    let offer = chain
        .trader_offer(&[(liquidity, 4200)], &[(Asset::Native, 402_382_333), (token, 4397)])
        .await?;
    chain.settle(pair, &offer).await?;
    assert!(chain.state(pair).await?.is_empty());

    // The trader was the only participant, so everything came back
    assert_eq!(chain.balance(TRADER, Asset::Native).await, NATIVE_FUNDS);
    assert_eq!(chain.balance(TRADER, token).await, TOKEN_FUNDS);
    assert_eq!(chain.balance(TRADER, liquidity).await, 0);

    println!("========================================");
    println!("Pair lifecycle PASSED");
    println!("========================================");
    Ok(())
}

#[tokio::test]
async fn test_sync_from_last_known_matches_full_walk() -> anyhow::Result<()> {
    let chain = TestChain::new();
    let token_id = token_id("resume");
    let token = Asset::Token(token_id);
    let pair = chain.bootstrap(token_id, NATIVE_FUNDS, TOKEN_FUNDS).await?;
    let liquidity = chain.liquidity_asset(pair).await?;

    let offer = chain
        .trader_offer(&[(Asset::Native, 100_001_000), (token, 1000)], &[(liquidity, 1000)])
        .await?;
    chain.settle(pair, &offer).await?;
    let checkpoint = chain.pair(pair).await?;

    let offer = chain.trader_offer(&[(Asset::Native, 10_000_000)], &[(token, 90)]).await?;
    chain.settle(pair, &offer).await?;
    let offer = chain.trader_offer(&[(token, 50)], &[(Asset::Native, 5_691_137)]).await?;
    chain.settle(pair, &offer).await?;

    let full = chain.pair(pair).await?;
    let resumed = coinpair_keeper::sync::sync_pair(
        chain.ledger.as_ref(),
        None,
        pair,
        Some(checkpoint.coin.coin_id()),
    )
    .await?;

    assert_eq!(resumed.coin, full.coin);
    assert_eq!(resumed.inner, full.inner);
    assert_eq!(resumed.lineage_proof, full.lineage_proof);
    assert_ne!(resumed.coin, checkpoint.coin);

    // Resuming from the tip itself decodes it from its parent's spend
    let at_tip = coinpair_keeper::sync::sync_pair(chain.ledger.as_ref(), None, pair, Some(full.coin.coin_id())).await?;
    assert_eq!(at_tip.inner, full.inner);
    Ok(())
}
