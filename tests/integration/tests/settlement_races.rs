//! Conflicts between settlements, registry rules and pending-spend chaining

use coinpair_common::{Asset, Bytes32};
use coinpair_integration_tests::{expect_err, inner_puzzle_hash, token_id, PairState, TestChain, OPERATOR, TRADER};
use coinpair_keeper::{locate_reserves, OfferBuilder, SettleError};

const NATIVE_FUNDS: u64 = 1_000_000_000;
const TOKEN_FUNDS: u64 = 10_000;

/// Pair seeded with the genesis deposit of 1e8 native and 1000 token
async fn seeded_pair(chain: &TestChain, name: &str) -> anyhow::Result<(Bytes32, Asset)> {
    let token_id = token_id(name);
    let token = Asset::Token(token_id);
    let pair = chain.bootstrap(token_id, NATIVE_FUNDS, TOKEN_FUNDS).await?;
    let liquidity = chain.liquidity_asset(pair).await?;

    let offer = chain
        .trader_offer(&[(Asset::Native, 100_001_000), (token, 1000)], &[(liquidity, 1000)])
        .await?;
    chain.settle(pair, &offer).await?;
    Ok((pair, token))
}

#[tokio::test]
async fn test_second_pair_for_token_refused() -> anyhow::Result<()> {
    let chain = TestChain::new();
    let token_id = token_id("dup");
    let router = chain.launch_router().await?;
    let pair = chain.create_pair(router, token_id).await?;

    assert_eq!(chain.settler.find_pair(router, &token_id).await?, Some(pair));
    assert_eq!(chain.settler.find_pair(router, &coinpair_integration_tests::token_id("other")).await?, None);

    let funding = chain.fund(OPERATOR, Asset::Native, 10).await;
    match expect_err(chain.settler.create_pair(router, token_id, &funding).await)? {
        SettleError::PairExists {
            token_id: refused,
            pair_launcher_id,
        } => {
            assert_eq!(refused, token_id);
            assert_eq!(pair_launcher_id, pair);
        }
        other => panic!("expected PairExists, got {}", other),
    }

    // A different token still gets its own pair
    let second = chain.create_pair(router, coinpair_integration_tests::token_id("other")).await?;
    assert_ne!(second, pair);
    assert_eq!(chain.settler.sync_router(router).await?.inner.pair_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_losing_race_is_stale_then_repriced() -> anyhow::Result<()> {
    let chain = TestChain::new();
    let (pair, token) = seeded_pair(&chain, "race").await?;

    // Two traders quote against the same pair coin
    let first_coin = chain.fund(TRADER, Asset::Native, 10_000_000).await;
    let second_coin = chain.fund(TRADER, Asset::Native, 10_000_000).await;
    let me = inner_puzzle_hash(TRADER);

    let first = OfferBuilder::new(vec![first_coin])
        .offer(Asset::Native, 10_000_000)
        .request(token, me, 90)
        .build()?;
    let second = OfferBuilder::new(vec![second_coin])
        .offer(Asset::Native, 10_000_000)
        .request(token, me, 90)
        .build()?;

    let winning = chain.settler.prepare(pair, &first).await?;
    let losing = chain.settler.prepare(pair, &second).await?;

    chain.settler.submit(&winning.bundle).await?;
    let err = expect_err(chain.settler.submit(&losing.bundle).await)?;
    assert!(err.is_stale(), "expected a stale reference, got {}", err);

    // Re-syncing sees the moved price, so the same offer no longer fits
    match expect_err(chain.settler.prepare(pair, &second).await)? {
        SettleError::OfferPriceMismatch { asset, expected, offered } => {
            assert_eq!(asset, token);
            assert_eq!(offered, 90);
            assert!(expected < 90);
        }
        other => panic!("expected OfferPriceMismatch, got {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_off_by_one_request_refused() -> anyhow::Result<()> {
    let chain = TestChain::new();
    let (pair, token) = seeded_pair(&chain, "greedy").await?;

    let offer = chain.trader_offer(&[(Asset::Native, 10_000_000)], &[(token, 91)]).await?;
    match expect_err(chain.settler.settle(pair, &offer).await)? {
        SettleError::OfferPriceMismatch { expected, offered, .. } => {
            assert_eq!(expected, 90);
            assert_eq!(offered, 91);
        }
        other => panic!("expected OfferPriceMismatch, got {}", other),
    }

    // Nothing moved
    assert_eq!(chain.state(pair).await?, PairState::new(1000, 100_000_000, 1000));
    Ok(())
}

#[tokio::test]
async fn test_forged_reserve_coin_ignored() -> anyhow::Result<()> {
    let chain = TestChain::new();
    let (pair, token) = seeded_pair(&chain, "forged").await?;

    // Someone locks coins with the reserve puzzle hashes and matching amounts
    let snapshot = chain.pair(pair).await?;
    let forged_native = chain
        .ledger
        .create_coin(snapshot.inner.native_reserve_puzzle_hash(), 100_000_000, Asset::Native)
        .await;
    chain
        .ledger
        .create_coin(snapshot.inner.token_reserve_puzzle_hash(), 1000, token)
        .await;

    let reserves = locate_reserves(&snapshot)?.expect("seeded pair has reserves");
    assert_ne!(reserves.native.coin, forged_native);
    assert_eq!(reserves.native.coin.parent_coin_info, snapshot.creating_spend.coin.coin_id());

    let offer = chain.trader_offer(&[(Asset::Native, 10_000_000)], &[(token, 90)]).await?;
    chain.settle(pair, &offer).await?;
    assert_eq!(chain.state(pair).await?, PairState::new(1000, 110_000_000, 910));
    Ok(())
}

#[tokio::test]
async fn test_chains_onto_pending_transition() -> anyhow::Result<()> {
    let chain = TestChain::with_mempool();
    let (pair, token) = seeded_pair(&chain, "mempool").await?;

    let first_coin = chain.fund(TRADER, Asset::Native, 10_000_000).await;
    let second_coin = chain.fund(TRADER, token, 50).await;
    let me = inner_puzzle_hash(TRADER);

    let first = OfferBuilder::new(vec![first_coin])
        .offer(Asset::Native, 10_000_000)
        .request(token, me, 90)
        .build()?;
    chain.settler.settle(pair, &first).await?;
    assert_eq!(chain.ledger.mempool_len().await, 1);

    // The pending swap is visible to the next sync
    let pending = chain.pair(pair).await?;
    assert!(pending.is_pending());
    assert_eq!(pending.state(), PairState::new(1000, 110_000_000, 910));

    let second = OfferBuilder::new(vec![second_coin])
        .offer(token, 50)
        .request(Asset::Native, me, 5_691_137)
        .build()?;
    chain.settler.settle(pair, &second).await?;

    // The chained bundle replaced the first one
    assert_eq!(chain.ledger.mempool_len().await, 1);
    assert_eq!(chain.confirm().await, 1);

    let confirmed = chain.pair(pair).await?;
    assert!(!confirmed.is_pending());
    assert_eq!(confirmed.state(), PairState::new(1000, 104_308_863, 960));
    Ok(())
}
