//! Coinpair integration harness
//!
//! A `TestChain` wraps an in-memory ledger and a settler, plus one trader
//! wallet and one operator wallet that pays for launches. Everything goes
//! through the same public keeper API the service uses.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use coinpair_common::{sha256, Asset, Bytes32};
use coinpair_keeper::{MemoryLedger, Offer, OfferBuilder, PairSnapshot, Settlement, Settler, WalletCoin};
use coinpair_puzzles::Puzzle;

pub use pair_model::PairState;

pub const TRADER: Bytes32 = Bytes32([0xA1; 32]);
pub const OPERATOR: Bytes32 = Bytes32([0x0F; 32]);

/// Asset id for a test token named `name`
pub fn token_id(name: &str) -> Bytes32 {
    sha256(&[b"test-token", name.as_bytes()])
}

/// Inner puzzle hash payments to `owner` are requested at
pub fn inner_puzzle_hash(owner: Bytes32) -> Bytes32 {
    Puzzle::standard(owner).puzzle_hash()
}

pub struct TestChain {
    pub ledger: Arc<MemoryLedger>,
    pub settler: Settler<MemoryLedger>,
    mempool: bool,
}

impl TestChain {
    /// Every accepted bundle is confirmed immediately
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        Self {
            settler: Settler::new(ledger.clone()),
            ledger,
            mempool: false,
        }
    }

    /// Accepted bundles wait in the mempool until `confirm`
    pub fn with_mempool() -> Self {
        let ledger = Arc::new(MemoryLedger::with_mempool());
        Self {
            settler: Settler::with_mempool(ledger.clone(), Duration::ZERO),
            ledger,
            mempool: true,
        }
    }

    /// Farm a block when running with a mempool
    pub async fn confirm(&self) -> usize {
        if self.mempool {
            self.ledger.farm_block().await
        } else {
            0
        }
    }

    fn puzzle_hash(owner: Bytes32, asset: Asset) -> Bytes32 {
        Puzzle::for_asset(asset, Puzzle::standard(owner)).puzzle_hash()
    }

    /// Give `owner` a fresh coin of `asset`
    pub async fn fund(&self, owner: Bytes32, asset: Asset, amount: u64) -> WalletCoin {
        let coin = self
            .ledger
            .create_coin(Self::puzzle_hash(owner, asset), amount, asset)
            .await;
        WalletCoin { coin, asset, owner }
    }

    /// Confirmed unspent coins `owner` holds in `asset`
    pub async fn wallet(&self, owner: Bytes32, asset: Asset) -> Vec<WalletCoin> {
        self.ledger
            .unspent_coins(&Self::puzzle_hash(owner, asset))
            .await
            .into_iter()
            .map(|record| WalletCoin {
                coin: record.coin,
                asset,
                owner,
            })
            .collect()
    }

    pub async fn balance(&self, owner: Bytes32, asset: Asset) -> u64 {
        self.ledger.balance(&Self::puzzle_hash(owner, asset)).await
    }

    /// Launch a router paid for by the operator
    pub async fn launch_router(&self) -> Result<Bytes32> {
        let funding = self.fund(OPERATOR, Asset::Native, 10).await;
        let router = self.settler.launch_router(&funding).await?;
        self.confirm().await;
        Ok(router)
    }

    /// Register `token` with `router` and launch its pair
    pub async fn create_pair(&self, router: Bytes32, token: Bytes32) -> Result<Bytes32> {
        let funding = self.fund(OPERATOR, Asset::Native, 10).await;
        let pair = self.settler.create_pair(router, token, &funding).await?;
        self.confirm().await;
        Ok(pair)
    }

    /// Router plus one pair for `token`, with the trader funded
    pub async fn bootstrap(&self, token: Bytes32, native: u64, tokens: u64) -> Result<Bytes32> {
        let router = self.launch_router().await?;
        let pair = self.create_pair(router, token).await?;
        self.fund(TRADER, Asset::Native, native).await;
        self.fund(TRADER, Asset::Token(token), tokens).await;
        Ok(pair)
    }

    /// Trader offer built from every confirmed coin of the offered assets
    pub async fn trader_offer(&self, offered: &[(Asset, u64)], requested: &[(Asset, u64)]) -> Result<Offer> {
        let mut coins = Vec::new();
        for (asset, _) in offered {
            coins.extend(self.wallet(TRADER, *asset).await);
        }
        let mut builder = OfferBuilder::new(coins);
        for (asset, amount) in offered {
            builder = builder.offer(*asset, *amount);
        }
        for (asset, amount) in requested {
            builder = builder.request(*asset, inner_puzzle_hash(TRADER), *amount);
        }
        Ok(builder.build()?)
    }

    /// Settle `offer` against `pair` and confirm it
    pub async fn settle(&self, pair: Bytes32, offer: &Offer) -> Result<Settlement> {
        let settlement = self.settler.settle(pair, offer).await?;
        self.confirm().await;
        Ok(settlement)
    }

    pub async fn pair(&self, pair: Bytes32) -> Result<PairSnapshot> {
        Ok(self.settler.sync_pair(pair).await?)
    }

    pub async fn state(&self, pair: Bytes32) -> Result<PairState> {
        Ok(self.pair(pair).await?.state())
    }

    pub async fn liquidity_asset(&self, pair: Bytes32) -> Result<Asset> {
        let snapshot = self.pair(pair).await?;
        Ok(Asset::Token(snapshot.inner.liquidity_asset_id()))
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail with the error text when `result` is not the expected error
pub fn expect_err<T>(result: coinpair_keeper::SettleResult<T>) -> Result<coinpair_keeper::SettleError> {
    match result {
        Ok(_) => Err(anyhow!("expected an error, got success")),
        Err(e) => Ok(e),
    }
}
