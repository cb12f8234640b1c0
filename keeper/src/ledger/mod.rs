//! Ledger query interface
//!
//! The keeper never owns chain state. Everything it knows comes through
//! [`LedgerClient`], and everything it produces goes back through
//! [`LedgerClient::submit_transaction`].

pub mod memory;

use async_trait::async_trait;
use coinpair_common::{Asset, Bytes32, Coin, CoinSpend, SpendBundle};
use coinpair_puzzles::PuzzleError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryLedger;

/// A coin as seen by the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin: Coin,
    pub asset: Asset,
    pub confirmed_height: u32,
    pub spent_height: Option<u32>,
}

impl CoinRecord {
    pub fn is_spent(&self) -> bool {
        self.spent_height.is_some()
    }

    pub fn coin_id(&self) -> Bytes32 {
        self.coin.coin_id()
    }
}

/// Why the ledger refused a bundle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("bundle has no spends")]
    Empty,

    #[error("coin {coin_id} spent twice in one bundle")]
    DuplicateSpend { coin_id: Bytes32 },

    #[error("coin {coin_id} already spent")]
    DoubleSpend { coin_id: Bytes32 },

    #[error("coin {coin_id} does not exist")]
    UnknownCoin { coin_id: Bytes32 },

    #[error("coin {coin_id} would be created twice")]
    DuplicateOutput { coin_id: Bytes32 },

    #[error("spend of {coin_id} failed: {error}")]
    Puzzle { coin_id: Bytes32, error: PuzzleError },

    #[error("coin {coin_id} holds {held}, puzzle expects {revealed}")]
    AssetMismatch {
        coin_id: Bytes32,
        held: Asset,
        revealed: Asset,
    },

    #[error("announcement {announcement_id} asserted but never made")]
    MissingAnnouncement { announcement_id: Bytes32 },

    #[error("coin {coin_id} asserted as spent in the same bundle but is not")]
    MissingConcurrentSpend { coin_id: Bytes32 },

    #[error("native outputs {outputs} exceed inputs {inputs}")]
    NativeDeficit { inputs: u128, outputs: u128 },

    #[error("token {asset_id} does not balance: {inputs} in, {outputs} out")]
    TokenImbalance {
        asset_id: Bytes32,
        inputs: i128,
        outputs: i128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { bundle_name: Bytes32 },
    Rejected(Rejection),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger snapshot error: {0}")]
    Snapshot(String),
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_coin_record(&self, coin_id: &Bytes32) -> Result<Option<CoinRecord>, LedgerError>;

    /// Spend that consumed `coin_id`, if it has been spent
    async fn get_coin_spend(&self, coin_id: &Bytes32) -> Result<Option<CoinSpend>, LedgerError>;

    /// Coins created by the spend of `parent_id`
    async fn get_coin_records_by_parent(&self, parent_id: &Bytes32) -> Result<Vec<CoinRecord>, LedgerError>;

    /// Bundles accepted but not yet confirmed
    async fn get_all_mempool_items(&self) -> Result<Vec<SpendBundle>, LedgerError>;

    async fn submit_transaction(&self, bundle: &SpendBundle) -> Result<SubmitOutcome, LedgerError>;

    /// Unspent child of `coin_id` locked with `puzzle_hash`
    async fn get_unspent_successor(
        &self,
        coin_id: &Bytes32,
        puzzle_hash: &Bytes32,
    ) -> Result<Option<CoinRecord>, LedgerError> {
        Ok(self
            .get_coin_records_by_parent(coin_id)
            .await?
            .into_iter()
            .find(|r| r.coin.puzzle_hash == *puzzle_hash && !r.is_spent()))
    }
}

#[async_trait]
impl<L: LedgerClient + ?Sized> LedgerClient for Arc<L> {
    async fn get_coin_record(&self, coin_id: &Bytes32) -> Result<Option<CoinRecord>, LedgerError> {
        (**self).get_coin_record(coin_id).await
    }

    async fn get_coin_spend(&self, coin_id: &Bytes32) -> Result<Option<CoinSpend>, LedgerError> {
        (**self).get_coin_spend(coin_id).await
    }

    async fn get_coin_records_by_parent(&self, parent_id: &Bytes32) -> Result<Vec<CoinRecord>, LedgerError> {
        (**self).get_coin_records_by_parent(parent_id).await
    }

    async fn get_all_mempool_items(&self) -> Result<Vec<SpendBundle>, LedgerError> {
        (**self).get_all_mempool_items().await
    }

    async fn submit_transaction(&self, bundle: &SpendBundle) -> Result<SubmitOutcome, LedgerError> {
        (**self).submit_transaction(bundle).await
    }
}
