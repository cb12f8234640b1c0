//! Settlement errors
//!
//! Every variant is a rejection of one attempt. Callers re-sync and
//! re-quote on `StaleReference`; the others need a different offer.

use coinpair_common::{Asset, Bytes32};
use coinpair_puzzles::PuzzleError;
use pair_model::FormulaError;
use thiserror::Error;

use crate::ledger::{LedgerError, Rejection};

#[derive(Debug, Error)]
pub enum SettleError {
    /// The history walk hit a coin or spend the ledger does not know
    #[error("chain desync at coin {coin_id}: {reason}")]
    ChainDesync { coin_id: Bytes32, reason: String },

    /// A spend in the pair's history does not decode as a pair transition
    #[error("malformed state in spend of {coin_id}: {reason}")]
    MalformedState { coin_id: Bytes32, reason: String },

    #[error("{asset} reserve of amount {expected} not found among children of {parent_coin_id} ({candidates} candidates)")]
    ReserveNotFound {
        parent_coin_id: Bytes32,
        asset: Asset,
        expected: u64,
        candidates: usize,
    },

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("offer price mismatch for {asset}: expected {expected}, offered {offered}")]
    OfferPriceMismatch {
        asset: Asset,
        expected: u64,
        offered: u64,
    },

    #[error("unsupported offer: {0}")]
    UnsupportedOffer(String),

    #[error("malformed offer: {0}")]
    MalformedOffer(String),

    /// Another transition consumed the coin first
    #[error("stale reference: coin {coin_id} already spent")]
    StaleReference { coin_id: Bytes32 },

    #[error("transaction rejected: {0}")]
    Rejected(Rejection),

    #[error("pair for token {token_id} already exists: {pair_launcher_id}")]
    PairExists {
        token_id: Bytes32,
        pair_launcher_id: Bytes32,
    },

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SettleError {
    /// True when re-syncing the pair and rebuilding may succeed
    pub fn is_stale(&self) -> bool {
        matches!(self, SettleError::StaleReference { .. })
    }
}

pub type SettleResult<T> = Result<T, SettleError>;
