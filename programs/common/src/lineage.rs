//! Lineage proofs for singleton coins

use serde::{Deserialize, Serialize};

use crate::bytes::Bytes32;
use crate::coin::Coin;

/// Evidence about a singleton coin's parent that lets the singleton layer
/// recompute the parent's id and check it against `coin.parent_coin_info`.
///
/// `inner_puzzle_hash` is `None` when the parent is the launcher itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageProof {
    /// The parent's own parent coin id
    pub parent_name: Bytes32,
    pub inner_puzzle_hash: Option<Bytes32>,
    pub amount: u64,
}

impl LineageProof {
    /// Proof for the first coin after the launcher (the eve coin)
    pub fn eve(launcher: &Coin) -> Self {
        Self {
            parent_name: launcher.parent_coin_info,
            inner_puzzle_hash: None,
            amount: launcher.amount,
        }
    }

    /// Proof for a child of `parent`, whose inner state hashes to `inner_puzzle_hash`
    pub fn from_parent(parent: &Coin, inner_puzzle_hash: Bytes32) -> Self {
        Self {
            parent_name: parent.parent_coin_info,
            inner_puzzle_hash: Some(inner_puzzle_hash),
            amount: parent.amount,
        }
    }

    pub fn is_eve(&self) -> bool {
        self.inner_puzzle_hash.is_none()
    }
}
