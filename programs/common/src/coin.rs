//! Coins, spends and bundles

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::bytes::{sha256, Bytes32};
use crate::program::Program;

/// An immutable, single-use unit of value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub parent_coin_info: Bytes32,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}

impl Coin {
    pub fn new(parent_coin_info: Bytes32, puzzle_hash: Bytes32, amount: u64) -> Self {
        Self {
            parent_coin_info,
            puzzle_hash,
            amount,
        }
    }

    /// sha256(parent_coin_info || puzzle_hash || amount as big-endian u64)
    pub fn coin_id(&self) -> Bytes32 {
        sha256(&[
            self.parent_coin_info.as_bytes(),
            self.puzzle_hash.as_bytes(),
            &self.amount.to_be_bytes(),
        ])
    }
}

/// Consumption of a coin: the puzzle it commits to and the solution run against it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSpend {
    pub coin: Coin,
    pub puzzle_reveal: Program,
    pub solution: Program,
}

impl CoinSpend {
    pub fn new(coin: Coin, puzzle_reveal: Program, solution: Program) -> Self {
        Self {
            coin,
            puzzle_reveal,
            solution,
        }
    }
}

/// Signature placeholder for spends that need the owner's key.
///
/// Signing is done by the wallet that owns the coins; bundles only carry
/// whatever it produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

/// An atomic set of spends: either every spend confirms or none does
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendBundle {
    pub coin_spends: Vec<CoinSpend>,
    pub signatures: Vec<Signature>,
}

impl SpendBundle {
    pub fn new(coin_spends: Vec<CoinSpend>, signatures: Vec<Signature>) -> Self {
        Self {
            coin_spends,
            signatures,
        }
    }

    /// Concatenate bundles in order, dropping spends and signatures that
    /// appear more than once
    pub fn aggregate<'a, I>(bundles: I) -> Self
    where
        I: IntoIterator<Item = &'a SpendBundle>,
    {
        let mut seen = HashSet::new();
        let mut out = SpendBundle::default();

        for bundle in bundles {
            for spend in &bundle.coin_spends {
                if seen.insert(spend.coin.coin_id()) {
                    out.coin_spends.push(spend.clone());
                }
            }
            for sig in &bundle.signatures {
                if !out.signatures.contains(sig) {
                    out.signatures.push(sig.clone());
                }
            }
        }

        out
    }

    /// Identifier of the bundle: hash of its spent coin ids in order
    pub fn name(&self) -> Bytes32 {
        let ids: Vec<Bytes32> = self.coin_spends.iter().map(|cs| cs.coin.coin_id()).collect();
        let parts: Vec<&[u8]> = ids.iter().map(|id| id.as_ref()).collect();
        sha256(&parts)
    }

    /// Ids of every coin this bundle spends
    pub fn removals(&self) -> Vec<Bytes32> {
        self.coin_spends.iter().map(|cs| cs.coin.coin_id()).collect()
    }

    /// Spend of `coin_id` inside this bundle, if any
    pub fn spend_of(&self, coin_id: &Bytes32) -> Option<&CoinSpend> {
        self.coin_spends.iter().find(|cs| cs.coin.coin_id() == *coin_id)
    }
}
