//! Router: registry of pairs, one per token
//!
//! The router singleton commits to a map `token_id -> pair launcher id`.
//! Spending it for a new token launches that token's pair and records it;
//! a token that already has a pair is refused.

use std::collections::BTreeMap;

use coinpair_common::{coin_announcement_id, Asset, Bytes32, Coin, Condition, Program, SINGLETON_AMOUNT};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::launcher::{self, LaunchMetadata};
use crate::pair::PairPuzzle;
use crate::puzzle::{curry_hash, Puzzle};
use crate::singleton;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterPuzzle {
    /// token id -> pair launcher id
    pub pairs: BTreeMap<Bytes32, Bytes32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSolution {
    pub token_id: Bytes32,
}

impl RouterPuzzle {
    pub fn inner_puzzle_hash(&self) -> Bytes32 {
        let mut params: Vec<&[u8]> = Vec::with_capacity(self.pairs.len() * 2);
        for (token_id, launcher_id) in &self.pairs {
            params.push(token_id.as_bytes());
            params.push(launcher_id.as_bytes());
        }
        curry_hash(b"router", &params)
    }

    /// Pair launcher registered for `token_id`
    pub fn find_pair(&self, token_id: &Bytes32) -> Option<Bytes32> {
        self.pairs.get(token_id).copied()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Launcher coin created when router coin `router_coin_id` registers a pair
    pub fn pair_launcher_coin(router_coin_id: Bytes32) -> Coin {
        Coin::new(router_coin_id, launcher::puzzle_hash(), SINGLETON_AMOUNT)
    }

    /// Registry after `router_coin` registers `token_id`
    pub fn register_pair(&self, router_coin: &Coin, token_id: Bytes32) -> PuzzleResult<(Self, Bytes32)> {
        if let Some(existing) = self.find_pair(&token_id) {
            return Err(PuzzleError::PairExists {
                token_id,
                pair_launcher_id: existing,
            });
        }

        let pair_launcher_id = Self::pair_launcher_coin(router_coin.coin_id()).coin_id();
        let mut next = self.clone();
        next.pairs.insert(token_id, pair_launcher_id);
        Ok((next, pair_launcher_id))
    }

    pub(crate) fn run(&self, coin: &Coin, solution: &Program) -> PuzzleResult<Vec<Condition>> {
        let solution: RouterSolution = solution.to_value()?;
        let (next, pair_launcher_id) = self.register_pair(coin, solution.token_id)?;

        let eve = PairPuzzle::genesis(pair_launcher_id, solution.token_id);
        let eve_puzzle_hash = singleton::puzzle_hash(&pair_launcher_id, &eve.inner_puzzle_hash());
        let message = launcher::launch_message(
            &eve_puzzle_hash,
            SINGLETON_AMOUNT,
            &LaunchMetadata::Pair {
                token_id: solution.token_id,
            },
        )?;

        Ok(vec![
            Condition::RecreateSelf {
                inner_puzzle_hash: next.inner_puzzle_hash(),
            },
            Condition::create_coin(launcher::puzzle_hash(), SINGLETON_AMOUNT, Asset::Native),
            Condition::AssertCoinAnnouncement {
                announcement_id: coin_announcement_id(&pair_launcher_id, &message),
            },
        ])
    }

    /// Singleton-wrapped puzzle for the router coin
    pub fn full_puzzle(&self, launcher_id: Bytes32) -> Puzzle {
        Puzzle::singleton(launcher_id, Puzzle::Router(self.clone()))
    }
}
