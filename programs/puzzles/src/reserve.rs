//! Pair reserves
//!
//! A reserve coin can only be spent together with a coin of its pair's
//! singleton, and only if the reserve itself was created by that singleton.
//! The pair spend decides where the value goes.

use coinpair_common::{Bytes32, Coin, Condition, LineageProof, Program};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::puzzle::curry_hash;
use crate::singleton;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSolution {
    /// Proof that the reserve's parent was a pair coin
    pub lineage_proof: LineageProof,
    /// Pair coin being spent alongside
    pub pair_coin: Coin,
    pub pair_inner_puzzle_hash: Bytes32,
}

pub fn puzzle_hash(launcher_id: &Bytes32) -> Bytes32 {
    curry_hash(b"reserve", &[launcher_id.as_bytes()])
}

pub(crate) fn run(launcher_id: &Bytes32, coin: &Coin, solution: &Program) -> PuzzleResult<Vec<Condition>> {
    let solution: ReserveSolution = solution.to_value()?;

    // Reserves are only ever created by pair spends, never by the launcher
    if solution.lineage_proof.is_eve() {
        return Err(PuzzleError::LineageMismatch {
            expected_parent: coin.parent_coin_info,
        });
    }
    singleton::verify_lineage(launcher_id, coin, &solution.lineage_proof)?;

    let expected = singleton::puzzle_hash(launcher_id, &solution.pair_inner_puzzle_hash);
    if solution.pair_coin.puzzle_hash != expected {
        return Err(PuzzleError::ForeignPairCoin {
            coin_id: solution.pair_coin.coin_id(),
            launcher_id: *launcher_id,
        });
    }

    Ok(vec![Condition::AssertConcurrentSpend {
        coin_id: solution.pair_coin.coin_id(),
    }])
}
