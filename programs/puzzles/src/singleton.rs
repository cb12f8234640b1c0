//! Singleton layer
//!
//! A singleton is a chain of coins, one alive at a time, all descending from
//! one launcher. Each spend proves its parent was either the launcher or an
//! earlier coin of the same chain, runs the inner puzzle, and turns the
//! inner puzzle's `RecreateSelf` into the next coin of the chain.

use coinpair_common::{Asset, Bytes32, Coin, CoinSpend, Condition, LineageProof, Program, SINGLETON_AMOUNT};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::launcher;
use crate::puzzle::{curry_hash, Puzzle};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonSolution {
    pub lineage_proof: LineageProof,
    pub inner_solution: Program,
}

pub fn puzzle_hash(launcher_id: &Bytes32, inner_puzzle_hash: &Bytes32) -> Bytes32 {
    curry_hash(b"singleton", &[launcher_id.as_bytes(), inner_puzzle_hash.as_bytes()])
}

/// Id of the coin the lineage proof describes
pub fn proven_parent_id(launcher_id: &Bytes32, proof: &LineageProof) -> Bytes32 {
    let parent_puzzle_hash = match proof.inner_puzzle_hash {
        Some(inner) => puzzle_hash(launcher_id, &inner),
        None => launcher::puzzle_hash(),
    };
    Coin::new(proof.parent_name, parent_puzzle_hash, proof.amount).coin_id()
}

/// Check that `coin`'s parent is the launcher or a coin of the same singleton
pub fn verify_lineage(launcher_id: &Bytes32, coin: &Coin, proof: &LineageProof) -> PuzzleResult<()> {
    let parent = proven_parent_id(launcher_id, proof);
    if parent != coin.parent_coin_info {
        return Err(PuzzleError::LineageMismatch {
            expected_parent: coin.parent_coin_info,
        });
    }
    if proof.is_eve() && parent != *launcher_id {
        return Err(PuzzleError::LineageMismatch {
            expected_parent: *launcher_id,
        });
    }
    Ok(())
}

/// Lineage proof for the children of `spend`'s coin.
///
/// `spend` is either a launcher spend (children are eve coins) or a
/// singleton spend.
pub fn lineage_proof_for_spend(spend: &CoinSpend) -> PuzzleResult<LineageProof> {
    match Puzzle::from_program(&spend.puzzle_reveal)? {
        Puzzle::Launcher => Ok(LineageProof::eve(&spend.coin)),
        Puzzle::Singleton { inner, .. } => Ok(LineageProof::from_parent(&spend.coin, inner.puzzle_hash())),
        _ => Err(PuzzleError::NotSpendable("non-singleton parent")),
    }
}

pub(crate) fn run(
    launcher_id: &Bytes32,
    inner: &Puzzle,
    coin: &Coin,
    solution: &Program,
) -> PuzzleResult<Vec<Condition>> {
    if coin.amount != SINGLETON_AMOUNT {
        return Err(PuzzleError::SingletonAmount(coin.amount));
    }

    let solution: SingletonSolution = solution.to_value()?;
    verify_lineage(launcher_id, coin, &solution.lineage_proof)?;

    let inner_conditions = match inner {
        Puzzle::Pair(pair) => {
            if pair.launcher_id != *launcher_id {
                return Err(PuzzleError::LauncherMismatch {
                    outer: *launcher_id,
                    inner: pair.launcher_id,
                });
            }
            pair.run(coin, &solution.inner_solution)?
        }
        Puzzle::Router(router) => router.run(coin, &solution.inner_solution)?,
        _ => return Err(PuzzleError::NotSpendable("singleton inner")),
    };

    let recreations = inner_conditions
        .iter()
        .filter(|c| matches!(c, Condition::RecreateSelf { .. }))
        .count();
    if recreations != 1 {
        return Err(PuzzleError::SuccessorCount(recreations));
    }

    Ok(inner_conditions
        .into_iter()
        .map(|c| match c {
            Condition::RecreateSelf { inner_puzzle_hash } => Condition::create_coin(
                puzzle_hash(launcher_id, &inner_puzzle_hash),
                coin.amount,
                Asset::Native,
            ),
            other => other,
        })
        .collect())
}
