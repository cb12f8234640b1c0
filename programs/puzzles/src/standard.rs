//! Owner-controlled wallet coins

use coinpair_common::{Asset, Bytes32, Condition, Program};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::puzzle::curry_hash;

/// The owner's chosen output conditions.
///
/// Authorization is the owner's signature over these conditions, which the
/// wallet adds to the bundle; it is not checked here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardSolution {
    pub conditions: Vec<Condition>,
}

pub fn puzzle_hash(owner: &Bytes32) -> Bytes32 {
    curry_hash(b"standard", &[owner.as_bytes()])
}

pub(crate) fn run(solution: &Program) -> PuzzleResult<Vec<Condition>> {
    let solution: StandardSolution = solution.to_value()?;
    for condition in &solution.conditions {
        check_wallet_condition(condition, "standard")?;
    }
    Ok(solution.conditions)
}

/// Wallet-style puzzles only create native coins and never touch supply
pub(crate) fn check_wallet_condition(condition: &Condition, puzzle: &'static str) -> PuzzleResult<()> {
    match condition {
        Condition::CreateCoin { asset: Asset::Native, .. } => Ok(()),
        Condition::CreateCoin { .. }
        | Condition::MintToken { .. }
        | Condition::BurnToken { .. }
        | Condition::RecreateSelf { .. } => Err(PuzzleError::RestrictedCondition(puzzle)),
        _ => Ok(()),
    }
}
