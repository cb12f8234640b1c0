//! Singleton launcher
//!
//! The launcher coin's id becomes the singleton's permanent identity. Its
//! spend creates the eve coin and announces what it created, so whoever
//! funded the launcher can assert the launch went as intended.

use coinpair_common::{sha256, Asset, Bytes32, Condition, Program};
use serde::{Deserialize, Serialize};

use crate::error::PuzzleResult;
use crate::puzzle::curry_hash;

/// What a launcher is launching, recorded in its solution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchMetadata {
    Router,
    Pair { token_id: Bytes32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherSolution {
    pub singleton_puzzle_hash: Bytes32,
    pub amount: u64,
    pub metadata: LaunchMetadata,
}

impl LauncherSolution {
    pub fn message(&self) -> PuzzleResult<Bytes32> {
        launch_message(&self.singleton_puzzle_hash, self.amount, &self.metadata)
    }
}

pub fn puzzle_hash() -> Bytes32 {
    curry_hash(b"launcher", &[])
}

/// Message announced by a launcher spend
pub fn launch_message(
    singleton_puzzle_hash: &Bytes32,
    amount: u64,
    metadata: &LaunchMetadata,
) -> PuzzleResult<Bytes32> {
    let metadata = Program::from_value(metadata)?;
    Ok(sha256(&[
        singleton_puzzle_hash.as_bytes(),
        &amount.to_be_bytes(),
        metadata.hash().as_bytes(),
    ]))
}

pub(crate) fn run(solution: &Program) -> PuzzleResult<Vec<Condition>> {
    let solution: LauncherSolution = solution.to_value()?;
    Ok(vec![
        Condition::create_coin(solution.singleton_puzzle_hash, solution.amount, Asset::Native),
        Condition::CreateCoinAnnouncement {
            message: solution.message()?,
        },
    ])
}
