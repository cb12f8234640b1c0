//! Contract errors

use coinpair_common::{Bytes32, CommonError};
use pair_model::{FormulaError, PairState};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    #[error(transparent)]
    Program(#[from] CommonError),

    #[error("puzzle reveal hashes to {revealed}, coin commits to {committed}")]
    PuzzleHashMismatch { committed: Bytes32, revealed: Bytes32 },

    #[error("{0} puzzle cannot be spent on its own")]
    NotSpendable(&'static str),

    #[error("condition not allowed by {0} puzzle")]
    RestrictedCondition(&'static str),

    #[error("lineage proof does not produce parent {expected_parent}")]
    LineageMismatch { expected_parent: Bytes32 },

    #[error("singleton coin amount must be 1, got {0}")]
    SingletonAmount(u64),

    #[error("singleton must recreate itself exactly once, found {0}")]
    SuccessorCount(usize),

    #[error("inner puzzle belongs to launcher {inner}, singleton layer to {outer}")]
    LauncherMismatch { outer: Bytes32, inner: Bytes32 },

    #[error("pair transition rejected: {0}")]
    Formula(#[from] FormulaError),

    #[error("committed state {committed} does not match computed {computed}")]
    StateMismatch {
        committed: PairState,
        computed: PairState,
    },

    #[error("reserve coin {coin_id} does not match pair state ({reason})")]
    ReserveMismatch { coin_id: Bytes32, reason: &'static str },

    #[error("pair with liquidity {liquidity} must spend its reserves")]
    MissingReserves { liquidity: u64 },

    #[error("empty pair has no reserves to spend")]
    UnexpectedReserves,

    #[error("coin {coin_id} is not a pair coin of launcher {launcher_id}")]
    ForeignPairCoin { coin_id: Bytes32, launcher_id: Bytes32 },

    #[error("pair for token {token_id} already registered as {pair_launcher_id}")]
    PairExists {
        token_id: Bytes32,
        pair_launcher_id: Bytes32,
    },
}

pub type PuzzleResult<T> = Result<T, PuzzleError>;
