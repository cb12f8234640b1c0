//! The puzzle family and its interpreter

use coinpair_common::{sha256, Asset, Bytes32, Coin, CoinSpend, Condition, Program};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::pair::PairPuzzle;
use crate::router::RouterPuzzle;
use crate::{launcher, reserve, settlement, singleton, standard, token};

/// Hash of a tagged list of curried parameters
pub(crate) fn curry_hash(tag: &[u8], params: &[&[u8]]) -> Bytes32 {
    let mut parts = Vec::with_capacity(params.len() + 1);
    parts.push(tag);
    parts.extend_from_slice(params);
    sha256(&parts)
}

/// Every puzzle a coin in this system can be locked with.
///
/// A puzzle's hash commits to its variant and all curried parameters, so a
/// coin's `puzzle_hash` pins down exactly which of these it can be spent as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Puzzle {
    /// Owner-controlled coin; the solution lists the conditions to emit
    Standard { owner: Bytes32 },
    /// Anyone-can-spend lock used by offers
    Settlement,
    /// Creates a singleton's eve coin and announces it
    Launcher,
    /// Singleton layer: lineage checks around an inner state puzzle
    Singleton {
        launcher_id: Bytes32,
        inner: Box<Puzzle>,
    },
    /// Pair state; only spendable inside its singleton
    Pair(PairPuzzle),
    /// Router registry; only spendable inside its singleton
    Router(RouterPuzzle),
    /// Native funds held for a pair
    Reserve { launcher_id: Bytes32 },
    /// Token layer around an inner puzzle
    Token {
        asset_id: Bytes32,
        inner: Box<Puzzle>,
    },
}

impl Puzzle {
    pub fn standard(owner: Bytes32) -> Self {
        Puzzle::Standard { owner }
    }

    pub fn singleton(launcher_id: Bytes32, inner: Puzzle) -> Self {
        Puzzle::Singleton {
            launcher_id,
            inner: Box::new(inner),
        }
    }

    pub fn token(asset_id: Bytes32, inner: Puzzle) -> Self {
        Puzzle::Token {
            asset_id,
            inner: Box::new(inner),
        }
    }

    /// Wrap `inner` in the token layer when `asset` is a token
    pub fn for_asset(asset: Asset, inner: Puzzle) -> Self {
        match asset {
            Asset::Native => inner,
            Asset::Token(asset_id) => Puzzle::token(asset_id, inner),
        }
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        match self {
            Puzzle::Standard { owner } => standard::puzzle_hash(owner),
            Puzzle::Settlement => settlement::puzzle_hash(),
            Puzzle::Launcher => launcher::puzzle_hash(),
            Puzzle::Singleton { launcher_id, inner } => {
                singleton::puzzle_hash(launcher_id, &inner.puzzle_hash())
            }
            Puzzle::Pair(pair) => pair.inner_puzzle_hash(),
            Puzzle::Router(router) => router.inner_puzzle_hash(),
            Puzzle::Reserve { launcher_id } => reserve::puzzle_hash(launcher_id),
            Puzzle::Token { asset_id, inner } => token::puzzle_hash(asset_id, &inner.puzzle_hash()),
        }
    }

    /// Asset held by coins locked with this puzzle
    pub fn asset(&self) -> Asset {
        match self {
            Puzzle::Token { asset_id, .. } => Asset::Token(*asset_id),
            _ => Asset::Native,
        }
    }

    /// Run against `solution` as the puzzle of `coin`
    pub fn run(&self, coin: &Coin, solution: &Program) -> PuzzleResult<Vec<Condition>> {
        match self {
            Puzzle::Standard { .. } => standard::run(solution),
            Puzzle::Settlement => settlement::run(solution),
            Puzzle::Launcher => launcher::run(solution),
            Puzzle::Singleton { launcher_id, inner } => singleton::run(launcher_id, inner, coin, solution),
            Puzzle::Pair(_) => Err(PuzzleError::NotSpendable("pair")),
            Puzzle::Router(_) => Err(PuzzleError::NotSpendable("router")),
            Puzzle::Reserve { launcher_id } => reserve::run(launcher_id, coin, solution),
            Puzzle::Token { asset_id, inner } => token::run(asset_id, inner, coin, solution),
        }
    }

    pub fn to_program(&self) -> PuzzleResult<Program> {
        Ok(Program::from_value(self)?)
    }

    pub fn from_program(program: &Program) -> PuzzleResult<Self> {
        Ok(program.to_value()?)
    }
}

/// A coin produced by a spend, with the asset it carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedCoin {
    pub coin: Coin,
    pub asset: Asset,
}

/// Decode and run a spend, checking the reveal against the coin's puzzle hash
pub fn run_spend(spend: &CoinSpend) -> PuzzleResult<(Puzzle, Vec<Condition>)> {
    let puzzle = Puzzle::from_program(&spend.puzzle_reveal)?;
    let revealed = puzzle.puzzle_hash();
    if revealed != spend.coin.puzzle_hash {
        return Err(PuzzleError::PuzzleHashMismatch {
            committed: spend.coin.puzzle_hash,
            revealed,
        });
    }

    let conditions = puzzle.run(&spend.coin, &spend.solution)?;
    Ok((puzzle, conditions))
}

/// Coins created by running `spend`
pub fn created_coins(spend: &CoinSpend) -> PuzzleResult<Vec<CreatedCoin>> {
    let (_, conditions) = run_spend(spend)?;
    Ok(created_coins_from(&spend.coin, &conditions))
}

pub(crate) fn created_coins_from(parent: &Coin, conditions: &[Condition]) -> Vec<CreatedCoin> {
    let parent_id = parent.coin_id();
    conditions
        .iter()
        .filter_map(|c| match c {
            Condition::CreateCoin {
                puzzle_hash,
                amount,
                asset,
            } => Some(CreatedCoin {
                coin: Coin::new(parent_id, *puzzle_hash, *amount),
                asset: *asset,
            }),
            _ => None,
        })
        .collect()
}

/// Build a spend of `coin` locked by `puzzle`
pub fn make_spend<S: Serialize>(coin: Coin, puzzle: &Puzzle, solution: &S) -> PuzzleResult<CoinSpend> {
    Ok(CoinSpend::new(
        coin,
        puzzle.to_program()?,
        Program::from_value(solution)?,
    ))
}
