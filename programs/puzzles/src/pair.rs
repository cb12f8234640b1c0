//! Pair contract
//!
//! The pair's inner puzzle commits to its launcher, its token and its
//! current [`PairState`]. A spend names one [`PairAction`] and the state it
//! leads to; the contract recomputes the transition and refuses any other
//! result. It then:
//!
//! - recreates itself with the new state
//! - consumes the old reserves and creates new ones holding the new totals
//! - mints or burns liquidity tokens
//! - pays the trader through settlement coins

use coinpair_common::{sha256, Asset, Bytes32, Coin, Condition, Program};
use pair_model::{FormulaError, PairAction, PairState, Transition};
use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, PuzzleResult};
use crate::puzzle::{curry_hash, Puzzle};
use crate::settlement::settlement_puzzle_hash;
use crate::{reserve, singleton};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPuzzle {
    pub launcher_id: Bytes32,
    pub token_id: Bytes32,
    pub state: PairState,
}

/// The reserve coins spent alongside a non-empty pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveCoins {
    pub native: Coin,
    pub token: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSolution {
    pub action: PairAction,
    /// State committed by the successor coin
    pub new_state: PairState,
    pub reserves: Option<ReserveCoins>,
}

/// Asset id of the liquidity token of the pair launched by `launcher_id`
pub fn liquidity_asset_id(launcher_id: &Bytes32) -> Bytes32 {
    sha256(&[b"liquidity", launcher_id.as_bytes()])
}

impl PairPuzzle {
    /// Pair as created by its launcher
    pub fn genesis(launcher_id: Bytes32, token_id: Bytes32) -> Self {
        Self {
            launcher_id,
            token_id,
            state: PairState::EMPTY,
        }
    }

    pub fn inner_puzzle_hash(&self) -> Bytes32 {
        curry_hash(
            b"pair",
            &[
                self.launcher_id.as_bytes(),
                self.token_id.as_bytes(),
                &self.state.liquidity.to_be_bytes(),
                &self.state.native_reserve.to_be_bytes(),
                &self.state.token_reserve.to_be_bytes(),
            ],
        )
    }

    /// Full puzzle hash of the pair coin carrying this state
    pub fn puzzle_hash(&self) -> Bytes32 {
        singleton::puzzle_hash(&self.launcher_id, &self.inner_puzzle_hash())
    }

    /// Singleton-wrapped puzzle for the pair coin
    pub fn full_puzzle(&self) -> Puzzle {
        Puzzle::singleton(self.launcher_id, Puzzle::Pair(*self))
    }

    pub fn successor(&self, state: PairState) -> Self {
        Self { state, ..*self }
    }

    pub fn liquidity_asset_id(&self) -> Bytes32 {
        liquidity_asset_id(&self.launcher_id)
    }

    pub fn native_reserve_puzzle(&self) -> Puzzle {
        Puzzle::Reserve {
            launcher_id: self.launcher_id,
        }
    }

    pub fn token_reserve_puzzle(&self) -> Puzzle {
        Puzzle::token(self.token_id, self.native_reserve_puzzle())
    }

    pub fn native_reserve_puzzle_hash(&self) -> Bytes32 {
        reserve::puzzle_hash(&self.launcher_id)
    }

    pub fn token_reserve_puzzle_hash(&self) -> Bytes32 {
        self.token_reserve_puzzle().puzzle_hash()
    }

    fn check_reserves(&self, reserves: Option<&ReserveCoins>) -> PuzzleResult<()> {
        let reserves = match (self.state.is_empty(), reserves) {
            (true, None) => return Ok(()),
            (true, Some(_)) => return Err(PuzzleError::UnexpectedReserves),
            (false, None) => {
                return Err(PuzzleError::MissingReserves {
                    liquidity: self.state.liquidity,
                })
            }
            (false, Some(r)) => r,
        };

        let checks = [
            (&reserves.native, self.native_reserve_puzzle_hash(), self.state.native_reserve),
            (&reserves.token, self.token_reserve_puzzle_hash(), self.state.token_reserve),
        ];
        for (coin, puzzle_hash, amount) in checks {
            if coin.puzzle_hash != puzzle_hash {
                return Err(PuzzleError::ReserveMismatch {
                    coin_id: coin.coin_id(),
                    reason: "puzzle hash",
                });
            }
            if coin.amount != amount {
                return Err(PuzzleError::ReserveMismatch {
                    coin_id: coin.coin_id(),
                    reason: "amount",
                });
            }
        }
        Ok(())
    }

    /// Conditions paying the trader for `action`
    fn payments(&self, action: &PairAction, t: &Transition) -> PuzzleResult<Vec<Condition>> {
        let liquidity = self.liquidity_asset_id();
        let token = Asset::Token(self.token_id);

        let mut out = Vec::new();
        match action {
            PairAction::Deposit { .. } => {
                out.push(Condition::MintToken {
                    asset_id: liquidity,
                    amount: t.liquidity_minted,
                });
                out.push(payment(Asset::Token(liquidity), t.liquidity_minted));
            }
            PairAction::Withdraw { .. } => {
                // Burned liquidity tokens release the native units they carried
                let native = t
                    .native_out
                    .checked_add(t.liquidity_burned)
                    .ok_or(FormulaError::Overflow {
                        context: "withdrawal payment",
                    })?;
                out.push(Condition::BurnToken {
                    asset_id: liquidity,
                    amount: t.liquidity_burned,
                });
                out.push(payment(Asset::Native, native));
                out.push(payment(token, t.token_out));
            }
            PairAction::SwapNativeForToken { .. } => out.push(payment(token, t.token_out)),
            PairAction::SwapTokenForNative { .. } => out.push(payment(Asset::Native, t.native_out)),
        }

        // Nothing to pay is not a coin
        out.retain(|c| !matches!(c, Condition::CreateCoin { amount: 0, .. }));
        Ok(out)
    }

    pub(crate) fn run(&self, _coin: &Coin, solution: &Program) -> PuzzleResult<Vec<Condition>> {
        let solution: PairSolution = solution.to_value()?;
        self.check_reserves(solution.reserves.as_ref())?;

        let transition = solution.action.apply(&self.state)?;
        if transition.after != solution.new_state {
            return Err(PuzzleError::StateMismatch {
                committed: solution.new_state,
                computed: transition.after,
            });
        }

        let next = self.successor(transition.after);
        let mut conditions = vec![Condition::RecreateSelf {
            inner_puzzle_hash: next.inner_puzzle_hash(),
        }];

        if let Some(reserves) = &solution.reserves {
            conditions.push(Condition::AssertConcurrentSpend {
                coin_id: reserves.native.coin_id(),
            });
            conditions.push(Condition::AssertConcurrentSpend {
                coin_id: reserves.token.coin_id(),
            });
        }

        if !next.state.is_empty() {
            conditions.push(Condition::create_coin(
                next.native_reserve_puzzle_hash(),
                next.state.native_reserve,
                Asset::Native,
            ));
            conditions.push(Condition::create_coin(
                next.token_reserve_puzzle_hash(),
                next.state.token_reserve,
                Asset::Token(self.token_id),
            ));
        }

        conditions.extend(self.payments(&solution.action, &transition)?);
        Ok(conditions)
    }
}

fn payment(asset: Asset, amount: u64) -> Condition {
    Condition::create_coin(settlement_puzzle_hash(asset), amount, asset)
}
