//! State transition functions - all total, no panics

use serde::{Deserialize, Serialize};

use crate::error::{FormulaError, FormulaResult};
use crate::math::*;
use crate::state::PairState;

/// One of the four operations a pair spend can perform.
///
/// Only the trader-chosen inputs are carried; every output is recomputed
/// from the state being spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairAction {
    Deposit { native_amount: u64, token_amount: u64 },
    Withdraw { liquidity: u64 },
    SwapNativeForToken { amount_in: u64 },
    SwapTokenForNative { amount_in: u64 },
}

impl PairAction {
    /// Apply this action to `state`
    pub fn apply(&self, state: &PairState) -> FormulaResult<Transition> {
        match *self {
            PairAction::Deposit {
                native_amount,
                token_amount,
            } => deposit(state, native_amount, token_amount),
            PairAction::Withdraw { liquidity } => withdraw(state, liquidity),
            PairAction::SwapNativeForToken { amount_in } => swap_native_for_token(state, amount_in),
            PairAction::SwapTokenForNative { amount_in } => swap_token_for_native(state, amount_in),
        }
    }
}

/// Result of applying a [`PairAction`]: the successor state and what moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub before: PairState,
    pub after: PairState,
    pub liquidity_minted: u64,
    pub liquidity_burned: u64,
    /// Native units paid out of the native reserve
    pub native_out: u64,
    /// Token units paid out of the token reserve
    pub token_out: u64,
}

fn add(a: u64, b: u64, context: &'static str) -> FormulaResult<u64> {
    a.checked_add(b).ok_or(FormulaError::Overflow { context })
}

/// Deposit both assets and mint liquidity
pub fn deposit(state: &PairState, native_amount: u64, token_amount: u64) -> FormulaResult<Transition> {
    let minted = liquidity_for_deposit(native_amount, token_amount, state)?;

    let after = PairState {
        liquidity: add(state.liquidity, minted, "liquidity")?,
        native_reserve: add(state.native_reserve, native_amount, "native reserve")?,
        token_reserve: add(state.token_reserve, token_amount, "token reserve")?,
    };

    Ok(Transition {
        before: *state,
        after,
        liquidity_minted: minted,
        ..Transition::default()
    })
}

/// Burn liquidity and release the proportional share of both reserves
pub fn withdraw(state: &PairState, liquidity: u64) -> FormulaResult<Transition> {
    let (native_out, token_out) = amounts_for_withdrawal(liquidity, state)?;

    // Withdrawal amounts never exceed the reserves they are taken from
    let after = PairState {
        liquidity: state.liquidity - liquidity,
        native_reserve: state.native_reserve - native_out,
        token_reserve: state.token_reserve - token_out,
    };

    Ok(Transition {
        before: *state,
        after,
        liquidity_burned: liquidity,
        native_out,
        token_out,
        ..Transition::default()
    })
}

/// Pay native units in, take tokens out
pub fn swap_native_for_token(state: &PairState, amount_in: u64) -> FormulaResult<Transition> {
    let token_out = swap_output(amount_in, state.native_reserve, state.token_reserve)?;

    let after = PairState {
        liquidity: state.liquidity,
        native_reserve: add(state.native_reserve, amount_in, "native reserve")?,
        token_reserve: state.token_reserve - token_out,
    };

    Ok(Transition {
        before: *state,
        after,
        token_out,
        ..Transition::default()
    })
}

/// Pay tokens in, take native units out
pub fn swap_token_for_native(state: &PairState, amount_in: u64) -> FormulaResult<Transition> {
    let native_out = swap_output(amount_in, state.token_reserve, state.native_reserve)?;

    let after = PairState {
        liquidity: state.liquidity,
        native_reserve: state.native_reserve - native_out,
        token_reserve: add(state.token_reserve, amount_in, "token reserve")?,
    };

    Ok(Transition {
        before: *state,
        after,
        native_out,
        ..Transition::default()
    })
}
