//! Trader-side quotes
//!
//! A quote is only valid against the exact state it was computed from. The
//! pair recomputes every amount when the offer is settled.

use crate::error::{FormulaError, FormulaResult, Operation};
use crate::math::*;
use crate::state::PairState;

/// Amounts for a deposit that keeps the pool ratio
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositQuote {
    pub native_amount: u64,
    pub token_amount: u64,
    pub liquidity: u64,
}

/// Native amount and minted liquidity for depositing `token_amount` at the
/// current price.
///
/// An empty pool has no price: the first depositor picks both amounts and
/// calls [`liquidity_for_deposit`] directly.
pub fn quote_deposit(token_amount: u64, state: &PairState) -> FormulaResult<DepositQuote> {
    if state.is_empty() {
        return Err(FormulaError::InsufficientLiquidity {
            requested: token_amount,
            available: 0,
        });
    }

    let liquidity = state.liquidity as u128;
    let minted = token_amount as u128 * liquidity / state.token_reserve as u128;
    if minted == 0 {
        return Err(FormulaError::ZeroAmount {
            operation: Operation::Deposit,
        });
    }

    // Smallest native amount whose share floors to `minted`
    let native = (minted * state.native_reserve as u128).div_ceil(liquidity);
    let native_amount = u64::try_from(native).map_err(|_| FormulaError::Overflow {
        context: "deposit quote",
    })?;

    let liquidity = liquidity_for_deposit(native_amount, token_amount, state)?;

    Ok(DepositQuote {
        native_amount,
        token_amount,
        liquidity,
    })
}

/// Tokens received for `amount_in` native units
pub fn quote_swap_native_for_token(amount_in: u64, state: &PairState) -> FormulaResult<u64> {
    swap_output(amount_in, state.native_reserve, state.token_reserve)
}

/// Native units received for `amount_in` tokens
pub fn quote_swap_token_for_native(amount_in: u64, state: &PairState) -> FormulaResult<u64> {
    swap_output(amount_in, state.token_reserve, state.native_reserve)
}
