//! Constant product formulas (x·y=k) with a 0.7% input fee
//!
//! Amounts are u64 and products are taken in u128. Only the swap numerator
//! can exceed u128 and it is checked. Division floors in the pool's favour.

use crate::error::{FormulaError, FormulaResult, Operation};
use crate::state::PairState;

/// Fee numerator: 993/1000 of the input reaches the curve
pub const FEE_NUMERATOR: u128 = 993;

/// Fee denominator
pub const FEE_DENOMINATOR: u128 = 1000;

fn to_u64(x: u128, context: &'static str) -> FormulaResult<u64> {
    u64::try_from(x).map_err(|_| FormulaError::Overflow { context })
}

/// Output of a swap paying `amount_in` into `reserve_in` and taking from `reserve_out`
///
/// - Δin_net = Δin · 993/1000
/// - Δout = reserve_out · Δin_net / (reserve_in + Δin_net)
/// - = reserve_out · Δin · 993 / (1000 · reserve_in + 993 · Δin)
///
/// The output is strictly below `reserve_out`, so a swap never drains a reserve.
pub fn swap_output(amount_in: u64, reserve_in: u64, reserve_out: u64) -> FormulaResult<u64> {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return Err(FormulaError::InvalidSwap {
            amount_in,
            reserve_in,
            reserve_out,
        });
    }

    let amount_in_with_fee = amount_in as u128 * FEE_NUMERATOR;
    let numerator = (reserve_out as u128)
        .checked_mul(amount_in_with_fee)
        .ok_or(FormulaError::Overflow {
            context: "swap numerator",
        })?;
    let denominator = reserve_in as u128 * FEE_DENOMINATOR + amount_in_with_fee;

    to_u64(numerator / denominator, "swap output")
}

/// Liquidity minted for depositing `native_amount` and `token_amount` into `state`
///
/// The first deposit sets the price and mints exactly `token_amount`.
/// Later deposits must match the pool ratio: both proportional shares
/// `native·L/Rn` and `token·L/Rt` are computed and have to agree.
pub fn liquidity_for_deposit(
    native_amount: u64,
    token_amount: u64,
    state: &PairState,
) -> FormulaResult<u64> {
    if native_amount == 0 || token_amount == 0 {
        return Err(FormulaError::ZeroAmount {
            operation: Operation::Deposit,
        });
    }

    if state.is_empty() {
        return Ok(token_amount);
    }

    let liquidity = state.liquidity as u128;
    let native_share = to_u64(
        native_amount as u128 * liquidity / state.native_reserve as u128,
        "native share",
    )?;
    let token_share = to_u64(
        token_amount as u128 * liquidity / state.token_reserve as u128,
        "token share",
    )?;

    if native_share != token_share {
        return Err(FormulaError::RatioMismatch {
            native_share,
            token_share,
        });
    }
    if native_share == 0 {
        return Err(FormulaError::ZeroAmount {
            operation: Operation::Deposit,
        });
    }

    Ok(native_share.min(token_share))
}

/// Native and token amounts released by burning `liquidity_burned`
pub fn amounts_for_withdrawal(
    liquidity_burned: u64,
    state: &PairState,
) -> FormulaResult<(u64, u64)> {
    if liquidity_burned == 0 {
        return Err(FormulaError::ZeroAmount {
            operation: Operation::Withdraw,
        });
    }
    if liquidity_burned > state.liquidity {
        return Err(FormulaError::InsufficientLiquidity {
            requested: liquidity_burned,
            available: state.liquidity,
        });
    }

    let burned = liquidity_burned as u128;
    let liquidity = state.liquidity as u128;

    // burned <= liquidity, so both results fit in the reserves they come from
    let native = (state.native_reserve as u128 * burned / liquidity) as u64;
    let token = (state.token_reserve as u128 * burned / liquidity) as u64;

    Ok((native, token))
}
