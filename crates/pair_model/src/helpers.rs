//! Invariant checking helpers

use crate::state::PairState;

/// Liquidity and both reserves are jointly zero or jointly positive
pub fn reserves_consistent(s: &PairState) -> bool {
    let zero = [s.liquidity, s.native_reserve, s.token_reserve]
        .iter()
        .filter(|v| **v == 0)
        .count();
    zero == 0 || zero == 3
}

/// Constant product k = Rn · Rt
pub fn invariant_product(s: &PairState) -> u128 {
    s.native_reserve as u128 * s.token_reserve as u128
}

/// Swaps must strictly grow k
pub fn product_grew(before: &PairState, after: &PairState) -> bool {
    invariant_product(after) > invariant_product(before)
}

/// Reserves backing each liquidity token never shrink across a deposit or
/// withdrawal: Rn'/L' >= Rn/L and Rt'/L' >= Rt/L.
///
/// Trivially true when either side is an empty pool.
pub fn share_value_preserved(before: &PairState, after: &PairState) -> bool {
    if before.is_empty() || after.is_empty() {
        return true;
    }

    let native_ok = after.native_reserve as u128 * before.liquidity as u128
        >= before.native_reserve as u128 * after.liquidity as u128;
    let token_ok = after.token_reserve as u128 * before.liquidity as u128
        >= before.token_reserve as u128 * after.liquidity as u128;

    native_ok && token_ok
}

/// Sum of both reserves, used to check that a deposit/withdraw round trip
/// never hands back more than went in
pub fn total_value(s: &PairState) -> u128 {
    s.native_reserve as u128 + s.token_reserve as u128
}
