//! Kani proofs for the pair transitions

use kani::{any, assume};
use pair_model::*;

use crate::{generators::*, sanitizer::*};

/// A successful swap strictly grows the constant product
#[kani::proof]
fn swap_native_for_token_grows_product() {
    let s = any_pair_state();
    let amount_in = any_amount();

    if let Ok(t) = swap_native_for_token(&s, amount_in) {
        kani::assert(product_grew(&t.before, &t.after), "swap must grow k");
        kani::assert(t.after.token_reserve > 0, "swap must not drain the token reserve");
        kani::assert(t.after.liquidity == s.liquidity, "swap must not mint or burn");
    }
}

#[kani::proof]
fn swap_token_for_native_grows_product() {
    let s = any_pair_state();
    let amount_in = any_amount();

    if let Ok(t) = swap_token_for_native(&s, amount_in) {
        kani::assert(product_grew(&t.before, &t.after), "swap must grow k");
        kani::assert(t.after.native_reserve > 0, "swap must not drain the native reserve");
    }
}

/// Withdrawals keep reserves consistent and never dilute remaining holders
#[kani::proof]
fn withdraw_keeps_consistency() {
    let s = any_pair_state();
    let liquidity = any_amount();
    assume(liquidity <= s.liquidity);

    if let Ok(t) = withdraw(&s, liquidity) {
        kani::assert(reserves_consistent(&t.after), "withdraw must leave a consistent pool");
        kani::assert(share_value_preserved(&t.before, &t.after), "withdraw must not dilute");
        kani::assert(t.liquidity_burned == liquidity, "withdraw burns exactly the offered liquidity");
    }
}

/// Deposits never dilute existing holders
#[kani::proof]
fn deposit_preserves_share_value() {
    let s = any_pair_state();
    let native_amount = any_amount();
    let token_amount = any_amount();

    if let Ok(t) = deposit(&s, native_amount, token_amount) {
        kani::assert(reserves_consistent(&t.after), "deposit must leave a consistent pool");
        kani::assert(share_value_preserved(&t.before, &t.after), "deposit must not dilute");
        kani::assert(t.liquidity_minted > 0, "a successful deposit mints");
    }
}

/// Sanitized arbitrary states are always consistent
#[kani::proof]
fn sanitized_state_is_consistent() {
    let s = PairState::new(any(), any(), any()).sanitize();
    kani::assert(reserves_consistent(&s), "sanitize must produce a consistent state");
}
