//! Generators for arbitrary pair states (for Kani)

#[cfg(kani)]
use kani::any;
#[cfg(kani)]
use pair_model::PairState;

// Small bounds keep the SAT problem fast
#[cfg(kani)]
const MAX_VAL: u64 = 100;

/// A non-empty pool with small reserves
#[cfg(kani)]
pub fn any_pair_state() -> PairState {
    let liquidity_raw: u8 = any();
    let native_raw: u8 = any();
    let token_raw: u8 = any();

    PairState::new(
        (liquidity_raw as u64) % MAX_VAL + 1,
        (native_raw as u64) % MAX_VAL + 1,
        (token_raw as u64) % MAX_VAL + 1,
    )
}

/// A positive amount no larger than `MAX_VAL`
#[cfg(kani)]
pub fn any_amount() -> u64 {
    let raw: u8 = any();
    (raw as u64) % MAX_VAL + 1
}
