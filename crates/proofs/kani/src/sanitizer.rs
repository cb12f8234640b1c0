//! State space sanitizer - bounds pair states for Kani exploration

use pair_model::PairState;

/// Bounds for tractable verification
pub const MAX_LIQUIDITY: u64 = 1_000_000;
pub const MAX_RESERVE: u64 = 1_000_000_000;

pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for PairState {
    /// Clamp into range and restore the all-zero or all-positive shape
    fn sanitize(self) -> PairState {
        let liquidity = self.liquidity % MAX_LIQUIDITY;
        let native_reserve = self.native_reserve % MAX_RESERVE;
        let token_reserve = self.token_reserve % MAX_RESERVE;

        if liquidity == 0 || native_reserve == 0 || token_reserve == 0 {
            return PairState::EMPTY;
        }
        PairState::new(liquidity, native_reserve, token_reserve)
    }
}
