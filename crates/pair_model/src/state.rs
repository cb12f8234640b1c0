//! Pair state carried by every pair coin

use serde::{Deserialize, Serialize};

/// Liquidity and reserve totals of one pair.
///
/// All three fields are jointly zero (empty pool) or jointly positive.
/// A value is only meaningful together with the unspent coin that carries it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairState {
    /// Outstanding liquidity tokens
    pub liquidity: u64,
    /// Native units held by the native reserve coin
    pub native_reserve: u64,
    /// Token units held by the token reserve coin
    pub token_reserve: u64,
}

impl PairState {
    pub const EMPTY: PairState = PairState {
        liquidity: 0,
        native_reserve: 0,
        token_reserve: 0,
    };

    pub fn new(liquidity: u64, native_reserve: u64, token_reserve: u64) -> Self {
        Self {
            liquidity,
            native_reserve,
            token_reserve,
        }
    }

    /// True before the first deposit and after the last withdrawal
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
    }
}

impl std::fmt::Display for PairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "liquidity={} native={} token={}",
            self.liquidity, self.native_reserve, self.token_reserve
        )
    }
}
