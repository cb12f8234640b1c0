//! Reserve locator
//!
//! A pair's reserves are the two coins its latest spend created next to the
//! pair coin. Only that spend's outputs are considered, so coins someone else
//! locks with a reserve puzzle hash are never picked up.

use coinpair_common::{Asset, Bytes32, Coin, LineageProof};
use coinpair_puzzles::created_coins;

use crate::error::{SettleError, SettleResult};
use crate::sync::PairSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveCoin {
    pub coin: Coin,
    /// Proof of the pair coin that created this reserve
    pub lineage_proof: LineageProof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairReserves {
    pub native: ReserveCoin,
    pub token: ReserveCoin,
}

/// Reserves backing `snapshot`'s pair coin; `None` for an empty pool
pub fn locate_reserves(snapshot: &PairSnapshot) -> SettleResult<Option<PairReserves>> {
    let pair = &snapshot.inner;
    if pair.state.is_empty() {
        return Ok(None);
    }

    let created = created_coins(&snapshot.creating_spend)?;
    let parent_coin_id = snapshot.creating_spend.coin.coin_id();

    let pick = |asset: Asset, puzzle_hash: Bytes32, expected: u64| -> SettleResult<ReserveCoin> {
        let candidates: Vec<Coin> = created
            .iter()
            .filter(|c| c.coin.puzzle_hash == puzzle_hash && c.asset == asset)
            .map(|c| c.coin)
            .collect();
        let matching: Vec<&Coin> = candidates.iter().filter(|c| c.amount == expected).collect();

        match matching.as_slice() {
            [coin] => Ok(ReserveCoin {
                coin: **coin,
                lineage_proof: snapshot.lineage_proof,
            }),
            _ => Err(SettleError::ReserveNotFound {
                parent_coin_id,
                asset,
                expected,
                candidates: candidates.len(),
            }),
        }
    };

    let native = pick(
        Asset::Native,
        pair.native_reserve_puzzle_hash(),
        pair.state.native_reserve,
    )?;
    let token = pick(
        Asset::Token(pair.token_id),
        pair.token_reserve_puzzle_hash(),
        pair.state.token_reserve,
    )?;

    log::debug!(
        "Located reserves for pair {}: native {} ({}), token {} ({})",
        snapshot.launcher_id,
        native.coin.coin_id(),
        native.coin.amount,
        token.coin.coin_id(),
        token.coin.amount
    );
    Ok(Some(PairReserves { native, token }))
}
