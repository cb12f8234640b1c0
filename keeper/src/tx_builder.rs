//! Transition builder
//!
//! Turns an offer and a synced pair into one bundle that settles it. The
//! pair-side spends are:
//!
//! - the pair coin, committing the state the offer leads to
//! - both reserves, when the pool is not empty
//! - the trader's settlement coins, which feed the new reserves
//! - the settlement coins the pair creates, paying out the trader's
//!   requested payments (these make the announcements the offer asserts)
//!
//! Every amount is recomputed from the synced state. An offer that is off by
//! a single unit is refused rather than adjusted.

use coinpair_common::{Asset, CoinSpend, Program, SpendBundle};
use coinpair_puzzles::{
    created_coins, make_spend, settlement_puzzle_hash, PairSolution, Puzzle, PuzzleError, ReserveCoins,
    ReserveSolution, SettlementSolution, SingletonSolution,
};
use pair_model::{FormulaError, PairAction, Transition};

use crate::error::{SettleError, SettleResult};
use crate::offer::{Offer, OfferIntent};
use crate::reserves::locate_reserves;
use crate::sync::PairSnapshot;

/// A settled offer, ready to submit
#[derive(Clone, Debug)]
pub struct Settlement {
    pub intent: OfferIntent,
    pub action: PairAction,
    pub transition: Transition,
    /// Pending bundles, the offer and the pair-side spends, aggregated
    pub bundle: SpendBundle,
}

fn expect_amount(asset: Asset, expected: u64, offered: u64) -> SettleResult<()> {
    if expected != offered {
        return Err(SettleError::OfferPriceMismatch {
            asset,
            expected,
            offered,
        });
    }
    Ok(())
}

/// Action the offer asks for, checked against the pair's current state
pub fn price_offer(snapshot: &PairSnapshot, offer: &Offer) -> SettleResult<(OfferIntent, PairAction, Transition)> {
    let pair = &snapshot.inner;
    let state = pair.state;
    let token = Asset::Token(pair.token_id);
    let liquidity = Asset::Token(pair.liquidity_asset_id());

    let intent = offer.classify(&pair.token_id, &pair.liquidity_asset_id())?;

    let (action, transition) = match intent {
        OfferIntent::DepositLiquidity => {
            let token_amount = offer.offered_amount(token)?;
            let native_offered = offer.offered_amount(Asset::Native)?;
            let requested_liquidity = offer.requested_amount(liquidity)?;

            // Minted liquidity tokens carry native units too, so the native
            // side of a deposit offer is the deposit plus the minted amount
            let native_amount = if state.is_empty() {
                expect_amount(liquidity, token_amount, requested_liquidity)?;
                native_offered.saturating_sub(token_amount)
            } else {
                // Liquidity the token side mints; the native side must floor to the same share
                let minted = token_amount as u128 * state.liquidity as u128 / state.token_reserve as u128;
                let minted = u64::try_from(minted).map_err(|_| FormulaError::Overflow { context: "deposit offer" })?;
                expect_amount(liquidity, minted, requested_liquidity)?;
                native_offered.checked_sub(minted).ok_or(SettleError::OfferPriceMismatch {
                    asset: Asset::Native,
                    expected: minted,
                    offered: native_offered,
                })?
            };

            let action = PairAction::Deposit {
                native_amount,
                token_amount,
            };
            let transition = action.apply(&state)?;
            expect_amount(liquidity, transition.liquidity_minted, requested_liquidity)?;
            (action, transition)
        }
        OfferIntent::WithdrawLiquidity => {
            let action = PairAction::Withdraw {
                liquidity: offer.offered_amount(liquidity)?,
            };
            let transition = action.apply(&state)?;
            let native_expected = transition
                .native_out
                .checked_add(transition.liquidity_burned)
                .ok_or(FormulaError::Overflow {
                    context: "withdrawal payment",
                })?;
            expect_amount(Asset::Native, native_expected, offer.requested_amount(Asset::Native)?)?;
            expect_amount(token, transition.token_out, offer.requested_amount(token)?)?;
            (action, transition)
        }
        OfferIntent::SwapNativeForToken => {
            let action = PairAction::SwapNativeForToken {
                amount_in: offer.offered_amount(Asset::Native)?,
            };
            let transition = action.apply(&state)?;
            expect_amount(token, transition.token_out, offer.requested_amount(token)?)?;
            (action, transition)
        }
        OfferIntent::SwapTokenForNative => {
            let action = PairAction::SwapTokenForNative {
                amount_in: offer.offered_amount(token)?,
            };
            let transition = action.apply(&state)?;
            expect_amount(
                Asset::Native,
                transition.native_out,
                offer.requested_amount(Asset::Native)?,
            )?;
            (action, transition)
        }
    };

    Ok((intent, action, transition))
}

/// Build the bundle settling `offer` against the pair in `snapshot`
pub fn build_settlement(snapshot: &PairSnapshot, offer: &Offer) -> SettleResult<Settlement> {
    let pair = &snapshot.inner;
    let (intent, action, transition) = price_offer(snapshot, offer)?;
    let reserves = locate_reserves(snapshot)?;

    let pair_solution = PairSolution {
        action,
        new_state: transition.after,
        reserves: reserves.map(|r| ReserveCoins {
            native: r.native.coin,
            token: r.token.coin,
        }),
    };
    let pair_spend = make_spend(
        snapshot.coin,
        &pair.full_puzzle(),
        &SingletonSolution {
            lineage_proof: snapshot.lineage_proof,
            inner_solution: Program::from_value(&pair_solution).map_err(PuzzleError::from)?,
        },
    )?;

    let mut spends: Vec<CoinSpend> = vec![pair_spend.clone()];

    if let Some(reserves) = reserves {
        let reserve_puzzles = [
            (reserves.native, pair.native_reserve_puzzle()),
            (reserves.token, pair.token_reserve_puzzle()),
        ];
        for (reserve, puzzle) in reserve_puzzles {
            spends.push(make_spend(
                reserve.coin,
                &puzzle,
                &ReserveSolution {
                    lineage_proof: reserve.lineage_proof,
                    pair_coin: snapshot.coin,
                    pair_inner_puzzle_hash: pair.inner_puzzle_hash(),
                },
            )?);
        }
    }

    for offered in offer.offered_coins()? {
        spends.push(make_spend(
            offered.coin,
            &Puzzle::for_asset(offered.asset, Puzzle::Settlement),
            &SettlementSolution::default(),
        )?);
    }

    // Payments the pair makes land in settlement coins; paying those out
    // announces exactly the payments the trader asserted
    for payout in created_coins(&pair_spend)?
        .into_iter()
        .filter(|c| c.coin.puzzle_hash == settlement_puzzle_hash(c.asset))
    {
        let notarized_payments = offer
            .requested_payments
            .get(&payout.asset)
            .cloned()
            .unwrap_or_default();
        spends.push(make_spend(
            payout.coin,
            &Puzzle::for_asset(payout.asset, Puzzle::Settlement),
            &SettlementSolution { notarized_payments },
        )?);
    }

    let pair_side = SpendBundle::new(spends, vec![]);
    let bundles = snapshot
        .pending
        .iter()
        .chain(std::iter::once(&offer.bundle))
        .chain(std::iter::once(&pair_side));
    let bundle = SpendBundle::aggregate(bundles);

    log::info!(
        "Built {:?} for pair {}: {} -> {} ({} spends)",
        intent,
        snapshot.launcher_id,
        transition.before,
        transition.after,
        bundle.coin_spends.len()
    );

    Ok(Settlement {
        intent,
        action,
        transition,
        bundle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer_builder::{OfferBuilder, WalletCoin};
    use coinpair_common::{Bytes32, Coin, LineageProof};
    use coinpair_puzzles::PairPuzzle;
    use pair_model::PairState;

    fn snapshot(state: PairState) -> PairSnapshot {
        let pair = PairPuzzle {
            launcher_id: Bytes32::new([1u8; 32]),
            token_id: Bytes32::new([2u8; 32]),
            state,
        };
        let parent = Coin::new(Bytes32::new([3u8; 32]), Bytes32::new([4u8; 32]), 1);
        PairSnapshot {
            launcher_id: pair.launcher_id,
            coin: Coin::new(parent.coin_id(), pair.puzzle_hash(), 1),
            creating_spend: CoinSpend::new(parent, Program::default(), Program::default()),
            lineage_proof: LineageProof::from_parent(&parent, Bytes32::zero()),
            inner: pair,
            pending: vec![],
        }
    }

    fn wallet(asset: Asset, amount: u64) -> WalletCoin {
        let owner = Bytes32::new([9u8; 32]);
        WalletCoin {
            coin: Coin::new(
                Bytes32::new([5u8; 32]),
                Puzzle::for_asset(asset, Puzzle::standard(owner)).puzzle_hash(),
                amount,
            ),
            asset,
            owner,
        }
    }

    fn me() -> Bytes32 {
        Puzzle::standard(Bytes32::new([9u8; 32])).puzzle_hash()
    }

    #[test]
    fn test_swap_priced_exactly() {
        let snap = snapshot(PairState::new(4200, 420_000_000, 4200));
        let token = Asset::Token(snap.token_id());

        let offer = OfferBuilder::new(vec![wallet(Asset::Native, 100_000_000)])
            .offer(Asset::Native, 100_000_000)
            .request(token, me(), 803)
            .build()
            .unwrap();
        let (intent, action, transition) = price_offer(&snap, &offer).unwrap();
        assert_eq!(intent, OfferIntent::SwapNativeForToken);
        assert_eq!(action, PairAction::SwapNativeForToken { amount_in: 100_000_000 });
        assert_eq!(transition.after, PairState::new(4200, 520_000_000, 3397));
    }

    #[test]
    fn test_off_by_one_rejected() {
        let snap = snapshot(PairState::new(4200, 420_000_000, 4200));
        let token = Asset::Token(snap.token_id());

        let offer = OfferBuilder::new(vec![wallet(Asset::Native, 100_000_000)])
            .offer(Asset::Native, 100_000_000)
            .request(token, me(), 804)
            .build()
            .unwrap();
        match price_offer(&snap, &offer) {
            Err(SettleError::OfferPriceMismatch {
                asset,
                expected,
                offered,
            }) => {
                assert_eq!(asset, token);
                assert_eq!(expected, 803);
                assert_eq!(offered, 804);
            }
            other => panic!("expected OfferPriceMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_deposit_native_includes_minted_liquidity() {
        let snap = snapshot(PairState::new(1000, 100_000_000, 1000));
        let token = Asset::Token(snap.token_id());
        let liquidity = Asset::Token(snap.inner.liquidity_asset_id());

        let offer = OfferBuilder::new(vec![wallet(Asset::Native, 500_000_000), wallet(token, 4000)])
            .offer(Asset::Native, 400_004_000)
            .offer(token, 4000)
            .request(liquidity, me(), 4000)
            .build()
            .unwrap();
        let (_, _, transition) = price_offer(&snap, &offer).unwrap();
        assert_eq!(transition.after, PairState::new(5000, 500_000_000, 5000));

        let short = OfferBuilder::new(vec![wallet(Asset::Native, 500_000_000), wallet(token, 4000)])
            .offer(Asset::Native, 400_000_000)
            .offer(token, 4000)
            .request(liquidity, me(), 4000)
            .build()
            .unwrap();
        assert!(matches!(
            price_offer(&snap, &short),
            Err(SettleError::Formula(FormulaError::RatioMismatch {
                native_share: 3999,
                token_share: 4000
            }))
        ));
    }

    #[test]
    fn test_deposit_accepts_any_native_in_share_range() {
        let snap = snapshot(PairState::new(1000, 100_000_000, 1000));
        let token = Asset::Token(snap.token_id());
        let liquidity = Asset::Token(snap.inner.liquidity_asset_id());
        let deposit = |native: u64, requested: u64| {
            OfferBuilder::new(vec![wallet(Asset::Native, 500_000_000), wallet(token, 4000)])
                .offer(Asset::Native, native)
                .offer(token, 4000)
                .request(liquidity, me(), requested)
                .build()
                .unwrap()
        };

        // 400_050_000 native still floors to a 4000 share
        let (_, action, transition) = price_offer(&snap, &deposit(400_054_000, 4000)).unwrap();
        assert_eq!(
            action,
            PairAction::Deposit {
                native_amount: 400_050_000,
                token_amount: 4000
            }
        );
        assert_eq!(transition.after, PairState::new(5000, 500_050_000, 5000));

        // Largest native amount with the same share
        let (_, _, transition) = price_offer(&snap, &deposit(400_103_999, 4000)).unwrap();
        assert_eq!(transition.after.native_reserve, 500_099_999);

        // One more unit mints a 4001 native share
        assert!(matches!(
            price_offer(&snap, &deposit(400_104_000, 4000)),
            Err(SettleError::Formula(FormulaError::RatioMismatch {
                native_share: 4001,
                token_share: 4000
            }))
        ));

        // Requested liquidity must match what the token side mints
        assert!(matches!(
            price_offer(&snap, &deposit(400_054_000, 4001)),
            Err(SettleError::OfferPriceMismatch {
                expected: 4000,
                offered: 4001,
                ..
            })
        ));
    }

    #[test]
    fn test_withdraw_pricing() {
        let snap = snapshot(PairState::new(5000, 500_000_000, 5000));
        let token = Asset::Token(snap.token_id());
        let liquidity = Asset::Token(snap.inner.liquidity_asset_id());

        let offer = OfferBuilder::new(vec![wallet(liquidity, 800)])
            .offer(liquidity, 800)
            .request(Asset::Native, me(), 80_000_800)
            .request(token, me(), 800)
            .build()
            .unwrap();
        let (intent, _, transition) = price_offer(&snap, &offer).unwrap();
        assert_eq!(intent, OfferIntent::WithdrawLiquidity);
        assert_eq!(transition.after, PairState::new(4200, 420_000_000, 4200));
    }
}
