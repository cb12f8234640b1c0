//! Assembling offers from wallet coins

use std::collections::BTreeMap;

use coinpair_common::{puzzle_announcement_id, sha256, Asset, Bytes32, Coin, Condition, SpendBundle};
use coinpair_puzzles::{make_spend, settlement_puzzle_hash, NotarizedPayment, Payment, Puzzle, StandardSolution};

use crate::error::{SettleError, SettleResult};
use crate::offer::Offer;

/// A coin the trader controls with a standard puzzle, possibly token-wrapped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletCoin {
    pub coin: Coin,
    pub asset: Asset,
    pub owner: Bytes32,
}

impl WalletCoin {
    pub fn puzzle(&self) -> Puzzle {
        Puzzle::for_asset(self.asset, Puzzle::standard(self.owner))
    }
}

/// Builds an unsigned offer.
///
/// Requested payment puzzle hashes are inner puzzle hashes; for token
/// requests the settlement coin's token layer wraps them.
pub struct OfferBuilder {
    coins: Vec<WalletCoin>,
    offered: BTreeMap<Asset, u64>,
    requested: BTreeMap<Asset, Vec<Payment>>,
    change_puzzle_hash: Option<Bytes32>,
}

struct Selection {
    asset: Asset,
    amount: u64,
    total: u64,
    coins: Vec<WalletCoin>,
}

impl OfferBuilder {
    pub fn new(coins: Vec<WalletCoin>) -> Self {
        Self {
            coins,
            offered: BTreeMap::new(),
            requested: BTreeMap::new(),
            change_puzzle_hash: None,
        }
    }

    pub fn offer(mut self, asset: Asset, amount: u64) -> Self {
        *self.offered.entry(asset).or_default() += amount;
        self
    }

    pub fn request(mut self, asset: Asset, puzzle_hash: Bytes32, amount: u64) -> Self {
        self.requested
            .entry(asset)
            .or_default()
            .push(Payment { puzzle_hash, amount });
        self
    }

    /// Send change here instead of back to each coin's owner
    pub fn change_to(mut self, puzzle_hash: Bytes32) -> Self {
        self.change_puzzle_hash = Some(puzzle_hash);
        self
    }

    fn select(&self, asset: Asset, amount: u64) -> SettleResult<Selection> {
        let mut candidates: Vec<WalletCoin> = self.coins.iter().filter(|c| c.asset == asset).copied().collect();
        candidates.sort_by(|a, b| b.coin.amount.cmp(&a.coin.amount));

        let mut total = 0u64;
        let mut coins = Vec::new();
        for candidate in candidates {
            if total >= amount {
                break;
            }
            total = total
                .checked_add(candidate.coin.amount)
                .ok_or_else(|| SettleError::MalformedOffer(format!("{} coin total overflows", asset)))?;
            coins.push(candidate);
        }

        if total < amount || coins.is_empty() {
            return Err(SettleError::MalformedOffer(format!(
                "offering {} {} but wallet holds {}",
                amount, asset, total
            )));
        }
        Ok(Selection {
            asset,
            amount,
            total,
            coins,
        })
    }

    pub fn build(self) -> SettleResult<Offer> {
        if self.offered.is_empty() {
            return Err(SettleError::MalformedOffer("offer gives nothing".to_string()));
        }

        let selections = self
            .offered
            .iter()
            .map(|(asset, amount)| self.select(*asset, *amount))
            .collect::<SettleResult<Vec<_>>>()?;

        let mut spent_ids: Vec<Bytes32> = selections
            .iter()
            .flat_map(|s| s.coins.iter().map(|c| c.coin.coin_id()))
            .collect();
        spent_ids.sort();
        let parts: Vec<&[u8]> = spent_ids.iter().map(|id| id.as_ref()).collect();
        let nonce = sha256(&parts);

        let requested_payments: BTreeMap<Asset, Vec<NotarizedPayment>> = self
            .requested
            .iter()
            .map(|(asset, payments)| {
                (
                    *asset,
                    vec![NotarizedPayment {
                        nonce,
                        payments: payments.clone(),
                    }],
                )
            })
            .collect();

        let mut assertions: Vec<Condition> = requested_payments
            .iter()
            .flat_map(|(asset, nps)| {
                nps.iter().map(move |np| Condition::AssertPuzzleAnnouncement {
                    announcement_id: puzzle_announcement_id(&settlement_puzzle_hash(*asset), &np.message()),
                })
            })
            .collect();

        let settlement_inner = Puzzle::Settlement.puzzle_hash();
        let mut coin_spends = Vec::new();
        for selection in &selections {
            let lead = selection.coins[0];
            let change_puzzle_hash = self
                .change_puzzle_hash
                .unwrap_or_else(|| Puzzle::standard(lead.owner).puzzle_hash());

            for (index, wallet_coin) in selection.coins.iter().enumerate() {
                let mut conditions = Vec::new();
                if index == 0 {
                    conditions.push(Condition::create_coin(settlement_inner, selection.amount, Asset::Native));
                    let change = selection.total - selection.amount;
                    if change > 0 {
                        conditions.push(Condition::create_coin(change_puzzle_hash, change, Asset::Native));
                    }
                } else {
                    conditions.push(Condition::AssertConcurrentSpend {
                        coin_id: lead.coin.coin_id(),
                    });
                }
                conditions.append(&mut assertions);

                coin_spends.push(make_spend(
                    wallet_coin.coin,
                    &wallet_coin.puzzle(),
                    &StandardSolution { conditions },
                )?);
            }

            log::debug!(
                "Offering {} {} from {} coins",
                selection.amount,
                selection.asset,
                selection.coins.len()
            );
        }

        Ok(Offer {
            requested_payments,
            bundle: SpendBundle::new(coin_spends, vec![]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinpair_puzzles::created_coins;

    fn wallet_coin(asset: Asset, amount: u64, tag: u8) -> WalletCoin {
        let owner = Bytes32::new([1u8; 32]);
        let puzzle = Puzzle::for_asset(asset, Puzzle::standard(owner));
        WalletCoin {
            coin: Coin::new(Bytes32::new([tag; 32]), puzzle.puzzle_hash(), amount),
            asset,
            owner,
        }
    }

    #[test]
    fn test_selects_coins_and_returns_change() {
        let offer = OfferBuilder::new(vec![
            wallet_coin(Asset::Native, 40, 1),
            wallet_coin(Asset::Native, 30, 2),
            wallet_coin(Asset::Native, 5, 3),
        ])
        .offer(Asset::Native, 60)
        .build()
        .unwrap();

        assert_eq!(offer.bundle.coin_spends.len(), 2);
        let created = created_coins(&offer.bundle.coin_spends[0]).unwrap();
        let amounts: Vec<u64> = created.iter().map(|c| c.coin.amount).collect();
        assert_eq!(amounts, vec![60, 10]);
        assert_eq!(offer.offered_amount(Asset::Native).unwrap(), 60);
    }

    #[test]
    fn test_token_offer_locks_token_settlement() {
        let token = Asset::Token(Bytes32::new([7u8; 32]));
        let offer = OfferBuilder::new(vec![wallet_coin(token, 100, 1)])
            .offer(token, 100)
            .build()
            .unwrap();

        let offered = offer.offered_coins().unwrap();
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].asset, token);
        assert_eq!(offered[0].coin.puzzle_hash, settlement_puzzle_hash(token));
    }

    #[test]
    fn test_insufficient_coins() {
        let result = OfferBuilder::new(vec![wallet_coin(Asset::Native, 10, 1)])
            .offer(Asset::Native, 11)
            .build();
        assert!(matches!(result, Err(SettleError::MalformedOffer(_))));
    }

    #[test]
    fn test_requested_payments_asserted_once() {
        let token = Asset::Token(Bytes32::new([7u8; 32]));
        let me = Puzzle::standard(Bytes32::new([1u8; 32])).puzzle_hash();
        let offer = OfferBuilder::new(vec![wallet_coin(Asset::Native, 10, 1), wallet_coin(Asset::Native, 10, 2)])
            .offer(Asset::Native, 15)
            .request(token, me, 4)
            .build()
            .unwrap();

        let nps = &offer.requested_payments[&token];
        assert_eq!(nps.len(), 1);
        let expected = Condition::AssertPuzzleAnnouncement {
            announcement_id: puzzle_announcement_id(&settlement_puzzle_hash(token), &nps[0].message()),
        };

        let asserting: Vec<_> = offer
            .bundle
            .coin_spends
            .iter()
            .filter(|cs| {
                let solution: StandardSolution = cs.solution.to_value().unwrap();
                solution.conditions.contains(&expected)
            })
            .collect();
        assert_eq!(asserting.len(), 1);
    }
}
