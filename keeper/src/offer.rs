//! Offers
//!
//! An offer is a partial bundle: the trader's spends lock what they give up
//! in settlement coins and assert announcements for what they want back.
//! It only becomes valid once someone adds spends that make those
//! announcements, which is what settling against a pair does.

use std::collections::BTreeMap;

use coinpair_common::{Asset, Bytes32, Coin, SpendBundle};
use coinpair_puzzles::{created_coins, settlement_puzzle_hash, CreatedCoin, NotarizedPayment};
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};

/// Prefix of the text encoding of an offer
pub const OFFER_PREFIX: &str = "offer1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Payments the trader asserts, per asset of the settlement coin paying them
    pub requested_payments: BTreeMap<Asset, Vec<NotarizedPayment>>,
    pub bundle: SpendBundle,
}

/// What an offer asks a pair to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferIntent {
    DepositLiquidity,
    WithdrawLiquidity,
    SwapNativeForToken,
    SwapTokenForNative,
}

/// Assets as seen from one pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Leg {
    Native,
    Token,
    Liquidity,
}

impl Offer {
    /// Settlement coins created by the trader's spends
    pub fn offered_coins(&self) -> SettleResult<Vec<CreatedCoin>> {
        let mut offered = Vec::new();
        for spend in &self.bundle.coin_spends {
            let created = created_coins(spend).map_err(|e| {
                SettleError::MalformedOffer(format!("spend of {} does not run: {}", spend.coin.coin_id(), e))
            })?;
            offered.extend(
                created
                    .into_iter()
                    .filter(|c| c.coin.puzzle_hash == settlement_puzzle_hash(c.asset)),
            );
        }
        Ok(offered)
    }

    /// Amount of `asset` locked in settlement coins
    pub fn offered_amount(&self, asset: Asset) -> SettleResult<u64> {
        self.offered_coins()?
            .iter()
            .filter(|c| c.asset == asset)
            .try_fold(0u64, |acc, c| acc.checked_add(c.coin.amount))
            .ok_or_else(|| SettleError::MalformedOffer(format!("offered {} overflows", asset)))
    }

    /// Amount of `asset` the trader asks to be paid
    pub fn requested_amount(&self, asset: Asset) -> SettleResult<u64> {
        self.requested_payments
            .get(&asset)
            .map(|nps| nps.iter().try_fold(0u64, |acc, np| acc.checked_add(np.total())))
            .unwrap_or(Some(0))
            .ok_or_else(|| SettleError::MalformedOffer(format!("requested {} overflows", asset)))
    }

    /// Net amount per asset from the trader's side: requested positive,
    /// offered negative
    pub fn summary(&self) -> SettleResult<BTreeMap<Asset, i128>> {
        let mut summary: BTreeMap<Asset, i128> = BTreeMap::new();
        for coin in self.offered_coins()? {
            *summary.entry(coin.asset).or_default() -= coin.coin.amount as i128;
        }
        for (asset, nps) in &self.requested_payments {
            for np in nps {
                *summary.entry(*asset).or_default() += np.total() as i128;
            }
        }
        summary.retain(|_, v| *v != 0);
        Ok(summary)
    }

    /// Classify against the pair trading `token_id` with liquidity token `liquidity_id`
    pub fn classify(&self, token_id: &Bytes32, liquidity_id: &Bytes32) -> SettleResult<OfferIntent> {
        let summary = self.summary()?;

        let mut offered = Vec::new();
        let mut requested = Vec::new();
        for (asset, net) in &summary {
            let leg = match asset {
                Asset::Native => Leg::Native,
                Asset::Token(id) if id == token_id => Leg::Token,
                Asset::Token(id) if id == liquidity_id => Leg::Liquidity,
                Asset::Token(id) => {
                    return Err(SettleError::UnsupportedOffer(format!("asset {} is not traded by this pair", id)))
                }
            };
            if *net < 0 {
                offered.push(leg);
            } else {
                requested.push(leg);
            }
        }

        offered.sort();
        requested.sort();

        use Leg::*;
        match (offered.as_slice(), requested.as_slice()) {
            ([Native, Token], [Liquidity]) => Ok(OfferIntent::DepositLiquidity),
            ([Liquidity], [Native, Token]) | ([Liquidity], [Native]) => Ok(OfferIntent::WithdrawLiquidity),
            ([Native], [Token]) => Ok(OfferIntent::SwapNativeForToken),
            ([Token], [Native]) => Ok(OfferIntent::SwapTokenForNative),
            _ => Err(SettleError::UnsupportedOffer(format!(
                "offers {:?} for {:?}",
                offered, requested
            ))),
        }
    }

    /// Coins the trader spends
    pub fn removals(&self) -> Vec<Coin> {
        self.bundle.coin_spends.iter().map(|cs| cs.coin).collect()
    }

    pub fn encode(&self) -> SettleResult<String> {
        let body = bincode::serialize(self).map_err(|e| SettleError::MalformedOffer(e.to_string()))?;
        Ok(format!("{}{}", OFFER_PREFIX, bs58::encode(body).into_string()))
    }

    pub fn decode(text: &str) -> SettleResult<Self> {
        let body = text
            .trim()
            .strip_prefix(OFFER_PREFIX)
            .ok_or_else(|| SettleError::MalformedOffer(format!("missing {} prefix", OFFER_PREFIX)))?;
        let bytes = bs58::decode(body)
            .into_vec()
            .map_err(|e| SettleError::MalformedOffer(format!("bad base58: {}", e)))?;
        bincode::deserialize(&bytes).map_err(|e| SettleError::MalformedOffer(format!("bad offer body: {}", e)))
    }
}
